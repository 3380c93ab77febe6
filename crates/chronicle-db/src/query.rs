//! Record listing query builder
//!
//! A listing request is a loose set of query parameters. Resolution turns it
//! into a [`RecordQuery`], one variant per supported filter combination, and
//! [`compose`] lowers that variant into a single SELECT through an ordered
//! list of [`Predicate`]s.
//!
//! Two keys are reserved: `start_date` and `finish_date`. Every other key is
//! a candidate tag name and selects records tagged with it when a tag of that
//! exact name exists in the people namespace.
//!
//! When both dates are given without any selected tag, only the lower bound
//! is applied. Existing links depend on that behavior, so it is kept.

use crate::codec;
use crate::error::Result;
use crate::models::{Record, Status};
use crate::records::{load_records, record_select};
use crate::schema::{RECORD_TAGS, RECORDS, TAGS};
use chrono::NaiveDate;
use chronicle_taggit::{TagNamespace, Taggable};
use sea_query::{Alias, Expr, ExprTrait, JoinType, Order, Query, SelectStatement, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

pub const START_DATE: &str = "start_date";
pub const FINISH_DATE: &str = "finish_date";

/// Client-side errors in a listing request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
	#[error("Invalid date for '{key}': '{value}' (expected YYYY-MM-DD or YYYYMMDD)")]
	InvalidDate { key: String, value: String },

	#[error("Malformed query string: {0}")]
	MalformedQuery(String),
}

/// Parameters of one listing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRequest {
	params: BTreeMap<String, String>,
}

impl FilterRequest {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a request from key/value pairs; a repeated key keeps its last value
	pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			params: pairs
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}

	/// Parse an `application/x-www-form-urlencoded` query string
	///
	/// # Examples
	///
	/// ```rust
	/// use chronicle_db::FilterRequest;
	///
	/// let request = FilterRequest::from_query_string("Paris=on&start_date=2024-01-01").unwrap();
	/// assert_eq!(request.get("start_date"), Some("2024-01-01"));
	/// assert_eq!(request.len(), 2);
	/// ```
	pub fn from_query_string(query: &str) -> std::result::Result<Self, FilterError> {
		let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
			.map_err(|e| FilterError::MalformedQuery(e.to_string()))?;
		Ok(Self::from_pairs(pairs))
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.params.insert(key.into(), value.into());
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.params.get(key).map(String::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}

	pub fn len(&self) -> usize {
		self.params.len()
	}

	/// Keys that are not reserved date parameters
	pub fn tag_candidates(&self) -> impl Iterator<Item = &str> {
		self.params
			.keys()
			.map(String::as_str)
			.filter(|k| *k != START_DATE && *k != FINISH_DATE)
	}
}

/// Supported filter combinations of the record listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordQuery {
	All,
	Tagged {
		tags: BTreeSet<String>,
	},
	TaggedSince {
		start: NaiveDate,
		tags: BTreeSet<String>,
	},
	TaggedUntil {
		finish: NaiveDate,
		tags: BTreeSet<String>,
	},
	TaggedBetween {
		start: NaiveDate,
		finish: NaiveDate,
		tags: BTreeSet<String>,
	},
	Since {
		start: NaiveDate,
	},
	Until {
		finish: NaiveDate,
	},
}

/// Single condition of a composed listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
	Published,
	HappenedOnOrAfter(NaiveDate),
	HappenedOnOrBefore(NaiveDate),
	/// Tagged with at least one of the people tags
	TaggedWithAny(BTreeSet<String>),
}

impl Predicate {
	/// Evaluate the predicate against a loaded record
	///
	/// Mirrors the SQL produced by [`compose`]: a record without a
	/// `date_happened` fails both date predicates.
	pub fn matches(&self, record: &Record) -> bool {
		match self {
			Predicate::Published => record.status == Status::Published,
			Predicate::HappenedOnOrAfter(start) => record.date_happened.is_some_and(|d| d >= *start),
			Predicate::HappenedOnOrBefore(finish) => {
				record.date_happened.is_some_and(|d| d <= *finish)
			}
			Predicate::TaggedWithAny(tags) => tags
				.iter()
				.any(|tag| record.has_tag(TagNamespace::People, tag)),
		}
	}

	fn apply(&self, stmt: &mut SelectStatement) {
		let column = |name: &str| Expr::col((Alias::new(RECORDS), Alias::new(name)));
		match self {
			Predicate::Published => {
				stmt.and_where(column("status").eq(Status::Published.as_str()));
			}
			Predicate::HappenedOnOrAfter(start) => {
				stmt.and_where(column("date_happened").gte(codec::encode_date(*start)));
			}
			Predicate::HappenedOnOrBefore(finish) => {
				stmt.and_where(column("date_happened").lte(codec::encode_date(*finish)));
			}
			Predicate::TaggedWithAny(tags) => {
				let tagged = Query::select()
					.column((Alias::new(RECORD_TAGS), Alias::new("record_id")))
					.from(Alias::new(RECORD_TAGS))
					.join(
						JoinType::InnerJoin,
						Alias::new(TAGS),
						Expr::col((Alias::new(TAGS), Alias::new("id")))
							.equals((Alias::new(RECORD_TAGS), Alias::new("tag_id"))),
					)
					.and_where(
						Expr::col((Alias::new(TAGS), Alias::new("namespace")))
							.eq(TagNamespace::People.as_str()),
					)
					.and_where(
						Expr::col((Alias::new(TAGS), Alias::new("name")))
							.is_in(tags.iter().map(String::as_str)),
					)
					.to_owned();
				stmt.and_where(column("id").in_subquery(tagged));
			}
		}
	}
}

impl RecordQuery {
	/// Conditions of the query, in the order they are applied
	pub fn predicates(&self) -> Vec<Predicate> {
		let mut predicates = vec![Predicate::Published];
		match self {
			RecordQuery::All => {}
			RecordQuery::Tagged { tags } => {
				predicates.push(Predicate::TaggedWithAny(tags.clone()));
			}
			RecordQuery::TaggedSince { start, tags } => {
				predicates.push(Predicate::HappenedOnOrAfter(*start));
				predicates.push(Predicate::TaggedWithAny(tags.clone()));
			}
			RecordQuery::TaggedUntil { finish, tags } => {
				predicates.push(Predicate::HappenedOnOrBefore(*finish));
				predicates.push(Predicate::TaggedWithAny(tags.clone()));
			}
			RecordQuery::TaggedBetween {
				start,
				finish,
				tags,
			} => {
				predicates.push(Predicate::HappenedOnOrAfter(*start));
				predicates.push(Predicate::HappenedOnOrBefore(*finish));
				predicates.push(Predicate::TaggedWithAny(tags.clone()));
			}
			RecordQuery::Since { start } => {
				predicates.push(Predicate::HappenedOnOrAfter(*start));
			}
			RecordQuery::Until { finish } => {
				predicates.push(Predicate::HappenedOnOrBefore(*finish));
			}
		}
		predicates
	}

	/// Whether a loaded record belongs to the query's result
	pub fn matches(&self, record: &Record) -> bool {
		self.predicates().iter().all(|p| p.matches(record))
	}
}

/// Parse a date filter value
///
/// Dashes are removed before parsing, so `2024-01-05` and `20240105` are
/// equivalent. An empty value means the filter is not set.
pub fn parse_filter_date(
	key: &str,
	value: &str,
) -> std::result::Result<Option<NaiveDate>, FilterError> {
	let digits: String = value.trim().chars().filter(|c| *c != '-').collect();
	if digits.is_empty() {
		return Ok(None);
	}

	let invalid = || FilterError::InvalidDate {
		key: key.to_string(),
		value: value.to_string(),
	};
	if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return Err(invalid());
	}
	let year: i32 = digits[..4].parse().map_err(|_| invalid())?;
	let month: u32 = digits[4..6].parse().map_err(|_| invalid())?;
	let day: u32 = digits[6..].parse().map_err(|_| invalid())?;
	NaiveDate::from_ymd_opt(year, month, day)
		.map(Some)
		.ok_or_else(invalid)
}

/// Resolve a listing request against the known people tag names
pub fn resolve(
	request: &FilterRequest,
	people_tags: &HashSet<String>,
) -> std::result::Result<RecordQuery, FilterError> {
	if request.is_empty() {
		return Ok(RecordQuery::All);
	}

	let start = match request.get(START_DATE) {
		Some(value) => parse_filter_date(START_DATE, value)?,
		None => None,
	};
	let finish = match request.get(FINISH_DATE) {
		Some(value) => parse_filter_date(FINISH_DATE, value)?,
		None => None,
	};
	let tags: BTreeSet<String> = request
		.tag_candidates()
		.filter(|key| people_tags.contains(*key))
		.map(str::to_string)
		.collect();

	let query = if !tags.is_empty() {
		match (start, finish) {
			(Some(start), Some(finish)) => RecordQuery::TaggedBetween {
				start,
				finish,
				tags,
			},
			(Some(start), None) => RecordQuery::TaggedSince { start, tags },
			(None, Some(finish)) => RecordQuery::TaggedUntil { finish, tags },
			(None, None) => RecordQuery::Tagged { tags },
		}
	} else {
		match (start, finish) {
			// The finish bound is dropped here; see the module docs.
			(Some(start), Some(_)) => RecordQuery::Since { start },
			(Some(start), None) => RecordQuery::Since { start },
			(None, Some(finish)) => RecordQuery::Until { finish },
			(None, None) => RecordQuery::All,
		}
	};
	Ok(query)
}

/// Lower a [`RecordQuery`] into one SELECT, newest records first
pub fn compose(query: &RecordQuery) -> SelectStatement {
	let mut stmt = record_select();
	for predicate in query.predicates() {
		predicate.apply(&mut stmt);
	}
	stmt.order_by((Alias::new(RECORDS), Alias::new("time_create")), Order::Desc)
		.order_by((Alias::new(RECORDS), Alias::new("id")), Order::Desc);
	stmt
}

/// Names of every tag in the people namespace
pub async fn known_people_tags(pool: &SqlitePool) -> Result<HashSet<String>> {
	people_tags_among(pool, None).await
}

async fn people_tags_among(
	pool: &SqlitePool,
	candidates: Option<Vec<&str>>,
) -> Result<HashSet<String>> {
	let mut stmt = Query::select();
	stmt.column(Alias::new("name"))
		.from(Alias::new(TAGS))
		.and_where(Expr::col(Alias::new("namespace")).eq(TagNamespace::People.as_str()));
	if let Some(candidates) = candidates {
		if candidates.is_empty() {
			return Ok(HashSet::new());
		}
		stmt.and_where(Expr::col(Alias::new("name")).is_in(candidates));
	}
	let sql = stmt.to_string(SqliteQueryBuilder);

	let rows = sqlx::query(&sql).fetch_all(pool).await?;
	rows.iter()
		.map(|row| row.try_get::<String, _>("name").map_err(Into::into))
		.collect()
}

/// Published records selected by a listing request
pub async fn select_records(pool: &SqlitePool, request: &FilterRequest) -> Result<Vec<Record>> {
	let people_tags = if request.is_empty() {
		HashSet::new()
	} else {
		people_tags_among(pool, Some(request.tag_candidates().collect())).await?
	};
	let query = resolve(request, &people_tags)?;
	tracing::debug!(?query, "resolved record listing");

	let sql = compose(&query).to_string(SqliteQueryBuilder);
	load_records(pool, &sql).await
}

/// [`select_records`] for a raw query string
pub async fn select_records_from_query(pool: &SqlitePool, query: &str) -> Result<Vec<Record>> {
	let request = FilterRequest::from_query_string(query)?;
	select_records(pool, &request).await
}
