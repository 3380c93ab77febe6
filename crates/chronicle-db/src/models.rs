//! Model definitions
//!
//! - `User`: author or updater identity
//! - `Record`: chronicle entry with namespaced tags
//! - `Comment`: node of a record's comment tree
//! - `NewRecord` / `RecordChanges` / `NewComment`: write-side inputs

use chrono::{DateTime, NaiveDate, Utc};
use chronicle_taggit::{TagNamespace, Taggable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DbError;

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_SHORT_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_COMMENT_LENGTH: usize = 3000;

/// Publication status shared by records and comments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
	#[default]
	Published,
	Draft,
}

impl Status {
	pub fn as_str(&self) -> &'static str {
		match self {
			Status::Published => "published",
			Status::Draft => "draft",
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Status {
	type Err = DbError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"published" => Ok(Status::Published),
			"draft" => Ok(Status::Draft),
			other => Err(DbError::Validation(format!("unknown status '{}'", other))),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: i64,
	pub username: String,
}

/// Chronicle record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	pub id: i64,
	pub title: String,
	pub slug: String,
	pub short_description: String,
	pub full_description: String,
	/// Media-relative path of the normalized thumbnail
	pub thumbnail: Option<String>,
	pub status: Status,
	pub date_happened: Option<NaiveDate>,
	pub author: User,
	pub updaters: Vec<User>,
	pub tags_places: Vec<String>,
	pub tags_people: Vec<String>,
	pub time_create: DateTime<Utc>,
	pub time_update: DateTime<Utc>,
}

impl Taggable for Record {
	fn object_id(&self) -> i64 {
		self.id
	}

	fn tag_names(&self, namespace: TagNamespace) -> &[String] {
		match namespace {
			TagNamespace::Places => &self.tags_places,
			TagNamespace::People => &self.tags_people,
		}
	}
}

/// Record together with the thumbnail it had when it was loaded
///
/// The save path normalizes a thumbnail only when it differs from the
/// loaded one.
#[derive(Debug, Clone)]
pub struct TrackedRecord {
	pub record: Record,
	loaded_thumbnail: Option<String>,
}

impl TrackedRecord {
	pub fn new(record: Record) -> Self {
		let loaded_thumbnail = record.thumbnail.clone();
		Self {
			record,
			loaded_thumbnail,
		}
	}

	pub fn loaded_thumbnail(&self) -> Option<&str> {
		self.loaded_thumbnail.as_deref()
	}

	/// Whether a new, present thumbnail replaced the loaded one
	pub fn thumbnail_changed(&self) -> bool {
		self.record.thumbnail.is_some() && self.record.thumbnail != self.loaded_thumbnail
	}
}

/// Input of record creation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewRecord {
	pub title: String,
	/// Explicit slug; derived from the title when absent
	pub slug: Option<String>,
	pub short_description: String,
	pub full_description: String,
	pub thumbnail: Option<String>,
	pub status: Status,
	pub date_happened: Option<NaiveDate>,
	pub tags_places: Vec<String>,
	pub tags_people: Vec<String>,
}

/// Partial update of a record; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordChanges {
	pub title: Option<String>,
	pub slug: Option<String>,
	pub short_description: Option<String>,
	pub full_description: Option<String>,
	pub thumbnail: Option<Option<String>>,
	pub status: Option<Status>,
	pub date_happened: Option<Option<NaiveDate>>,
	pub tags_places: Option<Vec<String>>,
	pub tags_people: Option<Vec<String>>,
}

impl RecordChanges {
	/// Apply the changes to an in-memory record
	pub fn apply_to(&self, record: &mut Record) {
		if let Some(title) = &self.title {
			record.title = title.clone();
		}
		if let Some(slug) = &self.slug {
			record.slug = slug.clone();
		}
		if let Some(short) = &self.short_description {
			record.short_description = short.clone();
		}
		if let Some(full) = &self.full_description {
			record.full_description = full.clone();
		}
		if let Some(thumbnail) = &self.thumbnail {
			record.thumbnail = thumbnail.clone();
		}
		if let Some(status) = self.status {
			record.status = status;
		}
		if let Some(date) = self.date_happened {
			record.date_happened = date;
		}
		if let Some(places) = &self.tags_places {
			record.tags_places = places.clone();
		}
		if let Some(people) = &self.tags_people {
			record.tags_people = people.clone();
		}
	}
}

/// Comment tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
	pub id: i64,
	pub record_id: i64,
	pub author: User,
	pub parent_id: Option<i64>,
	pub content: String,
	pub status: Status,
	/// Distance from the root comment; roots have depth 0
	pub depth: i64,
	/// Pre-order position among the record's comments
	pub sort_key: String,
	pub time_create: DateTime<Utc>,
	pub time_update: DateTime<Utc>,
}

/// Input of comment creation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewComment {
	pub parent: Option<i64>,
	pub content: String,
}
