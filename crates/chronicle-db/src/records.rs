//! Record persistence
//!
//! Records are created and updated inside a transaction together with their
//! tag links and updater set. Reads go through [`load_records`], which
//! attaches authors, tags and updaters to the selected rows.

use crate::codec;
use crate::error::{DbError, Result};
use crate::models::{
	MAX_SHORT_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, NewRecord, Record, RecordChanges, Status, User,
};
use crate::schema::{RECORD_UPDATERS, RECORDS, USERS};
use crate::slug::{assign_slug, validate_slug};
use crate::tags::{replace_record_tags, tags_for_records};
use crate::users::user_from_row;
use chronicle_taggit::TagNamespace;
use sea_query::{
	Alias, Expr, ExprTrait, JoinType, Order, Query, SelectStatement, SqliteQueryBuilder,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashMap;

const RECORD_COLUMNS: [&str; 11] = [
	"id",
	"title",
	"slug",
	"short_description",
	"full_description",
	"thumbnail",
	"status",
	"time_create",
	"time_update",
	"date_happened",
	"author_id",
];

/// SELECT of record columns joined with the author's username
///
/// Callers add their own conditions and ordering.
pub(crate) fn record_select() -> SelectStatement {
	let mut stmt = Query::select();
	for column in RECORD_COLUMNS {
		stmt.column((Alias::new(RECORDS), Alias::new(column)));
	}
	stmt.expr_as(
		Expr::col((Alias::new(USERS), Alias::new("username"))),
		Alias::new("author_username"),
	)
	.from(Alias::new(RECORDS))
	.join(
		JoinType::InnerJoin,
		Alias::new(USERS),
		Expr::col((Alias::new(USERS), Alias::new("id")))
			.equals((Alias::new(RECORDS), Alias::new("author_id"))),
	)
	.to_owned()
}

fn record_from_row(row: &SqliteRow) -> Result<Record> {
	let status: String = row.try_get("status")?;
	let time_create: String = row.try_get("time_create")?;
	let time_update: String = row.try_get("time_update")?;
	let date_happened: Option<String> = row.try_get("date_happened")?;

	Ok(Record {
		id: row.try_get("id")?,
		title: row.try_get("title")?,
		slug: row.try_get("slug")?,
		short_description: row.try_get("short_description")?,
		full_description: row.try_get("full_description")?,
		thumbnail: row.try_get("thumbnail")?,
		status: status
			.parse()
			.map_err(|_| DbError::CorruptRow(format!("record status '{}'", status)))?,
		date_happened: date_happened.as_deref().map(codec::decode_date).transpose()?,
		author: user_from_row(row, "author_id", "author_username")?,
		updaters: Vec::new(),
		tags_places: Vec::new(),
		tags_people: Vec::new(),
		time_create: codec::decode_timestamp(&time_create)?,
		time_update: codec::decode_timestamp(&time_update)?,
	})
}

async fn updaters_for_records(
	pool: &SqlitePool,
	record_ids: &[i64],
) -> Result<HashMap<i64, Vec<User>>> {
	let mut by_record: HashMap<i64, Vec<User>> = HashMap::new();
	if record_ids.is_empty() {
		return Ok(by_record);
	}

	let stmt = Query::select()
		.column((Alias::new(RECORD_UPDATERS), Alias::new("record_id")))
		.column((Alias::new(USERS), Alias::new("id")))
		.column((Alias::new(USERS), Alias::new("username")))
		.from(Alias::new(RECORD_UPDATERS))
		.join(
			JoinType::InnerJoin,
			Alias::new(USERS),
			Expr::col((Alias::new(USERS), Alias::new("id")))
				.equals((Alias::new(RECORD_UPDATERS), Alias::new("user_id"))),
		)
		.and_where(
			Expr::col((Alias::new(RECORD_UPDATERS), Alias::new("record_id")))
				.is_in(record_ids.iter().copied()),
		)
		.order_by((Alias::new(RECORD_UPDATERS), Alias::new("id")), Order::Asc)
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);

	for row in sqlx::query(&sql).fetch_all(pool).await? {
		let record_id: i64 = row.try_get("record_id")?;
		by_record
			.entry(record_id)
			.or_default()
			.push(user_from_row(&row, "id", "username")?);
	}
	Ok(by_record)
}

/// Run a rendered record SELECT and attach tags and updaters to every row
pub(crate) async fn load_records(pool: &SqlitePool, sql: &str) -> Result<Vec<Record>> {
	let rows = sqlx::query(sql).fetch_all(pool).await?;
	let mut records = rows.iter().map(record_from_row).collect::<Result<Vec<_>>>()?;

	let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
	let mut tags = tags_for_records(pool, &ids).await?;
	let mut updaters = updaters_for_records(pool, &ids).await?;
	for record in &mut records {
		if let Some(tags) = tags.remove(&record.id) {
			record.tags_places = tags.places;
			record.tags_people = tags.people;
		}
		record.updaters = updaters.remove(&record.id).unwrap_or_default();
	}
	Ok(records)
}

async fn load_one(pool: &SqlitePool, sql: String, what: String) -> Result<Record> {
	load_records(pool, &sql)
		.await?
		.into_iter()
		.next()
		.ok_or(DbError::NotFound(what))
}

fn validate_title(title: &str) -> Result<()> {
	if title.trim().is_empty() {
		return Err(DbError::Validation("title must not be empty".to_string()));
	}
	if title.chars().count() > MAX_TITLE_LENGTH {
		return Err(DbError::Validation(format!(
			"title exceeds {} characters",
			MAX_TITLE_LENGTH
		)));
	}
	Ok(())
}

fn validate_short_description(text: &str) -> Result<()> {
	if text.chars().count() > MAX_SHORT_DESCRIPTION_LENGTH {
		return Err(DbError::Validation(format!(
			"short description exceeds {} characters",
			MAX_SHORT_DESCRIPTION_LENGTH
		)));
	}
	Ok(())
}

async fn add_updater(conn: &mut SqliteConnection, record_id: i64, user: &User) -> Result<()> {
	let existing = Query::select()
		.expr(Expr::value(1))
		.from(Alias::new(RECORD_UPDATERS))
		.and_where(Expr::col(Alias::new("record_id")).eq(record_id))
		.and_where(Expr::col(Alias::new("user_id")).eq(user.id))
		.to_owned();
	let sql = existing.to_string(SqliteQueryBuilder);
	if sqlx::query(&sql).fetch_optional(&mut *conn).await?.is_some() {
		return Ok(());
	}

	let insert = Query::insert()
		.into_table(Alias::new(RECORD_UPDATERS))
		.columns([Alias::new("record_id"), Alias::new("user_id")])
		.values([Expr::val(record_id), Expr::val(user.id)])
		.map_err(|e| DbError::Query(e.to_string()))?
		.to_owned();
	let sql = insert.to_string(SqliteQueryBuilder);
	sqlx::query(&sql).execute(&mut *conn).await?;
	Ok(())
}

/// Store a new record authored by `author`
///
/// Without an explicit slug one is derived from the title. Tags are created
/// on demand in their namespace.
pub async fn create_record(pool: &SqlitePool, author: &User, new: NewRecord) -> Result<Record> {
	validate_title(&new.title)?;
	validate_short_description(&new.short_description)?;
	let explicit_slug = new.slug.as_deref().filter(|s| !s.is_empty());
	if let Some(slug) = explicit_slug {
		validate_slug(slug)?;
	}

	let mut tx = pool.begin().await?;
	let slug = match explicit_slug {
		Some(slug) => slug.to_string(),
		None => assign_slug(&mut tx, &new.title).await?,
	};

	let now = codec::encode_timestamp(codec::now());
	let stmt = Query::insert()
		.into_table(Alias::new(RECORDS))
		.columns([
			Alias::new("title"),
			Alias::new("slug"),
			Alias::new("short_description"),
			Alias::new("full_description"),
			Alias::new("thumbnail"),
			Alias::new("status"),
			Alias::new("time_create"),
			Alias::new("time_update"),
			Alias::new("date_happened"),
			Alias::new("author_id"),
		])
		.values([
			Expr::val(new.title.trim()),
			Expr::val(slug.as_str()),
			Expr::val(new.short_description.as_str()),
			Expr::val(new.full_description.as_str()),
			Expr::val(new.thumbnail.clone()),
			Expr::val(new.status.as_str()),
			Expr::val(now.as_str()),
			Expr::val(now.as_str()),
			Expr::val(new.date_happened.map(codec::encode_date)),
			Expr::val(author.id),
		])
		.map_err(|e| DbError::Query(e.to_string()))?
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);
	let result = sqlx::query(&sql)
		.execute(&mut *tx)
		.await
		.map_err(|e| DbError::from_write(e, format!("slug '{}'", slug)))?;
	let id = result.last_insert_rowid();

	replace_record_tags(&mut tx, id, TagNamespace::Places, &new.tags_places).await?;
	replace_record_tags(&mut tx, id, TagNamespace::People, &new.tags_people).await?;
	tx.commit().await?;

	tracing::info!(id, slug = %slug, author = %author.username, "created record");
	get_by_id(pool, id).await
}

/// Record with `id`, any status
pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Record> {
	let sql = record_select()
		.and_where(Expr::col((Alias::new(RECORDS), Alias::new("id"))).eq(id))
		.to_string(SqliteQueryBuilder);
	load_one(pool, sql, format!("record {}", id)).await
}

/// Record with `slug`, any status
pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Result<Record> {
	let sql = record_select()
		.and_where(Expr::col((Alias::new(RECORDS), Alias::new("slug"))).eq(slug))
		.to_string(SqliteQueryBuilder);
	load_one(pool, sql, format!("record '{}'", slug)).await
}

/// Published record with `slug`; drafts are reported as not found
pub async fn get_published_by_slug(pool: &SqlitePool, slug: &str) -> Result<Record> {
	let sql = record_select()
		.and_where(Expr::col((Alias::new(RECORDS), Alias::new("slug"))).eq(slug))
		.and_where(
			Expr::col((Alias::new(RECORDS), Alias::new("status"))).eq(Status::Published.as_str()),
		)
		.to_string(SqliteQueryBuilder);
	load_one(pool, sql, format!("record '{}'", slug)).await
}

/// Apply `changes` to the record with `slug` on behalf of `updater`
///
/// The updater joins the record's updater set once, however many times
/// they edit it.
pub async fn update_record(
	pool: &SqlitePool,
	updater: &User,
	slug: &str,
	changes: RecordChanges,
) -> Result<Record> {
	let current = get_by_slug(pool, slug).await?;

	if let Some(title) = &changes.title {
		validate_title(title)?;
	}
	if let Some(short) = &changes.short_description {
		validate_short_description(short)?;
	}
	if let Some(new_slug) = &changes.slug {
		validate_slug(new_slug)?;
	}

	let mut stmt = Query::update();
	stmt.table(Alias::new(RECORDS))
		.value(
			Alias::new("time_update"),
			codec::encode_timestamp(codec::now()),
		)
		.and_where(Expr::col(Alias::new("id")).eq(current.id));
	if let Some(title) = &changes.title {
		stmt.value(Alias::new("title"), title.trim());
	}
	if let Some(new_slug) = &changes.slug {
		stmt.value(Alias::new("slug"), new_slug.as_str());
	}
	if let Some(short) = &changes.short_description {
		stmt.value(Alias::new("short_description"), short.as_str());
	}
	if let Some(full) = &changes.full_description {
		stmt.value(Alias::new("full_description"), full.as_str());
	}
	if let Some(thumbnail) = &changes.thumbnail {
		stmt.value(Alias::new("thumbnail"), thumbnail.clone());
	}
	if let Some(status) = changes.status {
		stmt.value(Alias::new("status"), status.as_str());
	}
	if let Some(date) = changes.date_happened {
		stmt.value(Alias::new("date_happened"), date.map(codec::encode_date));
	}
	let sql = stmt.to_string(SqliteQueryBuilder);

	let mut tx = pool.begin().await?;
	sqlx::query(&sql).execute(&mut *tx).await.map_err(|e| {
		DbError::from_write(
			e,
			format!("slug '{}'", changes.slug.as_deref().unwrap_or(slug)),
		)
	})?;
	if let Some(places) = &changes.tags_places {
		replace_record_tags(&mut tx, current.id, TagNamespace::Places, places).await?;
	}
	if let Some(people) = &changes.tags_people {
		replace_record_tags(&mut tx, current.id, TagNamespace::People, people).await?;
	}
	add_updater(&mut tx, current.id, updater).await?;
	tx.commit().await?;

	tracing::info!(id = current.id, updater = %updater.username, "updated record");
	get_by_id(pool, current.id).await
}

/// Point the record's thumbnail at `path`, or clear it
pub async fn set_thumbnail(pool: &SqlitePool, id: i64, path: Option<&str>) -> Result<()> {
	let stmt = Query::update()
		.table(Alias::new(RECORDS))
		.value(Alias::new("thumbnail"), path.map(str::to_string))
		.and_where(Expr::col(Alias::new("id")).eq(id))
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);

	let result = sqlx::query(&sql).execute(pool).await?;
	if result.rows_affected() == 0 {
		return Err(DbError::NotFound(format!("record {}", id)));
	}
	Ok(())
}
