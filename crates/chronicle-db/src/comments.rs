//! Threaded comments
//!
//! Comments form a tree per record through `parent_id`. Display order is
//! materialized when a comment is written: its `sort_key` is the parent's
//! key followed by a fixed-width segment of its own. The segment inverts
//! the creation time and the id, so sorting keys as text walks the tree in
//! pre-order with the newest sibling first.

use crate::codec;
use crate::error::{DbError, Result};
use crate::models::{Comment, MAX_COMMENT_LENGTH, NewComment, Status, User};
use crate::schema::{COMMENTS, RECORDS, USERS};
use crate::users::user_from_row;
use chrono::{DateTime, Utc};
use sea_query::{Alias, Expr, ExprTrait, JoinType, Order, Query, SelectStatement, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Width of one sort key segment
pub const SEGMENT_WIDTH: usize = 38;

/// Sort key segment of a comment created at `time_create` with `id`
pub fn sort_segment(time_create: DateTime<Utc>, id: i64) -> String {
	format!(
		"{:019}{:019}",
		i64::MAX - time_create.timestamp_micros(),
		i64::MAX - id
	)
}

const COMMENT_COLUMNS: [&str; 10] = [
	"id",
	"record_id",
	"author_id",
	"parent_id",
	"content",
	"status",
	"time_create",
	"time_update",
	"depth",
	"sort_key",
];

fn comment_select() -> SelectStatement {
	let mut stmt = Query::select();
	for column in COMMENT_COLUMNS {
		stmt.column((Alias::new(COMMENTS), Alias::new(column)));
	}
	stmt.expr_as(
		Expr::col((Alias::new(USERS), Alias::new("username"))),
		Alias::new("author_username"),
	)
	.from(Alias::new(COMMENTS))
	.join(
		JoinType::InnerJoin,
		Alias::new(USERS),
		Expr::col((Alias::new(USERS), Alias::new("id")))
			.equals((Alias::new(COMMENTS), Alias::new("author_id"))),
	)
	.to_owned()
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
	let status: String = row.try_get("status")?;
	let time_create: String = row.try_get("time_create")?;
	let time_update: String = row.try_get("time_update")?;

	Ok(Comment {
		id: row.try_get("id")?,
		record_id: row.try_get("record_id")?,
		author: user_from_row(row, "author_id", "author_username")?,
		parent_id: row.try_get("parent_id")?,
		content: row.try_get("content")?,
		status: status
			.parse()
			.map_err(|_| DbError::CorruptRow(format!("comment status '{}'", status)))?,
		depth: row.try_get("depth")?,
		sort_key: row.try_get("sort_key")?,
		time_create: codec::decode_timestamp(&time_create)?,
		time_update: codec::decode_timestamp(&time_update)?,
	})
}

/// Trim comment text and check its length
pub fn validate_content(content: &str) -> Result<String> {
	let content = content.trim();
	if content.is_empty() {
		return Err(DbError::Validation("comment must not be empty".to_string()));
	}
	if content.chars().count() > MAX_COMMENT_LENGTH {
		return Err(DbError::Validation(format!(
			"comment exceeds {} characters",
			MAX_COMMENT_LENGTH
		)));
	}
	Ok(content.to_string())
}

/// Add a comment by `author` to the published record `record_id`
pub async fn create_comment(
	pool: &SqlitePool,
	record_id: i64,
	author: &User,
	new: NewComment,
) -> Result<Comment> {
	let content = validate_content(&new.content)?;

	let mut tx = pool.begin().await?;

	let record = Query::select()
		.column(Alias::new("status"))
		.from(Alias::new(RECORDS))
		.and_where(Expr::col(Alias::new("id")).eq(record_id))
		.to_owned();
	let sql = record.to_string(SqliteQueryBuilder);
	let status: Option<String> = sqlx::query(&sql)
		.fetch_optional(&mut *tx)
		.await?
		.map(|row| row.try_get("status"))
		.transpose()?;
	if status.as_deref() != Some(Status::Published.as_str()) {
		return Err(DbError::NotFound(format!("record {}", record_id)));
	}

	let (depth, parent_key) = match new.parent {
		Some(parent_id) => {
			let parent = Query::select()
				.columns([
					Alias::new("record_id"),
					Alias::new("depth"),
					Alias::new("sort_key"),
				])
				.from(Alias::new(COMMENTS))
				.and_where(Expr::col(Alias::new("id")).eq(parent_id))
				.to_owned();
			let sql = parent.to_string(SqliteQueryBuilder);
			let row = sqlx::query(&sql)
				.fetch_optional(&mut *tx)
				.await?
				.ok_or_else(|| DbError::NotFound(format!("parent comment {}", parent_id)))?;
			let parent_record: i64 = row.try_get("record_id")?;
			if parent_record != record_id {
				return Err(DbError::Validation(format!(
					"parent comment {} belongs to another record",
					parent_id
				)));
			}
			let depth: i64 = row.try_get("depth")?;
			let sort_key: String = row.try_get("sort_key")?;
			(depth + 1, sort_key)
		}
		None => (0, String::new()),
	};

	let now = codec::now();
	let stamp = codec::encode_timestamp(now);
	let insert = Query::insert()
		.into_table(Alias::new(COMMENTS))
		.columns([
			Alias::new("record_id"),
			Alias::new("author_id"),
			Alias::new("parent_id"),
			Alias::new("content"),
			Alias::new("status"),
			Alias::new("time_create"),
			Alias::new("time_update"),
			Alias::new("depth"),
			Alias::new("sort_key"),
		])
		.values([
			Expr::val(record_id),
			Expr::val(author.id),
			Expr::val(new.parent),
			Expr::val(content.as_str()),
			Expr::val(Status::Published.as_str()),
			Expr::val(stamp.as_str()),
			Expr::val(stamp.as_str()),
			Expr::val(depth),
			Expr::val(""),
		])
		.map_err(|e| DbError::Query(e.to_string()))?
		.to_owned();
	let sql = insert.to_string(SqliteQueryBuilder);
	let id = sqlx::query(&sql).execute(&mut *tx).await?.last_insert_rowid();

	let sort_key = format!("{}{}", parent_key, sort_segment(now, id));
	let update = Query::update()
		.table(Alias::new(COMMENTS))
		.value(Alias::new("sort_key"), sort_key.as_str())
		.and_where(Expr::col(Alias::new("id")).eq(id))
		.to_owned();
	let sql = update.to_string(SqliteQueryBuilder);
	sqlx::query(&sql).execute(&mut *tx).await?;
	tx.commit().await?;

	tracing::info!(id, record_id, depth, author = %author.username, "created comment");
	Ok(Comment {
		id,
		record_id,
		author: author.clone(),
		parent_id: new.parent,
		content,
		status: Status::Published,
		depth,
		sort_key,
		time_create: now,
		time_update: now,
	})
}

/// Published comments of a record in display order
pub async fn list_for_record(pool: &SqlitePool, record_id: i64) -> Result<Vec<Comment>> {
	let stmt = comment_select()
		.and_where(Expr::col((Alias::new(COMMENTS), Alias::new("record_id"))).eq(record_id))
		.and_where(
			Expr::col((Alias::new(COMMENTS), Alias::new("status"))).eq(Status::Published.as_str()),
		)
		.order_by((Alias::new(COMMENTS), Alias::new("sort_key")), Order::Asc)
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);

	let rows = sqlx::query(&sql).fetch_all(pool).await?;
	rows.iter().map(comment_from_row).collect()
}

/// Comment with `id`, any status
pub async fn get_comment(pool: &SqlitePool, id: i64) -> Result<Comment> {
	let stmt = comment_select()
		.and_where(Expr::col((Alias::new(COMMENTS), Alias::new("id"))).eq(id))
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);

	let row = sqlx::query(&sql)
		.fetch_optional(pool)
		.await?
		.ok_or_else(|| DbError::NotFound(format!("comment {}", id)))?;
	comment_from_row(&row)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use rstest::rstest;

	#[test]
	fn test_newer_segment_sorts_first() {
		// Arrange
		let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let newer = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

		// Act
		let a = sort_segment(older, 1);
		let b = sort_segment(newer, 2);

		// Assert
		assert_eq!(a.len(), SEGMENT_WIDTH);
		assert_eq!(b.len(), SEGMENT_WIDTH);
		assert!(b < a);
	}

	#[test]
	fn test_same_instant_breaks_tie_by_id() {
		let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		assert!(sort_segment(at, 9) < sort_segment(at, 8));
	}

	#[rstest]
	#[case("", false)]
	#[case("   ", false)]
	#[case(" hello ", true)]
	fn test_validate_content(#[case] content: &str, #[case] ok: bool) {
		assert_eq!(validate_content(content).is_ok(), ok);
	}

	#[test]
	fn test_content_length_limit() {
		assert!(validate_content(&"x".repeat(MAX_COMMENT_LENGTH)).is_ok());
		assert!(validate_content(&"x".repeat(MAX_COMMENT_LENGTH + 1)).is_err());
	}
}
