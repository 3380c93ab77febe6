//! Tag storage and record/tag links

use crate::codec;
use crate::error::{DbError, Result};
use crate::schema::{RECORD_TAGS, TAGS};
use chronicle_taggit::{Tag, TagNamespace, normalize_tag_name};
use sea_query::{Alias, Expr, ExprTrait, JoinType, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashMap;

/// Tag names of one record, split by namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTags {
	pub places: Vec<String>,
	pub people: Vec<String>,
}

/// Return the id of the tag, storing it when it does not exist yet
pub(crate) async fn ensure_tag(
	conn: &mut SqliteConnection,
	namespace: TagNamespace,
	name: &str,
) -> Result<i64> {
	let tag = Tag::from_name(namespace, name)?;

	let select = Query::select()
		.column(Alias::new("id"))
		.from(Alias::new(TAGS))
		.and_where(Expr::col(Alias::new("namespace")).eq(namespace.as_str()))
		.and_where(Expr::col(Alias::new("name")).eq(tag.name.as_str()))
		.to_owned();
	let sql = select.to_string(SqliteQueryBuilder);
	if let Some(row) = sqlx::query(&sql).fetch_optional(&mut *conn).await? {
		return Ok(row.try_get("id")?);
	}

	let insert = Query::insert()
		.into_table(Alias::new(TAGS))
		.columns([
			Alias::new("namespace"),
			Alias::new("name"),
			Alias::new("slug"),
			Alias::new("created_at"),
		])
		.values([
			Expr::val(namespace.as_str()),
			Expr::val(tag.name.as_str()),
			Expr::val(tag.slug.as_str()),
			Expr::val(codec::encode_timestamp(tag.created_at)),
		])
		.map_err(|e| DbError::Query(e.to_string()))?
		.to_owned();
	let sql = insert.to_string(SqliteQueryBuilder);
	let result = sqlx::query(&sql)
		.execute(&mut *conn)
		.await
		.map_err(|e| DbError::from_write(e, format!("tag '{}'", tag.name)))?;

	tracing::debug!(namespace = %namespace, name = %tag.name, "created tag");
	Ok(result.last_insert_rowid())
}

/// Replace the record's tags in one namespace with `names`
///
/// Blank names are skipped and the rest normalized and deduplicated. Tags
/// of the other namespace are left alone.
pub(crate) async fn replace_record_tags(
	conn: &mut SqliteConnection,
	record_id: i64,
	namespace: TagNamespace,
	names: &[String],
) -> Result<Vec<String>> {
	let mut names = names
		.iter()
		.filter(|name| !name.trim().is_empty())
		.map(|name| normalize_tag_name(name))
		.collect::<std::result::Result<Vec<_>, _>>()?;
	names.sort();
	names.dedup();

	let in_namespace = Query::select()
		.column(Alias::new("id"))
		.from(Alias::new(TAGS))
		.and_where(Expr::col(Alias::new("namespace")).eq(namespace.as_str()))
		.to_owned();
	let delete = Query::delete()
		.from_table(Alias::new(RECORD_TAGS))
		.and_where(Expr::col(Alias::new("record_id")).eq(record_id))
		.and_where(Expr::col(Alias::new("tag_id")).in_subquery(in_namespace))
		.to_owned();
	let sql = delete.to_string(SqliteQueryBuilder);
	sqlx::query(&sql).execute(&mut *conn).await?;

	for name in &names {
		let tag_id = ensure_tag(conn, namespace, name).await?;
		let link = Query::insert()
			.into_table(Alias::new(RECORD_TAGS))
			.columns([Alias::new("record_id"), Alias::new("tag_id")])
			.values([Expr::val(record_id), Expr::val(tag_id)])
			.map_err(|e| DbError::Query(e.to_string()))?
			.to_owned();
		let sql = link.to_string(SqliteQueryBuilder);
		sqlx::query(&sql).execute(&mut *conn).await?;
	}

	Ok(names)
}

/// Load the tags of every record in `record_ids`
pub async fn tags_for_records(
	pool: &SqlitePool,
	record_ids: &[i64],
) -> Result<HashMap<i64, RecordTags>> {
	let mut by_record: HashMap<i64, RecordTags> = HashMap::new();
	if record_ids.is_empty() {
		return Ok(by_record);
	}

	let stmt = Query::select()
		.column((Alias::new(RECORD_TAGS), Alias::new("record_id")))
		.column((Alias::new(TAGS), Alias::new("namespace")))
		.column((Alias::new(TAGS), Alias::new("name")))
		.from(Alias::new(RECORD_TAGS))
		.join(
			JoinType::InnerJoin,
			Alias::new(TAGS),
			Expr::col((Alias::new(TAGS), Alias::new("id")))
				.equals((Alias::new(RECORD_TAGS), Alias::new("tag_id"))),
		)
		.and_where(
			Expr::col((Alias::new(RECORD_TAGS), Alias::new("record_id")))
				.is_in(record_ids.iter().copied()),
		)
		.order_by((Alias::new(TAGS), Alias::new("name")), Order::Asc)
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);

	for row in sqlx::query(&sql).fetch_all(pool).await? {
		let record_id: i64 = row.try_get("record_id")?;
		let namespace: String = row.try_get("namespace")?;
		let name: String = row.try_get("name")?;
		let namespace: TagNamespace = namespace
			.parse()
			.map_err(|_| DbError::CorruptRow(format!("tag namespace '{}'", namespace)))?;

		let entry = by_record.entry(record_id).or_default();
		match namespace {
			TagNamespace::Places => entry.places.push(name),
			TagNamespace::People => entry.people.push(name),
		}
	}

	Ok(by_record)
}

/// Names of all stored tags in `namespace`, alphabetically
pub async fn tag_names(pool: &SqlitePool, namespace: TagNamespace) -> Result<Vec<String>> {
	let stmt = Query::select()
		.column(Alias::new("name"))
		.from(Alias::new(TAGS))
		.and_where(Expr::col(Alias::new("namespace")).eq(namespace.as_str()))
		.order_by(Alias::new("name"), Order::Asc)
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);

	let rows = sqlx::query(&sql).fetch_all(pool).await?;
	rows.iter()
		.map(|row| row.try_get::<String, _>("name").map_err(DbError::from))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pool::connect_in_memory;
	use crate::schema::create_schema;

	#[tokio::test]
	async fn test_ensure_tag_is_per_namespace() {
		// Arrange
		let pool = connect_in_memory().await.unwrap();
		create_schema(&pool).await.unwrap();
		let mut conn = pool.acquire().await.unwrap();

		// Act
		let person = ensure_tag(&mut conn, TagNamespace::People, "Paris").await.unwrap();
		let again = ensure_tag(&mut conn, TagNamespace::People, " Paris ").await.unwrap();
		let place = ensure_tag(&mut conn, TagNamespace::Places, "Paris").await.unwrap();
		drop(conn);

		// Assert
		assert_eq!(person, again);
		assert_ne!(person, place);
		assert_eq!(tag_names(&pool, TagNamespace::People).await.unwrap(), vec!["Paris"]);
		assert_eq!(tag_names(&pool, TagNamespace::Places).await.unwrap(), vec!["Paris"]);
	}
}
