//! Table definitions
//!
//! [`create_schema`] is idempotent: every table and index is created with
//! `IF NOT EXISTS`, so it doubles as the `migrate` step of the manage binary.

use crate::error::Result;
use sea_query::{
	Alias, ColumnDef, ForeignKey, ForeignKeyAction, Index, IndexCreateStatement, SqliteQueryBuilder,
	Table, TableCreateStatement,
};
use sqlx::SqlitePool;

pub const USERS: &str = "users";
pub const RECORDS: &str = "app_records";
pub const RECORD_UPDATERS: &str = "app_records_updater";
pub const TAGS: &str = "tags";
pub const RECORD_TAGS: &str = "app_records_tags";
pub const COMMENTS: &str = "app_comments";

fn id_column() -> ColumnDef {
	ColumnDef::new(Alias::new("id"))
		.integer()
		.not_null()
		.auto_increment()
		.primary_key()
		.to_owned()
}

fn users_table() -> TableCreateStatement {
	Table::create()
		.table(Alias::new(USERS))
		.if_not_exists()
		.col(id_column())
		.col(
			ColumnDef::new(Alias::new("username"))
				.string_len(150)
				.not_null()
				.unique_key(),
		)
		.col(ColumnDef::new(Alias::new("date_joined")).text().not_null())
		.to_owned()
}

fn records_table() -> TableCreateStatement {
	Table::create()
		.table(Alias::new(RECORDS))
		.if_not_exists()
		.col(id_column())
		.col(ColumnDef::new(Alias::new("title")).string_len(255).not_null())
		.col(
			ColumnDef::new(Alias::new("slug"))
				.string_len(255)
				.not_null()
				.unique_key(),
		)
		.col(
			ColumnDef::new(Alias::new("short_description"))
				.string_len(500)
				.not_null(),
		)
		.col(ColumnDef::new(Alias::new("full_description")).text().not_null())
		.col(ColumnDef::new(Alias::new("thumbnail")).string_len(255).null())
		.col(ColumnDef::new(Alias::new("status")).string_len(10).not_null())
		.col(ColumnDef::new(Alias::new("time_create")).text().not_null())
		.col(ColumnDef::new(Alias::new("time_update")).text().not_null())
		.col(ColumnDef::new(Alias::new("date_happened")).text().null())
		.col(ColumnDef::new(Alias::new("author_id")).integer().not_null())
		.foreign_key(
			ForeignKey::create()
				.name("fk_app_records_author")
				.from(Alias::new(RECORDS), Alias::new("author_id"))
				.to(Alias::new(USERS), Alias::new("id"))
				.on_delete(ForeignKeyAction::Cascade),
		)
		.to_owned()
}

fn record_updaters_table() -> TableCreateStatement {
	Table::create()
		.table(Alias::new(RECORD_UPDATERS))
		.if_not_exists()
		.col(id_column())
		.col(ColumnDef::new(Alias::new("record_id")).integer().not_null())
		.col(ColumnDef::new(Alias::new("user_id")).integer().not_null())
		.foreign_key(
			ForeignKey::create()
				.name("fk_app_records_updater_record")
				.from(Alias::new(RECORD_UPDATERS), Alias::new("record_id"))
				.to(Alias::new(RECORDS), Alias::new("id"))
				.on_delete(ForeignKeyAction::Cascade),
		)
		.foreign_key(
			ForeignKey::create()
				.name("fk_app_records_updater_user")
				.from(Alias::new(RECORD_UPDATERS), Alias::new("user_id"))
				.to(Alias::new(USERS), Alias::new("id"))
				.on_delete(ForeignKeyAction::Cascade),
		)
		.to_owned()
}

fn tags_table() -> TableCreateStatement {
	Table::create()
		.table(Alias::new(TAGS))
		.if_not_exists()
		.col(id_column())
		.col(ColumnDef::new(Alias::new("namespace")).string_len(16).not_null())
		.col(ColumnDef::new(Alias::new("name")).string_len(100).not_null())
		.col(ColumnDef::new(Alias::new("slug")).string_len(100).not_null())
		.col(ColumnDef::new(Alias::new("created_at")).text().not_null())
		.to_owned()
}

fn record_tags_table() -> TableCreateStatement {
	Table::create()
		.table(Alias::new(RECORD_TAGS))
		.if_not_exists()
		.col(id_column())
		.col(ColumnDef::new(Alias::new("record_id")).integer().not_null())
		.col(ColumnDef::new(Alias::new("tag_id")).integer().not_null())
		.foreign_key(
			ForeignKey::create()
				.name("fk_app_records_tags_record")
				.from(Alias::new(RECORD_TAGS), Alias::new("record_id"))
				.to(Alias::new(RECORDS), Alias::new("id"))
				.on_delete(ForeignKeyAction::Cascade),
		)
		.foreign_key(
			ForeignKey::create()
				.name("fk_app_records_tags_tag")
				.from(Alias::new(RECORD_TAGS), Alias::new("tag_id"))
				.to(Alias::new(TAGS), Alias::new("id"))
				.on_delete(ForeignKeyAction::Cascade),
		)
		.to_owned()
}

fn comments_table() -> TableCreateStatement {
	Table::create()
		.table(Alias::new(COMMENTS))
		.if_not_exists()
		.col(id_column())
		.col(ColumnDef::new(Alias::new("record_id")).integer().not_null())
		.col(ColumnDef::new(Alias::new("author_id")).integer().not_null())
		.col(ColumnDef::new(Alias::new("parent_id")).integer().null())
		.col(ColumnDef::new(Alias::new("content")).text().not_null())
		.col(ColumnDef::new(Alias::new("status")).string_len(10).not_null())
		.col(ColumnDef::new(Alias::new("time_create")).text().not_null())
		.col(ColumnDef::new(Alias::new("time_update")).text().not_null())
		.col(ColumnDef::new(Alias::new("depth")).integer().not_null())
		.col(ColumnDef::new(Alias::new("sort_key")).text().not_null())
		.foreign_key(
			ForeignKey::create()
				.name("fk_app_comments_record")
				.from(Alias::new(COMMENTS), Alias::new("record_id"))
				.to(Alias::new(RECORDS), Alias::new("id"))
				.on_delete(ForeignKeyAction::Cascade),
		)
		.foreign_key(
			ForeignKey::create()
				.name("fk_app_comments_author")
				.from(Alias::new(COMMENTS), Alias::new("author_id"))
				.to(Alias::new(USERS), Alias::new("id"))
				.on_delete(ForeignKeyAction::Cascade),
		)
		.foreign_key(
			ForeignKey::create()
				.name("fk_app_comments_parent")
				.from(Alias::new(COMMENTS), Alias::new("parent_id"))
				.to(Alias::new(COMMENTS), Alias::new("id"))
				.on_delete(ForeignKeyAction::Cascade),
		)
		.to_owned()
}

fn indexes() -> Vec<IndexCreateStatement> {
	vec![
		Index::create()
			.if_not_exists()
			.unique()
			.name("idx_tags_namespace_name")
			.table(Alias::new(TAGS))
			.col(Alias::new("namespace"))
			.col(Alias::new("name"))
			.to_owned(),
		Index::create()
			.if_not_exists()
			.unique()
			.name("idx_app_records_tags_pair")
			.table(Alias::new(RECORD_TAGS))
			.col(Alias::new("record_id"))
			.col(Alias::new("tag_id"))
			.to_owned(),
		Index::create()
			.if_not_exists()
			.unique()
			.name("idx_app_records_updater_pair")
			.table(Alias::new(RECORD_UPDATERS))
			.col(Alias::new("record_id"))
			.col(Alias::new("user_id"))
			.to_owned(),
		Index::create()
			.if_not_exists()
			.name("idx_app_records_time_create")
			.table(Alias::new(RECORDS))
			.col(Alias::new("time_create"))
			.to_owned(),
		Index::create()
			.if_not_exists()
			.name("idx_app_records_status")
			.table(Alias::new(RECORDS))
			.col(Alias::new("status"))
			.to_owned(),
		Index::create()
			.if_not_exists()
			.name("idx_app_records_date_happened")
			.table(Alias::new(RECORDS))
			.col(Alias::new("date_happened"))
			.to_owned(),
		Index::create()
			.if_not_exists()
			.name("idx_app_comments_record_sort")
			.table(Alias::new(COMMENTS))
			.col(Alias::new("record_id"))
			.col(Alias::new("sort_key"))
			.to_owned(),
	]
}

/// Create every table and index used by chronicle
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
	let tables = [
		users_table(),
		records_table(),
		record_updaters_table(),
		tags_table(),
		record_tags_table(),
		comments_table(),
	];

	let mut tx = pool.begin().await?;
	for table in &tables {
		let sql = table.to_string(SqliteQueryBuilder);
		sqlx::query(&sql).execute(&mut *tx).await?;
	}
	for index in indexes() {
		let sql = index.to_string(SqliteQueryBuilder);
		sqlx::query(&sql).execute(&mut *tx).await?;
	}
	tx.commit().await?;

	tracing::info!(tables = tables.len(), "schema ready");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pool::connect_in_memory;
	use sqlx::Row;

	#[tokio::test]
	async fn test_create_schema_is_idempotent() {
		// Arrange
		let pool = connect_in_memory().await.unwrap();

		// Act
		create_schema(&pool).await.unwrap();
		create_schema(&pool).await.unwrap();

		// Assert
		let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
			.fetch_all(&pool)
			.await
			.unwrap();
		let names: Vec<String> = rows.iter().map(|r| r.get::<String, _>("name")).collect();
		for table in [USERS, RECORDS, RECORD_UPDATERS, TAGS, RECORD_TAGS, COMMENTS] {
			assert!(names.iter().any(|n| n == table), "missing table {}", table);
		}
	}
}
