//! Users known to chronicle
//!
//! Identities come from the fronting proxy; a user row is created the first
//! time an identity is seen.

use crate::codec;
use crate::error::{DbError, Result};
use crate::models::User;
use crate::schema::USERS;
use sea_query::{Alias, Expr, ExprTrait, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub const MAX_USERNAME_LENGTH: usize = 150;

pub(crate) fn user_from_row(row: &SqliteRow, id_column: &str, name_column: &str) -> Result<User> {
	Ok(User {
		id: row.try_get(id_column)?,
		username: row.try_get(name_column)?,
	})
}

/// Look a user up by username
pub async fn find_user(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
	let stmt = Query::select()
		.columns([Alias::new("id"), Alias::new("username")])
		.from(Alias::new(USERS))
		.and_where(Expr::col(Alias::new("username")).eq(username))
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);

	let row = sqlx::query(&sql).fetch_optional(pool).await?;
	row.map(|row| user_from_row(&row, "id", "username")).transpose()
}

/// Return the user with `username`, creating it on first sight
pub async fn get_or_create_user(pool: &SqlitePool, username: &str) -> Result<User> {
	let username = username.trim();
	if username.is_empty() {
		return Err(DbError::Validation("username must not be empty".to_string()));
	}
	if username.chars().count() > MAX_USERNAME_LENGTH {
		return Err(DbError::Validation(format!(
			"username exceeds {} characters",
			MAX_USERNAME_LENGTH
		)));
	}

	if let Some(user) = find_user(pool, username).await? {
		return Ok(user);
	}

	let stmt = Query::insert()
		.into_table(Alias::new(USERS))
		.columns([Alias::new("username"), Alias::new("date_joined")])
		.values([
			Expr::val(username),
			Expr::val(codec::encode_timestamp(codec::now())),
		])
		.map_err(|e| DbError::Query(e.to_string()))?
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);

	match sqlx::query(&sql).execute(pool).await {
		Ok(result) => {
			tracing::info!(username, "registered user");
			Ok(User {
				id: result.last_insert_rowid(),
				username: username.to_string(),
			})
		}
		// Another request registered the same identity first
		Err(e) => match DbError::from_write(e, format!("user '{}'", username)) {
			DbError::Conflict(_) => find_user(pool, username)
				.await?
				.ok_or_else(|| DbError::NotFound(format!("user '{}'", username))),
			other => Err(other),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pool::connect_in_memory;
	use crate::schema::create_schema;
	use rstest::rstest;

	#[tokio::test]
	async fn test_get_or_create_is_stable() {
		// Arrange
		let pool = connect_in_memory().await.unwrap();
		create_schema(&pool).await.unwrap();

		// Act
		let first = get_or_create_user(&pool, "ann").await.unwrap();
		let second = get_or_create_user(&pool, " ann ").await.unwrap();

		// Assert
		assert_eq!(first, second);
		assert_eq!(first.username, "ann");
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	#[tokio::test]
	async fn test_blank_username_rejected(#[case] username: &str) {
		let pool = connect_in_memory().await.unwrap();
		create_schema(&pool).await.unwrap();

		let result = get_or_create_user(&pool, username).await;

		assert!(matches!(result, Err(DbError::Validation(_))));
	}
}
