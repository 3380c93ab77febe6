//! Slug assignment for records
//!
//! Slugs are derived from the title and made unique with a random suffix.
//! The UNIQUE constraint on `app_records.slug` stays the final arbiter: a
//! concurrent writer that claims the same slug first makes the later insert
//! fail with [`DbError::Conflict`].

use crate::error::{DbError, Result};
use crate::schema::RECORDS;
use rand::Rng;
use sea_query::{Alias, Expr, ExprTrait, Query, SqliteQueryBuilder};
use sqlx::SqliteConnection;

pub const MAX_SLUG_LENGTH: usize = 255;
pub const SUFFIX_LENGTH: usize = 8;
pub const MAX_ATTEMPTS: usize = 10;

const FALLBACK_SLUG: &str = "record";
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Derive the base slug of a title
///
/// The base is short enough to take a `-` and a suffix without exceeding
/// [`MAX_SLUG_LENGTH`].
pub fn slug_base(title: &str) -> String {
	let slug = ::slug::slugify(title);
	let max = MAX_SLUG_LENGTH - SUFFIX_LENGTH - 1;
	// slugify output is ASCII
	let truncated = if slug.len() > max { &slug[..max] } else { &slug[..] };
	let truncated = truncated.trim_end_matches('-');
	if truncated.is_empty() {
		FALLBACK_SLUG.to_string()
	} else {
		truncated.to_string()
	}
}

/// Check an explicit slug: `[a-z0-9_-]+`, at most [`MAX_SLUG_LENGTH`]
pub fn validate_slug(slug: &str) -> Result<()> {
	if slug.is_empty() {
		return Err(DbError::Validation("slug must not be empty".to_string()));
	}
	if slug.len() > MAX_SLUG_LENGTH {
		return Err(DbError::Validation(format!(
			"slug exceeds {} characters",
			MAX_SLUG_LENGTH
		)));
	}
	let valid = slug
		.bytes()
		.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
	if !valid {
		return Err(DbError::Validation(format!(
			"slug '{}' may only contain lowercase letters, digits, '-' and '_'",
			slug
		)));
	}
	Ok(())
}

pub(crate) fn random_suffix() -> String {
	let mut rng = rand::thread_rng();
	(0..SUFFIX_LENGTH)
		.map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
		.collect()
}

pub(crate) async fn slug_exists(conn: &mut SqliteConnection, slug: &str) -> Result<bool> {
	let stmt = Query::select()
		.expr(Expr::value(1))
		.from(Alias::new(RECORDS))
		.and_where(Expr::col(Alias::new("slug")).eq(slug))
		.to_owned();
	let sql = stmt.to_string(SqliteQueryBuilder);

	let row = sqlx::query(&sql).fetch_optional(&mut *conn).await?;
	Ok(row.is_some())
}

/// Find a free slug for `title`
pub async fn assign_slug(conn: &mut SqliteConnection, title: &str) -> Result<String> {
	assign_slug_with(conn, title, random_suffix).await
}

pub(crate) async fn assign_slug_with(
	conn: &mut SqliteConnection,
	title: &str,
	mut next_suffix: impl FnMut() -> String,
) -> Result<String> {
	let base = slug_base(title);
	if !slug_exists(conn, &base).await? {
		return Ok(base);
	}

	for attempt in 1..=MAX_ATTEMPTS {
		let candidate = format!("{}-{}", base, next_suffix());
		if !slug_exists(conn, &candidate).await? {
			tracing::debug!(base = %base, slug = %candidate, attempt, "slug collision resolved");
			return Ok(candidate);
		}
	}

	Err(DbError::SlugExhausted {
		base,
		attempts: MAX_ATTEMPTS,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::NewRecord;
	use crate::pool::connect_in_memory;
	use crate::records::create_record;
	use crate::schema::create_schema;
	use crate::users::get_or_create_user;
	use rstest::rstest;

	#[rstest]
	#[case("Hello World", "hello-world")]
	#[case("  Déjà vu!  ", "deja-vu")]
	#[case("", "record")]
	#[case("!!!", "record")]
	fn test_slug_base(#[case] title: &str, #[case] expected: &str) {
		assert_eq!(slug_base(title), expected);
	}

	#[test]
	fn test_long_title_leaves_room_for_suffix() {
		// Arrange
		let title = "word ".repeat(100);

		// Act
		let base = slug_base(&title);

		// Assert
		assert!(base.len() + 1 + SUFFIX_LENGTH <= MAX_SLUG_LENGTH);
		assert!(!base.ends_with('-'));
	}

	#[test]
	fn test_random_suffix_shape() {
		let suffix = random_suffix();
		assert_eq!(suffix.len(), SUFFIX_LENGTH);
		assert!(suffix.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
	}

	#[rstest]
	#[case("my-record_2", true)]
	#[case("My-Record", false)]
	#[case("with space", false)]
	#[case("", false)]
	fn test_validate_slug(#[case] slug: &str, #[case] ok: bool) {
		assert_eq!(validate_slug(slug).is_ok(), ok);
	}

	#[tokio::test]
	async fn test_assign_slug_gives_up_after_max_attempts() {
		// Arrange
		let pool = connect_in_memory().await.unwrap();
		create_schema(&pool).await.unwrap();
		let author = get_or_create_user(&pool, "ann").await.unwrap();
		for slug in ["same", "same-aaaaaaaa"] {
			let new = NewRecord {
				title: "Same".into(),
				slug: Some(slug.into()),
				..Default::default()
			};
			create_record(&pool, &author, new).await.unwrap();
		}
		let mut conn = pool.acquire().await.unwrap();

		// Act
		let result = assign_slug_with(&mut conn, "Same", || "aaaaaaaa".to_string()).await;

		// Assert
		match result {
			Err(DbError::SlugExhausted { base, attempts }) => {
				assert_eq!(base, "same");
				assert_eq!(attempts, MAX_ATTEMPTS);
			}
			other => panic!("expected exhaustion, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_assign_slug_uses_suffix_on_collision() {
		let pool = connect_in_memory().await.unwrap();
		create_schema(&pool).await.unwrap();
		let author = get_or_create_user(&pool, "ann").await.unwrap();
		let new = NewRecord {
			title: "Same".into(),
			..Default::default()
		};
		create_record(&pool, &author, new).await.unwrap();
		let mut conn = pool.acquire().await.unwrap();

		let slug = assign_slug_with(&mut conn, "Same", || "bbbbbbbb".to_string())
			.await
			.unwrap();

		assert_eq!(slug, "same-bbbbbbbb");
	}

	#[test]
	fn test_validate_slug_length() {
		assert!(validate_slug(&"a".repeat(MAX_SLUG_LENGTH)).is_ok());
		assert!(validate_slug(&"a".repeat(MAX_SLUG_LENGTH + 1)).is_err());
	}
}
