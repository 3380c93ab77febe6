//! # chronicle-db
//!
//! SQLite persistence for chronicle: users, records with namespaced tags,
//! slug assignment, the record listing query builder and threaded comments.
//!
//! Statements are built with sea-query and executed through an sqlx
//! [`SqlitePool`](sqlx::SqlitePool). Timestamps are stored as fixed-width
//! RFC 3339 UTC strings and calendar dates as `YYYY-MM-DD`, so both order
//! correctly as text.
//!
//! ## Listing records
//!
//! ```rust,no_run
//! use chronicle_db::{pool, query, schema};
//!
//! # async fn example() -> chronicle_db::Result<()> {
//! let pool = pool::connect_in_memory().await?;
//! schema::create_schema(&pool).await?;
//!
//! let records = query::select_records_from_query(&pool, "start_date=2024-01-01").await?;
//! assert!(records.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod comments;
pub mod error;
pub mod models;
pub mod pool;
pub mod query;
pub mod records;
pub mod schema;
pub mod slug;
pub mod tags;
pub mod users;

pub(crate) mod codec;

pub use error::{DbError, Result};
pub use models::{
	Comment, NewComment, NewRecord, Record, RecordChanges, Status, TrackedRecord, User,
	MAX_COMMENT_LENGTH, MAX_SHORT_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
pub use query::{FilterError, FilterRequest, Predicate, RecordQuery};
