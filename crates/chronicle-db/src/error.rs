use crate::query::FilterError;
use chronicle_taggit::TaggitError;
use thiserror::Error;

/// Errors returned by the persistence layer
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DbError {
	/// Error reported by the database driver
	#[error("Database error: {0}")]
	Database(#[from] sqlx::Error),

	/// Statement could not be built
	#[error("Query build error: {0}")]
	Query(String),

	/// Stored row does not decode into a model
	#[error("Corrupt row: {0}")]
	CorruptRow(String),

	/// Requested object does not exist
	#[error("{0} not found")]
	NotFound(String),

	/// Insert or update collided with a uniqueness constraint
	#[error("Conflict: {0}")]
	Conflict(String),

	/// Random suffixes kept colliding with stored slugs
	#[error("Could not find a free slug for '{base}' after {attempts} attempts")]
	SlugExhausted { base: String, attempts: usize },

	/// Input rejected before touching the database
	#[error("Validation error: {0}")]
	Validation(String),

	#[error(transparent)]
	Tag(#[from] TaggitError),

	#[error(transparent)]
	Filter(#[from] FilterError),
}

impl DbError {
	/// Translate unique-constraint violations into [`DbError::Conflict`]
	pub(crate) fn from_write(error: sqlx::Error, what: impl Into<String>) -> Self {
		match &error {
			sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Conflict(what.into()),
			_ => DbError::Database(error),
		}
	}
}

/// Result type for persistence operations
pub type Result<T> = std::result::Result<T, DbError>;
