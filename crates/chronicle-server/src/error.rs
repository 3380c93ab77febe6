use chronicle_conf::ConfError;
use chronicle_db::DbError;
use chronicle_storage::StorageError;
use hyper::StatusCode;
use thiserror::Error;

/// Errors that stop the server itself
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ServerError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("HTTP error: {0}")]
	Hyper(#[from] hyper::Error),

	#[error(transparent)]
	Conf(#[from] ConfError),

	#[error(transparent)]
	Db(#[from] DbError),
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Failure of a single request, mapped to an HTTP status in one place
#[derive(Debug, Error)]
pub enum ViewError {
	/// Request could not be parsed
	#[error("{0}")]
	BadRequest(String),

	/// Request was well formed but its content was rejected
	#[error("{0}")]
	Unprocessable(String),

	#[error("{0} not found")]
	NotFound(String),

	#[error("{0}")]
	Conflict(String),

	#[error("authentication required")]
	Unauthenticated,

	#[error("request body too large")]
	PayloadTooLarge,

	/// Detail is logged, never sent to the client
	#[error("internal server error")]
	Internal(String),
}

impl ViewError {
	pub fn status(&self) -> StatusCode {
		match self {
			ViewError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ViewError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
			ViewError::NotFound(_) => StatusCode::NOT_FOUND,
			ViewError::Conflict(_) => StatusCode::CONFLICT,
			ViewError::Unauthenticated => StatusCode::UNAUTHORIZED,
			ViewError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
			ViewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<DbError> for ViewError {
	fn from(error: DbError) -> Self {
		match error {
			DbError::Filter(e) => ViewError::BadRequest(e.to_string()),
			DbError::Validation(message) => ViewError::Unprocessable(message),
			DbError::Tag(e) => ViewError::Unprocessable(e.to_string()),
			DbError::NotFound(what) => ViewError::NotFound(what),
			e @ (DbError::Conflict(_) | DbError::SlugExhausted { .. }) => {
				ViewError::Conflict(e.to_string())
			}
			other => ViewError::Internal(other.to_string()),
		}
	}
}

impl From<StorageError> for ViewError {
	fn from(error: StorageError) -> Self {
		match error {
			e @ (StorageError::InvalidExtension(_)
			| StorageError::InvalidImage(_)
			| StorageError::InvalidPath(_)) => ViewError::Unprocessable(e.to_string()),
			other => ViewError::Internal(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chronicle_db::FilterError;
	use rstest::rstest;

	#[rstest]
	#[case(DbError::Filter(FilterError::InvalidDate { key: "start_date".into(), value: "x".into() }), StatusCode::BAD_REQUEST)]
	#[case(DbError::Validation("empty".into()), StatusCode::UNPROCESSABLE_ENTITY)]
	#[case(DbError::NotFound("record 1".into()), StatusCode::NOT_FOUND)]
	#[case(DbError::Conflict("slug 'a'".into()), StatusCode::CONFLICT)]
	#[case(DbError::SlugExhausted { base: "a".into(), attempts: 10 }, StatusCode::CONFLICT)]
	#[case(DbError::CorruptRow("bad".into()), StatusCode::INTERNAL_SERVER_ERROR)]
	fn test_db_errors_map_to_status(#[case] error: DbError, #[case] status: StatusCode) {
		assert_eq!(ViewError::from(error).status(), status);
	}

	#[test]
	fn test_internal_detail_is_not_displayed() {
		let error = ViewError::Internal("disk on fire".into());
		assert_eq!(error.to_string(), "internal server error");
	}
}
