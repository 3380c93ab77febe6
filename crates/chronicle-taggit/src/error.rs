use thiserror::Error;

/// Errors that can occur in the taggit system
#[derive(Debug, Error)]
pub enum TaggitError {
	/// Tag name is empty after trimming
	#[error("Tag name is empty")]
	EmptyTagName,

	/// Tag name exceeds maximum length
	#[error("Tag name too long: maximum {max} characters, got {len}")]
	TagNameTooLong { max: usize, len: usize },

	/// Tag name contains control characters or a comma
	#[error("Tag name contains invalid characters: {0}")]
	InvalidCharacters(String),

	/// Namespace string does not name a known namespace
	#[error("Unknown tag namespace: {0}")]
	UnknownNamespace(String),
}

/// Result type for taggit operations
pub type Result<T> = std::result::Result<T, TaggitError>;
