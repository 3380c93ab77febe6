use thiserror::Error;

/// Errors raised by media storage and thumbnail processing
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// File extension is not one of the accepted image types
	#[error("File extension '{0}' is not allowed; allowed extensions are: png, jpg, webp, jpeg, gif")]
	InvalidExtension(String),

	/// File name is empty or escapes the media root
	#[error("Invalid path: {0}")]
	InvalidPath(String),

	/// Content could not be decoded or encoded as an image
	#[error("Invalid image: {0}")]
	InvalidImage(String),
}

impl From<image::ImageError> for StorageError {
	fn from(error: image::ImageError) -> Self {
		StorageError::InvalidImage(error.to_string())
	}
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
