use thiserror::Error;

/// Errors raised while loading or validating settings
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfError {
	#[error("IO error reading {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Invalid settings: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error("Invalid value for {key}: {message}")]
	Invalid { key: &'static str, message: String },
}

/// Result type for settings operations
pub type Result<T> = std::result::Result<T, ConfError>;
