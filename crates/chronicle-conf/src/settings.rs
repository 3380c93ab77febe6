//! Settings schema and validation

use crate::error::{ConfError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Complete service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
	pub server: ServerSettings,
	pub database: DatabaseSettings,
	pub media: MediaSettings,
	pub thumbnails: ThumbnailSettings,
	pub auth: AuthSettings,
	pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
	/// Largest request body accepted, in bytes
	pub max_body_bytes: usize,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 8000,
			max_body_bytes: 10 * 1024 * 1024,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
	pub url: String,
	pub max_connections: u32,
}

impl Default for DatabaseSettings {
	fn default() -> Self {
		Self {
			url: "sqlite://chronicle.db?mode=rwc".to_string(),
			max_connections: 5,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
	/// Directory uploaded files are written under
	pub root: PathBuf,
	/// Public URL prefix the media root is served from
	pub url: String,
}

impl Default for MediaSettings {
	fn default() -> Self {
		Self {
			root: PathBuf::from("media"),
			url: "/media/".to_string(),
		}
	}
}

/// Bounding box and encoding of normalized record thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSettings {
	pub max_width: u32,
	pub max_height: u32,
	/// JPEG quality, 1..=100
	pub quality: u8,
}

impl Default for ThumbnailSettings {
	fn default() -> Self {
		Self {
			max_width: 400,
			max_height: 500,
			quality: 90,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
	/// Header a fronting proxy sets to the authenticated username
	pub user_header: String,
	/// Where page loads without an identity are redirected
	pub login_url: String,
}

impl Default for AuthSettings {
	fn default() -> Self {
		Self {
			user_header: "X-Remote-User".to_string(),
			login_url: "/accounts/login/".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// `tracing_subscriber::EnvFilter` directive
	pub filter: String,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			filter: "info".to_string(),
		}
	}
}

impl Settings {
	/// Check cross-field constraints serde cannot express
	pub fn validate(&self) -> Result<()> {
		if self.server.port == 0 {
			return Err(invalid("server.port", "must be non-zero"));
		}
		if self.server.max_body_bytes == 0 {
			return Err(invalid("server.max_body_bytes", "must be non-zero"));
		}
		if self.database.url.trim().is_empty() {
			return Err(invalid("database.url", "must not be empty"));
		}
		if self.database.max_connections == 0 {
			return Err(invalid("database.max_connections", "must be non-zero"));
		}
		if self.media.url.trim().is_empty() {
			return Err(invalid("media.url", "must not be empty"));
		}
		if self.thumbnails.max_width == 0 || self.thumbnails.max_height == 0 {
			return Err(invalid("thumbnails", "bounding box must be non-zero"));
		}
		if !(1..=100).contains(&self.thumbnails.quality) {
			return Err(invalid(
				"thumbnails.quality",
				format!("{} is outside 1..=100", self.thumbnails.quality),
			));
		}
		if self.auth.user_header.trim().is_empty() {
			return Err(invalid("auth.user_header", "must not be empty"));
		}
		Ok(())
	}

	/// Socket address the server binds to
	pub fn bind_addr(&self) -> Result<SocketAddr> {
		format!("{}:{}", self.server.host, self.server.port)
			.parse()
			.map_err(|e: std::net::AddrParseError| invalid("server.host", e.to_string()))
	}
}

fn invalid(key: &'static str, message: impl Into<String>) -> ConfError {
	ConfError::Invalid {
		key,
		message: message.into(),
	}
}
