//! # chronicle-conf
//!
//! Layered settings for the chronicle service.
//!
//! Sources are merged in priority order (environment variables > TOML file >
//! built-in defaults). The resulting [`Settings`] value is passed explicitly
//! to the database pool, media storage and HTTP server.
//!
//! ```rust
//! use chronicle_conf::{EnvSource, SettingsBuilder};
//!
//! let settings = SettingsBuilder::new()
//!     .add_source(EnvSource::from_vars([(
//!         "CHRONICLE_SERVER__PORT".to_string(),
//!         "9000".to_string(),
//!     )]))
//!     .build()
//!     .unwrap();
//! assert_eq!(settings.server.port, 9000);
//! assert_eq!(settings.thumbnails.max_width, 400);
//! ```

pub mod builder;
pub mod error;
pub mod settings;
pub mod sources;

pub use builder::SettingsBuilder;
pub use error::{ConfError, Result};
pub use settings::{
	AuthSettings, DatabaseSettings, LoggingSettings, MediaSettings, ServerSettings, Settings,
	ThumbnailSettings,
};
pub use sources::{ConfigSource, DefaultSource, EnvSource, TomlFileSource};
