//! # Chronicle
//!
//! A small publishing site: dated, tagged records with threaded comments,
//! served as a JSON API.
//!
//! The workspace is split by concern:
//!
//! - [`conf`] - layered settings (defaults, TOML file, environment)
//! - [`taggit`] - namespaced tags and tag-name parsing
//! - [`storage`] - media files and thumbnail normalization
//! - [`db`] - persistence, record filtering, slugs and comment threads
//! - [`server`] - routing, authentication, views and the HTTP loop
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use chronicle::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SettingsBuilder::new().add_source(EnvSource::new()).build()?;
//! let pool = chronicle::db::pool::connect(&settings.database).await?;
//! chronicle::db::schema::create_schema(&pool).await?;
//!
//! HttpServer::new(App::new(&settings, pool))
//!     .with_max_body_bytes(settings.server.max_body_bytes)
//!     .listen_with_shutdown(settings.bind_addr()?, shutdown_signal())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub use chronicle_conf as conf;
pub use chronicle_db as db;
pub use chronicle_server as server;
pub use chronicle_storage as storage;
pub use chronicle_taggit as taggit;

/// Commonly used types
pub mod prelude {
	pub use chronicle_conf::{EnvSource, Settings, SettingsBuilder, TomlFileSource};
	pub use chronicle_db::{
		Comment, FilterRequest, NewComment, NewRecord, Record, RecordQuery, Status, User,
	};
	pub use chronicle_server::{App, HttpServer, Request, Response, shutdown_signal};
	pub use chronicle_storage::{MediaStorage, ThumbnailSpec};
	pub use chronicle_taggit::{Tag, TagNamespace, Taggable};
}
