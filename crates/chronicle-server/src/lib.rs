//! # chronicle-server
//!
//! HTTP surface of chronicle: a hyper HTTP/1 server, the route table, the
//! JSON views and request authentication.
//!
//! The [`App`] is independent of the network: [`App::dispatch`] takes a
//! buffered [`Request`] and returns a [`Response`], which is how the tests
//! drive it. [`HttpServer`] adds the socket handling, body size limits and
//! graceful shutdown.
//!
//! ```rust,no_run
//! use chronicle_conf::SettingsBuilder;
//! use chronicle_db::{pool, schema};
//! use chronicle_server::{App, HttpServer, shutdown_signal};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SettingsBuilder::new().build()?;
//! let pool = pool::connect(&settings.database).await?;
//! schema::create_schema(&pool).await?;
//!
//! HttpServer::new(App::new(&settings, pool))
//!     .with_max_body_bytes(settings.server.max_body_bytes)
//!     .listen_with_shutdown(settings.bind_addr()?, shutdown_signal())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod auth;
pub mod error;
pub mod http;
pub mod payload;
pub mod request;
pub mod response;
pub mod router;
pub mod service;
pub mod views;

pub use app::{App, Handler};
pub use auth::{Authenticator, Identity, RemoteUserAuthenticator};
pub use error::{Result, ServerError, ViewError};
pub use http::{HttpServer, read_body, shutdown_signal};
pub use request::Request;
pub use response::Response;
pub use router::{Route, RouteMatch};
pub use service::RecordService;
