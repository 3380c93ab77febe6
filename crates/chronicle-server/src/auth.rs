//! Request authentication
//!
//! Identity is established outside chronicle. [`RemoteUserAuthenticator`]
//! trusts a header set by the fronting proxy.
//!
//! # Security Warning
//!
//! Only deploy the remote-user authenticator behind a proxy that strips the
//! header from client requests; otherwise anyone can claim any identity.

use crate::request::Request;
use async_trait::async_trait;
use chronicle_conf::AuthSettings;

/// Authenticated identity as reported by an [`Authenticator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
	pub username: String,
}

/// Resolves the identity behind a request
#[async_trait]
pub trait Authenticator: Send + Sync {
	/// `None` when the request is anonymous
	async fn authenticate(&self, request: &Request) -> Option<Identity>;
}

/// Authenticator that trusts a username header set by a proxy
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use chronicle_server::{Authenticator, RemoteUserAuthenticator, Request};
/// use hyper::{HeaderMap, Method};
///
/// # async fn example() {
/// let auth = RemoteUserAuthenticator::new("X-Remote-User");
/// let request = Request::new(Method::GET, "/".parse().unwrap(), HeaderMap::new(), Bytes::new())
///     .with_header("X-Remote-User", "alice");
///
/// let identity = auth.authenticate(&request).await.unwrap();
/// assert_eq!(identity.username, "alice");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RemoteUserAuthenticator {
	header_name: String,
}

impl RemoteUserAuthenticator {
	pub const DEFAULT_HEADER: &'static str = "X-Remote-User";

	pub fn new(header_name: impl Into<String>) -> Self {
		Self {
			header_name: header_name.into(),
		}
	}

	pub fn from_settings(settings: &AuthSettings) -> Self {
		Self::new(settings.user_header.clone())
	}

	pub fn header_name(&self) -> &str {
		&self.header_name
	}
}

impl Default for RemoteUserAuthenticator {
	fn default() -> Self {
		Self::new(Self::DEFAULT_HEADER)
	}
}

#[async_trait]
impl Authenticator for RemoteUserAuthenticator {
	async fn authenticate(&self, request: &Request) -> Option<Identity> {
		let username = request.header(&self.header_name)?.trim();
		if username.is_empty() {
			return None;
		}
		Some(Identity {
			username: username.to_string(),
		})
	}
}
