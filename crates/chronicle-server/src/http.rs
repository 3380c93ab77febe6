use crate::app::Handler;
use crate::error::{Result, ViewError};
use crate::request::Request;
use crate::response::Response;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Default maximum request body size (10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP/1 server driving a [`Handler`]
pub struct HttpServer {
	handler: Arc<dyn Handler>,
	max_body_bytes: usize,
}

impl HttpServer {
	pub fn new<H: Handler + 'static>(handler: H) -> Self {
		Self {
			handler: Arc::new(handler),
			max_body_bytes: DEFAULT_MAX_BODY_BYTES,
		}
	}

	/// Reject bodies larger than `limit` with `413 Payload Too Large`
	pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
		self.max_body_bytes = limit;
		self
	}

	/// Accept connections until `shutdown` resolves
	///
	/// Connections already being served run to completion on their own
	/// tasks; only the accept loop stops.
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		shutdown: impl Future<Output = ()>,
	) -> Result<()> {
		let listener = TcpListener::bind(addr).await?;
		tracing::info!(%addr, "listening on http://{}", addr);
		self.serve(listener, shutdown).await
	}

	/// Serve connections from an already bound listener
	pub async fn serve(self, listener: TcpListener, shutdown: impl Future<Output = ()>) -> Result<()> {
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = result?;
					let handler = self.handler.clone();
					let max_body_bytes = self.max_body_bytes;

					tokio::task::spawn(async move {
						if let Err(err) = Self::handle_connection(stream, handler, max_body_bytes).await {
							tracing::debug!(%remote_addr, error = %err, "connection closed with error");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("shutdown signal received, no longer accepting connections");
					break;
				}
			}
		}

		Ok(())
	}

	async fn handle_connection(
		stream: TcpStream,
		handler: Arc<dyn Handler>,
		max_body_bytes: usize,
	) -> std::result::Result<(), hyper::Error> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			max_body_bytes,
		};
		http1::Builder::new().serve_connection(io, service).await
	}
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "could not listen for Ctrl-C");
		std::future::pending::<()>().await;
	}
}

/// Buffer a request body of at most `limit` bytes
///
/// A declared `Content-Length` above the limit is rejected before any byte
/// is read.
pub async fn read_body<B>(
	body: B,
	content_length: Option<u64>,
	limit: usize,
) -> std::result::Result<Bytes, ViewError>
where
	B: Body,
	B::Error: Into<BoxError>,
{
	if content_length.is_some_and(|len| len > limit as u64) {
		return Err(ViewError::PayloadTooLarge);
	}

	match Limited::new(body, limit).collect().await {
		Ok(collected) => Ok(collected.to_bytes()),
		Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
			Err(ViewError::PayloadTooLarge)
		}
		Err(err) => Err(ViewError::BadRequest(format!("could not read body: {}", err))),
	}
}

struct RequestService {
	handler: Arc<dyn Handler>,
	max_body_bytes: usize,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = BoxError;
	type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let max_body_bytes = self.max_body_bytes;

		Box::pin(async move {
			let content_length = req
				.headers()
				.get(hyper::header::CONTENT_LENGTH)
				.and_then(|v| v.to_str().ok())
				.and_then(|v| v.parse::<u64>().ok());
			let (parts, body) = req.into_parts();

			let body = match read_body(body, content_length, max_body_bytes).await {
				Ok(body) => body,
				Err(error) => {
					tracing::warn!(path = %parts.uri.path(), error = %error, "request body rejected");
					return Ok(Response::error(&error).into_hyper());
				}
			};

			let request = Request::new(parts.method, parts.uri, parts.headers, body);
			let method = request.method.clone();
			let path = request.path().to_string();
			let response = handler.handle(request).await;
			tracing::info!(%method, %path, status = response.status.as_u16(), "request");

			Ok(response.into_hyper())
		})
	}
}
