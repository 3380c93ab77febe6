use crate::error::ViewError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue, LOCATION};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::json;

/// HTTP response produced by the views
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	/// `302 Found` pointing at `location`
	pub fn found(location: &str) -> Self {
		Self::new(StatusCode::FOUND).with_location(location)
	}

	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(value) = HeaderValue::from_str(value)
		{
			self.headers.insert(name, value);
		}
		self
	}

	pub fn with_location(mut self, location: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(location) {
			self.headers.insert(LOCATION, value);
		}
		self
	}

	/// Serialize `data` as the JSON body
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self, ViewError> {
		let body = serde_json::to_vec(data)
			.map_err(|e| ViewError::Internal(format!("serialize response: {}", e)))?;
		self.body = Bytes::from(body);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}

	/// `{"error": message}` with the error's status
	pub fn error(error: &ViewError) -> Self {
		let body = json!({ "error": error.to_string() });
		let mut response = Self::new(error.status());
		response.body = Bytes::from(body.to_string());
		response
			.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		response
	}

	/// Body parsed as JSON, for callers that inspect responses
	pub fn json_body(&self) -> Option<serde_json::Value> {
		serde_json::from_slice(&self.body).ok()
	}

	pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
		let mut response = hyper::Response::new(Full::new(self.body));
		*response.status_mut() = self.status;
		*response.headers_mut() = self.headers;
		response
	}
}
