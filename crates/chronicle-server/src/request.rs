use crate::error::ViewError;
use bytes::Bytes;
use hyper::header::{ACCEPT, CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

/// Buffered HTTP request as seen by the views
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Request {
	pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			headers,
			body,
		}
	}

	/// Add a header, ignoring names or values that are not valid HTTP
	///
	/// # Examples
	///
	/// ```
	/// use bytes::Bytes;
	/// use chronicle_server::Request;
	/// use hyper::{HeaderMap, Method};
	///
	/// let request = Request::new(Method::GET, "/".parse().unwrap(), HeaderMap::new(), Bytes::new())
	///     .with_header("X-Requested-With", "XMLHttpRequest");
	/// assert!(request.is_ajax());
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(value) = HeaderValue::from_str(value)
		{
			self.headers.insert(name, value);
		}
		self
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Raw query string, empty when absent
	pub fn query(&self) -> &str {
		self.uri.query().unwrap_or("")
	}

	/// Path and query, as used in login redirects
	pub fn full_path(&self) -> &str {
		self.uri
			.path_and_query()
			.map(|pq| pq.as_str())
			.unwrap_or_else(|| self.uri.path())
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	fn content_type(&self) -> Option<&str> {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.map(|v| v.split(';').next().unwrap_or("").trim())
	}

	/// Whether the request comes from a script rather than a page
	///
	/// True for `X-Requested-With: XMLHttpRequest` and for requests whose
	/// `Accept` header lists JSON media types only.
	pub fn is_ajax(&self) -> bool {
		if self
			.header("x-requested-with")
			.is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
		{
			return true;
		}

		let Some(accept) = self.headers.get(ACCEPT).and_then(|v| v.to_str().ok()) else {
			return false;
		};
		let mut ranges = accept
			.split(',')
			.map(|range| range.split(';').next().unwrap_or("").trim())
			.filter(|range| !range.is_empty())
			.peekable();
		ranges.peek().is_some() && ranges.all(|range| range.eq_ignore_ascii_case("application/json"))
	}

	/// Decode a JSON body
	pub fn json<T: DeserializeOwned>(&self) -> Result<T, ViewError> {
		serde_json::from_slice(&self.body)
			.map_err(|e| ViewError::BadRequest(format!("invalid JSON body: {}", e)))
	}

	/// Decode an `application/x-www-form-urlencoded` body
	pub fn form<T: DeserializeOwned>(&self) -> Result<T, ViewError> {
		serde_urlencoded::from_bytes(&self.body)
			.map_err(|e| ViewError::BadRequest(format!("invalid form body: {}", e)))
	}

	/// Decode the body as JSON or form data depending on its content type
	///
	/// Bodies without a content type are read as form data, the way a
	/// browser posts a plain form.
	pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ViewError> {
		match self.content_type() {
			Some(ct) if ct.eq_ignore_ascii_case("application/json") => self.json(),
			_ => self.form(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::Deserialize;

	fn get(uri: &str) -> Request {
		Request::new(Method::GET, uri.parse().unwrap(), HeaderMap::new(), Bytes::new())
	}

	#[rstest]
	#[case(None, None, false)]
	#[case(Some("XMLHttpRequest"), None, true)]
	#[case(Some("xmlhttprequest"), None, true)]
	#[case(None, Some("application/json"), true)]
	#[case(None, Some("application/json; charset=utf-8"), true)]
	#[case(None, Some("text/html,application/json"), false)]
	#[case(None, Some("*/*"), false)]
	fn test_is_ajax(
		#[case] requested_with: Option<&str>,
		#[case] accept: Option<&str>,
		#[case] expected: bool,
	) {
		// Arrange
		let mut request = get("/");
		if let Some(value) = requested_with {
			request = request.with_header("X-Requested-With", value);
		}
		if let Some(value) = accept {
			request = request.with_header("Accept", value);
		}

		// Act & Assert
		assert_eq!(request.is_ajax(), expected);
	}

	#[derive(Debug, Deserialize, PartialEq)]
	struct Body {
		content: String,
	}

	#[test]
	fn test_payload_follows_content_type() {
		let json = get("/")
			.with_header("Content-Type", "application/json")
			.with_body(r#"{"content":"hi"}"#);
		let form = get("/").with_body("content=hi+there");

		assert_eq!(json.payload::<Body>().unwrap().content, "hi");
		assert_eq!(form.payload::<Body>().unwrap().content, "hi there");
	}

	#[test]
	fn test_full_path_keeps_query() {
		let request = get("/records/?Paris=on");
		assert_eq!(request.path(), "/records/");
		assert_eq!(request.query(), "Paris=on");
		assert_eq!(request.full_path(), "/records/?Paris=on");
	}
}
