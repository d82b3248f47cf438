//! Minimal Web-Standard-shaped response, built on the `http` crate.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

/// An outbound HTTP response produced by any pipeline phase.
#[derive(Debug, Clone)]
pub struct Response {
	inner: http::Response<Bytes>,
}

impl Response {
	pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
		let mut builder = http::Response::builder().status(status);
		*builder.headers_mut().expect("builder has no error yet") = headers;
		let inner = builder.body(body).expect("status already validated");
		Self { inner }
	}

	pub fn from_http(inner: http::Response<Bytes>) -> Self {
		Self { inner }
	}

	pub fn status(status: StatusCode) -> Self {
		Self::new(status, HeaderMap::new(), Bytes::new())
	}

	pub fn no_content() -> Self {
		Self::status(StatusCode::NO_CONTENT)
	}

	pub fn text(status: StatusCode, body: impl Into<Bytes>) -> Self {
		let mut resp = Self::new(status, HeaderMap::new(), body.into());
		resp.set_header("content-type", "text/plain; charset=utf-8");
		resp
	}

	pub fn html(status: StatusCode, body: impl Into<Bytes>) -> Self {
		let mut resp = Self::new(status, HeaderMap::new(), body.into());
		resp.set_header("content-type", "text/html; charset=utf-8");
		resp
	}

	pub fn status_code(&self) -> StatusCode {
		self.inner.status()
	}

	pub fn set_status(&mut self, status: StatusCode) {
		*self.inner.status_mut() = status;
	}

	pub fn headers(&self) -> &HeaderMap {
		self.inner.headers()
	}

	pub fn headers_mut(&mut self) -> &mut HeaderMap {
		self.inner.headers_mut()
	}

	/// Sets a header, overwriting any prior value(s) under the same name.
	pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
		let name = HeaderName::from_bytes(name.as_bytes()).expect("header name must be valid token");
		let value = HeaderValue::try_from(value.into()).expect("header value must be ASCII-visible");
		self.inner.headers_mut().insert(name, value);
	}

	pub fn body(&self) -> &Bytes {
		self.inner.body()
	}

	pub fn set_body(&mut self, body: impl Into<Bytes>) {
		*self.inner.body_mut() = body.into();
	}

	pub fn into_http(self) -> http::Response<Bytes> {
		self.inner
	}

	/// Maps a response to its HEAD-equivalent: same status and headers, empty
	/// body. `Content-Length` is left untouched, matching §4.7 ("preserve
	/// status/headers, drop the body").
	pub fn into_head(mut self) -> Self {
		self.set_body(Bytes::new());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_html_sets_content_type() {
		let resp = Response::html(StatusCode::OK, "<html></html>");
		assert_eq!(
			resp.headers().get("content-type").unwrap(),
			"text/html; charset=utf-8"
		);
	}

	#[rstest]
	fn test_into_head_empties_body_but_keeps_headers() {
		let mut resp = Response::text(StatusCode::OK, "hello");
		resp.set_header("x-custom", "keep-me");

		let head = resp.into_head();

		assert!(head.body().is_empty());
		assert_eq!(head.headers().get("x-custom").unwrap(), "keep-me");
		assert_eq!(head.status_code(), StatusCode::OK);
	}
}
