//! Minimal Web-Standard-shaped request, built directly on the `http` crate
//! so adapters can convert to/from `hyper::Request` (or any other
//! Web-Standard fetch surface) without an intermediate representation.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// An inbound HTTP request as seen by the pipeline.
///
/// Adapters are responsible for producing one of these from whatever
/// platform-native request type they front (a `hyper::Request`, a worker
/// `fetch` event, ...). The core never parses transport framing itself.
#[derive(Debug, Clone)]
pub struct Request {
	inner: http::Request<Bytes>,
}

impl Request {
	pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
		let mut builder = http::Request::builder().method(method).uri(uri);
		*builder.headers_mut().expect("builder has no error yet") = headers;
		let inner = builder.body(body).expect("method/uri already validated");
		Self { inner }
	}

	pub fn from_http(inner: http::Request<Bytes>) -> Self {
		Self { inner }
	}

	pub fn method(&self) -> &Method {
		self.inner.method()
	}

	pub fn uri(&self) -> &Uri {
		self.inner.uri()
	}

	/// The raw path and query, exactly as received (not normalized).
	pub fn raw_target(&self) -> &str {
		self.inner
			.uri()
			.path_and_query()
			.map(|pq| pq.as_str())
			.unwrap_or("/")
	}

	pub fn headers(&self) -> &HeaderMap {
		self.inner.headers()
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.inner.headers().get(name).and_then(|v| v.to_str().ok())
	}

	pub fn body(&self) -> &Bytes {
		self.inner.body()
	}

	pub fn is_head(&self) -> bool {
		self.inner.method() == Method::HEAD
	}

	pub fn is_options(&self) -> bool {
		self.inner.method() == Method::OPTIONS
	}

	pub fn into_http(self) -> http::Request<Bytes> {
		self.inner
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_raw_target_includes_query() {
		let req = Request::new(
			Method::GET,
			"/blog/hello?ref=x".parse().unwrap(),
			HeaderMap::new(),
			Bytes::new(),
		);

		assert_eq!(req.raw_target(), "/blog/hello?ref=x");
	}

	#[rstest]
	fn test_is_head_and_is_options() {
		let head = Request::new(Method::HEAD, "/".parse().unwrap(), HeaderMap::new(), Bytes::new());
		let options = Request::new(
			Method::OPTIONS,
			"/".parse().unwrap(),
			HeaderMap::new(),
			Bytes::new(),
		);

		assert!(head.is_head());
		assert!(!head.is_options());
		assert!(options.is_options());
		assert!(!options.is_head());
	}
}
