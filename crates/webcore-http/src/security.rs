//! Default security headers and the HEAD-shaping helper (§4.7).
//!
//! Grounded on the admin panel's `SecurityHeaders` (same merge-then-override
//! shape), scaled down to the triplet this spec actually mandates:
//! `X-Content-Type-Options`, `X-Frame-Options`, `Referrer-Policy`.

use crate::response::Response;
use std::collections::HashMap;

/// The default security headers applied to every pipeline response, before
/// adapter overrides and the response's own headers are layered on top.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
	overrides: HashMap<String, String>,
}

impl Default for SecurityHeaders {
	fn default() -> Self {
		Self {
			overrides: HashMap::new(),
		}
	}
}

impl SecurityHeaders {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds from the adapter-supplied `securityHeaders` config map (§6.6).
	/// These take precedence over the built-in defaults, but not over
	/// whatever the response itself already set.
	pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
		Self { overrides }
	}

	fn defaults() -> [(&'static str, &'static str); 3] {
		[
			("x-content-type-options", "nosniff"),
			("x-frame-options", "DENY"),
			("referrer-policy", "strict-origin-when-cross-origin"),
		]
	}

	/// Applies adapter overrides, then defaults, leaving any header the
	/// response already set untouched. Precedence is response > overrides >
	/// defaults (§4.5 step 10, §4.7): overrides must beat defaults, and
	/// whatever the response already set beats both.
	pub fn apply(&self, response: &mut Response) {
		for (name, value) in &self.overrides {
			if !response.headers().contains_key(name.as_str()) {
				response.set_header(name, value.clone());
			}
		}
		for (name, value) in Self::defaults() {
			if !response.headers().contains_key(name) {
				response.set_header(name, value.to_string());
			}
		}
	}
}

/// Maps a response to its HEAD-equivalent. Thin re-export of
/// [`Response::into_head`] kept at this path so callers can treat
/// "HEAD-shape the final response" as a single pipeline utility alongside
/// the security header merge.
pub fn head_shape(response: Response) -> Response {
	response.into_head()
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::StatusCode;
	use rstest::rstest;

	#[rstest]
	fn test_default_headers_applied() {
		let mut resp = Response::status(StatusCode::OK);
		SecurityHeaders::new().apply(&mut resp);

		assert_eq!(resp.headers().get("x-content-type-options").unwrap(), "nosniff");
		assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
		assert_eq!(
			resp.headers().get("referrer-policy").unwrap(),
			"strict-origin-when-cross-origin"
		);
	}

	#[rstest]
	fn test_response_own_header_wins_over_default() {
		let mut resp = Response::status(StatusCode::OK);
		resp.set_header("x-frame-options", "SAMEORIGIN");
		SecurityHeaders::new().apply(&mut resp);

		assert_eq!(resp.headers().get("x-frame-options").unwrap(), "SAMEORIGIN");
	}

	#[rstest]
	fn test_adapter_override_applied_when_response_silent() {
		let mut overrides = HashMap::new();
		overrides.insert("x-frame-options".to_string(), "SAMEORIGIN".to_string());
		let mut resp = Response::status(StatusCode::OK);
		SecurityHeaders::with_overrides(overrides).apply(&mut resp);

		assert_eq!(resp.headers().get("x-frame-options").unwrap(), "SAMEORIGIN");
	}
}
