//! URL and path normalizer (§4.1).
//!
//! `normalize` turns whatever the platform handed the pipeline — a raw
//! request target, or occasionally a fully-qualified URL — into the bare,
//! decoded, slash-trimmed pathname the pattern matcher and static engine
//! both expect.

use webcore_http::{PipelineError, PipelineErrorKind};

const MAX_URL_BYTES: usize = 2048;

/// Normalizes `input` per §4.1, or returns a `BadRequest`-kinded
/// [`PipelineError`] if it fails length, decoding, or traversal checks.
pub fn normalize(input: &str) -> Result<String, PipelineError> {
	if input.len() > MAX_URL_BYTES {
		return Err(PipelineError::bad_request(format!(
			"url exceeds {MAX_URL_BYTES} bytes"
		)));
	}

	let without_fragment = input.split('#').next().unwrap_or("");
	let without_query = without_fragment.split('?').next().unwrap_or("");

	let path_only = strip_scheme_and_authority(without_query);

	let decoded = urlencoding::decode(path_only)
		.map_err(|_| PipelineError::bad_request("invalid percent-encoding"))?
		.into_owned();

	if decoded.contains('\0') || decoded.contains('\r') || decoded.contains('\n') {
		return Err(PipelineError::bad_request("control character in path"));
	}

	for segment in decoded.split('/') {
		if segment == ".." || segment == "." {
			return Err(PipelineError::bad_request("path traversal segment"));
		}
	}

	let trimmed = decoded.trim_start_matches('/').trim_end_matches('/');

	Ok(if trimmed.eq_ignore_ascii_case("index.html") {
		String::new()
	} else {
		trimmed.to_string()
	})
}

/// If `input` looks like an absolute URL (`scheme://authority/path...`),
/// returns just the `/path...` portion (possibly empty). Otherwise returns
/// `input` unchanged.
fn strip_scheme_and_authority(input: &str) -> &str {
	match input.find("://") {
		Some(scheme_end) => {
			let after_scheme = &input[scheme_end + 3..];
			match after_scheme.find('/') {
				Some(path_start) => &after_scheme[path_start..],
				None => "",
			}
		}
		None => input,
	}
}

/// Helper for call sites that need to know *why* normalization failed
/// without constructing their own `PipelineError`.
pub fn is_bad_request(err: &PipelineError) -> bool {
	err.kind == PipelineErrorKind::BadRequest
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("blog/hello-world", "blog/hello-world")]
	#[case("/blog/hello-world/", "blog/hello-world")]
	#[case("///about", "about")]
	#[case("", "")]
	#[case("index.html", "")]
	#[case("/index.html", "")]
	#[case("https://example.com/blog/hello?ref=x", "blog/hello")]
	#[case("https://example.com", "")]
	#[case("/blog/hello%20world", "blog/hello world")]
	fn test_normalize_examples(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize(input).unwrap(), expected);
	}

	#[rstest]
	#[case("/../etc/passwd")]
	#[case("/a/../b")]
	#[case("/a/./b")]
	#[case("/a\0b")]
	#[case("/a\r\nb")]
	fn test_normalize_rejects_traversal_and_control_chars(#[case] input: &str) {
		let err = normalize(input).unwrap_err();
		assert!(is_bad_request(&err));
	}

	#[rstest]
	fn test_normalize_rejects_oversized_url() {
		let huge = format!("/{}", "a".repeat(3000));
		let err = normalize(&huge).unwrap_err();
		assert!(is_bad_request(&err));
	}

	#[rstest]
	fn test_normalize_rejects_invalid_utf8_percent_sequence() {
		// %FF is not a valid UTF-8 lead byte on its own.
		let err = normalize("/a%FF").unwrap_err();
		assert!(is_bad_request(&err));
	}
}
