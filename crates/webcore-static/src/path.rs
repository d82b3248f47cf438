//! Traversal-safe resolution of a request path against the static root
//! (§4.6 step 2).

use std::path::{Component, Path, PathBuf};
use webcore_http::PipelineError;

const MAX_PATH_BYTES: usize = 1024;

/// Joins `relative` (an already-decoded, already-normalized pathname with no
/// leading slash) onto `root`, rejecting the candidate if it would resolve
/// outside of `root`.
///
/// This never touches the filesystem beyond the lexical join: canonicalizing
/// would require the file to already exist, which is exactly what step 3
/// (stat) checks next. Instead we reject `..`/root-escaping components
/// lexically, which is sufficient because `relative` has already been
/// through `webcore_routing::normalize` and cannot contain raw `..` segments
/// — this is defense in depth for callers that invoke the static engine
/// directly.
pub fn resolve_safe_path(root: &Path, relative: &str) -> Result<PathBuf, PipelineError> {
	if relative.len() > MAX_PATH_BYTES {
		return Err(PipelineError::bad_request("static path exceeds maximum length"));
	}
	if relative.as_bytes().contains(&0) {
		return Err(PipelineError::bad_request("static path contains a NUL byte"));
	}

	let mut resolved = root.to_path_buf();
	for segment in relative.split('/') {
		if segment.is_empty() {
			continue;
		}
		match Path::new(segment)
			.components()
			.next()
			.expect("non-empty segment has at least one component")
		{
			Component::Normal(part) => resolved.push(part),
			_ => {
				return Err(PipelineError::forbidden("path escapes the static root"));
			}
		}
	}

	if !resolved.starts_with(root) {
		return Err(PipelineError::forbidden("path escapes the static root"));
	}

	Ok(resolved)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_joins_simple_relative_path() {
		let root = Path::new("/var/www");
		let resolved = resolve_safe_path(root, "css/app.css").unwrap();
		assert_eq!(resolved, Path::new("/var/www/css/app.css"));
	}

	#[rstest]
	#[case("../secret")]
	#[case("a/../../secret")]
	#[case("..")]
	fn test_rejects_traversal_segments(#[case] relative: &str) {
		let root = Path::new("/var/www");
		let err = resolve_safe_path(root, relative).unwrap_err();
		assert_eq!(err.kind, webcore_http::PipelineErrorKind::Forbidden);
	}

	#[rstest]
	fn test_rejects_nul_byte() {
		let root = Path::new("/var/www");
		let err = resolve_safe_path(root, "a\0b").unwrap_err();
		assert_eq!(err.kind, webcore_http::PipelineErrorKind::BadRequest);
	}

	#[rstest]
	fn test_rejects_oversized_path() {
		let root = Path::new("/var/www");
		let huge = "a".repeat(2000);
		let err = resolve_safe_path(root, &huge).unwrap_err();
		assert_eq!(err.kind, webcore_http::PipelineErrorKind::BadRequest);
	}
}
