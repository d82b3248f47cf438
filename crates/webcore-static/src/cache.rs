//! Cache-Control classification by filename hash heuristics (§4.6 step 7).

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_HASH_SEGMENT: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?:^|[.-])[0-9a-fA-F]{8,}(?:[.-]|$)").expect("valid regex"));

static BASE36_HASH_SEGMENT: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?:^|[.-])[0-9A-Z]{8}(?:[.-]|$)").expect("valid regex"));

/// True if `basename` (filename only, no directory components) carries a
/// content-hash segment: either an 8+ char hex run delimited by `.`/`-`, or
/// an exact 8-char uppercase base36 run delimited the same way.
pub fn has_hash_segment(basename: &str) -> bool {
	HEX_HASH_SEGMENT.is_match(basename) || BASE36_HASH_SEGMENT.is_match(basename)
}

/// Returns the `Cache-Control` value for a static file basename.
pub fn cache_control_for(basename: &str) -> &'static str {
	if has_hash_segment(basename) {
		"public, max-age=31536000, immutable"
	} else {
		"public, max-age=300"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("main.a1b2c3d4.js")]
	#[case("app-e5f6a7b8c9.css")]
	#[case("bundle.1A2B3C4D.js")]
	fn test_hashed_basenames_are_immutable(#[case] basename: &str) {
		assert_eq!(
			cache_control_for(basename),
			"public, max-age=31536000, immutable"
		);
	}

	#[rstest]
	#[case("app.js")]
	#[case("index.html")]
	#[case("styles.css")]
	#[case("short.ab12.js")]
	fn test_unhashed_basenames_get_short_cache(#[case] basename: &str) {
		assert_eq!(cache_control_for(basename), "public, max-age=300");
	}
}
