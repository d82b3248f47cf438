//! Property test for the §8 universal invariant: `normalizePublicPath` is
//! idempotent and never drops a required trailing slash.

use proptest::prelude::*;
use webcore_assets::normalize_public_path;

proptest! {
	#[test]
	fn normalize_public_path_is_idempotent(path in "[a-zA-Z0-9/_-]{0,20}") {
		let once = normalize_public_path(Some(&path));
		let twice = normalize_public_path(Some(&once));
		prop_assert_eq!(once, twice);
	}

	#[test]
	fn normalize_public_path_nonempty_input_always_ends_with_slash(
		path in "[a-zA-Z0-9/_-]{1,20}",
	) {
		let normalized = normalize_public_path(Some(&path));
		prop_assert!(normalized.ends_with('/'));
	}
}
