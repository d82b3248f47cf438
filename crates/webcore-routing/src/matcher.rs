//! Matches a normalized pathname against a [`RouteManifest`] (§4.2).

use crate::manifest::{RouteEntry, RouteManifest};
use crate::pattern::PatternCache;
use once_cell::sync::Lazy;
use regex::Regex;
use webcore_http::Params;

static VALUE_PATTERN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,200}$").expect("static value pattern is valid"));

fn is_valid_value(value: &str) -> bool {
	VALUE_PATTERN.is_match(value)
}

/// Outcome of matching a pathname. `Invalid` is distinct from `NoMatch` so
/// the pipeline can answer 400 rather than 404.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
	NoMatch,
	Invalid,
	Matched { route: RouteEntry, params: Params },
}

/// Owns a manifest and the compiled-pattern cache behind it, and resolves
/// normalized pathnames to route matches.
pub struct RouteMatcher {
	manifest: RouteManifest,
	cache: PatternCache,
}

impl RouteMatcher {
	pub fn new(manifest: RouteManifest) -> Self {
		Self {
			manifest,
			cache: PatternCache::default(),
		}
	}

	pub fn with_cache(manifest: RouteManifest, cache: PatternCache) -> Self {
		Self { manifest, cache }
	}

	pub fn manifest(&self) -> &RouteManifest {
		&self.manifest
	}

	/// Matches `pathname` (already normalized by `webcore_routing::normalize`)
	/// with parameter-value validation enabled.
	pub fn match_path(&self, pathname: &str) -> RouteMatch {
		self.match_path_with_validation(pathname, true)
	}

	/// Matches `pathname`, optionally skipping the parameter-value
	/// constraint check (§4.2 "unless the caller disables validation").
	pub fn match_path_with_validation(&self, pathname: &str, validate: bool) -> RouteMatch {
		for entry in self.manifest.iter() {
			if entry.path.is_empty() {
				if pathname.is_empty() || pathname.eq_ignore_ascii_case("index.html") {
					return RouteMatch::Matched {
						route: entry.clone(),
						params: Params::new(),
					};
				}
				continue;
			}

			let fast_path = format!("{}/index.html", entry.path);
			if pathname == fast_path {
				return RouteMatch::Matched {
					route: entry.clone(),
					params: Params::new(),
				};
			}

			let compiled = match self.cache.get_or_compile(&entry.path) {
				Ok(compiled) => compiled,
				// The manifest validated every pattern at load time; a cache
				// miss failing to recompile here would mean the pattern
				// changed shape underneath us, which cannot happen.
				Err(_) => continue,
			};

			let Some(captures) = compiled.regex.captures(pathname) else {
				continue;
			};

			let mut params = Params::with_capacity(compiled.param_names.len());
			for (name, capture) in compiled.param_names.iter().zip(captures.iter().skip(1)) {
				let value = capture.map(|m| m.as_str()).unwrap_or("");
				if validate && !is_valid_value(value) {
					return RouteMatch::Invalid;
				}
				params.insert(name.clone(), value.to_string());
			}

			return RouteMatch::Matched {
				route: entry.clone(),
				params,
			};
		}

		RouteMatch::NoMatch
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::manifest::RouteAssets;
	use rstest::rstest;

	fn entry(path: &str, jsx: &str) -> RouteEntry {
		RouteEntry {
			filename: if path.is_empty() {
				"index.html".to_string()
			} else {
				format!("{path}/index.html")
			},
			path: path.to_string(),
			jsx: jsx.to_string(),
			generated: false,
			assets: RouteAssets::default(),
			script_loading: "module".to_string(),
		}
	}

	fn matcher() -> RouteMatcher {
		let manifest = RouteManifest::new(vec![
			entry("", "home"),
			entry("about", "about"),
			entry("blog/[category]/[slug]", "blog-post-categorized"),
			entry("blog/[slug]", "blog-post"),
		])
		.unwrap();
		RouteMatcher::new(manifest)
	}

	#[rstest]
	fn test_matches_root_on_empty_pathname() {
		let m = matcher();
		match m.match_path("") {
			RouteMatch::Matched { route, params } => {
				assert_eq!(route.jsx, "home");
				assert!(params.is_empty());
			}
			other => panic!("expected Matched, got {other:?}"),
		}
	}

	#[rstest]
	fn test_matches_root_on_index_html() {
		let m = matcher();
		assert!(matches!(
			m.match_path("index.html"),
			RouteMatch::Matched { .. }
		));
	}

	#[rstest]
	fn test_matches_static_segment() {
		let m = matcher();
		match m.match_path("about") {
			RouteMatch::Matched { route, .. } => assert_eq!(route.jsx, "about"),
			other => panic!("expected Matched, got {other:?}"),
		}
	}

	#[rstest]
	fn test_matches_single_param_route() {
		let m = matcher();
		match m.match_path("blog/hello-world") {
			RouteMatch::Matched { route, params } => {
				assert_eq!(route.jsx, "blog-post");
				assert_eq!(params.get("slug"), Some("hello-world"));
			}
			other => panic!("expected Matched, got {other:?}"),
		}
	}

	#[rstest]
	fn test_matches_multi_param_route_first_match_wins() {
		let m = matcher();
		match m.match_path("blog/electronics/laptop") {
			RouteMatch::Matched { route, params } => {
				assert_eq!(route.jsx, "blog-post-categorized");
				assert_eq!(params.get("category"), Some("electronics"));
				assert_eq!(params.get("slug"), Some("laptop"));
			}
			other => panic!("expected Matched, got {other:?}"),
		}
	}

	#[rstest]
	fn test_fast_path_index_html_suffix_matches_with_empty_params() {
		let m = matcher();
		match m.match_path("blog/hello-world/index.html") {
			RouteMatch::Matched { route, params } => {
				assert_eq!(route.jsx, "blog-post");
				assert!(params.is_empty());
			}
			other => panic!("expected Matched, got {other:?}"),
		}
	}

	#[rstest]
	fn test_invalid_param_value_short_circuits_without_fallthrough() {
		let m = matcher();
		// "hello world" contains a space, which violates the value regex; per
		// §4.2 this must return Invalid immediately, not fall through and try
		// a later, looser-matching entry.
		assert_eq!(m.match_path("blog/hello world"), RouteMatch::Invalid);
	}

	#[rstest]
	fn test_no_match_for_unknown_path() {
		let m = matcher();
		assert_eq!(m.match_path("does/not/exist/at/all"), RouteMatch::NoMatch);
	}

	#[rstest]
	fn test_validation_can_be_disabled() {
		let m = matcher();
		match m.match_path_with_validation("blog/hello world", false) {
			RouteMatch::Matched { params, .. } => {
				assert_eq!(params.get("slug"), Some("hello world"));
			}
			other => panic!("expected Matched, got {other:?}"),
		}
	}
}
