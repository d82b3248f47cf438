//! The route manifest schema (§3, §6.1) and its load-time validation.

use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// CSS/JS assets a route wants injected into its rendered page, client
/// relative (no `PUBLIC_PATH` prefix — that is applied at request time by
/// `webcore-assets`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAssets {
	#[serde(default)]
	pub css: Vec<String>,
	#[serde(default)]
	pub js: Vec<String>,
}

/// One entry in the route manifest (§3 "Route entry").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
	/// Output HTML filename, e.g. `"blog/[slug]/index.html"`.
	pub filename: String,
	/// Route pattern; empty string denotes the root.
	pub path: String,
	/// Opaque key the module loader resolves to a render function.
	pub jsx: String,
	/// Pre-rendered at build time; served verbatim from disk at runtime.
	#[serde(default)]
	pub generated: bool,
	#[serde(default)]
	pub assets: RouteAssets,
	/// Cosmetic; always `"module"`, kept for manifest round-tripping.
	#[serde(default = "default_script_loading")]
	pub script_loading: String,
}

fn default_script_loading() -> String {
	"module".to_string()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
	#[error("route at index {index} has an empty filename")]
	EmptyFilename { index: usize },
	#[error("route at index {index} has an empty jsx key")]
	EmptyJsx { index: usize },
	#[error("duplicate route path {path:?} (first seen at index {first_index}, repeated at {index})")]
	DuplicatePath {
		path: String,
		first_index: usize,
		index: usize,
	},
	#[error("route {path:?} has an invalid pattern: {source}")]
	InvalidPattern {
		path: String,
		#[source]
		source: crate::pattern::PatternError,
	},
	#[error("failed to parse manifest JSON: {0}")]
	Json(String),
}

/// The ordered list of route entries; insertion order is match-priority
/// order (§3 "Insertion order in the manifest is the match-priority order").
#[derive(Debug, Clone, Default)]
pub struct RouteManifest {
	entries: Vec<RouteEntry>,
}

impl RouteManifest {
	/// Validates and wraps a list of route entries loaded from the manifest
	/// file. Invariant violations (empty `filename`/`jsx`, duplicate
	/// normalized `path`, invalid pattern) are a hard load-time failure.
	pub fn new(entries: Vec<RouteEntry>) -> Result<Self, ManifestError> {
		let mut seen_paths: HashSet<String> = HashSet::new();
		let mut first_index_by_path: std::collections::HashMap<String, usize> =
			std::collections::HashMap::new();

		for (index, entry) in entries.iter().enumerate() {
			if entry.filename.is_empty() {
				return Err(ManifestError::EmptyFilename { index });
			}
			if entry.jsx.is_empty() {
				return Err(ManifestError::EmptyJsx { index });
			}

			let normalized_path = normalize(&entry.path).unwrap_or_else(|_| entry.path.clone());
			if !seen_paths.insert(normalized_path.clone()) {
				let first_index = first_index_by_path[&normalized_path];
				return Err(ManifestError::DuplicatePath {
					path: entry.path.clone(),
					first_index,
					index,
				});
			}
			first_index_by_path.insert(normalized_path, index);

			// Validate (but do not cache) the pattern at load time so a
			// malformed pattern fails fast rather than on first request.
			if !entry.path.is_empty() {
				crate::pattern::compile(&entry.path).map_err(|source| ManifestError::InvalidPattern {
					path: entry.path.clone(),
					source,
				})?;
			}
		}

		Ok(Self { entries })
	}

	/// Parses a manifest JSON array (§6.1) and validates it.
	pub fn from_json(data: &str) -> Result<Self, ManifestError> {
		let entries: Vec<RouteEntry> =
			serde_json::from_str(data).map_err(|e| ManifestError::Json(e.to_string()))?;
		Self::new(entries)
	}

	pub fn entries(&self) -> &[RouteEntry] {
		&self.entries
	}

	pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
		self.entries.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn entry(path: &str, jsx: &str) -> RouteEntry {
		RouteEntry {
			filename: format!("{path}/index.html"),
			path: path.to_string(),
			jsx: jsx.to_string(),
			generated: false,
			assets: RouteAssets::default(),
			script_loading: "module".to_string(),
		}
	}

	#[rstest]
	fn test_accepts_well_formed_manifest() {
		let manifest = RouteManifest::new(vec![
			entry("", "home"),
			entry("about", "about"),
			entry("blog/[slug]", "blog-post"),
		]);

		assert!(manifest.is_ok());
		assert_eq!(manifest.unwrap().entries().len(), 3);
	}

	#[rstest]
	fn test_rejects_empty_filename() {
		let mut bad = entry("about", "about");
		bad.filename = String::new();

		let err = RouteManifest::new(vec![bad]).unwrap_err();
		assert_eq!(err, ManifestError::EmptyFilename { index: 0 });
	}

	#[rstest]
	fn test_rejects_empty_jsx() {
		let mut bad = entry("about", "about");
		bad.jsx = String::new();

		let err = RouteManifest::new(vec![bad]).unwrap_err();
		assert_eq!(err, ManifestError::EmptyJsx { index: 0 });
	}

	#[rstest]
	fn test_rejects_duplicate_normalized_path() {
		let entries = vec![entry("about", "about"), entry("/about/", "about-2")];

		let err = RouteManifest::new(entries).unwrap_err();
		assert_eq!(
			err,
			ManifestError::DuplicatePath {
				path: "/about/".to_string(),
				first_index: 0,
				index: 1,
			}
		);
	}

	#[rstest]
	fn test_rejects_invalid_pattern_at_load_time() {
		let bad = entry("blog/[]", "blog-post");

		let err = RouteManifest::new(vec![bad]);
		assert!(err.is_err());
	}

	#[rstest]
	fn test_from_json_round_trips() {
		let json = r#"[
			{"filename": "index.html", "path": "", "jsx": "home"},
			{"filename": "blog/[slug]/index.html", "path": "blog/[slug]", "jsx": "blog-post",
			 "assets": {"css": ["blog.css"], "js": ["blog.js"]}}
		]"#;

		let manifest = RouteManifest::from_json(json).unwrap();
		assert_eq!(manifest.entries().len(), 2);
		assert_eq!(manifest.entries()[1].assets.css, vec!["blog.css".to_string()]);
	}
}
