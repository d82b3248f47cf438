//! Public-path normalization and the asset-injection engine (§4.3).
//!
//! Both functions here are pure: they never mutate their input and are safe
//! to call concurrently from any number of requests.

use std::collections::HashSet;

/// Normalizes a configured public path (§4.3 `normalizePublicPath`).
///
/// `None` stands in for the JS `null`/`undefined` case and yields `"/"`; an
/// explicit empty string means "no prefix" and is left untouched; anything
/// else gets a trailing slash if it lacks one.
pub fn normalize_public_path(path: Option<&str>) -> String {
	match path {
		None => "/".to_string(),
		Some("") => String::new(),
		Some(p) if p.ends_with('/') => p.to_string(),
		Some(p) => format!("{p}/"),
	}
}

/// Inserts `<link>`/`<script>` tags for `css`/`js` into `html`, prefixing
/// each href/src with `public_path`. Duplicate entries (by exact string
/// equality) are emitted once, in first-seen order.
///
/// CSS is inserted before the first case-insensitive `</head>` (or prepended
/// if absent). JS is inserted before the last case-insensitive `</body>` (or
/// appended if absent).
pub fn inject_assets(html: &str, css: &[String], js: &[String], public_path: &str) -> String {
	let mut out = html.to_string();

	let unique_css = dedup_preserve_order(css);
	if !unique_css.is_empty() {
		let tags: Vec<String> = unique_css
			.iter()
			.map(|href| format!(r#"<link rel="stylesheet" href="{public_path}{href}">"#))
			.collect();
		out = match find_case_insensitive(&out, "</head>") {
			Some(idx) => splice(&out, idx, &tag_block(tags.iter().cloned())),
			None => format!("{}{out}", tags.concat()),
		};
	}

	let unique_js = dedup_preserve_order(js);
	if !unique_js.is_empty() {
		let tags: Vec<String> = unique_js
			.iter()
			.map(|src| format!(r#"<script type="module" src="{public_path}{src}"></script>"#))
			.collect();
		out = match rfind_case_insensitive(&out, "</body>") {
			Some(idx) => splice(&out, idx, &tag_block(tags.iter().cloned())),
			None => format!("{out}{}", tags.concat()),
		};
	}

	out
}

/// Joins tags into the indented, newline-delimited block the spec's literal
/// scenario expects: each tag on its own line indented by two spaces, with a
/// trailing newline so the tag right after the block starts on a fresh line.
fn tag_block(tags: impl Iterator<Item = String>) -> String {
	let mut block = String::new();
	for tag in tags {
		block.push_str("\n  ");
		block.push_str(&tag);
	}
	block.push('\n');
	block
}

fn dedup_preserve_order(items: &[String]) -> Vec<&String> {
	let mut seen = HashSet::new();
	items.iter().filter(|item| seen.insert(item.as_str())).collect()
}

/// Inserts `block` into `haystack` right before byte offset `at`.
fn splice(haystack: &str, at: usize, block: &str) -> String {
	let mut result = String::with_capacity(haystack.len() + block.len());
	result.push_str(&haystack[..at]);
	result.push_str(block);
	result.push_str(&haystack[at..]);
	result
}

/// ASCII-case-insensitive `find`. Lowercasing only ASCII bytes keeps byte
/// offsets aligned with the original string even when it contains non-ASCII
/// UTF-8 elsewhere.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
	haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

fn rfind_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
	haystack.to_ascii_lowercase().rfind(&needle.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(None, "/")]
	#[case(Some(""), "")]
	#[case(Some("/static"), "/static/")]
	#[case(Some("/static/"), "/static/")]
	fn test_normalize_public_path(#[case] input: Option<&str>, #[case] expected: &str) {
		assert_eq!(normalize_public_path(input), expected);
	}

	#[rstest]
	fn test_inject_css_before_head() {
		let html = "<html><head><title>x</title></head><body></body></html>";
		let css = vec!["styles.css".to_string()];
		let out = inject_assets(html, &css, &[], "/");
		assert!(out.contains(r#"<link rel="stylesheet" href="/styles.css">"#));
		let head_close = out.find("</head>").unwrap();
		let link_pos = out.find("<link").unwrap();
		assert!(link_pos < head_close);
	}

	#[rstest]
	fn test_inject_js_before_last_body_close() {
		let html = "<html><head></head><body><p>hi</p></body></html>";
		let js = vec!["app.js".to_string()];
		let out = inject_assets(html, &[], &js, "/static/");
		assert!(out.contains(r#"<script type="module" src="/static/app.js"></script>"#));
		let script_pos = out.find("<script").unwrap();
		let body_close = out.rfind("</body>").unwrap();
		assert!(script_pos < body_close);
	}

	#[rstest]
	fn test_inject_prepends_css_when_head_absent() {
		let html = "<div>no head here</div>";
		let css = vec!["a.css".to_string()];
		let out = inject_assets(html, &css, &[], "");
		assert!(out.starts_with(r#"<link rel="stylesheet" href="a.css">"#));
	}

	#[rstest]
	fn test_inject_appends_js_when_body_absent() {
		let html = "<div>no body here</div>";
		let js = vec!["a.js".to_string()];
		let out = inject_assets(html, &[], &js, "");
		assert!(out.ends_with(r#"<script type="module" src="a.js"></script>"#));
	}

	#[rstest]
	fn test_matching_is_case_insensitive() {
		let html = "<HTML><HEAD></HEAD><BODY></BODY></HTML>";
		let css = vec!["a.css".to_string()];
		let js = vec!["a.js".to_string()];
		let out = inject_assets(html, &css, &js, "/");
		assert!(out.contains("<link"));
		assert!(out.contains("<script"));
	}

	#[rstest]
	fn test_duplicate_entries_emitted_once_in_first_seen_order() {
		let html = "<head></head><body></body>";
		let css = vec!["a.css".to_string(), "b.css".to_string(), "a.css".to_string()];
		let out = inject_assets(html, &css, &[], "/");
		assert_eq!(out.matches("<link").count(), 2);
		let a_pos = out.find("a.css").unwrap();
		let b_pos = out.find("b.css").unwrap();
		assert!(a_pos < b_pos);
	}

	#[rstest]
	fn test_inject_assets_matches_spec_scenario() {
		let html = "<html><head></head><body></body></html>";
		let css = vec!["a.css".to_string()];
		let js = vec!["b.js".to_string()];
		let out = inject_assets(html, &css, &js, "/");

		assert_eq!(
			out,
			"<html><head>\n  <link rel=\"stylesheet\" href=\"/a.css\">\n</head><body>\n  <script type=\"module\" src=\"/b.js\"></script>\n</body></html>"
		);
	}

	#[rstest]
	fn test_no_assets_leaves_html_untouched() {
		let html = "<head></head><body></body>";
		let out = inject_assets(html, &[], &[], "/");
		assert_eq!(out, html);
	}

	#[rstest]
	fn test_engine_does_not_mutate_input_arguments() {
		let html = "<head></head><body></body>".to_string();
		let css = vec!["a.css".to_string()];
		let _ = inject_assets(&html, &css, &[], "/");
		assert_eq!(css, vec!["a.css".to_string()]);
		assert_eq!(html, "<head></head><body></body>");
	}
}
