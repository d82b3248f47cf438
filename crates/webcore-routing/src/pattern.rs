//! Pattern compiler and the bounded FIFO cache of compiled patterns (§4.2,
//! §9 "Shared-resource discipline").

use parking_lot::Mutex;
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;

/// Default bound named in §3 ("bounded, e.g. 2000 entries").
pub const DEFAULT_CACHE_CAPACITY: usize = 2000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
	#[error("pattern {pattern:?} has an unterminated parameter token")]
	UnterminatedToken { pattern: String },
	#[error("pattern {pattern:?} has an empty parameter name (`[]`)")]
	EmptyParamName { pattern: String },
	#[error("pattern {pattern:?} has an invalid parameter name {name:?}")]
	InvalidParamName { pattern: String, name: String },
	#[error("pattern {pattern:?} repeats parameter name {name:?}")]
	DuplicateParamName { pattern: String, name: String },
	#[error("pattern {pattern:?} failed to compile to a regex: {source}")]
	RegexCompile { pattern: String, source: String },
}

/// A compiled route pattern: an anchored regex plus the parameter names in
/// the order their capture groups appear.
#[derive(Debug)]
pub struct CompiledPattern {
	pub regex: Regex,
	pub param_names: Vec<String>,
}

/// Validates a captured `[name]` token per the parameter-name constraint
/// (`^[a-zA-Z][a-zA-Z0-9_]*$`).
fn validate_param_name(name: &str, pattern: &str) -> Result<(), PatternError> {
	if name.is_empty() {
		return Err(PatternError::EmptyParamName {
			pattern: pattern.to_string(),
		});
	}
	let mut chars = name.chars();
	let first_ok = chars.next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false);
	let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
	if !first_ok || !rest_ok {
		return Err(PatternError::InvalidParamName {
			pattern: pattern.to_string(),
			name: name.to_string(),
		});
	}
	Ok(())
}

/// Compiles a raw pattern string like `"blog/[category]/[slug]"` into an
/// anchored regex and its ordered parameter names (§4.2).
///
/// Literal bytes surrounding `[name]` tokens are regex-escaped so that route
/// segments containing `.`, `+`, `*`, `(`, `)`, `|`, `^`, `$`, `\`, or `?`
/// never silently match the wrong path (§9 "Regex escaping").
pub fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
	let mut param_names = Vec::new();
	let mut seen_names: HashSet<String> = HashSet::new();
	let mut regex_src = String::from("^");
	let mut literal_start = 0usize;
	let mut cursor = 0usize;

	while cursor < pattern.len() {
		if pattern.as_bytes()[cursor] == b'[' {
			regex_src.push_str(&regex::escape(&pattern[literal_start..cursor]));

			let close_offset = pattern[cursor..]
				.find(']')
				.ok_or_else(|| PatternError::UnterminatedToken {
					pattern: pattern.to_string(),
				})?;
			let close = cursor + close_offset;
			let name = &pattern[cursor + 1..close];

			validate_param_name(name, pattern)?;
			if !seen_names.insert(name.to_string()) {
				return Err(PatternError::DuplicateParamName {
					pattern: pattern.to_string(),
					name: name.to_string(),
				});
			}

			param_names.push(name.to_string());
			regex_src.push_str("([^/]+)");

			cursor = close + 1;
			literal_start = cursor;
		} else {
			cursor += 1;
		}
	}
	regex_src.push_str(&regex::escape(&pattern[literal_start..]));
	regex_src.push('$');

	let regex = Regex::new(&regex_src).map_err(|e| PatternError::RegexCompile {
		pattern: pattern.to_string(),
		source: e.to_string(),
	})?;

	Ok(CompiledPattern { regex, param_names })
}

struct CacheInner {
	map: HashMap<String, Arc<CompiledPattern>>,
	order: VecDeque<String>,
	capacity: usize,
}

/// A process-local, bounded FIFO cache of compiled patterns, keyed by the
/// raw pattern string. Internally synchronized so all read-only engines can
/// share one instance across requests (§5 "Shared-resource discipline").
pub struct PatternCache {
	inner: Mutex<CacheInner>,
}

impl PatternCache {
	pub fn new(capacity: usize) -> Self {
		Self {
			inner: Mutex::new(CacheInner {
				map: HashMap::new(),
				order: VecDeque::new(),
				capacity,
			}),
		}
	}

	pub fn len(&self) -> usize {
		self.inner.lock().map.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the cached compiled pattern, compiling and inserting it (with
	/// FIFO eviction if at capacity) on a miss.
	pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<CompiledPattern>, PatternError> {
		{
			let inner = self.inner.lock();
			if let Some(compiled) = inner.map.get(pattern) {
				return Ok(Arc::clone(compiled));
			}
		}

		let compiled = Arc::new(compile(pattern)?);

		let mut inner = self.inner.lock();
		// Another task may have raced us; prefer the winner already stored.
		if let Some(existing) = inner.map.get(pattern) {
			return Ok(Arc::clone(existing));
		}
		if inner.order.len() >= inner.capacity {
			if let Some(evicted) = inner.order.pop_front() {
				inner.map.remove(&evicted);
			}
		}
		inner.order.push_back(pattern.to_string());
		inner.map.insert(pattern.to_string(), Arc::clone(&compiled));
		Ok(compiled)
	}
}

impl Default for PatternCache {
	fn default() -> Self {
		Self::new(DEFAULT_CACHE_CAPACITY)
	}
}
