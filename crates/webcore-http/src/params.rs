//! Insertion-ordered path parameter map.
//!
//! Parameter sets are tiny (a handful of entries per route at most), so a
//! linear `Vec` beats a hash map both in allocation cost and in avoiding any
//! prototype-polluting map base. Insertion order is preserved because it is
//! the order parameter names appear in the compiled pattern.

/// Path parameters extracted from a matched route, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
	entries: Vec<(String, String)>,
}

impl Params {
	pub fn new() -> Self {
		Self { entries: Vec::new() }
	}

	pub fn with_capacity(cap: usize) -> Self {
		Self {
			entries: Vec::with_capacity(cap),
		}
	}

	/// Inserts a parameter, overwriting any existing value for the same name.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(k, _)| *k == name) {
			Some(entry) => entry.1 = value,
			None => self.entries.push((name, value)),
		}
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.entries
			.iter()
			.find(|(k, _)| k == name)
			.map(|(_, v)| v.as_str())
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

impl FromIterator<(String, String)> for Params {
	fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
		let mut params = Params::new();
		for (k, v) in iter {
			params.insert(k, v);
		}
		params
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_insert_and_get() {
		let mut params = Params::new();
		params.insert("slug", "hello-world");

		assert_eq!(params.get("slug"), Some("hello-world"));
		assert_eq!(params.get("missing"), None);
	}

	#[rstest]
	fn test_insert_overwrites_existing() {
		let mut params = Params::new();
		params.insert("id", "1");
		params.insert("id", "2");

		assert_eq!(params.len(), 1);
		assert_eq!(params.get("id"), Some("2"));
	}

	#[rstest]
	fn test_preserves_insertion_order() {
		let mut params = Params::new();
		params.insert("category", "electronics");
		params.insert("slug", "laptop");

		let names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
		assert_eq!(names, vec!["category", "slug"]);
	}
}
