//! Precompressed-variant negotiation (§4.6 step 5).

use std::collections::HashSet;

/// Extensions eligible for `.br`/`.gz` sibling-file negotiation.
pub const COMPRESSIBLE_EXTENSIONS: &[&str] = &[
	"html", "htm", "js", "mjs", "css", "svg", "json", "xml", "txt", "md", "csv", "webmanifest", "map",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
	Identity,
	Brotli,
	Gzip,
}

impl Variant {
	pub fn suffix(self) -> &'static str {
		match self {
			Variant::Identity => "",
			Variant::Brotli => ".br",
			Variant::Gzip => ".gz",
		}
	}

	pub fn content_encoding(self) -> Option<&'static str> {
		match self {
			Variant::Identity => None,
			Variant::Brotli => Some("br"),
			Variant::Gzip => Some("gzip"),
		}
	}
}

pub fn is_compressible(extension: &str) -> bool {
	COMPRESSIBLE_EXTENSIONS.contains(&extension)
}

/// Parses an `Accept-Encoding` header into the set of tokens the client
/// accepts (ignores `q` weighting; any non-zero-weighted mention counts).
fn accepted_encodings(accept_encoding: &str) -> HashSet<String> {
	accept_encoding
		.split(',')
		.filter_map(|token| {
			let name = token.split(';').next()?.trim().to_ascii_lowercase();
			let is_rejected = token
				.split(';')
				.nth(1)
				.map(|q| q.trim().eq_ignore_ascii_case("q=0"))
				.unwrap_or(false);
			if name.is_empty() || is_rejected {
				None
			} else {
				Some(name)
			}
		})
		.collect()
}

/// Picks the precompressed variant to prefer: brotli first, then gzip, else
/// identity. Only consulted when `extension` is in the compressible set.
pub fn pick_variant(extension: &str, accept_encoding: Option<&str>) -> Variant {
	if !is_compressible(extension) {
		return Variant::Identity;
	}
	let Some(header) = accept_encoding else {
		return Variant::Identity;
	};
	let accepted = accepted_encodings(header);
	if accepted.contains("br") {
		Variant::Brotli
	} else if accepted.contains("gzip") {
		Variant::Gzip
	} else {
		Variant::Identity
	}
}
