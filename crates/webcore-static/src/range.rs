//! Byte-range parsing (§4.6 step 8). Only a single `bytes=start-end` range
//! is supported, matching the specification's scope.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
	pub start: u64,
	pub end: u64,
}

impl ByteRange {
	pub fn len(&self) -> u64 {
		self.end - self.start + 1
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
	/// No `Range` header, or a header this engine doesn't support parsing;
	/// serve the full identity body.
	Absent,
	/// A valid, satisfiable single range.
	Satisfiable(ByteRange),
	/// A syntactically parseable but out-of-bounds range: 416.
	Unsatisfiable,
}

/// Parses a `Range` header against a resource of `size` bytes.
///
/// Only the single-range form `bytes=start-end` (with either bound
/// optional) is handled; anything else is treated as `Absent` so the
/// pipeline falls back to a full 200 response rather than erroring.
pub fn parse_range(header_value: &str, size: u64) -> RangeOutcome {
	let Some(spec) = header_value.strip_prefix("bytes=") else {
		return RangeOutcome::Absent;
	};
	// Reject multi-range requests; we only implement a single range.
	if spec.contains(',') {
		return RangeOutcome::Absent;
	}

	let Some((start_str, end_str)) = spec.split_once('-') else {
		return RangeOutcome::Absent;
	};

	if size == 0 {
		return RangeOutcome::Unsatisfiable;
	}

	let range = match (start_str.trim(), end_str.trim()) {
		("", "") => return RangeOutcome::Absent,
		("", suffix_len) => {
			// `bytes=-N`: last N bytes.
			let Ok(n) = suffix_len.parse::<u64>() else {
				return RangeOutcome::Absent;
			};
			if n == 0 {
				return RangeOutcome::Unsatisfiable;
			}
			let start = size.saturating_sub(n);
			ByteRange { start, end: size - 1 }
		}
		(start, "") => {
			let Ok(start) = start.parse::<u64>() else {
				return RangeOutcome::Absent;
			};
			if start >= size {
				return RangeOutcome::Unsatisfiable;
			}
			ByteRange { start, end: size - 1 }
		}
		(start, end) => {
			let (Ok(start), Ok(end)) = (start.parse::<u64>(), end.parse::<u64>()) else {
				return RangeOutcome::Absent;
			};
			if start > end || start >= size {
				return RangeOutcome::Unsatisfiable;
			}
			ByteRange {
				start,
				end: end.min(size - 1),
			}
		}
	};

	RangeOutcome::Satisfiable(range)
}
