//! Weak ETag computation, HTTP-date formatting, and conditional-GET
//! comparisons (§4.6 steps 4 and 6).

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Computes `W/"<size-hex>-<mtime-ms-hex>"` from a file's metadata.
pub fn weak_etag(size: u64, modified: SystemTime) -> String {
	let mtime_ms = modified
		.duration_since(SystemTime::UNIX_EPOCH)
		.map(|d| d.as_millis())
		.unwrap_or(0);
	format!("W/\"{size:x}-{mtime_ms:x}\"")
}

/// Formats a [`SystemTime`] as an RFC 1123 HTTP-date, e.g.
/// `"Wed, 21 Oct 2015 07:28:00 GMT"`.
pub fn http_date(time: SystemTime) -> String {
	let dt: DateTime<Utc> = time.into();
	dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `If-None-Match` matches if any ETag in the comma-separated header value
/// equals `etag`, or the header is the wildcard `*`.
pub fn if_none_match_hits(header_value: &str, etag: &str) -> bool {
	let trimmed = header_value.trim();
	if trimmed == "*" {
		return true;
	}
	trimmed.split(',').map(|v| v.trim()).any(|v| v == etag)
}

/// `If-Modified-Since` hits when the resource's mtime (truncated to second
/// precision, per HTTP-date granularity) is no later than the header's
/// parsed date.
pub fn if_modified_since_hits(header_value: &str, modified: SystemTime) -> bool {
	let Ok(since) = DateTime::parse_from_rfc2822(header_value) else {
		return false;
	};
	let mtime_secs = modified
		.duration_since(SystemTime::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0);
	mtime_secs <= since.timestamp() as u64
}
