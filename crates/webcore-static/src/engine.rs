//! The static-asset engine (§4.6): ties path resolution, conditional GET,
//! precompressed-variant negotiation, byte ranges, and the MIME table
//! together into a single `serve` entry point.

use crate::cache::cache_control_for;
use crate::compression::{pick_variant, Variant};
use crate::etag::{http_date, if_modified_since_hits, if_none_match_hits, weak_etag};
use crate::path::resolve_safe_path;
use crate::range::{parse_range, RangeOutcome};
use bytes::Bytes;
use http::{Method, StatusCode};
use std::path::{Path, PathBuf};
use webcore_http::{PipelineError, PipelineErrorKind, Response};

const MAX_PATHNAME_BYTES: usize = 1024;

/// Conditional/negotiation headers the caller extracted from the incoming
/// request, plus the bits of the request line the engine needs.
pub struct StaticRequestInfo<'a> {
	pub pathname: &'a str,
	pub method: &'a Method,
	pub accept_encoding: Option<&'a str>,
	pub if_none_match: Option<&'a str>,
	pub if_modified_since: Option<&'a str>,
	pub range: Option<&'a str>,
}

/// Result of attempting to serve `pathname` from the static root.
#[derive(Debug)]
pub enum StaticOutcome {
	/// Preconditions for static serving were not met (bad length/NUL/missing
	/// extension); the pipeline should try the next phase.
	NotHandled,
	/// The extension was recognized but no file (or precompressed sibling)
	/// exists; the pipeline should try the next phase.
	NotFound,
	/// A complete response (200, 206, 304, 403, or 416) ready to return.
	Response(Response),
}

/// Attempts to serve `info.pathname` out of `root` (§4.6's per-request
/// algorithm, steps 1-10).
pub async fn serve(root: &Path, info: &StaticRequestInfo<'_>) -> Result<StaticOutcome, PipelineError> {
	if info.pathname.len() > MAX_PATHNAME_BYTES || info.pathname.as_bytes().contains(&0) {
		return Ok(StaticOutcome::NotHandled);
	}

	let extension = match Path::new(info.pathname).extension().and_then(|e| e.to_str()) {
		Some(ext) if !ext.is_empty() => ext.to_ascii_lowercase(),
		_ => return Ok(StaticOutcome::NotHandled),
	};

	let mime = match mime_guess::from_path(info.pathname).first_raw() {
		Some(mime) => mime,
		None => return Ok(StaticOutcome::NotHandled),
	};

	let candidate = match resolve_safe_path(root, info.pathname) {
		Ok(path) => path,
		Err(err) if err.kind == PipelineErrorKind::Forbidden => {
			return Ok(StaticOutcome::Response(Response::text(
				StatusCode::FORBIDDEN,
				"Forbidden",
			)));
		}
		Err(_) => return Ok(StaticOutcome::NotHandled),
	};

	let Ok(identity_meta) = tokio::fs::metadata(&candidate).await else {
		return Ok(StaticOutcome::NotFound);
	};
	if !identity_meta.is_file() {
		return Ok(StaticOutcome::NotFound);
	}

	let size = identity_meta.len();
	let modified = identity_meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
	let etag = weak_etag(size, modified);
	let last_modified = http_date(modified);

	let variant = pick_variant(&extension, info.accept_encoding);
	let (serve_path, serve_size, served_variant): (PathBuf, u64, Variant) = match variant {
		Variant::Identity => (candidate.clone(), size, Variant::Identity),
		other => {
			let variant_path = variant_sibling_path(&candidate, other);
			match tokio::fs::metadata(&variant_path).await {
				Ok(meta) if meta.is_file() => (variant_path, meta.len(), other),
				_ => (candidate.clone(), size, Variant::Identity),
			}
		}
	};

	if let Some(if_none_match) = info.if_none_match {
		if if_none_match_hits(if_none_match, &etag) {
			return Ok(StaticOutcome::Response(not_modified(&etag, &last_modified)));
		}
	} else if let Some(if_modified_since) = info.if_modified_since {
		if if_modified_since_hits(if_modified_since, modified) {
			return Ok(StaticOutcome::Response(not_modified(&etag, &last_modified)));
		}
	}

	let basename = candidate
		.file_name()
		.and_then(|n| n.to_str())
		.unwrap_or(info.pathname);
	let cache_control = cache_control_for(basename);
	let is_head = info.method == Method::HEAD;

	if served_variant == Variant::Identity {
		if let Some(range_header) = info.range {
			match parse_range(range_header, serve_size) {
				RangeOutcome::Satisfiable(range) => {
					let body = if is_head {
						Bytes::new()
					} else {
						read_range(&serve_path, range.start, range.len()).await?
					};
					let mut response = Response::new(StatusCode::PARTIAL_CONTENT, Default::default(), body);
					apply_common_headers(&mut response, &mime, &etag, &last_modified, cache_control);
					response.set_header("accept-ranges", "bytes");
					response.set_header(
						"content-range",
						format!("bytes {}-{}/{}", range.start, range.end, serve_size),
					);
					response.set_header("content-length", range.len().to_string());
					return Ok(StaticOutcome::Response(response));
				}
				RangeOutcome::Unsatisfiable => {
					let mut response = Response::new(
						StatusCode::RANGE_NOT_SATISFIABLE,
						Default::default(),
						Bytes::new(),
					);
					response.set_header("content-range", format!("bytes */{serve_size}"));
					return Ok(StaticOutcome::Response(response));
				}
				RangeOutcome::Absent => {}
			}
		}
	}

	let body = if is_head {
		Bytes::new()
	} else {
		tokio::fs::read(&serve_path)
			.await
			.map(Bytes::from)
			.map_err(|e| PipelineError::internal(format!("failed to read {}: {e}", serve_path.display())))?
	};

	let mut response = Response::new(StatusCode::OK, Default::default(), body);
	apply_common_headers(&mut response, &mime, &etag, &last_modified, cache_control);
	if served_variant == Variant::Identity {
		response.set_header("accept-ranges", "bytes");
	}
	if let Some(encoding) = served_variant.content_encoding() {
		response.set_header("content-encoding", encoding);
		response.set_header("vary", "Accept-Encoding");
	}
	response.set_header("content-length", serve_size.to_string());

	Ok(StaticOutcome::Response(response))
}

fn variant_sibling_path(identity: &Path, variant: Variant) -> PathBuf {
	let mut name = identity.as_os_str().to_os_string();
	name.push(variant.suffix());
	PathBuf::from(name)
}

fn not_modified(etag: &str, last_modified: &str) -> Response {
	let mut response = Response::new(StatusCode::NOT_MODIFIED, Default::default(), Bytes::new());
	response.set_header("etag", etag.to_string());
	response.set_header("last-modified", last_modified.to_string());
	response
}

fn apply_common_headers(
	response: &mut Response,
	mime: &str,
	etag: &str,
	last_modified: &str,
	cache_control: &str,
) {
	response.set_header("content-type", mime.to_string());
	response.set_header("etag", etag.to_string());
	response.set_header("last-modified", last_modified.to_string());
	response.set_header("cache-control", cache_control.to_string());
}

async fn read_range(path: &Path, start: u64, len: u64) -> Result<Bytes, PipelineError> {
	use tokio::io::{AsyncReadExt, AsyncSeekExt};

	let mut file = tokio::fs::File::open(path)
		.await
		.map_err(|e| PipelineError::internal(format!("failed to open {}: {e}", path.display())))?;
	file.seek(std::io::SeekFrom::Start(start))
		.await
		.map_err(|e| PipelineError::internal(format!("failed to seek {}: {e}", path.display())))?;
	let mut buf = vec![0u8; len as usize];
	file.read_exact(&mut buf)
		.await
		.map_err(|e| PipelineError::internal(format!("failed to read range of {}: {e}", path.display())))?;
	Ok(Bytes::from(buf))
}
