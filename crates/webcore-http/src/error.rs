//! The five-kind error model the request pipeline maps to status codes.
//!
//! Errors raised by middleware, the static engine, or a render function are
//! caught at the pipeline boundary (see `webcore-server::pipeline`) and
//! turned into one of these kinds. The static engine handles most of its own
//! errors internally and only ever surfaces `NotFound`, `Forbidden`, or
//! `RangeNotSatisfiable` to the pipeline.

use http::StatusCode;
use thiserror::Error;

/// The kind of failure, independent of the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
	/// URL too long, malformed percent-encoding, invalid route parameters.
	BadRequest,
	/// Unmatched route or missing static file.
	NotFound,
	/// Path traversal outside the static root.
	Forbidden,
	/// Byte range could not be satisfied against the resource length.
	RangeNotSatisfiable,
	/// Render exception, missing module, or I/O failure while sending.
	InternalError,
}

impl PipelineErrorKind {
	pub fn status_code(self) -> StatusCode {
		match self {
			PipelineErrorKind::BadRequest => StatusCode::BAD_REQUEST,
			PipelineErrorKind::NotFound => StatusCode::NOT_FOUND,
			PipelineErrorKind::Forbidden => StatusCode::FORBIDDEN,
			PipelineErrorKind::RangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
			PipelineErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

/// A pipeline-level error carrying its kind and a message safe to log.
///
/// The `Display` impl is *not* automatically safe to send back to the
/// client as HTML — callers that embed it in an HTML error page must run it
/// through [`escape_html`] first.
#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct PipelineError {
	pub kind: PipelineErrorKind,
	pub message: String,
}

impl PipelineError {
	pub fn new(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	pub fn bad_request(message: impl Into<String>) -> Self {
		Self::new(PipelineErrorKind::BadRequest, message)
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self::new(PipelineErrorKind::NotFound, message)
	}

	pub fn forbidden(message: impl Into<String>) -> Self {
		Self::new(PipelineErrorKind::Forbidden, message)
	}

	pub fn range_not_satisfiable(message: impl Into<String>) -> Self {
		Self::new(PipelineErrorKind::RangeNotSatisfiable, message)
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(PipelineErrorKind::InternalError, message)
	}

	pub fn status_code(&self) -> StatusCode {
		self.kind.status_code()
	}
}

/// Escapes `& < > " '` per the error-page escape rule (§7). Used whenever an
/// error message, a render-module import error, or a hot-replace banner is
/// embedded into HTML.
pub fn escape_html(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	for ch in input.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(ch),
		}
	}
	out
}
