//! Shared HTTP core for the webcore SSR runtime.
//!
//! This crate is the seam every platform adapter talks through: a small
//! `Request`/`Response` vocabulary built directly on the `http` crate, the
//! error kinds the pipeline maps to status codes, default security headers,
//! and the HEAD-shaping helper applied uniformly before a response leaves
//! the pipeline.

pub mod error;
pub mod params;
pub mod request;
pub mod response;
pub mod security;

pub use error::{escape_html, PipelineError, PipelineErrorKind};
pub use params::Params;
pub use request::Request;
pub use response::Response;
pub use security::{head_shape, SecurityHeaders};
