//! Static-asset engine: MIME lookup, conditional GET, byte-range, and
//! precompressed-variant negotiation against a filesystem root.

pub mod cache;
pub mod compression;
pub mod engine;
pub mod etag;
pub mod path;
pub mod range;

pub use compression::{Variant, COMPRESSIBLE_EXTENSIONS};
pub use engine::{serve, StaticOutcome, StaticRequestInfo};
pub use path::resolve_safe_path;
