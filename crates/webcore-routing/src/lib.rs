//! Route manifest schema, pattern compiler, URL normalizer, and matcher.
//!
//! This is the "hard part" of resolving an incoming pathname to a
//! [`RouteEntry`] and a set of extracted [`webcore_http::Params`]. See
//! `manifest`, `pattern`, `normalize`, and `matcher` for the four pieces the
//! specification splits this into.

pub mod manifest;
pub mod matcher;
pub mod normalize;
pub mod pattern;

pub use manifest::{ManifestError, RouteAssets, RouteEntry, RouteManifest};
pub use matcher::{RouteMatch, RouteMatcher};
pub use normalize::normalize;
pub use pattern::{CompiledPattern, PatternCache, PatternError};
