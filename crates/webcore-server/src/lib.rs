//! Request pipeline orchestration, module loading, and the dev hot-replace
//! engine for the webcore SSR runtime. The `webcore-serve` binary wires
//! these onto a concrete hyper server.

pub mod config;
pub mod hotreplace;
pub mod loader;
pub mod pipeline;

pub use config::{ServeConfig, ServeConfigBuilder};
pub use hotreplace::{format_sse_event, HotReplaceConfig, HotReplaceEngine, HotReplaceError, HotReplacePayload};
pub use loader::{ErrorPages, LoaderError, ModuleSource, RenderFn, RenderModuleRegistry, RenderOutput};
pub use pipeline::{is_within_root, Pipeline};
