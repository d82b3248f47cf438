//! Render-module loader and error-page resolver (§4.8).
//!
//! The original JS runtime resolves a render function through a dynamic
//! `import()`, preferring the module's default export and falling back to a
//! named `jsx` export. There is no dynamic-import equivalent in a compiled
//! Rust binary, so the analogous seam is [`ModuleSource`]: whatever
//! mechanism actually produces a [`RenderFn`] for a key (a static registry
//! built by the bundler, a dynamic-library reload, ...) implements it, and
//! this loader owns only the caching, cache-busting, and error-stub
//! behavior §4.8 describes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use webcore_http::{escape_html, Params};

pub type RenderOutput = String;

#[derive(Debug, Error)]
pub enum LoaderError {
	#[error("render module {key:?} has neither a default export nor a named `jsx` export")]
	MissingExport { key: String },
	#[error("failed to load render module {key:?}: {message}")]
	LoadFailed { key: String, message: String },
}

/// A resolved render function: `(params) -> html | Promise<html>` in the
/// original signature (§6.8), `async fn render` here.
#[async_trait]
pub trait RenderFn: Send + Sync {
	async fn render(&self, params: &Params) -> Result<RenderOutput, LoaderError>;
}

/// Produces a [`RenderFn`] for a manifest `jsx` key. Implementations own
/// whatever mechanism resolves that key to actual render code.
#[async_trait]
pub trait ModuleSource: Send + Sync {
	async fn load(&self, key: &str) -> Result<Arc<dyn RenderFn>, LoaderError>;
}

struct ErrorStub {
	message: String,
}

#[async_trait]
impl RenderFn for ErrorStub {
	async fn render(&self, _params: &Params) -> Result<RenderOutput, LoaderError> {
		Ok(format!("<pre>{}</pre>", escape_html(&self.message)))
	}
}

/// Caches resolved render functions by their manifest key, per §4.8.
pub struct RenderModuleRegistry<S> {
	source: S,
	cache: parking_lot::Mutex<HashMap<String, Arc<dyn RenderFn>>>,
	// One lock per in-flight (or previously seen) key, so concurrent misses on
	// the same key await a single `source.load` instead of racing it (§5).
	load_locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: ModuleSource> RenderModuleRegistry<S> {
	pub fn new(source: S) -> Self {
		Self {
			source,
			cache: parking_lot::Mutex::new(HashMap::new()),
			load_locks: parking_lot::Mutex::new(HashMap::new()),
		}
	}

	fn load_lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
		let mut locks = self.load_locks.lock();
		Arc::clone(
			locks
				.entry(key.to_string())
				.or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
		)
	}

	/// Resolves `key`, honoring the cache unless `bust_cache` is set (the
	/// dev-mode cache-busting import, §6.5 `DEV`). On a load failure, caches
	/// and returns an escaped-`<pre>` error stub when `return_error_stub` is
	/// true (dev); otherwise propagates the error (prod).
	pub async fn load(
		&self,
		key: &str,
		bust_cache: bool,
		return_error_stub: bool,
	) -> Result<Arc<dyn RenderFn>, LoaderError> {
		if !bust_cache {
			if let Some(cached) = self.cache.lock().get(key) {
				return Ok(Arc::clone(cached));
			}
		}

		// Serialize concurrent misses on the same key: the first caller
		// through does the real load, everyone else waits and then hits the
		// cache re-check below instead of calling `source.load` again.
		let key_lock = self.load_lock_for(key);
		let _guard = key_lock.lock().await;

		if !bust_cache {
			if let Some(cached) = self.cache.lock().get(key) {
				return Ok(Arc::clone(cached));
			}
		}

		match self.source.load(key).await {
			Ok(render_fn) => {
				self.cache.lock().insert(key.to_string(), Arc::clone(&render_fn));
				Ok(render_fn)
			}
			Err(err) => {
				if return_error_stub {
					tracing::warn!(key, error = %err, "render module failed to load; serving error stub");
					let stub: Arc<dyn RenderFn> = Arc::new(ErrorStub {
						message: err.to_string(),
					});
					self.cache.lock().insert(key.to_string(), Arc::clone(&stub));
					Ok(stub)
				} else {
					Err(err)
				}
			}
		}
	}

	/// Invalidates every cached render function (hot-replace manifest
	/// reload, §4.9).
	pub fn invalidate_all(&self) {
		self.cache.lock().clear();
	}
}

/// The optional `404`/`500` render functions (§4.8 `loadErrorPages`).
#[derive(Clone, Default)]
pub struct ErrorPages {
	pub not_found: Option<Arc<dyn RenderFn>>,
	pub server_error: Option<Arc<dyn RenderFn>>,
}

/// Loads both error pages independently; a failure on one is logged and
/// does not prevent the other from loading.
pub async fn load_error_pages<S: ModuleSource>(
	registry: &RenderModuleRegistry<S>,
	key_404: Option<&str>,
	key_500: Option<&str>,
) -> ErrorPages {
	let not_found = match key_404 {
		Some(key) => match registry.load(key, false, false).await {
			Ok(render_fn) => Some(render_fn),
			Err(err) => {
				tracing::warn!(key, error = %err, "failed to load 404 render module");
				None
			}
		},
		None => None,
	};

	let server_error = match key_500 {
		Some(key) => match registry.load(key, false, false).await {
			Ok(render_fn) => Some(render_fn),
			Err(err) => {
				tracing::warn!(key, error = %err, "failed to load 500 render module");
				None
			}
		},
		None => None,
	};

	ErrorPages { not_found, server_error }
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct EchoRenderFn(String);

	#[async_trait]
	impl RenderFn for EchoRenderFn {
		async fn render(&self, _params: &Params) -> Result<RenderOutput, LoaderError> {
			Ok(self.0.clone())
		}
	}

	struct CountingSource {
		calls: AtomicUsize,
		should_fail: bool,
	}

	#[async_trait]
	impl ModuleSource for CountingSource {
		async fn load(&self, key: &str) -> Result<Arc<dyn RenderFn>, LoaderError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			if self.should_fail {
				Err(LoaderError::LoadFailed {
					key: key.to_string(),
					message: "boom".to_string(),
				})
			} else {
				Ok(Arc::new(EchoRenderFn(format!("rendered:{key}"))))
			}
		}
	}

	#[tokio::test]
	async fn test_caches_by_key() {
		let source = CountingSource {
			calls: AtomicUsize::new(0),
			should_fail: false,
		};
		let registry = RenderModuleRegistry::new(source);

		registry.load("home", false, false).await.unwrap();
		registry.load("home", false, false).await.unwrap();

		assert_eq!(registry.source.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_bust_cache_reloads() {
		let source = CountingSource {
			calls: AtomicUsize::new(0),
			should_fail: false,
		};
		let registry = RenderModuleRegistry::new(source);

		registry.load("home", false, false).await.unwrap();
		registry.load("home", true, false).await.unwrap();

		assert_eq!(registry.source.calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn test_failure_without_stub_propagates() {
		let source = CountingSource {
			calls: AtomicUsize::new(0),
			should_fail: true,
		};
		let registry = RenderModuleRegistry::new(source);

		let err = registry.load("home", false, false).await.unwrap_err();
		assert!(matches!(err, LoaderError::LoadFailed { .. }));
	}

	#[tokio::test]
	async fn test_failure_with_stub_renders_escaped_error() {
		let source = CountingSource {
			calls: AtomicUsize::new(0),
			should_fail: true,
		};
		let registry = RenderModuleRegistry::new(source);

		let render_fn = registry.load("home", false, true).await.unwrap();
		let output = render_fn.render(&Params::new()).await.unwrap();

		assert!(output.starts_with("<pre>"));
		assert!(!output.contains("<script>"));
	}

	#[tokio::test]
	async fn test_invalidate_all_forces_reload() {
		let source = CountingSource {
			calls: AtomicUsize::new(0),
			should_fail: false,
		};
		let registry = RenderModuleRegistry::new(source);

		registry.load("home", false, false).await.unwrap();
		registry.invalidate_all();
		registry.load("home", false, false).await.unwrap();

		assert_eq!(registry.source.calls.load(Ordering::SeqCst), 2);
	}

	struct SlowSource {
		calls: AtomicUsize,
	}

	#[async_trait]
	impl ModuleSource for SlowSource {
		async fn load(&self, key: &str) -> Result<Arc<dyn RenderFn>, LoaderError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			tokio::time::sleep(std::time::Duration::from_millis(20)).await;
			Ok(Arc::new(EchoRenderFn(format!("rendered:{key}"))))
		}
	}

	#[tokio::test]
	async fn test_concurrent_loads_of_same_key_dedupe_to_one_import() {
		let registry = Arc::new(RenderModuleRegistry::new(SlowSource {
			calls: AtomicUsize::new(0),
		}));

		let a = Arc::clone(&registry);
		let b = Arc::clone(&registry);
		let (first, second) = tokio::join!(
			tokio::spawn(async move { a.load("home", false, false).await }),
			tokio::spawn(async move { b.load("home", false, false).await }),
		);

		first.unwrap().unwrap();
		second.unwrap().unwrap();
		assert_eq!(registry.source.calls.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_load_error_pages_tolerates_one_failure() {
		let source = CountingSource {
			calls: AtomicUsize::new(0),
			should_fail: true,
		};
		let registry = RenderModuleRegistry::new(source);

		let pages = load_error_pages(&registry, Some("404"), None).await;

		assert!(pages.not_found.is_none());
		assert!(pages.server_error.is_none());
	}
}
