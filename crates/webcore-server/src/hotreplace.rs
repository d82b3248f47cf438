//! Dev hot-replace engine (§4.9): a debounced file watcher that triggers a
//! rebuild, reloads the manifest, invalidates render-module caches, and
//! broadcasts the SSE payload contract to every connected subscriber.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use webcore_http::escape_html;

/// The two shapes an SSE subscriber can receive. `#[serde(untagged)]` keeps
/// each variant's own field set as the entire JSON object — the error
/// variant must carry *only* `body`, with no sibling keys.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HotReplacePayload {
	Success {
		body: String,
		assets: HotReplaceAssets,
		#[serde(rename = "publicPath")]
		public_path: String,
	},
	Error {
		body: String,
	},
}

#[derive(Debug, Clone, Serialize)]
pub struct HotReplaceAssets {
	pub css: Vec<String>,
	pub js: Vec<String>,
}

impl HotReplacePayload {
	/// Builds the error payload, escaping `message` per the HTML-escape rule
	/// so it is safe to splice into the client's error banner.
	pub fn error(message: &str) -> Self {
		Self::Error {
			body: escape_html(message),
		}
	}
}

/// Formats one SSE record per §4.9: `id: hot-replace\ndata: <json>\nretry:
/// 250\n\n`.
pub fn format_sse_event(payload: &HotReplacePayload) -> String {
	let json = serde_json::to_string(payload).expect("HotReplacePayload always serializes");
	format!("id: hot-replace\ndata: {json}\nretry: 250\n\n")
}

#[derive(Debug, Error)]
pub enum HotReplaceError {
	#[error("manifest reload failed: {0}")]
	ManifestReload(String),
	#[error("failed to spawn build command: {0}")]
	BuildSpawn(String),
	#[error("failed to watch {path}: {source}")]
	Watch {
		path: PathBuf,
		#[source]
		source: notify::Error,
	},
}

/// Broadcasts [`HotReplacePayload`]s to every subscribed SSE connection.
/// Cloning is cheap; all clones share the same underlying channel.
#[derive(Clone)]
pub struct HotReplaceEngine {
	sender: broadcast::Sender<HotReplacePayload>,
}

impl HotReplaceEngine {
	pub fn new(capacity: usize) -> Self {
		let (sender, _receiver) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<HotReplacePayload> {
		self.sender.subscribe()
	}

	/// Sends `payload` to every current subscriber. No subscribers is not
	/// an error — a dev server may start before any page is open.
	pub fn broadcast(&self, payload: HotReplacePayload) {
		let _ = self.sender.send(payload);
	}
}

impl Default for HotReplaceEngine {
	fn default() -> Self {
		Self::new(16)
	}
}

/// Parameters for the debounced watch loop.
pub struct HotReplaceConfig {
	pub watch_root: PathBuf,
	pub debounce: Duration,
	pub build_command: Vec<String>,
	pub manifest_reload_retries: u32,
	pub manifest_reload_delay: Duration,
}

impl Default for HotReplaceConfig {
	fn default() -> Self {
		Self {
			watch_root: PathBuf::from("src"),
			debounce: Duration::from_millis(150),
			build_command: vec!["npm".to_string(), "run".to_string(), "build".to_string()],
			manifest_reload_retries: 3,
			manifest_reload_delay: Duration::from_millis(100),
		}
	}
}

/// Runs the watch → rebuild → reload → broadcast loop until the debouncer's
/// channel closes. `reload_manifest` and `invalidate_render_cache` are
/// injected so this module stays agnostic to the concrete manifest/registry
/// types living in `webcore-server::loader`.
pub async fn run_watch_loop<ReloadFut>(
	engine: HotReplaceEngine,
	config: HotReplaceConfig,
	invalidate_render_cache: impl Fn() + Send + Sync + 'static,
	reload_manifest: impl Fn() -> ReloadFut + Send + Sync + 'static,
) -> Result<(), HotReplaceError>
where
	ReloadFut: std::future::Future<Output = Result<HotReplacePayload, HotReplaceError>> + Send,
{
	use notify_debouncer_mini::{new_debouncer, DebounceEventResult};

	let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<DebounceEventResult>();
	let mut debouncer =
		new_debouncer(config.debounce, move |result| {
			let _ = event_tx.send(result);
		})
		.map_err(|source| HotReplaceError::Watch {
			path: config.watch_root.clone(),
			source,
		})?;
	debouncer
		.watcher()
		.watch(&config.watch_root, notify::RecursiveMode::Recursive)
		.map_err(|source| HotReplaceError::Watch {
			path: config.watch_root.clone(),
			source,
		})?;

	while let Some(result) = event_rx.recv().await {
		if result.is_err() {
			continue;
		}

		let mut command = tokio::process::Command::new(&config.build_command[0]);
		command.args(&config.build_command[1..]);
		let output = command.output().await;

		let build_error = match &output {
			Ok(out) if !out.status.success() => Some(String::from_utf8_lossy(&out.stderr).into_owned()),
			Err(err) => Some(err.to_string()),
			Ok(_) => None,
		};

		if let Some(message) = build_error {
			// The accumulated error is cleared by the act of broadcasting it
			// — nothing retains it after this call.
			engine.broadcast(HotReplacePayload::error(&message));
			continue;
		}

		let mut attempt = 0u32;
		loop {
			attempt += 1;
			match reload_manifest().await {
				Ok(payload) => {
					invalidate_render_cache();
					engine.broadcast(payload);
					break;
				}
				Err(err) if attempt < config.manifest_reload_retries => {
					tracing::warn!(attempt, error = %err, "manifest reload failed, retrying");
					tokio::time::sleep(config.manifest_reload_delay).await;
				}
				Err(err) => {
					tracing::error!(error = %err, "manifest reload failed after all retries");
					break;
				}
			}
		}
	}

	Ok(())
}
