//! The production request pipeline (§4.5): orchestrates the middleware
//! chain, static-asset lookup, generated/dynamic route matching, rendering,
//! asset injection, and the uniform security-header / HEAD-shaping
//! post-processing every response goes through.

use crate::hotreplace::{HotReplaceAssets, HotReplacePayload};
use crate::loader::{ErrorPages, ModuleSource, RenderModuleRegistry};
use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use webcore_assets::inject_assets;
use webcore_http::security::{head_shape, SecurityHeaders};
use webcore_http::{Request, Response};
use webcore_middleware::{run_chain, Middleware, MiddlewareOutcome};
use webcore_routing::{normalize, RouteMatch, RouteMatcher};
use webcore_static::{serve as serve_static, StaticOutcome, StaticRequestInfo};

const MAX_RAW_TARGET_BYTES: usize = 2048;

/// Everything one call to [`handle_request`] needs, bundled so adapters
/// (the hyper server, tests) don't have to thread ten parameters through.
pub struct Pipeline<S: ModuleSource> {
	// Swappable so a dev-mode manifest reload can install a new matcher
	// without restarting the server; a write-lock swap means an in-flight
	// request observes either the old or the new manifest coherently,
	// never a half-updated one (§5).
	pub matcher: parking_lot::RwLock<Arc<RouteMatcher>>,
	pub static_root: PathBuf,
	pub public_path: String,
	pub registry: Arc<RenderModuleRegistry<S>>,
	pub error_pages: ErrorPages,
	pub security: SecurityHeaders,
	pub middleware: Vec<Option<Arc<dyn Middleware<(), Response = Response>>>>,
	pub dev: bool,
}

impl<S: ModuleSource> Pipeline<S> {
	/// Runs the full pipeline for `request` and returns a finished
	/// response: security headers merged in and, for HEAD requests, the
	/// body dropped.
	#[tracing::instrument(skip(self, request), fields(method = %request.method(), path = request.raw_target()))]
	pub async fn handle_request(&self, request: &Request) -> Response {
		let mut response = self.handle_inner(request).await;
		self.security.apply(&mut response);
		if request.is_head() {
			response = head_shape(response);
		}
		response
	}

	async fn handle_inner(&self, request: &Request) -> Response {
		// Step 1: raw-target length check, ahead of any decoding.
		if request.raw_target().len() > MAX_RAW_TARGET_BYTES {
			return Response::text(StatusCode::URI_TOO_LONG, "URI Too Long");
		}

		// Step 2.
		if request.is_options() {
			return Response::no_content();
		}

		// Step 3: middleware chain.
		match run_chain(&self.middleware, request, &()).await {
			Ok(MiddlewareOutcome::Respond(response)) => return response,
			Ok(MiddlewareOutcome::Continue) => {}
			Err(err) => {
				tracing::error!(error = %err, "middleware raised an error");
				return self.error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).await;
			}
		}

		// Step 4: decode the pathname.
		let pathname = match normalize(request.raw_target()) {
			Ok(pathname) => pathname,
			Err(err) => return Response::text(StatusCode::BAD_REQUEST, err.message.clone()),
		};

		// Step 5: static-asset service.
		let static_info = StaticRequestInfo {
			pathname: &pathname,
			method: request.method(),
			accept_encoding: request.header("accept-encoding"),
			if_none_match: request.header("if-none-match"),
			if_modified_since: request.header("if-modified-since"),
			range: request.header("range"),
		};
		match serve_static(&self.static_root, &static_info).await {
			Ok(StaticOutcome::Response(response)) => return response,
			Ok(StaticOutcome::NotHandled) | Ok(StaticOutcome::NotFound) => {}
			Err(err) => {
				tracing::error!(error = %err, "static engine failed");
				return self.error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).await;
			}
		}

		// Steps 6-7: generated vs. dynamic route match.
		match self.matcher.read().match_path(&pathname) {
			RouteMatch::Invalid => Response::text(StatusCode::BAD_REQUEST, "Bad Request"),
			RouteMatch::NoMatch => self.not_found_response().await,
			RouteMatch::Matched { route, params: _ } if route.generated => {
				self.serve_generated(&route.filename).await
			}
			RouteMatch::Matched { route, params } => self.render_dynamic(&route, &params).await,
		}
	}

	async fn serve_generated(&self, filename: &str) -> Response {
		let path = self.static_root.join(filename);
		match tokio::fs::read(&path).await {
			Ok(bytes) => {
				let mut response = Response::html(StatusCode::OK, Bytes::from(bytes));
				let cache_control = webcore_static::cache::cache_control_for(filename);
				response.set_header("cache-control", cache_control.to_string());
				response
			}
			Err(err) => {
				tracing::error!(error = %err, file = %path.display(), "failed to read generated route");
				self.error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).await
			}
		}
	}

	async fn render_dynamic(&self, route: &webcore_routing::RouteEntry, params: &webcore_http::Params) -> Response {
		let render_fn = match self.registry.load(&route.jsx, self.dev, self.dev).await {
			Ok(render_fn) => render_fn,
			Err(err) => {
				tracing::error!(error = %err, jsx = %route.jsx, "render module missing");
				return self.error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).await;
			}
		};

		match render_fn.render(params).await {
			Ok(output) => self.finish_render(output, &route.assets.css, &route.assets.js),
			Err(err) => {
				tracing::error!(error = %err, jsx = %route.jsx, "render function raised an error");
				self.error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).await
			}
		}
	}

	fn finish_render(&self, output: String, css: &[String], js: &[String]) -> Response {
		if output.trim_start().starts_with("<html") {
			let injected = inject_assets(&output, css, js, &self.public_path);
			Response::html(StatusCode::OK, format!("<!doctype html>\n{injected}"))
		} else {
			Response::html(StatusCode::OK, output)
		}
	}

	async fn not_found_response(&self) -> Response {
		match &self.error_pages.not_found {
			Some(render_fn) => match render_fn.render(&webcore_http::Params::new()).await {
				Ok(output) => {
					let mut response = self.finish_render(output, &[], &[]);
					response.set_status(StatusCode::NOT_FOUND);
					response.set_header("cache-control", "must-revalidate");
					response
				}
				Err(err) => {
					tracing::error!(error = %err, "custom 404 page failed to render");
					Response::text(StatusCode::NOT_FOUND, "Not Found")
				}
			},
			None => Response::text(StatusCode::NOT_FOUND, "Not Found"),
		}
	}

	async fn error_response(&self, status: StatusCode, message: String) -> Response {
		if status == StatusCode::INTERNAL_SERVER_ERROR {
			if let Some(render_fn) = &self.error_pages.server_error {
				match render_fn.render(&webcore_http::Params::new()).await {
					Ok(output) => {
						let mut response = self.finish_render(output, &[], &[]);
						response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
						response.set_header("cache-control", "no-store");
						return response;
					}
					Err(err) => {
						tracing::error!(error = %err, "custom 500 page itself failed; falling back to plain text");
					}
				}
			}
		}
		let mut response = Response::text(status, message);
		if status == StatusCode::INTERNAL_SERVER_ERROR {
			response.set_header("cache-control", "no-store");
		}
		response
	}
	/// Re-renders `pathname` for the dev hot-replace SSE stream (§4.9):
	/// a dynamic-route match renders fresh and its `<body>` content is
	/// extracted for the client to splice in; anything else (no match, a
	/// generated route, a render failure) reports as an error payload so the
	/// client falls back to a full reload.
	pub async fn render_payload_for(&self, pathname: &str) -> HotReplacePayload {
		match self.matcher.read().match_path(pathname) {
			RouteMatch::Matched { route, params } if !route.generated => {
				let render_fn = match self.registry.load(&route.jsx, true, false).await {
					Ok(render_fn) => render_fn,
					Err(err) => return HotReplacePayload::error(&err.to_string()),
				};
				match render_fn.render(&params).await {
					Ok(output) => HotReplacePayload::Success {
						body: extract_body(&output),
						assets: HotReplaceAssets {
							css: route.assets.css.clone(),
							js: route.assets.js.clone(),
						},
						public_path: self.public_path.clone(),
					},
					Err(err) => HotReplacePayload::error(&err.to_string()),
				}
			}
			_ => HotReplacePayload::error("route is not a re-renderable dynamic page"),
		}
	}

	/// Installs `manifest` as the live matcher (§4.9 manifest reload).
	/// In-flight requests holding the previous `Arc<RouteMatcher>` keep
	/// running against it to completion; new requests see the new one as
	/// soon as this call returns.
	pub fn set_manifest(&self, manifest: webcore_routing::RouteManifest) {
		*self.matcher.write() = Arc::new(RouteMatcher::new(manifest));
	}
}

/// Returns whether `path` escapes `root`, re-exported for adapters that
/// want to validate an `--out-dir` before starting.
pub fn is_within_root(root: &Path, path: &Path) -> bool {
	path.starts_with(root)
}

/// Extracts the content between the first `<body ...>` and last `</body>`
/// tags, case-insensitively; returns the whole string unchanged if either
/// tag is absent.
fn extract_body(html: &str) -> String {
	let lower = html.to_ascii_lowercase();
	let open_tag_start = match lower.find("<body") {
		Some(index) => index,
		None => return html.to_string(),
	};
	let open_tag_end = match lower[open_tag_start..].find('>') {
		Some(offset) => open_tag_start + offset + 1,
		None => return html.to_string(),
	};
	let close_tag_start = match lower.rfind("</body>") {
		Some(index) if index >= open_tag_end => index,
		_ => return html.to_string(),
	};
	html[open_tag_end..close_tag_start].to_string()
}
