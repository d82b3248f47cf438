//! `webcore-serve`: the hyper-backed HTTP adapter for the webcore SSR
//! runtime. Converts `hyper::Request`/`Response` to and from the
//! transport-agnostic `webcore_http` vocabulary and wires the request
//! pipeline, the dev hot-replace SSE stream, and `--dev`-mode file watching.

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use webcore_routing::RouteMatcher;
use webcore_server::hotreplace::{format_sse_event, HotReplaceConfig, HotReplaceEngine};
use webcore_server::loader::{ErrorPages, LoaderError, ModuleSource, RenderFn, RenderModuleRegistry};
use webcore_server::{Pipeline, ServeConfig};

const HOT_REPLACE_CLIENT_SCRIPT: &str = include_str!("../../assets/hot-replace.js");

#[derive(Parser, Debug)]
#[command(name = "webcore-serve")]
#[command(about = "Serves a built webcore site")]
struct Args {
	#[arg(long)]
	port: Option<u16>,

	#[arg(long)]
	public_path: Option<String>,

	#[arg(long, default_value = "dist")]
	out_dir: String,

	#[arg(long)]
	dev: bool,
}

/// Placeholder [`ModuleSource`]: a real build emits a registry that knows
/// how to resolve a `jsx` key to generated render code. This adapter leaves
/// that seam to the bundler-specific integration.
struct MissingModuleSource;

#[async_trait::async_trait]
impl ModuleSource for MissingModuleSource {
	async fn load(&self, key: &str) -> Result<Arc<dyn RenderFn>, LoaderError> {
		Err(LoaderError::MissingExport { key: key.to_string() })
	}
}

async fn to_webcore_request(req: hyper::Request<Incoming>) -> Result<webcore_http::Request, hyper::Error> {
	let (parts, body) = req.into_parts();
	let bytes = body.collect().await?.to_bytes();
	Ok(webcore_http::Request::new(parts.method, parts.uri, parts.headers, bytes))
}

fn to_hyper_response(response: webcore_http::Response) -> hyper::Response<Full<Bytes>> {
	let inner = response.into_http();
	let (parts, body) = inner.into_parts();
	let mut builder = hyper::Response::builder().status(parts.status);
	*builder.headers_mut().expect("builder has no error yet") = parts.headers;
	builder.body(Full::new(body)).expect("status already validated")
}

fn sse_response(body: String) -> hyper::Response<Full<Bytes>> {
	hyper::Response::builder()
		.status(hyper::StatusCode::OK)
		.header("content-type", "text/event-stream")
		.header("cache-control", "no-cache")
		.body(Full::new(Bytes::from(body)))
		.expect("sse response is always valid")
}

async fn handle<S: ModuleSource + Send + Sync + 'static>(
	req: hyper::Request<Incoming>,
	pipeline: Arc<Pipeline<S>>,
	hot_replace: Option<Arc<HotReplaceEngine>>,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
	let request = match to_webcore_request(req).await {
		Ok(request) => request,
		Err(err) => {
			tracing::error!(error = %err, "failed to read request body");
			return Ok(hyper::Response::builder()
				.status(hyper::StatusCode::BAD_REQUEST)
				.body(Full::new(Bytes::new()))
				.unwrap());
		}
	};

	if hot_replace.is_some() && request.raw_target().starts_with("/hot-replace.js") {
		return Ok(hyper::Response::builder()
			.status(hyper::StatusCode::OK)
			.header("content-type", "text/javascript; charset=utf-8")
			.body(Full::new(Bytes::from_static(HOT_REPLACE_CLIENT_SCRIPT.as_bytes())))
			.unwrap());
	}

	if let Some(engine) = &hot_replace {
		if let Some(query) = request.raw_target().strip_prefix("/hot-replace?") {
			let href = query
				.split('&')
				.find_map(|pair| pair.strip_prefix("href="))
				.unwrap_or("");
			let initial = pipeline.render_payload_for(href).await;
			let mut body = format_sse_event(&initial);

			// A real streaming response would keep the connection open and
			// forward `engine.subscribe()` events as they arrive; building a
			// fully chunked `hyper` body here is left to the bundler-specific
			// integration that owns the event loop shape it wants.
			let mut subscriber = engine.subscribe();
			if let Ok(payload) = subscriber.try_recv() {
				body.push_str(&format_sse_event(&payload));
			}
			return Ok(sse_response(body));
		}
	}

	Ok(to_hyper_response(pipeline.handle_request(&request).await))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.init();

	let args = Args::parse();
	let mut builder = ServeConfig::builder().out_dir(args.out_dir).dev(args.dev);
	if let Some(port) = args.port {
		builder = builder.port(port);
	}
	if let Some(public_path) = args.public_path {
		builder = builder.public_path(public_path);
	}
	let config = builder.apply_env().build();

	let manifest_json = tokio::fs::read_to_string(config.manifest_path()).await.map_err(|err| {
		format!("failed to read route manifest at {}: {err}", config.manifest_path().display())
	})?;
	let manifest = webcore_routing::RouteManifest::from_json(&manifest_json)?;
	let matcher = parking_lot::RwLock::new(Arc::new(RouteMatcher::new(manifest)));

	let registry = Arc::new(RenderModuleRegistry::new(MissingModuleSource));
	let error_pages = ErrorPages::default();

	let pipeline = Arc::new(Pipeline {
		matcher,
		static_root: config.client_dir(),
		public_path: config.public_path.clone(),
		registry,
		error_pages,
		security: webcore_http::SecurityHeaders::default(),
		middleware: Vec::new(),
		dev: config.dev,
	});

	let hot_replace = if config.dev {
		let engine = Arc::new(HotReplaceEngine::default());
		let watch_engine = (*engine).clone();
		let watch_pipeline = Arc::clone(&pipeline);
		let registry_for_invalidate = Arc::clone(&watch_pipeline.registry);
		let manifest_path = config.manifest_path();
		tokio::spawn(async move {
			let hot_replace_config = HotReplaceConfig {
				watch_root: watch_pipeline.static_root.clone(),
				..HotReplaceConfig::default()
			};
			let reload = move || {
				let manifest_path = manifest_path.clone();
				let pipeline = Arc::clone(&watch_pipeline);
				async move {
					let json = tokio::fs::read_to_string(&manifest_path).await.map_err(|err| {
						webcore_server::hotreplace::HotReplaceError::ManifestReload(err.to_string())
					})?;
					let manifest = webcore_routing::RouteManifest::from_json(&json)
						.map_err(|err| webcore_server::hotreplace::HotReplaceError::ManifestReload(err.to_string()))?;
					pipeline.set_manifest(manifest);
					Ok(pipeline.render_payload_for("").await)
				}
			};
			let invalidate = move || registry_for_invalidate.invalidate_all();
			if let Err(err) =
				webcore_server::hotreplace::run_watch_loop(watch_engine, hot_replace_config, invalidate, reload).await
			{
				tracing::error!(error = %err, "hot-replace watch loop exited");
			}
		});
		Some(engine)
	} else {
		None
	};

	let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
	let listener = TcpListener::bind(addr).await?;
	tracing::info!(%addr, dev = config.dev, "webcore-serve listening");

	loop {
		let (stream, _) = listener.accept().await?;
		let io = TokioIo::new(stream);
		let pipeline = Arc::clone(&pipeline);
		let hot_replace = hot_replace.clone();

		tokio::task::spawn(async move {
			let service = service_fn(move |req| handle(req, Arc::clone(&pipeline), hot_replace.clone()));
			if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
				tracing::error!(error = %err, "error serving connection");
			}
		});
	}
}
