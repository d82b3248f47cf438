//! Short-circuiting middleware executor (§4.4).
//!
//! A middleware chain is a fixed list of slots, each either an active
//! middleware or `None` — the Rust counterpart of "skips non-callable
//! entries": a disabled middleware (e.g. CORS when no origins are
//! configured) is represented by leaving its slot empty rather than by a
//! runtime type check.

use async_trait::async_trait;
use std::sync::Arc;
use webcore_http::{PipelineError, Request};

/// What a single middleware decided to do with a request.
pub enum MiddlewareOutcome<Response> {
	/// Let the pipeline continue to the next phase.
	Continue,
	/// Short-circuit the pipeline with this response.
	Respond(Response),
}

/// One link in a middleware chain. `Env` carries whatever adapter-supplied
/// bindings (config, request-scoped context, cancellation signal) the
/// concrete middleware needs.
#[async_trait]
pub trait Middleware<Env>: Send + Sync {
	type Response: Send;

	async fn call(
		&self,
		request: &Request,
		env: &Env,
	) -> Result<MiddlewareOutcome<Self::Response>, PipelineError>;
}

/// Runs `chain` in order, skipping empty slots, and stops at the first
/// middleware that returns a response. Propagates the first error as-is —
/// the caller (the request pipeline) maps it to a 500.
pub async fn run_chain<Env, Response>(
	chain: &[Option<Arc<dyn Middleware<Env, Response = Response> + 'static>>],
	request: &Request,
	env: &Env,
) -> Result<MiddlewareOutcome<Response>, PipelineError>
where
	Response: Send,
{
	for slot in chain {
		let Some(middleware) = slot else {
			continue;
		};
		match middleware.call(request, env).await? {
			MiddlewareOutcome::Continue => continue,
			respond @ MiddlewareOutcome::Respond(_) => return Ok(respond),
		}
	}
	Ok(MiddlewareOutcome::Continue)
}
