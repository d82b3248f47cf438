//! Layered server configuration (§6.5, §6.6, §10.3).
//!
//! Three sources, lowest to highest priority: compiled-in defaults,
//! environment variables, explicit builder overrides. The CLI binary and
//! any embedding-as-a-library caller both populate the same [`ServeConfig`].

use std::collections::HashMap;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;

/// Fully-resolved server configuration, ready to hand to the pipeline and
/// the HTTP adapter.
#[derive(Debug, Clone)]
pub struct ServeConfig {
	pub port: u16,
	pub public_path: String,
	pub out_dir: PathBuf,
	pub dev: bool,
	pub security_headers: HashMap<String, String>,
}

impl Default for ServeConfig {
	fn default() -> Self {
		Self {
			port: DEFAULT_PORT,
			public_path: "/".to_string(),
			out_dir: PathBuf::from("dist"),
			dev: false,
			security_headers: HashMap::new(),
		}
	}
}

/// Builds a [`ServeConfig`] from defaults, then environment variables, then
/// explicit overrides (§10.3's "highest priority wins").
#[derive(Debug, Clone, Default)]
pub struct ServeConfigBuilder {
	port: Option<u16>,
	public_path: Option<String>,
	out_dir: Option<PathBuf>,
	dev: Option<bool>,
	security_headers: HashMap<String, String>,
}

impl ServeConfigBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn port(mut self, port: u16) -> Self {
		self.port = Some(port);
		self
	}

	pub fn public_path(mut self, public_path: impl Into<String>) -> Self {
		self.public_path = Some(public_path.into());
		self
	}

	pub fn out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
		self.out_dir = Some(out_dir.into());
		self
	}

	pub fn dev(mut self, dev: bool) -> Self {
		self.dev = Some(dev);
		self
	}

	pub fn security_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.security_headers.insert(name.into(), value.into());
		self
	}

	/// Reads `PORT`, `PUBLIC_PATH`, and `DEV` into this builder, but only for
	/// fields not already set by an earlier (lower-priority) layer — so
	/// calling this before applying explicit overrides keeps the override
	/// precedence intact.
	pub fn apply_env(mut self) -> Self {
		if self.port.is_none() {
			if let Ok(port) = std::env::var("PORT") {
				if let Ok(parsed) = port.parse() {
					self.port = Some(parsed);
				}
			}
		}
		if self.public_path.is_none() {
			// "" is preserved per §6.5; only an unset var falls through to
			// the compiled-in default.
			if let Ok(public_path) = std::env::var("PUBLIC_PATH") {
				self.public_path = Some(public_path);
			}
		}
		if self.dev.is_none() {
			if let Ok(dev) = std::env::var("DEV") {
				self.dev = Some(dev == "true");
			}
		}
		self
	}

	pub fn build(self) -> ServeConfig {
		let defaults = ServeConfig::default();
		ServeConfig {
			port: self.port.unwrap_or(defaults.port),
			public_path: self.public_path.unwrap_or(defaults.public_path),
			out_dir: self.out_dir.unwrap_or(defaults.out_dir),
			dev: self.dev.unwrap_or(defaults.dev),
			security_headers: self.security_headers,
		}
	}
}

impl ServeConfig {
	pub fn builder() -> ServeConfigBuilder {
		ServeConfigBuilder::new()
	}

	pub fn client_dir(&self) -> PathBuf {
		self.out_dir.join("client")
	}

	pub fn server_dir(&self) -> PathBuf {
		self.out_dir.join("server")
	}

	pub fn manifest_path(&self) -> PathBuf {
		self.server_dir().join("routes.json")
	}
}
