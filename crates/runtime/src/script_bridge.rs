//! Script-bridge pool.
//!
//! Holds at most one script bridge for the whole process. Every script tab
//! mounts a module view on that bridge, so they share JavaScript startup
//! cost and memory, and also one fault domain.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tabhost_protocol::BuildMode;
use tracing::{debug, error, info, warn};

use crate::InitOutcome;
use crate::error::{Error, Result};

/// Initial properties handed to a mounted module.
pub type Props = Map<String, Value>;

/// Default development server for the bridge payload.
pub const DEFAULT_DEV_SERVER: &str = "http://localhost:8081";
/// Bundle root requested from the development server.
pub const DEFAULT_BUNDLE_ROOT: &str = "index";
/// Production payload file name.
pub const DEFAULT_BUNDLE_FILE: &str = "main.jsbundle";

/// Where the bridge loads its payload from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "camelCase")]
pub enum BundleSource {
	/// Live payload served by a development server.
	DevServer(String),
	/// Payload file shipped with the host.
	Bundled(PathBuf),
}

impl fmt::Display for BundleSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BundleSource::DevServer(url) => f.write_str(url),
			BundleSource::Bundled(path) => write!(f, "{}", path.display()),
		}
	}
}

/// Inputs for choosing a [`BundleSource`].
#[derive(Debug, Clone)]
pub struct BridgeSourceConfig {
	pub dev_server: String,
	pub bundle_root: String,
	pub bundle_dir: PathBuf,
	pub bundle_file: String,
}

impl Default for BridgeSourceConfig {
	fn default() -> Self {
		Self {
			dev_server: DEFAULT_DEV_SERVER.to_string(),
			bundle_root: DEFAULT_BUNDLE_ROOT.to_string(),
			bundle_dir: PathBuf::from("."),
			bundle_file: DEFAULT_BUNDLE_FILE.to_string(),
		}
	}
}

impl BridgeSourceConfig {
	pub fn with_dev_server(mut self, dev_server: impl Into<String>) -> Self {
		self.dev_server = dev_server.into();
		self
	}

	pub fn with_bundle_dir(mut self, dir: impl AsRef<Path>) -> Self {
		self.bundle_dir = dir.as_ref().to_path_buf();
		self
	}

	/// Development payload address for the configured bundle root.
	pub fn dev_bundle_url(&self) -> String {
		format!(
			"{}/{}.bundle?platform=ios&dev=true",
			self.dev_server.trim_end_matches('/'),
			self.bundle_root
		)
	}

	/// Picks the payload source for `mode`.
	///
	/// # Errors
	///
	/// Returns [`Error::BridgeSourceMissing`] in release mode when the
	/// payload file does not exist.
	pub fn resolve(&self, mode: BuildMode) -> Result<BundleSource> {
		match mode {
			BuildMode::Debug => Ok(BundleSource::DevServer(self.dev_bundle_url())),
			BuildMode::Release => {
				let path = self.bundle_dir.join(&self.bundle_file);
				if path.is_file() {
					Ok(BundleSource::Bundled(path))
				} else {
					Err(Error::BridgeSourceMissing { path })
				}
			}
		}
	}
}

/// Starts bridges from a payload source.
pub trait ScriptBridgeFactory: Send + Sync {
	fn start(&self, source: &BundleSource) -> Result<Box<dyn ScriptBridge>>;
}

/// A running bridge that multiplexes module views.
pub trait ScriptBridge: Send + Sync {
	/// Mounts `module` and returns the root tag of the new view.
	fn mount(&self, module: &str, props: Option<&Props>) -> Result<u64>;

	/// Re-executes the payload in place.
	fn reload(&self) -> Result<()>;

	/// Stops the bridge. Views mounted on it become inert.
	fn invalidate(&self);
}

/// Module view bound to the shared bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeView {
	pub module_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub initial_props: Option<Props>,
	pub root_tag: u64,
	/// Which bridge instance (1-based) mounted the view.
	pub generation: u64,
}

/// Observable bridge lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeLifecycle {
	Uninitialized,
	Initialized,
	Invalidated,
}

/// Result of [`ScriptBridgePool::reload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
	Reloaded,
	/// Release builds cannot reload.
	Unsupported,
}

enum BridgeState {
	Uninitialized,
	Initialized {
		bridge: Box<dyn ScriptBridge>,
		source: BundleSource,
	},
	Invalidated,
}

/// Owns the single process-wide script bridge.
pub struct ScriptBridgePool {
	mode: BuildMode,
	sources: BridgeSourceConfig,
	factory: Box<dyn ScriptBridgeFactory>,
	state: BridgeState,
	generation: u64,
}

impl ScriptBridgePool {
	pub fn new(mode: BuildMode, sources: BridgeSourceConfig, factory: Box<dyn ScriptBridgeFactory>) -> Self {
		Self {
			mode,
			sources,
			factory,
			state: BridgeState::Uninitialized,
			generation: 0,
		}
	}

	pub fn mode(&self) -> BuildMode {
		self.mode
	}

	pub fn lifecycle(&self) -> BridgeLifecycle {
		match self.state {
			BridgeState::Uninitialized => BridgeLifecycle::Uninitialized,
			BridgeState::Initialized { .. } => BridgeLifecycle::Initialized,
			BridgeState::Invalidated => BridgeLifecycle::Invalidated,
		}
	}

	/// Payload source of the live bridge.
	pub fn source(&self) -> Option<&BundleSource> {
		match &self.state {
			BridgeState::Initialized { source, .. } => Some(source),
			_ => None,
		}
	}

	/// Starts the bridge unless one is already live.
	///
	/// # Errors
	///
	/// Returns [`Error::BridgeSourceMissing`] when the release payload is
	/// absent; no bridge is constructed and view creation keeps failing.
	pub fn initialize_bridge(&mut self) -> Result<InitOutcome> {
		if matches!(self.state, BridgeState::Initialized { .. }) {
			warn!(target = "tabhost.bridge", "script bridge already initialized");
			return Ok(InitOutcome::AlreadyInitialized);
		}

		let source = self.sources.resolve(self.mode).inspect_err(|err| {
			error!(target = "tabhost.bridge", error = %err, "script bridge payload unavailable");
		})?;
		debug!(target = "tabhost.bridge", mode = %self.mode, %source, "starting script bridge");

		let bridge = self.factory.start(&source)?;
		self.generation += 1;
		info!(target = "tabhost.bridge", generation = self.generation, %source, "script bridge initialized");
		self.state = BridgeState::Initialized { bridge, source };
		Ok(InitOutcome::Initialized)
	}

	/// Mounts `module_name` on the shared bridge.
	///
	/// Any number of views, including several of the same module, may be
	/// mounted at once.
	///
	/// # Errors
	///
	/// Returns [`Error::BridgeUninitialized`] when no bridge is live.
	pub fn create_view(&self, module_name: &str, initial_props: Option<Props>) -> Result<BridgeView> {
		let BridgeState::Initialized { bridge, .. } = &self.state else {
			return Err(Error::BridgeUninitialized);
		};

		let root_tag = bridge.mount(module_name, initial_props.as_ref())?;
		debug!(target = "tabhost.bridge", module = module_name, root_tag, "script view created");
		Ok(BridgeView {
			module_name: module_name.to_string(),
			initial_props,
			root_tag,
			generation: self.generation,
		})
	}

	/// Re-executes the payload; development builds only.
	pub fn reload(&self) -> Result<ReloadOutcome> {
		if !self.mode.is_development() {
			warn!(target = "tabhost.bridge", "reload is not supported in release builds");
			return Ok(ReloadOutcome::Unsupported);
		}

		let BridgeState::Initialized { bridge, .. } = &self.state else {
			return Err(Error::BridgeUninitialized);
		};
		bridge.reload()?;
		info!(target = "tabhost.bridge", "script bridge reloaded");
		Ok(ReloadOutcome::Reloaded)
	}

	/// Invalidates and discards the bridge.
	pub fn cleanup(&mut self) {
		if let BridgeState::Initialized { bridge, .. } = std::mem::replace(&mut self.state, BridgeState::Invalidated) {
			bridge.invalidate();
			info!(target = "tabhost.bridge", "script bridge invalidated");
		} else {
			debug!(target = "tabhost.bridge", "no live script bridge to clean up");
		}
	}
}
