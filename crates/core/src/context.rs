//! The runtime context: every long-lived resource a tab host shares.
//!
//! Built once at startup and passed by `&mut` to the dispatcher and
//! composer. There is no global state; tests build a fresh context each.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tabhost_protocol::BuildMode;
use tabhost_runtime::{
	BridgeSourceConfig, EngineGroupFactory, EngineGroupPool, Error, InitOutcome, ScriptBridgeFactory, ScriptBridgePool,
	headless::{HeadlessBridgeFactory, HeadlessEngineGroupFactory},
};
use tracing::{error, info};

use crate::headless::{HeadlessNativeFactory, HeadlessWebEngineFactory};
use crate::native::NativeViewFactory;
use crate::resolver::{AssetSource, DEFAULT_DEV_ADDRESS, MemoryAssets, ResourceResolver};
use crate::web::WebEngineFactory;

/// Label given to the shared engine group unless configured otherwise.
pub const DEFAULT_ENGINE_GROUP_NAME: &str = "tabhost.engine-group";

/// Startup state of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PoolStatus {
	Ready { already_initialized: bool },
	Failed { code: &'static str, message: String },
}

impl PoolStatus {
	fn from_result(result: Result<InitOutcome, Error>) -> Self {
		match result {
			Ok(outcome) => PoolStatus::Ready {
				already_initialized: outcome == InitOutcome::AlreadyInitialized,
			},
			Err(err) => PoolStatus::Failed {
				code: err.code(),
				message: err.to_string(),
			},
		}
	}

	pub fn is_ready(&self) -> bool {
		matches!(self, PoolStatus::Ready { .. })
	}
}

/// Result of [`RuntimeContext::startup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupReport {
	pub engine_group: PoolStatus,
	pub script_bridge: PoolStatus,
}

/// Pools, resolver and view factories for one host process.
pub struct RuntimeContext {
	mode: BuildMode,
	pub engines: EngineGroupPool,
	pub bridge: ScriptBridgePool,
	resolver: Arc<ResourceResolver>,
	native: Box<dyn NativeViewFactory>,
	web: Box<dyn WebEngineFactory>,
}

impl RuntimeContext {
	pub fn builder(mode: BuildMode) -> RuntimeContextBuilder {
		RuntimeContextBuilder::new(mode)
	}

	pub fn mode(&self) -> BuildMode {
		self.mode
	}

	pub fn resolver(&self) -> &Arc<ResourceResolver> {
		&self.resolver
	}

	pub fn native_factory(&self) -> &dyn NativeViewFactory {
		self.native.as_ref()
	}

	pub fn web_factory(&self) -> &dyn WebEngineFactory {
		self.web.as_ref()
	}

	/// Initializes both pools.
	///
	/// Failures are logged and reported but never returned: the host keeps
	/// running with the affected pool non-functional.
	pub fn startup(&mut self) -> StartupReport {
		let engine_group = self.engines.initialize_group().inspect_err(|err| {
			error!(target = "tabhost.context", error = %err, "engine group unavailable");
		});
		let script_bridge = self.bridge.initialize_bridge().inspect_err(|err| {
			error!(target = "tabhost.context", error = %err, "script bridge unavailable");
		});

		let report = StartupReport {
			engine_group: PoolStatus::from_result(engine_group),
			script_bridge: PoolStatus::from_result(script_bridge),
		};
		info!(
			target = "tabhost.context",
			mode = %self.mode,
			engine_group = report.engine_group.is_ready(),
			script_bridge = report.script_bridge.is_ready(),
			"runtime context started"
		);
		report
	}

	/// Cleans up the script bridge, then tears down the engine group.
	pub fn shutdown(&mut self) {
		self.bridge.cleanup();
		self.engines.teardown_group();
		info!(target = "tabhost.context", "runtime context shut down");
	}
}

impl fmt::Debug for RuntimeContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RuntimeContext")
			.field("mode", &self.mode)
			.field("engine_group", &self.engines.name())
			.field("engines", &self.engines.count())
			.field("bridge", &self.bridge.lifecycle())
			.field("resolver", &self.resolver)
			.finish()
	}
}

/// Builder for [`RuntimeContext`].
///
/// Every backend defaults to its headless implementation.
pub struct RuntimeContextBuilder {
	mode: BuildMode,
	engine_group_name: String,
	engine_factory: Option<Box<dyn EngineGroupFactory>>,
	bridge_sources: BridgeSourceConfig,
	bridge_factory: Option<Box<dyn ScriptBridgeFactory>>,
	assets: Option<Arc<dyn AssetSource>>,
	dev_address: String,
	native: Option<Box<dyn NativeViewFactory>>,
	web: Option<Box<dyn WebEngineFactory>>,
}

impl RuntimeContextBuilder {
	pub fn new(mode: BuildMode) -> Self {
		Self {
			mode,
			engine_group_name: DEFAULT_ENGINE_GROUP_NAME.to_string(),
			engine_factory: None,
			bridge_sources: BridgeSourceConfig::default(),
			bridge_factory: None,
			assets: None,
			dev_address: DEFAULT_DEV_ADDRESS.to_string(),
			native: None,
			web: None,
		}
	}

	pub fn engine_group_name(mut self, name: impl Into<String>) -> Self {
		self.engine_group_name = name.into();
		self
	}

	pub fn engine_factory(mut self, factory: impl EngineGroupFactory + 'static) -> Self {
		self.engine_factory = Some(Box::new(factory));
		self
	}

	pub fn bridge_sources(mut self, sources: BridgeSourceConfig) -> Self {
		self.bridge_sources = sources;
		self
	}

	pub fn bridge_factory(mut self, factory: impl ScriptBridgeFactory + 'static) -> Self {
		self.bridge_factory = Some(Box::new(factory));
		self
	}

	pub fn assets(mut self, assets: impl AssetSource + 'static) -> Self {
		self.assets = Some(Arc::new(assets));
		self
	}

	pub fn dev_address(mut self, address: impl Into<String>) -> Self {
		self.dev_address = address.into();
		self
	}

	pub fn native_factory(mut self, factory: impl NativeViewFactory + 'static) -> Self {
		self.native = Some(Box::new(factory));
		self
	}

	pub fn web_factory(mut self, factory: impl WebEngineFactory + 'static) -> Self {
		self.web = Some(Box::new(factory));
		self
	}

	pub fn build(self) -> RuntimeContext {
		let engine_factory = self
			.engine_factory
			.unwrap_or_else(|| Box::new(HeadlessEngineGroupFactory::new()));
		let bridge_factory = self
			.bridge_factory
			.unwrap_or_else(|| Box::new(HeadlessBridgeFactory::new()));
		let assets = self.assets.unwrap_or_else(|| Arc::new(MemoryAssets::new()));

		RuntimeContext {
			mode: self.mode,
			engines: EngineGroupPool::new(self.engine_group_name, engine_factory),
			bridge: ScriptBridgePool::new(self.mode, self.bridge_sources, bridge_factory),
			resolver: Arc::new(ResourceResolver::new(self.mode, assets).with_dev_address(self.dev_address)),
			native: self.native.unwrap_or_else(|| Box::new(HeadlessNativeFactory)),
			web: self.web.unwrap_or_else(|| Box::new(HeadlessWebEngineFactory::new())),
		}
	}
}
