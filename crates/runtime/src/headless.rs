//! In-process backends with no native runtime behind them.
//!
//! Used by the CLI when it composes tabs without a windowing host, and by
//! tests. Every backend records its lifecycle calls in a shared log so
//! callers can assert on what the pools did.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::engine_group::{Engine, EngineGroup, EngineGroupFactory};
use crate::error::{Error, Result};
use crate::script_bridge::{BundleSource, Props, ScriptBridge, ScriptBridgeFactory};

#[derive(Debug, Default)]
struct EngineCounters {
	groups_created: usize,
	engines_created: usize,
	engines_destroyed: usize,
}

/// Shared record of engine-group activity.
#[derive(Debug, Clone, Default)]
pub struct HeadlessEngineLog(Arc<Mutex<EngineCounters>>);

impl HeadlessEngineLog {
	pub fn groups_created(&self) -> usize {
		self.0.lock().groups_created
	}

	pub fn engines_created(&self) -> usize {
		self.0.lock().engines_created
	}

	pub fn engines_destroyed(&self) -> usize {
		self.0.lock().engines_destroyed
	}
}

/// Engine-group factory backed by plain structs.
#[derive(Debug, Default)]
pub struct HeadlessEngineGroupFactory {
	log: HeadlessEngineLog,
	init_failure: Option<String>,
	failing_entrypoint: Option<String>,
}

impl HeadlessEngineGroupFactory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Factory whose group construction always fails with `reason`.
	pub fn failing(reason: impl Into<String>) -> Self {
		Self {
			init_failure: Some(reason.into()),
			..Self::default()
		}
	}

	/// Makes engine creation fail for one entrypoint name.
	pub fn with_failing_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
		self.failing_entrypoint = Some(entrypoint.into());
		self
	}

	pub fn log(&self) -> HeadlessEngineLog {
		self.log.clone()
	}
}

impl EngineGroupFactory for HeadlessEngineGroupFactory {
	fn create_group(&self, _name: &str) -> Result<Box<dyn EngineGroup>> {
		if let Some(reason) = &self.init_failure {
			return Err(Error::GroupInitFailed(reason.clone()));
		}
		self.log.0.lock().groups_created += 1;
		Ok(Box::new(HeadlessEngineGroup {
			log: self.log.clone(),
			failing_entrypoint: self.failing_entrypoint.clone(),
		}))
	}
}

struct HeadlessEngineGroup {
	log: HeadlessEngineLog,
	failing_entrypoint: Option<String>,
}

impl EngineGroup for HeadlessEngineGroup {
	fn make_engine(&self, entrypoint: &str) -> Result<Box<dyn Engine>> {
		if self.failing_entrypoint.as_deref() == Some(entrypoint) {
			return Err(Error::EngineSpawnFailed {
				entrypoint: entrypoint.to_string(),
				reason: "headless spawn refused".into(),
			});
		}
		self.log.0.lock().engines_created += 1;
		Ok(Box::new(HeadlessEngine {
			entrypoint: entrypoint.to_string(),
			log: self.log.clone(),
		}))
	}
}

struct HeadlessEngine {
	entrypoint: String,
	log: HeadlessEngineLog,
}

impl Engine for HeadlessEngine {
	fn entrypoint(&self) -> &str {
		&self.entrypoint
	}

	fn destroy_context(&self) {
		self.log.0.lock().engines_destroyed += 1;
	}
}

#[derive(Debug, Default)]
struct BridgeRecord {
	bridges_started: usize,
	sources: Vec<BundleSource>,
	mounted: Vec<String>,
	reloads: usize,
	invalidations: usize,
}

/// Shared record of script-bridge activity.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBridgeLog(Arc<Mutex<BridgeRecord>>);

impl HeadlessBridgeLog {
	pub fn bridges_started(&self) -> usize {
		self.0.lock().bridges_started
	}

	pub fn sources(&self) -> Vec<BundleSource> {
		self.0.lock().sources.clone()
	}

	pub fn mounted_modules(&self) -> Vec<String> {
		self.0.lock().mounted.clone()
	}

	pub fn reloads(&self) -> usize {
		self.0.lock().reloads
	}

	pub fn invalidations(&self) -> usize {
		self.0.lock().invalidations
	}
}

/// Script-bridge factory that mounts modules by name only.
#[derive(Debug, Default)]
pub struct HeadlessBridgeFactory {
	log: HeadlessBridgeLog,
	registered: Option<Vec<String>>,
}

impl HeadlessBridgeFactory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Restricts mounting to `modules`; any other name fails.
	pub fn with_registered_modules<I, S>(mut self, modules: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.registered = Some(modules.into_iter().map(Into::into).collect());
		self
	}

	pub fn log(&self) -> HeadlessBridgeLog {
		self.log.clone()
	}
}

impl ScriptBridgeFactory for HeadlessBridgeFactory {
	fn start(&self, source: &BundleSource) -> Result<Box<dyn ScriptBridge>> {
		let mut record = self.log.0.lock();
		record.bridges_started += 1;
		record.sources.push(source.clone());
		Ok(Box::new(HeadlessBridge {
			log: self.log.clone(),
			registered: self.registered.clone(),
			next_tag: AtomicU64::new(1),
		}))
	}
}

struct HeadlessBridge {
	log: HeadlessBridgeLog,
	registered: Option<Vec<String>>,
	next_tag: AtomicU64,
}

impl ScriptBridge for HeadlessBridge {
	fn mount(&self, module: &str, _props: Option<&Props>) -> Result<u64> {
		if let Some(registered) = &self.registered {
			if !registered.iter().any(|m| m == module) {
				return Err(Error::ModuleNotRegistered {
					module: module.to_string(),
				});
			}
		}
		self.log.0.lock().mounted.push(module.to_string());
		// Root tags step by 10 like native root views.
		Ok(self.next_tag.fetch_add(1, Ordering::SeqCst) * 10 + 1)
	}

	fn reload(&self) -> Result<()> {
		self.log.0.lock().reloads += 1;
		Ok(())
	}

	fn invalidate(&self) {
		self.log.0.lock().invalidations += 1;
	}
}
