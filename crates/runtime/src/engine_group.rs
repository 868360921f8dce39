//! Engine-group pool.
//!
//! One shared group resource lets several isolated engines share a VM's
//! memory and startup cost. The pool keys engines by a caller-chosen
//! identifier so the dispatcher decides instance granularity (one engine per
//! tab, or shared by convention).
//!
//! Handles returned from [`EngineGroupPool::create_or_get`] are weak: once
//! the pool releases an engine, every outstanding handle reports
//! [`Error::EngineReleased`] instead of reaching a destroyed engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use crate::InitOutcome;
use crate::error::{Error, Result};

/// Entrypoint used when a caller does not name one.
pub const DEFAULT_ENTRYPOINT: &str = "main";

/// Builds the shared group resource.
pub trait EngineGroupFactory: Send + Sync {
	fn create_group(&self, name: &str) -> Result<Box<dyn EngineGroup>>;
}

/// A live group that spawns engines sharing one VM.
pub trait EngineGroup: Send + Sync {
	fn make_engine(&self, entrypoint: &str) -> Result<Box<dyn Engine>>;
}

/// One isolated execution engine inside a group.
pub trait Engine: Send + Sync {
	/// Entrypoint the engine was started with.
	fn entrypoint(&self) -> &str;

	/// Tears down the engine's execution context.
	fn destroy_context(&self);
}

/// Pool-owned storage for one engine.
pub struct EngineSlot {
	identifier: String,
	engine: Box<dyn Engine>,
	released: AtomicBool,
}

impl EngineSlot {
	pub fn identifier(&self) -> &str {
		&self.identifier
	}

	pub fn engine(&self) -> &dyn Engine {
		self.engine.as_ref()
	}

	/// `true` once the pool has destroyed this engine's context.
	pub fn is_released(&self) -> bool {
		self.released.load(Ordering::Acquire)
	}

	fn destroy(&self) {
		if !self.released.swap(true, Ordering::AcqRel) {
			self.engine.destroy_context();
		}
	}
}

/// Caller-side reference to a pooled engine.
#[derive(Clone)]
pub struct EngineHandle {
	identifier: Arc<str>,
	slot: Weak<EngineSlot>,
}

impl EngineHandle {
	pub fn identifier(&self) -> &str {
		&self.identifier
	}

	/// Returns `true` while the pool still tracks this engine.
	pub fn is_live(&self) -> bool {
		self.slot.upgrade().is_some_and(|slot| !slot.is_released())
	}

	/// Returns `true` when both handles point at the same pooled engine.
	pub fn same_engine(&self, other: &EngineHandle) -> bool {
		Weak::ptr_eq(&self.slot, &other.slot)
	}

	/// Upgrades to the pooled engine.
	///
	/// # Errors
	///
	/// Returns [`Error::EngineReleased`] once the pool has released it,
	/// even if an earlier upgrade is still held elsewhere.
	pub fn engine(&self) -> Result<Arc<EngineSlot>> {
		self.slot
			.upgrade()
			.filter(|slot| !slot.is_released())
			.ok_or_else(|| Error::EngineReleased {
				identifier: self.identifier.to_string(),
			})
	}

	/// Entrypoint of the live engine.
	pub fn entrypoint(&self) -> Result<String> {
		Ok(self.engine()?.engine().entrypoint().to_string())
	}
}

impl fmt::Debug for EngineHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EngineHandle")
			.field("identifier", &self.identifier)
			.field("live", &self.is_live())
			.finish()
	}
}

/// Owns one engine group and the identifier → engine mapping.
///
/// Single-writer: every mutating call takes `&mut self`, so concurrent use
/// needs external synchronization.
pub struct EngineGroupPool {
	name: String,
	factory: Box<dyn EngineGroupFactory>,
	group: Option<Box<dyn EngineGroup>>,
	engines: HashMap<String, Arc<EngineSlot>>,
}

impl EngineGroupPool {
	pub fn new(name: impl Into<String>, factory: Box<dyn EngineGroupFactory>) -> Self {
		Self {
			name: name.into(),
			factory,
			group: None,
			engines: HashMap::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn is_initialized(&self) -> bool {
		self.group.is_some()
	}

	/// Creates the shared group once; later calls report it already exists.
	///
	/// # Errors
	///
	/// Returns [`Error::GroupInitFailed`] if the factory cannot build it.
	pub fn initialize_group(&mut self) -> Result<InitOutcome> {
		if self.group.is_some() {
			warn!(target = "tabhost.engine", group = %self.name, "engine group already initialized");
			return Ok(InitOutcome::AlreadyInitialized);
		}

		let group = self.factory.create_group(&self.name).map_err(|err| match err {
			Error::GroupInitFailed(msg) => Error::GroupInitFailed(msg),
			other => Error::GroupInitFailed(other.to_string()),
		})?;
		self.group = Some(group);
		info!(target = "tabhost.engine", group = %self.name, "engine group initialized");
		Ok(InitOutcome::Initialized)
	}

	/// Returns the engine tracked under `identifier`, creating it if absent.
	///
	/// Reuse has no side effects: a second call with the same identifier
	/// returns a handle to the same engine even if `entrypoint` differs.
	///
	/// # Errors
	///
	/// Returns [`Error::GroupUninitialized`] when a new engine is needed and
	/// the group does not exist, or the group's error if spawning fails.
	pub fn create_or_get(&mut self, identifier: &str, entrypoint: Option<&str>) -> Result<EngineHandle> {
		if let Some(slot) = self.engines.get(identifier) {
			debug!(target = "tabhost.engine", identifier, "reusing engine");
			return Ok(Self::handle_for(slot));
		}

		let group = self.group.as_ref().ok_or(Error::GroupUninitialized)?;
		let entry = entrypoint.filter(|e| !e.is_empty()).unwrap_or(DEFAULT_ENTRYPOINT);
		debug!(target = "tabhost.engine", identifier, entrypoint = entry, "creating engine");

		let engine = group.make_engine(entry)?;
		let slot = Arc::new(EngineSlot {
			identifier: identifier.to_string(),
			engine,
			released: AtomicBool::new(false),
		});
		let handle = Self::handle_for(&slot);
		self.engines.insert(identifier.to_string(), slot);
		info!(target = "tabhost.engine", identifier, entrypoint = entry, "engine created");
		Ok(handle)
	}

	fn handle_for(slot: &Arc<EngineSlot>) -> EngineHandle {
		EngineHandle {
			identifier: Arc::from(slot.identifier.as_str()),
			slot: Arc::downgrade(slot),
		}
	}

	/// Returns `true` if an engine is tracked under `identifier`.
	pub fn contains(&self, identifier: &str) -> bool {
		self.engines.contains_key(identifier)
	}

	/// Destroys and forgets the engine under `identifier`; no-op if absent.
	pub fn release(&mut self, identifier: &str) {
		if let Some(slot) = self.engines.remove(identifier) {
			slot.destroy();
			info!(target = "tabhost.engine", identifier, "engine released");
		}
	}

	/// Destroys every tracked engine. The group itself stays initialized.
	pub fn release_all(&mut self) {
		for (identifier, slot) in self.engines.drain() {
			slot.destroy();
			info!(target = "tabhost.engine", identifier = %identifier, "engine released");
		}
	}

	/// Number of live tracked engines.
	pub fn count(&self) -> usize {
		self.engines.len()
	}

	/// Releases every engine, then discards the group.
	///
	/// [`create_or_get`](Self::create_or_get) fails for new identifiers until
	/// [`initialize_group`](Self::initialize_group) runs again.
	pub fn teardown_group(&mut self) {
		self.release_all();
		if self.group.take().is_some() {
			info!(target = "tabhost.engine", group = %self.name, "engine group torn down");
		}
	}
}

impl Drop for EngineGroupPool {
	fn drop(&mut self) {
		self.release_all();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::headless::{HeadlessEngineGroupFactory, HeadlessEngineLog};

	fn pool() -> (EngineGroupPool, HeadlessEngineLog) {
		let factory = HeadlessEngineGroupFactory::new();
		let log = factory.log();
		(EngineGroupPool::new("test.group", Box::new(factory)), log)
	}

	fn ready_pool() -> (EngineGroupPool, HeadlessEngineLog) {
		let (mut pool, log) = pool();
		pool.initialize_group().unwrap();
		(pool, log)
	}

	#[test]
	fn initialize_is_idempotent() {
		let (mut pool, log) = pool();
		assert_eq!(pool.initialize_group().unwrap(), InitOutcome::Initialized);
		assert_eq!(pool.initialize_group().unwrap(), InitOutcome::AlreadyInitialized);
		assert_eq!(log.groups_created(), 1);
	}

	#[test]
	fn initialize_failure_maps_to_group_init_failed() {
		let factory = HeadlessEngineGroupFactory::failing("no vm snapshot");
		let mut pool = EngineGroupPool::new("broken", Box::new(factory));

		let err = pool.initialize_group().unwrap_err();
		assert!(matches!(err, Error::GroupInitFailed(ref msg) if msg.contains("no vm snapshot")));
		assert!(!pool.is_initialized());
	}

	#[test]
	fn create_requires_group() {
		let (mut pool, _) = pool();
		let err = pool.create_or_get("engine_tab3", None).unwrap_err();
		assert!(matches!(err, Error::GroupUninitialized));
		assert_eq!(pool.count(), 0);
	}

	#[test]
	fn create_or_get_reuses_by_identifier() {
		let (mut pool, log) = ready_pool();

		let first = pool.create_or_get("engine_tab3", Some("main")).unwrap();
		let second = pool.create_or_get("engine_tab3", Some("profileMain")).unwrap();

		assert!(first.same_engine(&second));
		assert_eq!(second.entrypoint().unwrap(), "main");
		assert_eq!(pool.count(), 1);
		assert_eq!(log.engines_created(), 1);
	}

	#[test]
	fn default_entrypoint_applies() {
		let (mut pool, _) = ready_pool();
		let handle = pool.create_or_get("a", None).unwrap();
		assert_eq!(handle.entrypoint().unwrap(), DEFAULT_ENTRYPOINT);

		let handle = pool.create_or_get("b", Some("")).unwrap();
		assert_eq!(handle.entrypoint().unwrap(), DEFAULT_ENTRYPOINT);
	}

	#[test]
	fn release_destroys_and_recreates_fresh() {
		let (mut pool, log) = ready_pool();
		let original = pool.create_or_get("a", None).unwrap();
		pool.create_or_get("b", None).unwrap();
		assert_eq!(pool.count(), 2);

		pool.release("a");
		assert_eq!(pool.count(), 1);
		assert_eq!(log.engines_destroyed(), 1);
		assert!(!original.is_live());
		assert!(matches!(original.engine(), Err(Error::EngineReleased { .. })));

		let recreated = pool.create_or_get("a", Some("other")).unwrap();
		assert!(!recreated.same_engine(&original));
		assert_eq!(recreated.entrypoint().unwrap(), "other");
	}

	#[test]
	fn held_slot_does_not_outlive_release() {
		let (mut pool, log) = ready_pool();
		let handle = pool.create_or_get("a", None).unwrap();
		let slot = handle.engine().unwrap();

		pool.release("a");
		assert!(slot.is_released());
		assert!(!handle.is_live());
		assert!(matches!(handle.engine(), Err(Error::EngineReleased { .. })));
		assert!(handle.entrypoint().is_err());

		drop(slot);
		pool.release_all();
		assert_eq!(log.engines_destroyed(), 1);
	}

	#[test]
	fn release_missing_is_noop() {
		let (mut pool, log) = ready_pool();
		pool.release("ghost");
		assert_eq!(pool.count(), 0);
		assert_eq!(log.engines_destroyed(), 0);
	}

	#[test]
	fn release_all_keeps_group() {
		let (mut pool, log) = ready_pool();
		for id in ["a", "b", "c"] {
			pool.create_or_get(id, None).unwrap();
		}

		pool.release_all();
		assert_eq!(pool.count(), 0);
		assert_eq!(log.engines_destroyed(), 3);
		assert!(pool.create_or_get("a", None).is_ok());
	}

	#[test]
	fn teardown_discards_group() {
		let (mut pool, log) = ready_pool();
		let handle = pool.create_or_get("a", None).unwrap();

		pool.teardown_group();
		assert!(!handle.is_live());
		assert_eq!(pool.count(), 0);
		assert!(matches!(pool.create_or_get("a", None), Err(Error::GroupUninitialized)));

		assert_eq!(pool.initialize_group().unwrap(), InitOutcome::Initialized);
		assert!(pool.create_or_get("a", None).is_ok());
		assert_eq!(log.groups_created(), 2);
	}

	#[test]
	fn spawn_failure_leaves_mapping_untouched() {
		let factory = HeadlessEngineGroupFactory::new().with_failing_entrypoint("crashMain");
		let mut pool = EngineGroupPool::new("g", Box::new(factory));
		pool.initialize_group().unwrap();

		let err = pool.create_or_get("bad", Some("crashMain")).unwrap_err();
		assert_eq!(err.code(), "ENGINE_SPAWN_FAILED");
		assert!(!pool.contains("bad"));
		assert_eq!(pool.count(), 0);
	}
}
