//! tabhost runtime - pools for heterogeneous tab runtimes
//!
//! This crate owns the long-lived runtime resources a tab host shares
//! between tabs:
//!
//! - **Engine-group pool**: one VM-sharing group, isolated engines keyed by identifier
//! - **Script-bridge pool**: one process-wide bridge multiplexing module views
//! - **Errors**: the failure taxonomy used across the host core
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   tabhost    │  Dispatcher, composer, resource resolver
//! └──────┬───────┘
//!        │ create_or_get / create_view
//! ┌──────▼───────┐
//! │   runtime    │  This crate
//! │  ┌────────┐  │
//! │  │ Engine │  │  EngineGroupPool → dyn EngineGroup
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Bridge │  │  ScriptBridgePool → dyn ScriptBridge
//! │  └────────┘  │
//! └──────────────┘
//! ```
//!
//! # Decoupling via factories
//!
//! The pools never construct native runtimes themselves. They call an
//! [`EngineGroupFactory`] or [`ScriptBridgeFactory`], so a platform host
//! plugs in its SDK bindings and tests plug in the [`headless`] backends.
//!
//! All pool operations are synchronous and single-writer (`&mut self`);
//! they are meant to run on the host's UI-event thread.

pub mod engine_group;
pub mod error;
pub mod headless;
pub mod script_bridge;

pub use engine_group::{DEFAULT_ENTRYPOINT, Engine, EngineGroup, EngineGroupFactory, EngineGroupPool, EngineHandle, EngineSlot};
pub use error::{Error, Result};
pub use script_bridge::{
	BridgeLifecycle, BridgeSourceConfig, BridgeView, BundleSource, Props, ReloadOutcome, ScriptBridge, ScriptBridgeFactory,
	ScriptBridgePool,
};

/// Result of a pool initialization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
	/// The resource was constructed by this call.
	Initialized,
	/// A live resource already existed; nothing changed.
	AlreadyInitialized,
}
