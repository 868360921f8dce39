//! Error types for the tabhost runtime pools and host core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, resolving, or mounting tab runtimes.
///
/// None of these are fatal to the host process: a failure affects only the
/// tab, request, or pool it names.
#[derive(Debug, Error)]
pub enum Error {
	/// The shared engine group could not be constructed.
	#[error("Engine group initialization failed: {0}")]
	GroupInitFailed(String),

	/// An engine was requested before the group existed.
	#[error("Engine group is not initialized")]
	GroupUninitialized,

	/// The production script payload could not be located.
	#[error("Script bridge payload not found at '{}'", path.display())]
	BridgeSourceMissing { path: PathBuf },

	/// The group could not start an engine for an entrypoint.
	#[error("Engine '{entrypoint}' failed to start: {reason}")]
	EngineSpawnFailed { entrypoint: String, reason: String },

	/// A script view was requested with no live bridge.
	#[error("Script bridge is not initialized")]
	BridgeUninitialized,

	/// The bridge payload does not register the requested module.
	#[error("Script module '{module}' is not registered")]
	ModuleNotRegistered { module: String },

	/// No bundled resource matched the request.
	#[error("Resource not found: {filename}")]
	ResourceNotFound { filename: String },

	/// The web content engine could not load an address.
	#[error("Navigation to '{address}' failed: {reason}")]
	NavigationFailed { address: String, reason: String },

	/// A tab record lacks the reference its kind requires.
	#[error("Invalid tab '{tab_id}': {reason}")]
	DescriptorInvalid { tab_id: String, reason: String },

	/// An engine handle outlived its pool entry.
	#[error("Engine '{identifier}' was released")]
	EngineReleased { identifier: String },

	/// The operation is not available in the current build mode.
	#[error("Unsupported operation: {0}")]
	Unsupported(&'static str),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Stable machine-readable code for this error.
	pub fn code(&self) -> &'static str {
		match self {
			Error::GroupInitFailed(_) => "GROUP_INIT_FAILED",
			Error::GroupUninitialized => "GROUP_UNINITIALIZED",
			Error::BridgeSourceMissing { .. } => "BRIDGE_SOURCE_MISSING",
			Error::EngineSpawnFailed { .. } => "ENGINE_SPAWN_FAILED",
			Error::BridgeUninitialized => "BRIDGE_UNINITIALIZED",
			Error::ModuleNotRegistered { .. } => "MODULE_NOT_REGISTERED",
			Error::ResourceNotFound { .. } => "RESOURCE_NOT_FOUND",
			Error::NavigationFailed { .. } => "NAVIGATION_FAILED",
			Error::DescriptorInvalid { .. } => "DESCRIPTOR_INVALID",
			Error::EngineReleased { .. } => "ENGINE_RELEASED",
			Error::Unsupported(_) => "UNSUPPORTED",
			Error::Io(_) => "IO_ERROR",
		}
	}

	/// Returns true if this error came from a missing bundled resource.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Error::ResourceNotFound { .. })
	}

	/// Returns true if the user can meaningfully retry the failed action.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Error::NavigationFailed { .. })
	}
}
