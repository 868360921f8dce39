//! Web content tabs.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use tabhost_runtime::{Error, Result};
use tracing::{info, warn};

use crate::resolver::{LOCAL_SCHEME, ResourceResolver};
use crate::scheme::LocalSchemeHandler;

/// An embeddable web content engine.
///
/// Implemented by platform webview bindings; [`crate::headless::HeadlessWebEngine`]
/// is the in-process stand-in.
pub trait WebContentEngine: Send + Sync {
	/// Routes every request on `scheme` to `handler`.
	fn register_scheme_handler(&self, scheme: &str, handler: Arc<LocalSchemeHandler>);

	/// Navigates to `address`, resolving once the main document has loaded.
	fn load<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<()>>;

	/// Clears all cached storage. Completion is the future resolving.
	fn purge_cache(&self) -> BoxFuture<'_, Result<()>>;
}

/// Creates one content engine per web tab.
pub trait WebEngineFactory: Send + Sync {
	fn create_engine(&self) -> Arc<dyn WebContentEngine>;
}

/// Summary of one completed load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
	pub requested: String,
	pub effective: String,
	pub purged_cache: bool,
}

/// Load state of a [`WebTab`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebTabStatus {
	Idle,
	Loaded(LoadReport),
	Failed { reason: String },
}

/// A web content engine bound to one address and the shared resolver.
pub struct WebTab {
	address: String,
	engine: Arc<dyn WebContentEngine>,
	resolver: Arc<ResourceResolver>,
	status: Mutex<WebTabStatus>,
}

impl WebTab {
	/// Creates the tab and registers a `local://` handler with its engine.
	pub fn new(address: impl Into<String>, engine: Arc<dyn WebContentEngine>, resolver: Arc<ResourceResolver>) -> Self {
		let handler = Arc::new(LocalSchemeHandler::new(Arc::clone(&resolver)));
		engine.register_scheme_handler(LOCAL_SCHEME, handler);

		Self {
			address: address.into(),
			engine,
			resolver,
			status: Mutex::new(WebTabStatus::Idle),
		}
	}

	pub fn address(&self) -> &str {
		&self.address
	}

	pub fn engine(&self) -> &Arc<dyn WebContentEngine> {
		&self.engine
	}

	pub fn status(&self) -> WebTabStatus {
		self.status.lock().clone()
	}

	/// Loads the tab's address.
	///
	/// When development mode redirects the address, the engine's cache is
	/// purged first and the load waits for that purge to complete.
	///
	/// # Errors
	///
	/// Returns [`Error::NavigationFailed`]. The tab keeps its address, so
	/// [`Self::retry`] repeats the same load.
	pub async fn load(&self) -> Result<LoadReport> {
		let effective = self.resolver.resolve_base_address(&self.address);

		let mut purged_cache = false;
		if self.resolver.redirects(&self.address) {
			match self.resolver.purge_cache(self.engine.as_ref()).await {
				Ok(()) => purged_cache = true,
				Err(err) => warn!(target = "tabhost.web", error = %err, "cache purge failed; loading anyway"),
			}
		}

		let loaded = self.engine.load(&effective).await;
		match loaded {
			Ok(()) => {
				let report = LoadReport {
					requested: self.address.clone(),
					effective,
					purged_cache,
				};
				info!(target = "tabhost.web", address = %report.effective, purged = purged_cache, "web tab loaded");
				*self.status.lock() = WebTabStatus::Loaded(report.clone());
				Ok(report)
			}
			Err(err) => {
				let err = match err {
					nav @ Error::NavigationFailed { .. } => nav,
					other => Error::NavigationFailed {
						address: effective,
						reason: other.to_string(),
					},
				};
				warn!(target = "tabhost.web", error = %err, "web tab failed to load");
				*self.status.lock() = WebTabStatus::Failed { reason: err.to_string() };
				Err(err)
			}
		}
	}

	/// Repeats the last load of this tab's address.
	pub async fn retry(&self) -> Result<LoadReport> {
		self.load().await
	}
}

impl fmt::Debug for WebTab {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebTab")
			.field("address", &self.address)
			.field("status", &*self.status.lock())
			.finish()
	}
}
