//! In-process web and native backends.
//!
//! [`HeadlessWebEngine`] drives `local://` loads through the registered
//! scheme handler exactly as a real engine would, and records every purge
//! and navigation. Remote addresses never touch the network; they succeed
//! unless the engine is set offline.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use tabhost_runtime::{Error, Result};
use tracing::debug;
use url::Url;

use crate::descriptor::TabDescriptor;
use crate::native::{NativeView, NativeViewFactory};
use crate::scheme::{BufferedSink, LocalSchemeHandler, SchemeTask, TaskOutcome};
use crate::web::{WebContentEngine, WebEngineFactory};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebEngineEvent {
	Purged,
	Loaded(String),
}

/// Main document served for a `local://` load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
	pub address: String,
	pub mime_type: String,
	pub len: usize,
}

#[derive(Debug, Default)]
struct WebRecord {
	events: Vec<WebEngineEvent>,
	documents: Vec<DocumentRecord>,
}

/// Shared record of web engine activity.
#[derive(Debug, Clone, Default)]
pub struct HeadlessWebLog(Arc<Mutex<WebRecord>>);

impl HeadlessWebLog {
	pub fn events(&self) -> Vec<WebEngineEvent> {
		self.0.lock().events.clone()
	}

	pub fn purges(&self) -> usize {
		self.0.lock().events.iter().filter(|e| **e == WebEngineEvent::Purged).count()
	}

	pub fn loads(&self) -> Vec<String> {
		self.0
			.lock()
			.events
			.iter()
			.filter_map(|e| match e {
				WebEngineEvent::Loaded(address) => Some(address.clone()),
				WebEngineEvent::Purged => None,
			})
			.collect()
	}

	pub fn last_document(&self) -> Option<DocumentRecord> {
		self.0.lock().documents.last().cloned()
	}
}

/// Web content engine with no renderer.
#[derive(Debug, Default)]
pub struct HeadlessWebEngine {
	handlers: Mutex<HashMap<String, Arc<LocalSchemeHandler>>>,
	log: HeadlessWebLog,
	offline: AtomicBool,
}

impl HeadlessWebEngine {
	pub fn new() -> Self {
		Self::default()
	}

	fn with_log(log: HeadlessWebLog) -> Self {
		Self {
			log,
			..Self::default()
		}
	}

	pub fn log(&self) -> HeadlessWebLog {
		self.log.clone()
	}

	/// Makes remote loads fail until switched back.
	pub fn set_offline(&self, offline: bool) {
		self.offline.store(offline, Ordering::SeqCst);
	}

	async fn navigate(&self, address: &str) -> Result<()> {
		let failed = |reason: String| Error::NavigationFailed {
			address: address.to_string(),
			reason,
		};

		let scheme = Url::parse(address)
			.map_err(|err| failed(err.to_string()))?
			.scheme()
			.to_ascii_lowercase();
		let handler = self.handlers.lock().get(&scheme).cloned();

		match handler {
			Some(handler) => {
				let sink = Arc::new(BufferedSink::new());
				let outcome = handler
					.start(SchemeTask::new(address, sink.clone()))
					.await
					.map_err(|err| failed(err.to_string()))?;

				match outcome {
					TaskOutcome::Served { mime_type, len } => {
						self.log.0.lock().documents.push(DocumentRecord {
							address: address.to_string(),
							mime_type: mime_type.to_string(),
							len,
						});
					}
					TaskOutcome::Failed { message, .. } => return Err(failed(message)),
					TaskOutcome::Cancelled => return Err(failed("request cancelled".into())),
				}
			}
			None if self.offline.load(Ordering::SeqCst) => {
				return Err(failed("network unavailable".into()));
			}
			None => {}
		}

		self.log.0.lock().events.push(WebEngineEvent::Loaded(address.to_string()));
		debug!(target = "tabhost.headless", address, "headless page loaded");
		Ok(())
	}
}

impl WebContentEngine for HeadlessWebEngine {
	fn register_scheme_handler(&self, scheme: &str, handler: Arc<LocalSchemeHandler>) {
		self.handlers.lock().insert(scheme.to_ascii_lowercase(), handler);
	}

	fn load<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<()>> {
		self.navigate(address).boxed()
	}

	fn purge_cache(&self) -> BoxFuture<'_, Result<()>> {
		async move {
			tokio::task::yield_now().await;
			self.log.0.lock().events.push(WebEngineEvent::Purged);
			Ok(())
		}
		.boxed()
	}
}

/// Hands out headless engines that share one log.
#[derive(Debug, Clone, Default)]
pub struct HeadlessWebEngineFactory {
	log: HeadlessWebLog,
}

impl HeadlessWebEngineFactory {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn log(&self) -> HeadlessWebLog {
		self.log.clone()
	}
}

impl WebEngineFactory for HeadlessWebEngineFactory {
	fn create_engine(&self) -> Arc<dyn WebContentEngine> {
		Arc::new(HeadlessWebEngine::with_log(self.log.clone()))
	}
}

/// Native factory that labels views with their tab id.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessNativeFactory;

impl NativeViewFactory for HeadlessNativeFactory {
	fn make_view(&self, descriptor: &TabDescriptor) -> Result<NativeView> {
		Ok(NativeView {
			tab_id: descriptor.id.clone(),
			label: format!("native:{}", descriptor.id),
		})
	}
}

#[cfg(test)]
mod tests {
	use tabhost_protocol::BuildMode;

	use super::*;
	use crate::resolver::{MemoryAssets, ResourceResolver};

	fn engine_with_local(assets: MemoryAssets) -> HeadlessWebEngine {
		let engine = HeadlessWebEngine::new();
		let resolver = Arc::new(ResourceResolver::new(BuildMode::Release, Arc::new(assets)));
		engine.register_scheme_handler("local", Arc::new(LocalSchemeHandler::new(resolver)));
		engine
	}

	#[tokio::test]
	async fn local_load_records_document() {
		let engine = engine_with_local(MemoryAssets::new().with_file("page.html", "<p>hi</p>"));

		engine.load("local://page.html").await.unwrap();

		let log = engine.log();
		assert_eq!(log.loads(), vec!["local://page.html"]);
		assert_eq!(
			log.last_document(),
			Some(DocumentRecord {
				address: "local://page.html".into(),
				mime_type: "text/html".into(),
				len: 9,
			})
		);
	}

	#[tokio::test]
	async fn local_load_without_file_fails() {
		let engine = engine_with_local(MemoryAssets::new());
		let err = engine.load("local://page.html").await.unwrap_err();

		assert_eq!(err.code(), "NAVIGATION_FAILED");
		assert!(engine.log().loads().is_empty());
	}

	#[tokio::test]
	async fn unregistered_scheme_without_handler() {
		let engine = HeadlessWebEngine::new();
		// No handler registered: treated as a remote address.
		assert!(engine.load("local://page.html").await.is_ok());

		engine.set_offline(true);
		assert!(engine.load("https://example.com").await.is_err());
	}

	#[tokio::test]
	async fn factory_engines_share_log() {
		let factory = HeadlessWebEngineFactory::new();
		let a = factory.create_engine();
		let b = factory.create_engine();

		a.purge_cache().await.unwrap();
		b.load("https://example.com").await.unwrap();

		assert_eq!(
			factory.log().events(),
			vec![WebEngineEvent::Purged, WebEngineEvent::Loaded("https://example.com".into())]
		);
	}

	#[test]
	fn native_factory_labels_view() {
		let descriptor = TabDescriptor::new("tab1", "Home", crate::descriptor::TabRuntime::Native);
		let view = HeadlessNativeFactory.make_view(&descriptor).unwrap();
		assert_eq!(view.label, "native:tab1");
	}
}
