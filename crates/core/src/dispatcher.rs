//! Descriptor → mounted view dispatch for [`RuntimeContext`].

use tabhost_runtime::Result;
use tracing::{debug, warn};

use crate::context::RuntimeContext;
use crate::descriptor::{TabDescriptor, TabRuntime};
use crate::view::{MountedView, ViewContent};
use crate::web::WebTab;

/// Engine-group identifier owned by the tab `tab_id`.
pub fn engine_identifier(tab_id: &str) -> String {
	format!("engine_{tab_id}")
}

impl RuntimeContext {
	/// Builds the live view for one descriptor.
	///
	/// Never fails: a runtime that cannot be built yields a placeholder
	/// carrying the error message, labelled like the real view would be.
	pub fn dispatch(&mut self, descriptor: &TabDescriptor) -> MountedView {
		match self.mount(descriptor) {
			Ok(content) => {
				debug!(target = "tabhost.dispatch", tab = %descriptor.id, kind = %descriptor.kind(), "tab mounted");
				MountedView::mounted(descriptor, content)
			}
			Err(err) => {
				warn!(target = "tabhost.dispatch", tab = %descriptor.id, kind = %descriptor.kind(), error = %err, "tab replaced by placeholder");
				MountedView::placeholder(descriptor, err.to_string())
			}
		}
	}

	fn mount(&mut self, descriptor: &TabDescriptor) -> Result<ViewContent> {
		match &descriptor.runtime {
			TabRuntime::Native => self.native_factory().make_view(descriptor).map(ViewContent::Native),
			TabRuntime::ScriptBridge { module, initial_props } => self
				.bridge
				.create_view(module, initial_props.clone())
				.map(ViewContent::ScriptBridge),
			TabRuntime::EngineGroup { entrypoint } => self
				.engines
				.create_or_get(&engine_identifier(&descriptor.id), Some(entrypoint.as_str()))
				.map(ViewContent::EngineGroup),
			TabRuntime::WebContent { address } => {
				let engine = self.web_factory().create_engine();
				Ok(ViewContent::Web(WebTab::new(address.clone(), engine, self.resolver().clone())))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use tabhost_protocol::{BuildMode, TabType};
	use tabhost_runtime::headless::{HeadlessBridgeFactory, HeadlessEngineGroupFactory};

	use super::*;
	use crate::view::Chrome;

	fn started(mode: BuildMode) -> RuntimeContext {
		let mut ctx = RuntimeContext::builder(mode).build();
		ctx.startup();
		ctx
	}

	#[test]
	fn engine_identifier_is_deterministic() {
		assert_eq!(engine_identifier("tab3"), "engine_tab3");
	}

	#[test]
	fn native_gets_navigation_chrome() {
		let mut ctx = started(BuildMode::Debug);
		let view = ctx.dispatch(&TabDescriptor::new("tab1", "Home", TabRuntime::Native).with_icon("house.fill"));

		assert!(matches!(view.content, ViewContent::Native(_)));
		assert_eq!(view.chrome, Chrome::Navigation);
		assert_eq!(view.icon, "house.fill");
	}

	#[test]
	fn engine_tab_reuses_engine_per_id() {
		let mut ctx = started(BuildMode::Debug);
		let descriptor = TabDescriptor::new(
			"tab3",
			"Engine",
			TabRuntime::EngineGroup {
				entrypoint: "main".into(),
			},
		);

		let first = ctx.dispatch(&descriptor);
		let second = ctx.dispatch(&descriptor);

		assert_eq!(first.chrome, Chrome::None);
		assert!(first.engine().unwrap().same_engine(second.engine().unwrap()));
		assert_eq!(ctx.engines.count(), 1);
	}

	#[test]
	fn engine_tab_without_group_is_placeholder() {
		let mut ctx = RuntimeContext::builder(BuildMode::Debug)
			.engine_factory(HeadlessEngineGroupFactory::failing("no vm"))
			.build();
		ctx.startup();

		let view = ctx.dispatch(&TabDescriptor::new(
			"tab3",
			"Engine",
			TabRuntime::EngineGroup {
				entrypoint: "main".into(),
			},
		));

		assert_eq!(view.kind, TabType::EngineGroup);
		assert_eq!(view.chrome, Chrome::None);
		assert_eq!(view.placeholder_message(), Some("Engine group is not initialized"));
	}

	#[test]
	fn unregistered_module_is_placeholder() {
		let mut ctx = RuntimeContext::builder(BuildMode::Debug)
			.bridge_factory(HeadlessBridgeFactory::new().with_registered_modules(["ExampleRNApp"]))
			.build();
		ctx.startup();

		let ok = ctx.dispatch(&TabDescriptor::new(
			"a",
			"A",
			TabRuntime::ScriptBridge {
				module: "ExampleRNApp".into(),
				initial_props: None,
			},
		));
		let bad = ctx.dispatch(&TabDescriptor::new(
			"b",
			"B",
			TabRuntime::ScriptBridge {
				module: "SecondRNApp".into(),
				initial_props: None,
			},
		));

		assert_eq!(ok.bridge_view().unwrap().module_name, "ExampleRNApp");
		assert!(bad.placeholder_message().unwrap().contains("SecondRNApp"));
	}

	#[test]
	fn web_tab_is_not_loaded_on_mount() {
		let mut ctx = started(BuildMode::Release);
		let view = ctx.dispatch(&TabDescriptor::new(
			"tab4",
			"Web",
			TabRuntime::WebContent {
				address: "local://index.html".into(),
			},
		));

		let tab = view.web_tab().unwrap();
		assert_eq!(tab.address(), "local://index.html");
		assert_eq!(tab.status(), crate::web::WebTabStatus::Idle);
		assert_eq!(view.chrome, Chrome::Navigation);
	}
}
