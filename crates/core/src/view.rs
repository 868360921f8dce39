//! Mounted views handed to the host shell.

use serde::Serialize;
use tabhost_protocol::TabType;
use tabhost_runtime::{BridgeView, EngineHandle};

use crate::descriptor::TabDescriptor;
use crate::native::NativeView;
use crate::web::WebTab;

/// Chrome the host shell wraps a view in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Chrome {
	Navigation,
	None,
}

impl Chrome {
	/// Native and web tabs get navigation chrome; the other runtimes draw
	/// their own.
	pub fn for_kind(kind: TabType) -> Self {
		match kind {
			TabType::Native | TabType::WebContent => Chrome::Navigation,
			TabType::ScriptBridge | TabType::EngineGroup => Chrome::None,
		}
	}
}

/// What a mounted view actually shows.
#[derive(Debug)]
pub enum ViewContent {
	Native(NativeView),
	ScriptBridge(BridgeView),
	EngineGroup(EngineHandle),
	Web(WebTab),
	/// In-place error shown instead of a runtime that could not be built.
	Placeholder { message: String },
}

/// One tab's live content, labelled for the tab strip.
#[derive(Debug)]
pub struct MountedView {
	pub tab_id: String,
	pub title: String,
	pub icon: String,
	pub kind: TabType,
	pub chrome: Chrome,
	pub content: ViewContent,
}

impl MountedView {
	pub fn mounted(descriptor: &TabDescriptor, content: ViewContent) -> Self {
		Self::labelled(&descriptor.id, &descriptor.title, descriptor.icon_or_placeholder(), descriptor.kind(), content)
	}

	pub fn placeholder(descriptor: &TabDescriptor, message: impl Into<String>) -> Self {
		Self::mounted(descriptor, ViewContent::Placeholder { message: message.into() })
	}

	/// Builds a view from raw labels, for records that never became a
	/// descriptor.
	pub fn labelled(tab_id: &str, title: &str, icon: &str, kind: TabType, content: ViewContent) -> Self {
		Self {
			tab_id: tab_id.to_string(),
			title: title.to_string(),
			icon: icon.to_string(),
			kind,
			chrome: Chrome::for_kind(kind),
			content,
		}
	}

	pub fn is_placeholder(&self) -> bool {
		matches!(self.content, ViewContent::Placeholder { .. })
	}

	pub fn placeholder_message(&self) -> Option<&str> {
		match &self.content {
			ViewContent::Placeholder { message } => Some(message),
			_ => None,
		}
	}

	pub fn engine(&self) -> Option<&EngineHandle> {
		match &self.content {
			ViewContent::EngineGroup(handle) => Some(handle),
			_ => None,
		}
	}

	pub fn bridge_view(&self) -> Option<&BridgeView> {
		match &self.content {
			ViewContent::ScriptBridge(view) => Some(view),
			_ => None,
		}
	}

	pub fn web_tab(&self) -> Option<&WebTab> {
		match &self.content {
			ViewContent::Web(tab) => Some(tab),
			_ => None,
		}
	}
}
