//! Native view construction seam.

use serde::Serialize;
use tabhost_runtime::Result;

use crate::descriptor::TabDescriptor;

/// Opaque handle to a host-built native widget tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeView {
	pub tab_id: String,
	pub label: String,
}

/// Builds the widget tree for a native tab.
pub trait NativeViewFactory: Send + Sync {
	fn make_view(&self, descriptor: &TabDescriptor) -> Result<NativeView>;
}
