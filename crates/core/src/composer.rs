//! Tab composition and the selection surface.

use tabhost_protocol::TabConfig;
use tracing::{debug, info, warn};

use crate::context::RuntimeContext;
use crate::descriptor::{IntoDescriptor, PLACEHOLDER_ICON, TabDescriptor};
use crate::handlers::{HandlerMap, Subscription, emit, handler_map, subscribe};
use crate::view::{MountedView, ViewContent};

/// Mounts one view per descriptor, in input order.
pub fn compose_descriptors(ctx: &mut RuntimeContext, descriptors: &[TabDescriptor]) -> Vec<MountedView> {
	descriptors.iter().map(|descriptor| ctx.dispatch(descriptor)).collect()
}

/// Mounts one view per configuration record, in input order.
///
/// A record that does not convert to a descriptor becomes a placeholder in
/// its position; the records around it are unaffected.
pub fn compose_tabs(ctx: &mut RuntimeContext, configs: &[TabConfig]) -> Vec<MountedView> {
	let views: Vec<MountedView> = configs
		.iter()
		.map(|config| match config.try_into_descriptor() {
			Ok(descriptor) => ctx.dispatch(&descriptor),
			Err(err) => {
				warn!(target = "tabhost.compose", tab = %config.id, error = %err, "invalid tab record");
				let message = match &err {
					tabhost_runtime::Error::DescriptorInvalid { reason, .. } => reason.clone(),
					other => other.to_string(),
				};
				MountedView::labelled(
					&config.id,
					&config.title,
					config.icon.as_deref().unwrap_or(PLACEHOLDER_ICON),
					config.kind,
					ViewContent::Placeholder { message },
				)
			}
		})
		.collect();

	info!(
		target = "tabhost.compose",
		tabs = views.len(),
		placeholders = views.iter().filter(|v| v.is_placeholder()).count(),
		"tabs composed"
	);
	views
}

/// Emitted to observers whenever the selected tab changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSelected {
	pub index: usize,
	pub tab_id: String,
	pub title: String,
}

/// Composed views plus the current selection.
///
/// Selection is pure host-shell state; it never calls into the pools.
pub struct TabHost {
	views: Vec<MountedView>,
	selected: usize,
	observers: HandlerMap<TabSelected>,
}

impl TabHost {
	pub fn new(views: Vec<MountedView>) -> Self {
		Self {
			views,
			selected: 0,
			observers: handler_map(),
		}
	}

	/// Composes `configs` and wraps the result.
	pub fn compose(ctx: &mut RuntimeContext, configs: &[TabConfig]) -> Self {
		Self::new(compose_tabs(ctx, configs))
	}

	pub fn views(&self) -> &[MountedView] {
		&self.views
	}

	pub fn len(&self) -> usize {
		self.views.len()
	}

	pub fn is_empty(&self) -> bool {
		self.views.is_empty()
	}

	pub fn selected_index(&self) -> usize {
		self.selected
	}

	pub fn selected(&self) -> Option<&MountedView> {
		self.views.get(self.selected)
	}

	pub fn position(&self, tab_id: &str) -> Option<usize> {
		self.views.iter().position(|view| view.tab_id == tab_id)
	}

	/// Registers a selection observer; dropping the subscription removes it.
	pub fn on_select<F>(&self, handler: F) -> Subscription
	where
		F: Fn(&TabSelected) + Send + Sync + 'static,
	{
		subscribe(&self.observers, handler)
	}

	/// Selects the view at `index` and notifies observers.
	///
	/// Returns `None` without notifying anyone when `index` is out of range.
	pub fn select(&mut self, index: usize) -> Option<TabSelected> {
		let view = self.views.get(index)?;
		let event = TabSelected {
			index,
			tab_id: view.tab_id.clone(),
			title: view.title.clone(),
		};
		self.selected = index;

		info!(target = "tabhost.select", index, tab = %event.tab_id, title = %event.title, "tab selected");
		emit(&self.observers, &event);
		Some(event)
	}

	/// Removes the view at `index`.
	///
	/// Its engine is released unless another open view still shows it.
	pub fn close_tab(&mut self, ctx: &mut RuntimeContext, index: usize) -> Option<MountedView> {
		if index >= self.views.len() {
			return None;
		}
		let view = self.views.remove(index);

		if let Some(handle) = view.engine() {
			let shared = self.views.iter().filter_map(MountedView::engine).any(|other| other.same_engine(handle));
			if shared {
				debug!(target = "tabhost.compose", engine = handle.identifier(), "engine still shown by another tab");
			} else {
				ctx.engines.release(handle.identifier());
			}
		}
		if self.selected >= self.views.len() {
			self.selected = self.views.len().saturating_sub(1);
		} else if index < self.selected {
			self.selected -= 1;
		}

		info!(target = "tabhost.compose", tab = %view.tab_id, "tab closed");
		Some(view)
	}
}

impl std::fmt::Debug for TabHost {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TabHost")
			.field("views", &self.views.len())
			.field("selected", &self.selected)
			.field("observers", &self.observers.lock().len())
			.finish()
	}
}
