//! Typed tab descriptors.
//!
//! A [`TabConfig`] record carries optional fields whose presence depends on
//! its `type`. Converting it to a [`TabDescriptor`] checks those fields once;
//! afterwards each [`TabRuntime`] variant holds exactly what its kind needs.

use tabhost_protocol::{TabConfig, TabType};
use tabhost_runtime::{DEFAULT_ENTRYPOINT, Error, Props, Result};

/// Icon name used when a tab declares none.
pub const PLACEHOLDER_ICON: &str = "circle";

/// The runtime a tab is backed by, with its required references.
#[derive(Debug, Clone, PartialEq)]
pub enum TabRuntime {
	Native,
	ScriptBridge { module: String, initial_props: Option<Props> },
	EngineGroup { entrypoint: String },
	WebContent { address: String },
}

impl TabRuntime {
	pub fn kind(&self) -> TabType {
		match self {
			TabRuntime::Native => TabType::Native,
			TabRuntime::ScriptBridge { .. } => TabType::ScriptBridge,
			TabRuntime::EngineGroup { .. } => TabType::EngineGroup,
			TabRuntime::WebContent { .. } => TabType::WebContent,
		}
	}
}

/// A validated tab description.
#[derive(Debug, Clone, PartialEq)]
pub struct TabDescriptor {
	pub id: String,
	pub title: String,
	pub icon: Option<String>,
	pub runtime: TabRuntime,
}

impl TabDescriptor {
	pub fn new(id: impl Into<String>, title: impl Into<String>, runtime: TabRuntime) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			icon: None,
			runtime,
		}
	}

	pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
		self.icon = Some(icon.into());
		self
	}

	pub fn kind(&self) -> TabType {
		self.runtime.kind()
	}

	/// Declared icon, or [`PLACEHOLDER_ICON`].
	pub fn icon_or_placeholder(&self) -> &str {
		self.icon.as_deref().unwrap_or(PLACEHOLDER_ICON)
	}
}

impl TryFrom<&TabConfig> for TabDescriptor {
	type Error = Error;

	fn try_from(config: &TabConfig) -> Result<Self> {
		let invalid = |reason: &str| Error::DescriptorInvalid {
			tab_id: config.id.clone(),
			reason: reason.to_string(),
		};

		let runtime = match config.kind {
			TabType::Native => TabRuntime::Native,
			TabType::ScriptBridge => TabRuntime::ScriptBridge {
				module: non_empty(&config.module_name).ok_or_else(|| invalid("missing module reference"))?,
				initial_props: None,
			},
			TabType::EngineGroup => TabRuntime::EngineGroup {
				entrypoint: non_empty(&config.entrypoint).unwrap_or_else(|| DEFAULT_ENTRYPOINT.to_string()),
			},
			TabType::WebContent => TabRuntime::WebContent {
				address: non_empty(&config.url).ok_or_else(|| invalid("missing resource reference"))?,
			},
		};

		Ok(Self {
			id: config.id.clone(),
			title: config.title.clone(),
			icon: non_empty(&config.icon),
			runtime,
		})
	}
}

impl TryFrom<TabConfig> for TabDescriptor {
	type Error = Error;

	fn try_from(config: TabConfig) -> Result<Self> {
		Self::try_from(&config)
	}
}

/// Adds `try_into_descriptor` to raw configuration records.
pub trait IntoDescriptor {
	fn try_into_descriptor(&self) -> Result<TabDescriptor>;
}

impl IntoDescriptor for TabConfig {
	fn try_into_descriptor(&self) -> Result<TabDescriptor> {
		TabDescriptor::try_from(self)
	}
}

/// The value as declared, or `None` when absent or blank.
fn non_empty(value: &Option<String>) -> Option<String> {
	value.clone().filter(|v| !v.trim().is_empty())
}
