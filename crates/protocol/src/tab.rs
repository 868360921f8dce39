//! Tab configuration records.
//!
//! These mirror `tab_config.json` field for field. Records are validated
//! later, when the host turns them into typed descriptors; a record here
//! may still lack the reference its [`TabType`] requires.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime kind declared by a tab record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TabType {
	/// Native widget tree built by the host.
	#[serde(rename = "native")]
	Native,
	/// Module view mounted on the shared script bridge.
	#[serde(rename = "react-native")]
	ScriptBridge,
	/// Engine spawned inside the shared engine group.
	#[serde(rename = "flutter")]
	EngineGroup,
	/// Web content engine page.
	#[serde(rename = "web")]
	WebContent,
}

impl TabType {
	/// Name used in the configuration file.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Native => "native",
			Self::ScriptBridge => "react-native",
			Self::EngineGroup => "flutter",
			Self::WebContent => "web",
		}
	}
}

impl fmt::Display for TabType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One tab as declared in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabConfig {
	/// Stable tab identifier; engine-group identifiers derive from it.
	pub id: String,
	/// Label shown in the tab strip.
	pub title: String,
	/// Runtime kind.
	#[serde(rename = "type")]
	pub kind: TabType,
	/// Registered module name, required for [`TabType::ScriptBridge`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub module_name: Option<String>,
	/// Entrypoint function, optional for [`TabType::EngineGroup`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub entrypoint: Option<String>,
	/// Page address, required for [`TabType::WebContent`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	/// Icon name for the tab strip.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub icon: Option<String>,
}

impl TabConfig {
	/// Creates a record with no optional references set.
	pub fn new(id: impl Into<String>, title: impl Into<String>, kind: TabType) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			kind,
			module_name: None,
			entrypoint: None,
			url: None,
			icon: None,
		}
	}

	pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
		self.module_name = Some(module_name.into());
		self
	}

	pub fn with_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
		self.entrypoint = Some(entrypoint.into());
		self
	}

	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());
		self
	}

	pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
		self.icon = Some(icon.into());
		self
	}
}

/// Top-level shape of `tab_config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabsConfiguration {
	pub tabs: Vec<TabConfig>,
}

/// Built-in tab set used when no configuration can be loaded.
///
/// One tab of each kind, in strip order.
pub fn default_tabs() -> Vec<TabConfig> {
	vec![
		TabConfig::new("tab1", "Home", TabType::Native).with_icon("house.fill"),
		TabConfig::new("tab2", "Script", TabType::ScriptBridge)
			.with_module_name("ExampleRNApp")
			.with_icon("cpu.fill"),
		TabConfig::new("tab3", "Engine", TabType::EngineGroup)
			.with_entrypoint("main")
			.with_icon("bolt.fill"),
		TabConfig::new("tab4", "Web", TabType::WebContent)
			.with_url("local://index.html")
			.with_icon("globe"),
	]
}
