//! Host and tab configuration loading.
//!
//! Host configuration (`tabhost.json`) is optional; every field has a
//! default. Tab configuration falls back to the built-in tab set whenever
//! the file is missing, unreadable or malformed, so the host always has
//! something to show.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tabhost::{BuildMode, TabConfig, TabsConfiguration, default_tabs};
use tabhost_runtime::BridgeSourceConfig;
use tabhost_runtime::script_bridge::DEFAULT_DEV_SERVER;
use tracing::{debug, warn};

use crate::error::{HostError, Result};

/// Host configuration file looked up in the working directory.
pub const HOST_CONFIG_FILE: &str = "tabhost.json";

/// Environment variable that overrides the configured build mode.
pub const MODE_ENV: &str = "TABHOST_MODE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfig {
	pub mode: Option<BuildMode>,
	pub tab_config: PathBuf,
	/// Directory served under `local://`.
	pub resource_dir: PathBuf,
	/// Directory holding the release script payload.
	pub bundle_dir: PathBuf,
	pub bridge_dev_server: String,
	pub web_dev_server: String,
	pub engine_group_name: String,
}

impl Default for HostConfig {
	fn default() -> Self {
		Self {
			mode: None,
			tab_config: PathBuf::from("tab_config.json"),
			resource_dir: PathBuf::from("Web"),
			bundle_dir: PathBuf::from("."),
			bridge_dev_server: DEFAULT_DEV_SERVER.to_string(),
			web_dev_server: tabhost::DEFAULT_DEV_ADDRESS.to_string(),
			engine_group_name: tabhost::DEFAULT_ENGINE_GROUP_NAME.to_string(),
		}
	}
}

impl HostConfig {
	/// Makes relative paths relative to `base` instead of the working directory.
	pub fn rebase(mut self, base: &Path) -> Self {
		for path in [&mut self.tab_config, &mut self.resource_dir, &mut self.bundle_dir] {
			if path.is_relative() {
				*path = base.join(&*path);
			}
		}
		self
	}

	pub fn bridge_sources(&self) -> BridgeSourceConfig {
		BridgeSourceConfig::default()
			.with_dev_server(self.bridge_dev_server.clone())
			.with_bundle_dir(&self.bundle_dir)
	}
}

/// Host configuration plus the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	pub config: HostConfig,
	pub path: Option<PathBuf>,
}

/// Loads `explicit`, else `tabhost.json` in the working directory, else defaults.
///
/// # Errors
///
/// Returns [`HostError::Config`] when a named file is missing, or when any
/// file that exists cannot be read or parsed.
pub fn load_host_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
	let path = match explicit {
		Some(path) => path.to_path_buf(),
		None => {
			let implicit = PathBuf::from(HOST_CONFIG_FILE);
			if !implicit.is_file() {
				debug!(target = "tabhost.config", "no host config file; using defaults");
				return Ok(LoadedConfig {
					config: HostConfig::default(),
					path: None,
				});
			}
			implicit
		}
	};

	let config_error = |reason: String| HostError::Config {
		path: path.clone(),
		reason,
	};
	let raw = std::fs::read_to_string(&path).map_err(|err| config_error(err.to_string()))?;
	let config: HostConfig = serde_json::from_str(&raw).map_err(|err| config_error(err.to_string()))?;

	let base = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
	debug!(target = "tabhost.config", path = %path.display(), "host config loaded");
	Ok(LoadedConfig {
		config: config.rebase(base),
		path: Some(path),
	})
}

/// Where the effective build mode came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSource {
	Flag,
	Environment,
	Config,
	Build,
}

/// Picks the build mode: flag, then environment, then config, then how
/// the binary was compiled.
///
/// # Errors
///
/// Returns [`HostError::InvalidInput`] for an unparsable environment value.
pub fn resolve_mode(flag: Option<BuildMode>, env: Option<&str>, config: Option<BuildMode>) -> Result<(BuildMode, ModeSource)> {
	if let Some(mode) = flag {
		return Ok((mode, ModeSource::Flag));
	}
	if let Some(raw) = env.filter(|v| !v.trim().is_empty()) {
		let mode = raw
			.parse::<BuildMode>()
			.map_err(|err| HostError::InvalidInput(format!("{MODE_ENV}: {err}")))?;
		return Ok((mode, ModeSource::Environment));
	}
	if let Some(mode) = config {
		return Ok((mode, ModeSource::Config));
	}
	Ok((BuildMode::from_build(), ModeSource::Build))
}

/// Where the tab list came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "camelCase")]
pub enum TabOrigin {
	File { path: PathBuf },
	Fallback { reason: String },
}

#[derive(Debug, Clone)]
pub struct LoadedTabs {
	pub tabs: Vec<TabConfig>,
	pub origin: TabOrigin,
}

fn read_tabs(path: &Path) -> anyhow::Result<TabsConfiguration> {
	let raw = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
	serde_json::from_str(&raw).with_context(|| format!("cannot parse {}", path.display()))
}

/// Reads the tab configuration file, falling back to [`default_tabs`].
pub fn load_tabs(path: &Path) -> LoadedTabs {
	match read_tabs(path) {
		Ok(config) => {
			debug!(target = "tabhost.config", path = %path.display(), tabs = config.tabs.len(), "tab config loaded");
			LoadedTabs {
				tabs: config.tabs,
				origin: TabOrigin::File { path: path.to_path_buf() },
			}
		}
		Err(err) => {
			let reason = format!("{err:#}");
			warn!(target = "tabhost.config", %reason, "using built-in tabs");
			LoadedTabs {
				tabs: default_tabs(),
				origin: TabOrigin::Fallback { reason },
			}
		}
	}
}
