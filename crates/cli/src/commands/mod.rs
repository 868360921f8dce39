//! Command dispatch.
//!
//! Every command resolves the build mode and host configuration the same
//! way, then either builds a bare resolver (`resolve`, `base-url`) or a full
//! runtime context with headless backends (`tabs`, `open`).

mod base_url;
mod open;
mod resolve;
mod tabs;

use std::sync::Arc;

use serde::Serialize;
use tabhost::headless::HeadlessWebEngineFactory;
use tabhost::{BuildMode, Chrome, DirectoryAssets, MountedView, ResourceResolver, RuntimeContext, ViewContent};
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config::{LoadedConfig, MODE_ENV, ModeSource, load_host_config, resolve_mode};
use crate::error::Result;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let setup = HostSetup::prepare(&cli)?;
	let format = cli.format;

	match cli.command {
		Commands::Tabs => tabs::execute(&setup, format),
		Commands::Resolve { address } => resolve::execute(&setup, &address, format),
		Commands::BaseUrl { address } => base_url::execute(&setup, &address, format),
		Commands::Open { tab_id } => open::execute(&setup, &tab_id, format).await,
	}
}

/// Mode and configuration shared by every command.
#[derive(Debug)]
pub struct HostSetup {
	pub mode: BuildMode,
	pub mode_source: ModeSource,
	pub loaded: LoadedConfig,
}

impl HostSetup {
	pub fn prepare(cli: &Cli) -> Result<Self> {
		let loaded = load_host_config(cli.config.as_deref())?;
		let env = std::env::var(MODE_ENV).ok();
		let (mode, mode_source) = resolve_mode(cli.mode, env.as_deref(), loaded.config.mode)?;
		debug!(target = "tabhost.cli", %mode, source = ?mode_source, "build mode resolved");

		Ok(Self {
			mode,
			mode_source,
			loaded,
		})
	}

	pub fn resolver(&self) -> ResourceResolver {
		let config = &self.loaded.config;
		ResourceResolver::new(self.mode, Arc::new(DirectoryAssets::new(&config.resource_dir)))
			.with_dev_address(config.web_dev_server.clone())
	}

	pub fn context(&self, web: HeadlessWebEngineFactory) -> RuntimeContext {
		let config = &self.loaded.config;
		RuntimeContext::builder(self.mode)
			.engine_group_name(config.engine_group_name.clone())
			.bridge_sources(config.bridge_sources())
			.assets(DirectoryAssets::new(&config.resource_dir))
			.dev_address(config.web_dev_server.clone())
			.web_factory(web)
			.build()
	}
}

/// One mounted view as printed by `tabs` and `open`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRow {
	pub index: usize,
	pub id: String,
	pub title: String,
	pub icon: String,
	pub kind: String,
	pub chrome: Chrome,
	pub status: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub engine: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub module: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub root_tag: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
}

impl TabRow {
	pub fn from_view(index: usize, view: &MountedView) -> Self {
		let mut row = Self {
			index,
			id: view.tab_id.clone(),
			title: view.title.clone(),
			icon: view.icon.clone(),
			kind: view.kind.to_string(),
			chrome: view.chrome,
			status: if view.is_placeholder() { "placeholder" } else { "mounted" },
			message: None,
			engine: None,
			module: None,
			root_tag: None,
			address: None,
		};

		match &view.content {
			ViewContent::Native(_) => {}
			ViewContent::ScriptBridge(bridge_view) => {
				row.module = Some(bridge_view.module_name.clone());
				row.root_tag = Some(bridge_view.root_tag);
			}
			ViewContent::EngineGroup(handle) => row.engine = Some(handle.identifier().to_string()),
			ViewContent::Web(tab) => row.address = Some(tab.address().to_string()),
			ViewContent::Placeholder { message } => row.message = Some(message.clone()),
		}
		row
	}
}
