use std::time::Instant;

use serde::Serialize;
use tabhost::headless::HeadlessWebEngineFactory;
use tabhost::{BuildMode, PoolStatus, StartupReport, TabHost};
use tracing::info;

use super::{HostSetup, TabRow};
use crate::config::{ModeSource, TabOrigin, load_tabs};
use crate::error::Result;
use crate::output::{DiagnosticLevel, OutputFormat, ResultBuilder, print_result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsData {
	pub mode: BuildMode,
	pub mode_source: ModeSource,
	pub tab_source: TabOrigin,
	pub startup: StartupReport,
	pub tabs: Vec<TabRow>,
}

pub fn execute(setup: &HostSetup, format: OutputFormat) -> Result<()> {
	let start = Instant::now();
	let loaded = load_tabs(&setup.loaded.config.tab_config);

	let mut ctx = setup.context(HeadlessWebEngineFactory::new());
	let startup = ctx.startup();
	let host = TabHost::compose(&mut ctx, &loaded.tabs);
	let tabs: Vec<TabRow> = host.views().iter().enumerate().map(|(i, view)| TabRow::from_view(i, view)).collect();
	info!(target = "tabhost.cli", tabs = tabs.len(), "tabs composed");
	drop(host);
	ctx.shutdown();

	let mut builder = ResultBuilder::new("tabs").started_at(start);
	if let TabOrigin::Fallback { reason } = &loaded.origin {
		builder = builder.diagnostic_with_source(DiagnosticLevel::Warning, format!("using built-in tabs: {reason}"), "config");
	}
	for (pool, status) in [("engine-group", &startup.engine_group), ("script-bridge", &startup.script_bridge)] {
		if let PoolStatus::Failed { message, .. } = status {
			builder = builder.diagnostic_with_source(DiagnosticLevel::Warning, message.clone(), pool);
		}
	}

	let result = builder
		.data(TabsData {
			mode: setup.mode,
			mode_source: setup.mode_source,
			tab_source: loaded.origin,
			startup,
			tabs,
		})
		.build();
	print_result(&result, format);
	Ok(())
}
