use std::time::Instant;

use serde::Serialize;
use tabhost::headless::{DocumentRecord, HeadlessWebEngineFactory};
use tabhost::{BuildMode, LoadReport, StartupReport, TabHost};

use super::{HostSetup, TabRow};
use crate::config::{TabOrigin, load_tabs};
use crate::error::{HostError, Result};
use crate::output::{DiagnosticLevel, OutputFormat, ResultBuilder, print_result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenData {
	pub mode: BuildMode,
	pub startup: StartupReport,
	pub tab: TabRow,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub entrypoint: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub load: Option<LoadReport>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub document: Option<DocumentRecord>,
}

/// Composes every tab, selects `tab_id` and loads it if it is a web tab.
pub async fn execute(setup: &HostSetup, tab_id: &str, format: OutputFormat) -> Result<()> {
	let start = Instant::now();
	let loaded = load_tabs(&setup.loaded.config.tab_config);

	let web = HeadlessWebEngineFactory::new();
	let web_log = web.log();
	let mut ctx = setup.context(web);
	let startup = ctx.startup();
	let mut host = TabHost::compose(&mut ctx, &loaded.tabs);

	let outcome = open_tab(&mut host, tab_id).await;
	drop(host);
	ctx.shutdown();
	let (tab, entrypoint, load) = outcome?;

	let mut builder = ResultBuilder::new("open").started_at(start);
	if let TabOrigin::Fallback { reason } = &loaded.origin {
		builder = builder.diagnostic_with_source(DiagnosticLevel::Warning, format!("using built-in tabs: {reason}"), "config");
	}
	if let Some(message) = &tab.message {
		builder = builder.diagnostic_with_source(DiagnosticLevel::Warning, message.clone(), tab.id.clone());
	}

	let document = load.as_ref().and_then(|_| web_log.last_document());
	let result = builder
		.data(OpenData {
			mode: setup.mode,
			startup,
			tab,
			entrypoint,
			load,
			document,
		})
		.build();
	print_result(&result, format);
	Ok(())
}

async fn open_tab(host: &mut TabHost, tab_id: &str) -> Result<(TabRow, Option<String>, Option<LoadReport>)> {
	let index = host.position(tab_id).ok_or_else(|| HostError::TabNotFound {
		id: tab_id.to_string(),
		available: host.views().iter().map(|view| view.tab_id.clone()).collect(),
	})?;
	host.select(index);

	let view = &host.views()[index];
	let entrypoint = match view.engine() {
		Some(handle) => Some(handle.entrypoint()?),
		None => None,
	};
	let load = match view.web_tab() {
		Some(tab) => Some(tab.load().await?),
		None => None,
	};
	Ok((TabRow::from_view(index, view), entrypoint, load))
}
