use std::time::Instant;

use serde::Serialize;
use tabhost::{BuildMode, ResolvedResource};
use tracing::debug;

use super::HostSetup;
use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, print_result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveData {
	pub address: String,
	pub mode: BuildMode,
	#[serde(flatten)]
	pub resource: ResolvedResource,
	pub length: usize,
}

pub fn execute(setup: &HostSetup, address: &str, format: OutputFormat) -> Result<()> {
	let start = Instant::now();
	let resolver = setup.resolver();
	let resource = resolver.resolve_address(address)?;
	debug!(target = "tabhost.cli", file = %resource.file_name, mime = resource.mime_type, "resolved");

	let result = ResultBuilder::new("resolve")
		.started_at(start)
		.data(ResolveData {
			address: address.to_string(),
			mode: setup.mode,
			length: resource.len(),
			resource,
		})
		.build();
	print_result(&result, format);
	Ok(())
}
