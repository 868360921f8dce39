use std::time::Instant;

use serde::Serialize;
use tabhost::BuildMode;

use super::HostSetup;
use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, print_result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseUrlData {
	pub requested: String,
	pub effective: String,
	pub redirected: bool,
	pub mode: BuildMode,
}

pub fn execute(setup: &HostSetup, address: &str, format: OutputFormat) -> Result<()> {
	let start = Instant::now();
	let resolver = setup.resolver();

	let result = ResultBuilder::new("base-url")
		.started_at(start)
		.data(BaseUrlData {
			requested: address.to_string(),
			effective: resolver.resolve_base_address(address),
			redirected: resolver.redirects(address),
			mode: setup.mode,
		})
		.build();
	print_result(&result, format);
	Ok(())
}
