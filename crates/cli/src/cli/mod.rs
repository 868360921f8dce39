
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tabhost::BuildMode;

use crate::output::OutputFormat;
use crate::styles::cli_styles;

/// Root CLI for the tab host.
#[derive(Parser, Debug)]
#[command(name = "tabhost")]
#[command(about = "Compose and inspect multi-runtime tabs with headless backends")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: toon (default), json, ndjson, or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "toon")]
	pub format: OutputFormat,

	/// Host configuration file (defaults to ./tabhost.json when present)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Build mode; overrides TABHOST_MODE and the config file
	#[arg(long, global = true, value_name = "MODE")]
	pub mode: Option<BuildMode>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Compose every configured tab and list the mounted views.
	Tabs,
	/// Resolve one local:// address against the bundled resources.
	Resolve {
		#[arg(value_name = "ADDRESS")]
		address: String,
	},
	/// Print the address the web engine would actually load.
	BaseUrl {
		#[arg(value_name = "ADDRESS")]
		address: String,
	},
	/// Compose, select one tab, and load it if it is a web tab.
	Open {
		#[arg(value_name = "TAB_ID")]
		tab_id: String,
	},
}

impl Commands {
	/// Name used in the output envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Tabs => "tabs",
			Commands::Resolve { .. } => "resolve",
			Commands::BaseUrl { .. } => "base-url",
			Commands::Open { .. } => "open",
		}
	}
}
