//! CLI help output styling.

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Returns clap Styles matching cargo's help output colors.
///
/// Errors and invalid values are red so a bad `--mode` or `--format`
/// stands out.
pub fn cli_styles() -> Styles {
	Styles::styled()
		.error(AnsiColor::Red.on_default().bold())
		.invalid(AnsiColor::Red.on_default())
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
}
