use clap::Parser;
use tabhost_cli::cli::Cli;
use tabhost_cli::error::HostError;
use tabhost_cli::output::{self, OutputFormat, ResultBuilder};
use tabhost_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli).await {
		handle_error(command, err, format);
		std::process::exit(1);
	}
}

fn handle_error(command: &str, err: HostError, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	// Humans read stderr; agents parse the envelope on stdout.
	output::print_error_stderr(&cmd_error);

	if format != OutputFormat::Text {
		let result: output::CommandResult<()> = ResultBuilder::new(command)
			.error_with(cmd_error)
			.build();
		output::print_result(&result, format);
	}
}
