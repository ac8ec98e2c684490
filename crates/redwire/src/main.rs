use std::process::ExitCode;

use client::Client;
use log::debug;
use log::error;
use redwire::config::Cli;
use redwire::config::CliConfig;
use redwire::config::Parser;
use redwire::config::setup;
use redwire::shell;
use tokio::io::BufReader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	let args = Cli::parse();
	let config = match setup(&args) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("redwire: {}", e);
			return ExitCode::FAILURE;
		}
	};

	match run(&config, args.command).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{}", e);
			eprintln!("redwire: {}", e);
			ExitCode::FAILURE
		}
	}
}

async fn run(
	config: &CliConfig,
	command: Vec<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let id = config.identifier();
	let mut client = Client::connect(&id, config.client_options()).await?;
	debug!("Session established with {}", id);

	if command.is_empty() {
		let prompt = format!("{}> ", id);
		let mut stdout = tokio::io::stdout();
		shell::run_repl(
			&mut client,
			BufReader::new(tokio::io::stdin()),
			&mut stdout,
			&prompt,
			config.inline,
		)
		.await?;
	} else {
		let words = command.into_iter().map(String::into_bytes).collect();
		let reply = shell::execute(&mut client, words, config.inline).await?;
		println!("{}", reply);
	}

	client.close().await?;
	Ok(())
}
