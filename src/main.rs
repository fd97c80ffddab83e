// ABOUTME: Entry point for the ssh-connect CLI application.
// ABOUTME: Resolves connection settings, then runs one command or an interactive shell.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use ssh_connect::config::{ConnectionConfig, Overrides, parse_port};
use ssh_connect::error::Result;
use ssh_connect::output::{Output, OutputMode};
use ssh_connect::shell::InputMode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the verbose flag picks the level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    if let Err(e) = run(cli, &mut output).await {
        output.failure(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let overrides = Overrides {
        host: cli.host,
        user: cli.user,
        password: None,
        key_path: cli.identity,
        port: cli.port.as_deref().map(parse_port).transpose()?,
    };
    let config = ConnectionConfig::resolve(&overrides, cli.env_file.as_deref())?;

    if cli.command.is_empty() {
        let input_mode = if cli.blocking_input {
            InputMode::blocking()
        } else {
            InputMode::detect()
        };
        commands::shell_command(config, input_mode, output).await
    } else {
        let command = cli.command.join(" ");
        let timeout = Duration::from_secs(cli.timeout);
        commands::exec_command(config, &command, timeout, output).await
    }
}
