// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Connection overrides as options; any trailing words form the remote command.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ssh-connect")]
#[command(about = "Connect to a remote machine using SSH credentials from .env")]
#[command(
    long_about = "Connect to a remote machine using SSH credentials from .env.\n\n\
    With no COMMAND, opens an interactive shell. Otherwise the words of COMMAND \
    are joined with spaces and run on the remote host."
)]
#[command(version)]
pub struct Cli {
    /// Settings file to load instead of searching for .env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Remote host (overrides SSH_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Remote user (overrides SSH_USER)
    #[arg(short, long)]
    pub user: Option<String>,

    /// SSH port (overrides SSH_PORT)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Private key file (overrides SSH_KEY_PATH)
    #[arg(short, long, value_name = "PATH")]
    pub identity: Option<PathBuf>,

    /// Seconds to wait for a remote command to finish
    #[arg(short, long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Read whole lines before showing remote output (for terminals that cannot be polled)
    #[arg(long)]
    pub blocking_input: bool,

    /// Suppress banners and notices
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Print command results and errors as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to run on the remote host
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
