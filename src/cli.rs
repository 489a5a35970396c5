//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::output::OutputFormat;

/// Lock the current virtual console until the user's password is entered.
#[derive(Debug, Parser)]
#[command(name = "vlock-main", version, about, long_about = None)]
pub struct Cli {
    /// Plugins to load, in order. Dependencies are loaded automatically.
    #[arg(value_name = "PLUGIN")]
    pub plugins: Vec<String>,

    /// Show the message for locking all consoles.
    #[arg(short, long)]
    pub all: bool,

    /// Resolve the plugins, print their dispatch order and exit.
    #[arg(long)]
    pub check: bool,

    /// Output format for --check
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// System configuration file (root only)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
