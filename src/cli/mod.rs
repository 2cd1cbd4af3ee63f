//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Folio - a small self-hosted portfolio gallery
#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file (overrides the default search locations)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the web server (default)
    #[command(alias = "s")]
    Serve,

    /// Create default config file
    Init,
}
