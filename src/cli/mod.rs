//! Command-line interface for the backoffice server.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Backoffice - admin API for users and site settings
#[derive(Parser)]
#[command(name = "backoffice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the search path
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "daemon")]
    Serve,

    /// Upsert the default settings
    #[command(alias = "db:seed")]
    Seed,

    /// Create default config file
    Init,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::parse_from(["backoffice"]);
        assert_eq!(cli.command(), Commands::Serve);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parses_subcommands_and_config() {
        let cli = Cli::parse_from(["backoffice", "seed", "--config", "/tmp/b.toml"]);
        assert_eq!(cli.command(), Commands::Seed);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/b.toml")));

        let cli = Cli::parse_from(["backoffice", "daemon"]);
        assert_eq!(cli.command(), Commands::Serve);
    }
}
