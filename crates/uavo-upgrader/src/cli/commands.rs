//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Upgrade command arguments.
#[derive(Debug, Args)]
pub struct UpgradeCommand {
    /// Version identifier of the firmware that produced the dump
    #[arg(short, long)]
    pub githash: String,

    /// Settings dump to upgrade, optionally zlib-compressed ("-" for stdin)
    pub input: PathBuf,

    /// Write the exported document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pretty-print the exported document
    #[arg(short, long)]
    pub pretty: bool,
}

/// Sanitize command arguments.
#[derive(Debug, Args)]
pub struct SanitizeCommand {
    /// JSON settings dump ("-" for stdin)
    pub input: PathBuf,

    /// Write the sanitized dump here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Fail if the dump cannot be sanitized instead of passing it through
    #[arg(long)]
    pub strict: bool,

    /// Pretty-print the sanitized dump
    #[arg(short, long)]
    pub pretty: bool,
}

/// Definition archive commands.
#[derive(Debug, Subcommand)]
pub enum DefinitionsCommand {
    /// List known versions
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Resolve a version and show its archive digest
    Check {
        /// Version identifier to resolve
        githash: String,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

impl UpgradeCommand {
    /// Check if the input should be read from stdin.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        is_stdin(&self.input)
    }
}

impl SanitizeCommand {
    /// Check if the input should be read from stdin.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        is_stdin(&self.input)
    }
}

fn is_stdin(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_stdin() {
        let cmd = SanitizeCommand {
            input: PathBuf::from("-"),
            output: None,
            strict: false,
            pretty: false,
        };
        assert!(cmd.reads_stdin());

        let cmd = UpgradeCommand {
            githash: "abc1234".to_string(),
            input: PathBuf::from("dump.bin"),
            output: None,
            pretty: false,
        };
        assert!(!cmd.reads_stdin());
    }

    #[test]
    fn test_definitions_command_debug() {
        let cmd = DefinitionsCommand::Check {
            githash: "Release-20160120.3".to_string(),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Check"));
        assert!(debug_str.contains("Release-20160120.3"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
