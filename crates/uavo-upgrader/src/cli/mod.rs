//! Command-line interface for uavo-upgrader.
//!
//! This module provides the CLI structure for the `uavoup` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, DefinitionsCommand, SanitizeCommand, UpgradeCommand};

/// uavoup - Upgrade flight controller settings dumps
///
/// Resolves the object definitions for the firmware version that produced a
/// settings dump, imports it, zeroes the PWM bounds of disabled mixer
/// channels and exports the result.
#[derive(Debug, Parser)]
#[command(name = "uavoup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full upgrade pipeline on a settings dump
    Upgrade(UpgradeCommand),

    /// Sanitize disabled mixer channels of a JSON settings dump
    Sanitize(SanitizeCommand),

    /// Inspect the definition archive
    #[command(subcommand)]
    Definitions(DefinitionsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                2 => crate::logging::Verbosity::Debug,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Config(ConfigCommand::Path),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "uavoup");
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), Verbosity::Debug);
        assert_eq!(cli(5, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upgrade() {
        let args = vec![
            "uavoup",
            "upgrade",
            "--githash",
            "Release-20160120.3",
            "dump.bin",
            "-o",
            "out.json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Upgrade(cmd) = cli.command else {
            panic!("expected upgrade command");
        };
        assert_eq!(cmd.githash, "Release-20160120.3");
        assert_eq!(cmd.input, PathBuf::from("dump.bin"));
        assert_eq!(cmd.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_parse_upgrade_from_stdin() {
        let args = vec!["uavoup", "upgrade", "-g", "a1b2c3d", "-"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Upgrade(cmd) = cli.command else {
            panic!("expected upgrade command");
        };
        assert!(cmd.reads_stdin());
    }

    #[test]
    fn test_parse_upgrade_requires_githash() {
        let args = vec!["uavoup", "upgrade", "dump.bin"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_sanitize_strict() {
        let args = vec!["uavoup", "sanitize", "--strict", "-"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Sanitize(cmd) = cli.command else {
            panic!("expected sanitize command");
        };
        assert!(cmd.strict);
        assert!(cmd.reads_stdin());
    }

    #[test]
    fn test_parse_definitions_check() {
        let args = vec!["uavoup", "definitions", "check", "abc1234"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Definitions(DefinitionsCommand::Check { ref githash }) if githash == "abc1234"
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["uavoup", "-c", "/custom/config.toml", "config", "show"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose() {
        let args = vec!["uavoup", "-vv", "definitions", "list"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
