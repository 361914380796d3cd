//! `uavoup` - CLI for uavo-upgrader
//!
//! This binary runs the settings upgrade pipeline on local files and inspects
//! the definition archive and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{Read, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use uavo_upgrader::cli::{Cli, Command, ConfigCommand, DefinitionsCommand, SanitizeCommand, UpgradeCommand};
use uavo_upgrader::{
    init_logging, Config, DefinitionSource, JsonCodec, MixerChannelSanitizer, SanitizeOutcome,
    StaticArchive, UpgradeOptions, Upgrader,
};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Upgrade(cmd) => handle_upgrade(&config, &cmd),
        Command::Sanitize(cmd) => handle_sanitize(&config, &cmd),
        Command::Definitions(cmd) => handle_definitions(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Exit code for an upgrade rejected because of its input.
const EXIT_REJECTED: u8 = 2;

fn handle_upgrade(config: &Config, cmd: &UpgradeCommand) -> anyhow::Result<ExitCode> {
    let raw = read_input(&cmd.input, cmd.reads_stdin())?;
    let archive = StaticArchive::from_config(config)?;
    let codec = JsonCodec {
        pretty: cmd.pretty,
    };
    let upgrader = Upgrader::new(archive, codec, codec, UpgradeOptions::from(config));

    let output = match upgrader.upgrade(&cmd.githash, &raw) {
        Ok(output) => output,
        Err(err) if err.is_client_error() => {
            error!(input = %cmd.input.display(), error = %err, "upgrade rejected");
            return Ok(ExitCode::from(EXIT_REJECTED));
        }
        Err(err) => {
            return Err(err).with_context(|| format!("upgrading {}", cmd.input.display()));
        }
    };
    write_output(cmd.output.as_deref(), &output.document)?;

    if let SanitizeOutcome::Applied(report) = &output.sanitize {
        if !report.is_noop() {
            info!(
                changed = ?report.changed_channels,
                "zeroed PWM range of disabled channels"
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_sanitize(config: &Config, cmd: &SanitizeCommand) -> anyhow::Result<ExitCode> {
    let raw = read_input(&cmd.input, cmd.reads_stdin())?;
    let mut settings = JsonCodec::parse(&raw)?;
    let sanitizer = MixerChannelSanitizer::new(config.sanitize.disabled_option.clone());

    let exit = match sanitizer.sanitize_settings(&mut settings) {
        Ok(report) => {
            info!(
                channels = report.channel_count,
                disabled = ?report.disabled_channels,
                changed = ?report.changed_channels,
                "sanitized settings dump"
            );
            ExitCode::SUCCESS
        }
        Err(err) if cmd.strict => return Err(uavo_upgrader::Error::from(err).into()),
        Err(err) => {
            warn!(error = %err, "mixer channel sanitation skipped");
            ExitCode::SUCCESS
        }
    };

    let codec = JsonCodec {
        pretty: cmd.pretty,
    };
    write_output(cmd.output.as_deref(), &codec.render(&settings)?)?;
    Ok(exit)
}

fn handle_definitions(config: &Config, cmd: &DefinitionsCommand) -> anyhow::Result<ExitCode> {
    let archive = StaticArchive::from_config(config)?;
    match cmd {
        DefinitionsCommand::List { json } => {
            let versions = archive.versions();
            if *json {
                println!("{}", serde_json::to_string_pretty(&versions)?);
            } else if versions.is_empty() {
                println!(
                    "No definitions found in {}",
                    config.definitions_dir().display()
                );
            } else {
                for version in versions {
                    let path = archive.path_for(&version).map(Path::display);
                    match path {
                        Some(path) => println!("{version:<30} {path}"),
                        None => println!("{version}"),
                    }
                }
            }
        }
        DefinitionsCommand::Check { githash } => {
            let bundle = archive.resolve(githash)?;
            println!("Version:  {}", bundle.githash);
            println!("Size:     {} bytes", bundle.len());
            println!("Digest:   {}", bundle.digest);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Definitions]");
                println!(
                    "  Archive dir:        {}",
                    config.definitions_dir().display()
                );
                println!(
                    "  Explicit versions:  {}",
                    config.definitions.versions.len()
                );
                println!(
                    "  Pinned digests:     {}",
                    config.definitions.digests.len()
                );
                println!();
                println!("[Import]");
                println!("  Decompress:         {}", config.import.decompress);
                println!(
                    "  Max payload bytes:  {}",
                    config.import.max_payload_bytes
                );
                println!();
                println!("[Sanitize]");
                println!("  Enabled:            {}", config.sanitize.enabled);
                println!(
                    "  Disabled option:    {}",
                    config.sanitize.disabled_option
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    println!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn read_input(path: &Path, stdin: bool) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if stdin {
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("reading stdin")?;
    } else {
        bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    }
    Ok(bytes)
}

fn write_output(path: Option<&Path>, document: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, document)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(document.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
