//! `uavo-upgrader` - import pipeline for flight controller settings dumps
//!
//! This library resolves per-version object definitions, decodes uploaded
//! settings dumps through a pluggable importer, zeroes the PWM bounds of
//! disabled mixer channels, and renders the result through a pluggable
//! exporter.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod codec;
pub mod config;
pub mod definitions;
pub mod error;
pub mod logging;
pub mod mixer;
pub mod payload;
pub mod sanitize;
pub mod uavo;
pub mod upgrade;

pub use codec::JsonCodec;
pub use config::Config;
pub use definitions::{DefinitionBundle, DefinitionSource, StaticArchive};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use sanitize::{MixerChannelSanitizer, SanitizeError, SanitizeOutcome, SanitizeReport};
pub use uavo::SettingsCollection;
pub use upgrade::{Exporter, Importer, UpgradeOptions, UpgradeOutput, Upgrader};
