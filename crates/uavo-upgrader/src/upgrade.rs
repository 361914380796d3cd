//! The settings upgrade pipeline.
//!
//! One upgrade request takes a version identifier and an uploaded settings
//! dump and produces an exported document:
//!
//! 1. resolve the definitions for the version (unknown versions fail);
//! 2. decode the payload, inflating zlib uploads;
//! 3. import the payload into a [`SettingsCollection`];
//! 4. sanitize disabled mixer channels, logging and continuing on failure;
//! 5. export the settings.
//!
//! Decoding and exporting are delegated to [`Importer`] and [`Exporter`]
//! implementations so the binary object decoder and the XML renderer can
//! live outside this crate.

use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::definitions::{DefinitionBundle, DefinitionSource};
use crate::error::{Error, Result};
use crate::payload::decode_payload;
use crate::sanitize::{MixerChannelSanitizer, SanitizeOutcome};
use crate::uavo::SettingsCollection;

/// Content type of documents rendered by the XML exporter.
pub const XML_CONTENT_TYPE: &str = "text/xml";

/// Decodes an uploaded settings dump.
pub trait Importer {
    /// Decode `payload`, produced by firmware version `githash`, using that
    /// version's definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded.
    fn import(
        &self,
        githash: &str,
        payload: &[u8],
        definitions: &DefinitionBundle,
    ) -> Result<SettingsCollection>;
}

/// Renders decoded settings as a document.
pub trait Exporter {
    /// Render `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be rendered.
    fn export(&self, settings: &SettingsCollection) -> Result<String>;

    /// MIME type of the rendered document.
    fn content_type(&self) -> &'static str {
        XML_CONTENT_TYPE
    }
}

/// Pipeline tuning, normally taken from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Try to inflate uploads as zlib.
    pub decompress: bool,
    /// Largest accepted upload, before and after decompression.
    pub max_payload_bytes: usize,
    /// Run mixer channel sanitation.
    pub sanitize: bool,
    /// Mixer type option name that marks a channel as disabled.
    pub disabled_option: String,
}

impl Default for UpgradeOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for UpgradeOptions {
    fn from(config: &Config) -> Self {
        Self {
            decompress: config.import.decompress,
            max_payload_bytes: config.import.max_payload_bytes,
            sanitize: config.sanitize.enabled,
            disabled_option: config.sanitize.disabled_option.clone(),
        }
    }
}

/// The result of a successful upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOutput {
    /// The exported document.
    pub document: String,
    /// MIME type of `document`.
    pub content_type: &'static str,
    /// What sanitation did.
    pub sanitize: SanitizeOutcome,
    /// Whether the upload was zlib-compressed.
    pub decompressed: bool,
}

/// Runs upgrade requests against a definition source and a pair of codecs.
#[derive(Debug)]
pub struct Upgrader<D, I, E> {
    definitions: D,
    importer: I,
    exporter: E,
    options: UpgradeOptions,
    sanitizer: MixerChannelSanitizer,
}

impl<D, I, E> Upgrader<D, I, E>
where
    D: DefinitionSource,
    I: Importer,
    E: Exporter,
{
    /// Create an upgrader.
    #[must_use]
    pub fn new(definitions: D, importer: I, exporter: E, options: UpgradeOptions) -> Self {
        let sanitizer = MixerChannelSanitizer::new(options.disabled_option.clone());
        Self {
            definitions,
            importer,
            exporter,
            options,
            sanitizer,
        }
    }

    /// The options this upgrader runs with.
    #[must_use]
    pub fn options(&self) -> &UpgradeOptions {
        &self.options
    }

    /// The definition source.
    #[must_use]
    pub fn definitions(&self) -> &D {
        &self.definitions
    }

    /// Upgrade one uploaded settings dump.
    ///
    /// # Errors
    ///
    /// `githash` is matched exactly; surrounding whitespace is not stripped.
    ///
    /// Fails if `githash` is blank or unknown, the payload is too large, or
    /// the importer or exporter fails. Sanitation failures never fail the
    /// upgrade; they are logged and reported in [`UpgradeOutput::sanitize`].
    pub fn upgrade(&self, githash: &str, raw: &[u8]) -> Result<UpgradeOutput> {
        if githash.trim().is_empty() {
            return Err(Error::MissingGithash);
        }
        let span = info_span!("upgrade", %githash, size = raw.len());
        let _guard = span.enter();

        let definitions = self.definitions.resolve(githash)?;
        let payload = decode_payload(raw, self.options.decompress, self.options.max_payload_bytes)?;
        let mut settings = self
            .importer
            .import(githash, payload.as_bytes(), &definitions)?;

        let sanitize = self.sanitize(&mut settings);
        let document = self.exporter.export(&settings)?;

        info!(
            objects = settings.len(),
            decompressed = payload.was_decompressed(),
            document = document.len(),
            "upgrade complete"
        );
        Ok(UpgradeOutput {
            document,
            content_type: self.exporter.content_type(),
            sanitize,
            decompressed: payload.was_decompressed(),
        })
    }

    fn sanitize(&self, settings: &mut SettingsCollection) -> SanitizeOutcome {
        if !self.options.sanitize {
            return SanitizeOutcome::Disabled;
        }
        let outcome = SanitizeOutcome::from(self.sanitizer.sanitize_settings(settings));
        if let SanitizeOutcome::Skipped(err) = &outcome {
            warn!(error = %err, "mixer channel sanitation skipped");
        }
        outcome
    }
}
