//! Mixer channel PWM sanitation.
//!
//! Channels whose mixer type is disabled get their actuator PWM bounds
//! (minimum, maximum and neutral) zeroed, so an imported configuration never
//! drives an output nobody assigned. Sanitation is best effort: a settings
//! dump that lacks the objects or has an unexpected shape yields a
//! [`SanitizeError`] and the actuator settings are left exactly as imported.
//!
//! # Example
//!
//! ```
//! use uavo_upgrader::mixer::{ActuatorSettings, MixerSettings, MixerType, PwmRange};
//! use uavo_upgrader::sanitize::MixerChannelSanitizer;
//!
//! let mixer = MixerSettings::new(vec![MixerType::Disabled, MixerType::Motor]);
//! let mut actuators = ActuatorSettings::uniform(2, PwmRange::new(1000, 2000, 1000));
//!
//! let report = MixerChannelSanitizer::default()
//!     .sanitize(&mixer, &mut actuators)
//!     .unwrap();
//!
//! assert_eq!(report.disabled_channels, vec![1]);
//! assert_eq!(actuators.channel(1), Some(PwmRange::ZERO));
//! assert_eq!(actuators.channel(2), Some(PwmRange::new(1000, 2000, 1000)));
//! ```

use thiserror::Error;
use tracing::{debug, trace};

use crate::mixer::{
    ActuatorSettings, MixerSettings, PwmRange, ACTUATOR_SETTINGS, CHANNEL_MAX, CHANNEL_MIN,
    CHANNEL_NEUTRAL, DISABLED_OPTION,
};
use crate::uavo::{FieldKind, SettingsCollection};

/// Why sanitation could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    /// A required object is not in the settings.
    #[error("object {object} is missing")]
    ObjectMissing {
        /// Object type name.
        object: String,
    },

    /// A required field is not in its object.
    #[error("field {object}.{field} is missing")]
    FieldMissing {
        /// Object type name.
        object: String,
        /// Field name.
        field: String,
    },

    /// A field holds the wrong kind of data.
    #[error("field {object}.{field} is {actual}, expected {expected}")]
    FieldKind {
        /// Object type name.
        object: String,
        /// Field name.
        field: String,
        /// Kind the sanitizer needs.
        expected: FieldKind,
        /// Kind found.
        actual: FieldKind,
    },

    /// A field has the wrong number of elements.
    #[error("field {object}.{field} has {actual} elements, expected {expected}")]
    LengthMismatch {
        /// Object type name.
        object: String,
        /// Field name.
        field: String,
        /// Expected element count.
        expected: usize,
        /// Element count found.
        actual: usize,
    },

    /// An enum value points outside its option table.
    #[error("field {object}.{field} has value {value} but only {options} options")]
    UnknownOption {
        /// Object type name.
        object: String,
        /// Field name.
        field: String,
        /// Value found.
        value: u8,
        /// Size of the option table.
        options: usize,
    },
}

impl SanitizeError {
    /// Create an object missing error.
    #[must_use]
    pub fn object_missing(object: impl Into<String>) -> Self {
        Self::ObjectMissing {
            object: object.into(),
        }
    }

    /// Create a field missing error.
    #[must_use]
    pub fn field_missing(object: impl Into<String>, field: impl Into<String>) -> Self {
        Self::FieldMissing {
            object: object.into(),
            field: field.into(),
        }
    }
}

/// What a successful sanitation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Number of mixer channels inspected.
    pub channel_count: usize,
    /// 1-based channels whose mixer type is disabled.
    pub disabled_channels: Vec<usize>,
    /// 1-based channels whose bounds were actually rewritten.
    pub changed_channels: Vec<usize>,
}

impl SanitizeReport {
    /// Check if sanitation left every value as it was.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changed_channels.is_empty()
    }
}

/// Result of the sanitation step of an upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeOutcome {
    /// Sanitation ran.
    Applied(SanitizeReport),
    /// Sanitation could not run; settings are as imported.
    Skipped(SanitizeError),
    /// Sanitation is turned off in configuration.
    Disabled,
}

impl SanitizeOutcome {
    /// The report, if sanitation ran.
    #[must_use]
    pub fn report(&self) -> Option<&SanitizeReport> {
        match self {
            Self::Applied(report) => Some(report),
            _ => None,
        }
    }

    /// Check if sanitation was attempted and failed.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

impl From<Result<SanitizeReport, SanitizeError>> for SanitizeOutcome {
    fn from(result: Result<SanitizeReport, SanitizeError>) -> Self {
        match result {
            Ok(report) => Self::Applied(report),
            Err(err) => Self::Skipped(err),
        }
    }
}

/// Zeroes the PWM bounds of disabled mixer channels.
#[derive(Debug, Clone)]
pub struct MixerChannelSanitizer {
    disabled_option: String,
}

impl Default for MixerChannelSanitizer {
    fn default() -> Self {
        Self::new(DISABLED_OPTION)
    }
}

impl MixerChannelSanitizer {
    /// Create a sanitizer. `disabled_option` is the mixer type option name
    /// that marks a channel as disabled.
    #[must_use]
    pub fn new(disabled_option: impl Into<String>) -> Self {
        Self {
            disabled_option: disabled_option.into(),
        }
    }

    /// The option name treated as disabled.
    #[must_use]
    pub fn disabled_option(&self) -> &str {
        &self.disabled_option
    }

    /// Zero the bounds of every disabled channel in `actuators`.
    ///
    /// Channel counts are checked before anything is written, so on error
    /// `actuators` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::LengthMismatch`] if any of the actuator
    /// arrays does not have one element per mixer channel.
    pub fn sanitize(
        &self,
        mixer: &MixerSettings,
        actuators: &mut ActuatorSettings,
    ) -> Result<SanitizeReport, SanitizeError> {
        let expected = mixer.len();
        if actuators.channel_count() != Some(expected) {
            let (field, actual) = [
                (CHANNEL_MIN, actuators.channel_min.len()),
                (CHANNEL_MAX, actuators.channel_max.len()),
                (CHANNEL_NEUTRAL, actuators.channel_neutral.len()),
            ]
            .into_iter()
            .find(|(_, actual)| *actual != expected)
            .unwrap_or((CHANNEL_MIN, actuators.channel_min.len()));
            return Err(SanitizeError::LengthMismatch {
                object: ACTUATOR_SETTINGS.to_string(),
                field: field.to_string(),
                expected,
                actual,
            });
        }

        let mut report = SanitizeReport {
            channel_count: expected,
            ..SanitizeReport::default()
        };
        for channel in mixer.disabled_channels() {
            report.disabled_channels.push(channel);
            if actuators.channel(channel) != Some(PwmRange::ZERO) {
                trace!(channel, "zeroing PWM range of disabled channel");
                actuators.set_channel(channel, PwmRange::ZERO);
                report.changed_channels.push(channel);
            }
        }
        Ok(report)
    }

    /// Sanitize the actuator object of a decoded settings collection in place.
    ///
    /// The new channel arrays are written back only after every check has
    /// passed; on error `settings` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if either object is missing or malformed.
    pub fn sanitize_settings(
        &self,
        settings: &mut SettingsCollection,
    ) -> Result<SanitizeReport, SanitizeError> {
        let mixer = MixerSettings::from_settings(settings, &self.disabled_option)?;
        let mut actuators = ActuatorSettings::from_settings(settings)?;
        let report = self.sanitize(&mixer, &mut actuators)?;

        if !report.is_noop() {
            let object = settings
                .get_mut(ACTUATOR_SETTINGS)
                .ok_or_else(|| SanitizeError::object_missing(ACTUATOR_SETTINGS))?;
            actuators.write_to(object)?;
        }
        debug!(
            channels = report.channel_count,
            disabled = ?report.disabled_channels,
            changed = ?report.changed_channels,
            "mixer channel sanitation applied"
        );
        Ok(report)
    }
}
