//! Typed views over the mixer and actuator settings objects.
//!
//! The decoded collection stores fields by name; these views pull the pieces
//! the sanitizer needs into channel-indexed records and write them back.
//! Channels are numbered from 1, matching the `Mixer{n}Type` field names.

use crate::sanitize::SanitizeError;
use crate::uavo::{FieldData, FieldKind, SettingsCollection, UavObject};

/// Object type name of the mixer settings.
pub const MIXER_SETTINGS: &str = "UAVO_MixerSettings";

/// Object type name of the actuator settings.
pub const ACTUATOR_SETTINGS: &str = "UAVO_ActuatorSettings";

/// Actuator field holding per-channel minimum pulse widths.
pub const CHANNEL_MIN: &str = "ChannelMin";

/// Actuator field holding per-channel maximum pulse widths.
pub const CHANNEL_MAX: &str = "ChannelMax";

/// Actuator field holding per-channel neutral pulse widths.
pub const CHANNEL_NEUTRAL: &str = "ChannelNeutral";

/// Default option name of a disabled mixer channel.
pub const DISABLED_OPTION: &str = "Disabled";

/// Name of the mixer type field for a 1-based channel.
#[must_use]
pub fn mixer_type_field(channel: usize) -> String {
    format!("Mixer{channel}Type")
}

/// What a mixer channel drives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MixerType {
    /// The channel drives nothing.
    Disabled,
    /// The channel drives a motor.
    Motor,
    /// The channel drives a servo.
    Servo,
    /// Any other assignment (camera gimbal axes, accessories, ...).
    Other(String),
}

impl MixerType {
    /// Classify an option name. `disabled_option` is the name this firmware
    /// version uses for a disabled channel.
    #[must_use]
    pub fn from_option(name: &str, disabled_option: &str) -> Self {
        if name == disabled_option {
            return Self::Disabled;
        }
        match name {
            "Motor" => Self::Motor,
            "Servo" => Self::Servo,
            other => Self::Other(other.to_string()),
        }
    }

    /// Check if the channel is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

impl std::fmt::Display for MixerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "Disabled"),
            Self::Motor => write!(f, "Motor"),
            Self::Servo => write!(f, "Servo"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Per-channel mixer assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerSettings {
    channels: Vec<MixerType>,
}

impl MixerSettings {
    /// Build from assignments in channel order.
    #[must_use]
    pub fn new(channels: Vec<MixerType>) -> Self {
        Self { channels }
    }

    /// Read the mixer object out of a settings collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is absent or malformed.
    pub fn from_settings(
        settings: &SettingsCollection,
        disabled_option: &str,
    ) -> Result<Self, SanitizeError> {
        let object = settings
            .get(MIXER_SETTINGS)
            .ok_or_else(|| SanitizeError::object_missing(MIXER_SETTINGS))?;
        Self::from_object(object, disabled_option)
    }

    /// Read assignments from consecutive `Mixer{n}Type` fields, starting at 1.
    ///
    /// The channel count is however many consecutive fields exist.
    ///
    /// # Errors
    ///
    /// Returns an error if no channel fields exist, or a channel field is not
    /// a single-element enum whose value is inside its option table.
    pub fn from_object(object: &UavObject, disabled_option: &str) -> Result<Self, SanitizeError> {
        let mut channels = Vec::new();
        loop {
            let name = mixer_type_field(channels.len() + 1);
            let Some(field) = object.field(&name) else {
                break;
            };
            let FieldData::Enum { options, values } = &field.data else {
                return Err(SanitizeError::FieldKind {
                    object: object.name.clone(),
                    field: name,
                    expected: FieldKind::Enum,
                    actual: field.data.kind(),
                });
            };
            let [value] = values.as_slice() else {
                return Err(SanitizeError::LengthMismatch {
                    object: object.name.clone(),
                    field: name,
                    expected: 1,
                    actual: values.len(),
                });
            };
            let option = field.data.option_name(*value).ok_or_else(|| {
                SanitizeError::UnknownOption {
                    object: object.name.clone(),
                    field: name.clone(),
                    value: *value,
                    options: options.len(),
                }
            })?;
            channels.push(MixerType::from_option(option, disabled_option));
        }

        if channels.is_empty() {
            return Err(SanitizeError::field_missing(
                object.name.clone(),
                mixer_type_field(1),
            ));
        }
        Ok(Self { channels })
    }

    /// Number of mixer channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if there are no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Assignment of a 1-based channel.
    #[must_use]
    pub fn channel(&self, channel: usize) -> Option<&MixerType> {
        channel.checked_sub(1).and_then(|i| self.channels.get(i))
    }

    /// 1-based indices of disabled channels.
    pub fn disabled_channels(&self) -> impl Iterator<Item = usize> + '_ {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_disabled())
            .map(|(i, _)| i + 1)
    }
}

/// Pulse width bounds of one actuator channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PwmRange {
    /// Minimum pulse width.
    pub min: i64,
    /// Maximum pulse width.
    pub max: i64,
    /// Neutral pulse width.
    pub neutral: i64,
}

impl PwmRange {
    /// The range written to disabled channels.
    pub const ZERO: Self = Self {
        min: 0,
        max: 0,
        neutral: 0,
    };

    /// Create a range.
    #[must_use]
    pub fn new(min: i64, max: i64, neutral: i64) -> Self {
        Self { min, max, neutral }
    }
}

/// Per-channel PWM bounds from the actuator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorSettings {
    /// Minimum pulse width per channel.
    pub channel_min: Vec<i64>,
    /// Maximum pulse width per channel.
    pub channel_max: Vec<i64>,
    /// Neutral pulse width per channel.
    pub channel_neutral: Vec<i64>,
}

impl ActuatorSettings {
    /// Build with every channel set to `range`.
    #[must_use]
    pub fn uniform(channels: usize, range: PwmRange) -> Self {
        Self {
            channel_min: vec![range.min; channels],
            channel_max: vec![range.max; channels],
            channel_neutral: vec![range.neutral; channels],
        }
    }

    /// Read the actuator object out of a settings collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is absent or malformed.
    pub fn from_settings(settings: &SettingsCollection) -> Result<Self, SanitizeError> {
        let object = settings
            .get(ACTUATOR_SETTINGS)
            .ok_or_else(|| SanitizeError::object_missing(ACTUATOR_SETTINGS))?;
        Self::from_object(object)
    }

    /// Read the three channel arrays from an actuator object.
    ///
    /// # Errors
    ///
    /// Returns an error if a channel field is missing or not an integer field.
    pub fn from_object(object: &UavObject) -> Result<Self, SanitizeError> {
        Ok(Self {
            channel_min: integer_values(object, CHANNEL_MIN)?.clone(),
            channel_max: integer_values(object, CHANNEL_MAX)?.clone(),
            channel_neutral: integer_values(object, CHANNEL_NEUTRAL)?.clone(),
        })
    }

    /// Number of channels, or `None` if the three arrays disagree.
    #[must_use]
    pub fn channel_count(&self) -> Option<usize> {
        let n = self.channel_min.len();
        (self.channel_max.len() == n && self.channel_neutral.len() == n).then_some(n)
    }

    /// Bounds of a 1-based channel.
    #[must_use]
    pub fn channel(&self, channel: usize) -> Option<PwmRange> {
        let i = channel.checked_sub(1)?;
        Some(PwmRange {
            min: *self.channel_min.get(i)?,
            max: *self.channel_max.get(i)?,
            neutral: *self.channel_neutral.get(i)?,
        })
    }

    /// Overwrite the bounds of a 1-based channel. Returns `false` and changes
    /// nothing if the channel is out of range in any of the arrays.
    pub fn set_channel(&mut self, channel: usize, range: PwmRange) -> bool {
        if self.channel(channel).is_none() {
            return false;
        }
        let i = channel - 1;
        self.channel_min[i] = range.min;
        self.channel_max[i] = range.max;
        self.channel_neutral[i] = range.neutral;
        true
    }

    /// Replace the three channel arrays of `object`, leaving other fields as
    /// they are.
    ///
    /// # Errors
    ///
    /// Returns an error if a channel field is missing or not an integer field;
    /// `object` is unchanged in that case.
    pub fn write_to(&self, object: &mut UavObject) -> Result<(), SanitizeError> {
        for name in [CHANNEL_MIN, CHANNEL_MAX, CHANNEL_NEUTRAL] {
            integer_values(object, name)?;
        }
        for (name, values) in [
            (CHANNEL_MIN, &self.channel_min),
            (CHANNEL_MAX, &self.channel_max),
            (CHANNEL_NEUTRAL, &self.channel_neutral),
        ] {
            if let Some(field) = object.field_mut(name) {
                field.data = FieldData::Integer {
                    values: values.clone(),
                };
            }
        }
        Ok(())
    }
}

fn integer_values<'a>(object: &'a UavObject, name: &str) -> Result<&'a Vec<i64>, SanitizeError> {
    let field = object
        .field(name)
        .ok_or_else(|| SanitizeError::field_missing(object.name.clone(), name))?;
    match &field.data {
        FieldData::Integer { values } => Ok(values),
        other => Err(SanitizeError::FieldKind {
            object: object.name.clone(),
            field: name.to_string(),
            expected: FieldKind::Integer,
            actual: other.kind(),
        }),
    }
}
