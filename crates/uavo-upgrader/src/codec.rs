//! JSON settings dumps.
//!
//! [`JsonCodec`] reads and writes the serde form of a [`SettingsCollection`].
//! It lets the pipeline run end to end on settings that were decoded
//! elsewhere, and is what the `uavoup` binary uses.

use tracing::warn;

use crate::definitions::DefinitionBundle;
use crate::error::{Error, Result};
use crate::uavo::{FieldData, SettingsCollection};
use crate::upgrade::{Exporter, Importer};

/// Content type of JSON documents.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Imports and exports settings as JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    /// Pretty-print exported documents.
    pub pretty: bool,
}

impl JsonCodec {
    /// Create a codec that pretty-prints its output.
    #[must_use]
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Parse a settings dump.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a JSON settings collection.
    pub fn parse(bytes: &[u8]) -> Result<SettingsCollection> {
        serde_json::from_slice(bytes).map_err(|e| Error::import(format!("invalid settings JSON: {e}")))
    }

    /// Render a settings dump.
    ///
    /// # Errors
    ///
    /// Returns an error if a float field holds NaN or an infinity, which JSON
    /// cannot represent, or if serialization fails.
    pub fn render(&self, settings: &SettingsCollection) -> Result<String> {
        reject_non_finite(settings)?;
        let document = if self.pretty {
            serde_json::to_string_pretty(settings)
        } else {
            serde_json::to_string(settings)
        };
        document.map_err(|e| Error::export(format!("cannot render settings JSON: {e}")))
    }
}

fn reject_non_finite(settings: &SettingsCollection) -> Result<()> {
    for object in settings.object_names().filter_map(|name| settings.get(name)) {
        for field in object.fields() {
            if let FieldData::Float { values } = &field.data {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(Error::export(format!(
                        "field {}.{} holds a non-finite float",
                        object.name, field.name
                    )));
                }
            }
        }
    }
    Ok(())
}

impl Importer for JsonCodec {
    fn import(
        &self,
        githash: &str,
        payload: &[u8],
        _definitions: &DefinitionBundle,
    ) -> Result<SettingsCollection> {
        let mut settings = Self::parse(payload)?;
        match settings.githash.as_deref() {
            None => settings.githash = Some(githash.to_string()),
            Some(recorded) if recorded != githash => {
                warn!(
                    requested = %githash,
                    %recorded,
                    "settings dump names a different version"
                );
            }
            Some(_) => {}
        }
        Ok(settings)
    }
}

impl Exporter for JsonCodec {
    fn export(&self, settings: &SettingsCollection) -> Result<String> {
        self.render(settings)
    }

    fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uavo::{Field, UavObject};

    const DUMP: &str = r#"{
        "objects": {
            "UAVO_ActuatorSettings": {
                "name": "UAVO_ActuatorSettings",
                "fields": [{"name": "ChannelMin", "type": "integer", "values": [1000]}]
            }
        }
    }"#;

    fn bundle() -> DefinitionBundle {
        DefinitionBundle::new("abc1234", Vec::new())
    }

    #[test]
    fn test_import_fills_githash() {
        let settings = JsonCodec::default()
            .import("abc1234", DUMP.as_bytes(), &bundle())
            .unwrap();

        assert_eq!(settings.githash.as_deref(), Some("abc1234"));
        assert!(settings.get("UAVO_ActuatorSettings").is_some());
    }

    #[test]
    fn test_import_keeps_recorded_githash() {
        crate::logging::init_test_logging();
        let dump = SettingsCollection::new().with_githash("feedface");
        let bytes = serde_json::to_vec(&dump).unwrap();

        let settings = JsonCodec::default()
            .import("abc1234", &bytes, &bundle())
            .unwrap();

        assert_eq!(settings.githash.as_deref(), Some("feedface"));
    }

    #[test]
    fn test_import_rejects_garbage() {
        let err = JsonCodec::default()
            .import("abc1234", b"\x00\x01", &bundle())
            .unwrap_err();
        assert!(matches!(err, Error::Import(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_export_rejects_non_finite_floats() {
        let mut settings = SettingsCollection::new();
        settings.insert(
            UavObject::new("UAVO_StabilizationSettings")
                .with_field(Field::float("RollPI", vec![f64::NAN])),
        );

        let err = JsonCodec::default().export(&settings).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
        assert!(err.to_string().contains("UAVO_StabilizationSettings.RollPI"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_export_compact_and_pretty() {
        let mut settings = SettingsCollection::new();
        settings.insert(
            UavObject::new("UAVO_ActuatorSettings")
                .with_field(Field::integer("ChannelMin", vec![0, 1000])),
        );

        let compact = JsonCodec::default().export(&settings).unwrap();
        let pretty = JsonCodec::pretty().export(&settings).unwrap();

        assert!(!compact.contains('\n'));
        assert!(pretty.contains('\n'));
        assert_eq!(JsonCodec::parse(compact.as_bytes()).unwrap(), settings);
        assert_eq!(JsonCodec::default().content_type(), JSON_CONTENT_TYPE);
    }
}
