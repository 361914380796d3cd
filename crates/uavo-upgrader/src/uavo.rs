//! Decoded settings object model.
//!
//! An importer turns an uploaded settings dump into a [`SettingsCollection`]:
//! a set of named objects, each holding ordered, named fields. Enumerated
//! fields carry their own option table so values can be resolved to names
//! without consulting the definition bundle again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The kind of data a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Signed integer elements.
    Integer,
    /// Floating point elements.
    Float,
    /// Indices into an option table.
    Enum,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Enum => write!(f, "enum"),
        }
    }
}

/// Element data of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldData {
    /// Integer elements (every unsigned and signed width fits in `i64`).
    Integer {
        /// Element values.
        values: Vec<i64>,
    },
    /// Floating point elements.
    Float {
        /// Element values.
        values: Vec<f64>,
    },
    /// Enumerated elements.
    Enum {
        /// Option names; an element value is an index into this table.
        options: Vec<String>,
        /// Element values.
        values: Vec<u8>,
    },
}

impl FieldData {
    /// The kind of this data.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Integer { .. } => FieldKind::Integer,
            Self::Float { .. } => FieldKind::Float,
            Self::Enum { .. } => FieldKind::Enum,
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Integer { values } => values.len(),
            Self::Float { values } => values.len(),
            Self::Enum { values, .. } => values.len(),
        }
    }

    /// Check if the field has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the name of an option by value. `None` for non-enum data or
    /// values outside the table.
    #[must_use]
    pub fn option_name(&self, index: u8) -> Option<&str> {
        match self {
            Self::Enum { options, .. } => options.get(usize::from(index)).map(String::as_str),
            _ => None,
        }
    }
}

/// A named field of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, unique within its object.
    pub name: String,
    /// Field data.
    #[serde(flatten)]
    pub data: FieldData,
}

impl Field {
    /// Create an integer field.
    #[must_use]
    pub fn integer(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            data: FieldData::Integer { values },
        }
    }

    /// Create a floating point field.
    #[must_use]
    pub fn float(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: FieldData::Float { values },
        }
    }

    /// Create an enumerated field.
    #[must_use]
    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        values: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            data: FieldData::Enum {
                options: options.into_iter().map(Into::into).collect(),
                values,
            },
        }
    }
}

/// A decoded settings object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UavObject {
    /// Object type name, e.g. `UAVO_ActuatorSettings`.
    pub name: String,
    /// Fields in definition order.
    #[serde(default)]
    fields: Vec<Field>,
}

impl UavObject {
    /// Create an object with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder form of [`UavObject::push_field`].
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.push_field(field);
        self
    }

    /// Append a field, replacing any existing field of the same name in place.
    pub fn push_field(&mut self, field: Field) {
        if let Some(existing) = self.field_mut(&field.name) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by name for mutation.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// All fields in order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// A decoded set of settings objects, keyed by object type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsCollection {
    /// Version identifier of the firmware that produced the settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub githash: Option<String>,
    #[serde(default)]
    objects: BTreeMap<String, UavObject>,
}

impl SettingsCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that sets the version identifier.
    #[must_use]
    pub fn with_githash(mut self, githash: impl Into<String>) -> Self {
        self.githash = Some(githash.into());
        self
    }

    /// Insert an object under its own name, returning any object it replaced.
    pub fn insert(&mut self, object: UavObject) -> Option<UavObject> {
        self.objects.insert(object.name.clone(), object)
    }

    /// Look up an object by type name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UavObject> {
        self.objects.get(name)
    }

    /// Look up an object by type name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut UavObject> {
        self.objects.get_mut(name)
    }

    /// Remove an object by type name.
    pub fn remove(&mut self, name: &str) -> Option<UavObject> {
        self.objects.remove(name)
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the collection holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object type names in sorted order.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }
}
