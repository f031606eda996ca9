//! Persistence documents.
//!
//! The persistence layer hands restored entities to the core as a flat
//! [`Document`]: a field-name → value map. The core reads the fields it
//! declares (owning location, world position, flags) and keeps the rest
//! as opaque custom properties. The wire format of documents belongs to
//! the persistence layer.

use std::collections::BTreeMap;

use crate::error::ContentError;

/// A single document field value.
#[derive(Clone, Debug, PartialEq)]
pub enum DocValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer (all integral properties are widened to `i64`).
    Int(i64),
    /// UTF-8 string.
    Str(String),
    /// Integer array (e.g. day-time tables).
    IntList(Vec<i64>),
}

/// A field-name → value map describing one persisted entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    fields: BTreeMap<String, DocValue>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<String>, value: DocValue) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a field.
    pub fn set(&mut self, key: impl Into<String>, value: DocValue) {
        self.fields.insert(key.into(), value);
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<DocValue> {
        self.fields.remove(key)
    }

    /// Raw field lookup.
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.fields.get(key)
    }

    /// Integer field lookup. Booleans read as 0/1.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.fields.get(key)? {
            DocValue::Int(v) => Some(*v),
            DocValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Boolean field lookup. Integers read as `!= 0`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.fields.get(key)? {
            DocValue::Bool(b) => Some(*b),
            DocValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// String field lookup.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            DocValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read a required unsigned field that must fit in `T`.
    ///
    /// `entity` is only used to label the error.
    pub fn require<T: TryFrom<i64>>(&self, entity: u32, key: &str) -> Result<T, ContentError> {
        let raw = self.get_int(key).ok_or_else(|| ContentError::MissingField {
            entity,
            field: key.to_string(),
        })?;
        T::try_from(raw).map_err(|_| ContentError::InvalidField {
            entity,
            field: key.to_string(),
            reason: format!("value {raw} out of range"),
        })
    }

    /// Iterate over all fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_coerce_bool_and_int() {
        let doc = Document::new()
            .with("flag", DocValue::Bool(true))
            .with("count", DocValue::Int(0))
            .with("name", DocValue::Str("den".into()));
        assert_eq!(doc.get_int("flag"), Some(1));
        assert_eq!(doc.get_bool("count"), Some(false));
        assert_eq!(doc.get_str("name"), Some("den"));
        assert_eq!(doc.get_str("count"), None);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn require_reports_missing_and_out_of_range() {
        let doc = Document::new().with("world_x", DocValue::Int(-5));
        assert!(matches!(
            doc.require::<u16>(9, "world_y"),
            Err(ContentError::MissingField { entity: 9, .. })
        ));
        assert!(matches!(
            doc.require::<u16>(9, "world_x"),
            Err(ContentError::InvalidField { entity: 9, .. })
        ));
        let ok = Document::new().with("world_x", DocValue::Int(300));
        assert_eq!(ok.require::<u16>(1, "world_x").unwrap(), 300);
    }
}
