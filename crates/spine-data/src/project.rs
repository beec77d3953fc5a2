//! Persisted form of a record and the conversions to and from it.
//!
//! Projection walks the registry in declaration order and emits every
//! field that is not storage-excluded:
//!
//! - boolean fields become `Int(0)` / `Int(1)`
//! - binarizable fields become `Int(bits)`, bit `k` set iff `k` is present
//! - derived fields are resolved (override or computed) and stored as is
//! - unset arrays are stored as empty arrays
//!
//! [`OutObject::restore`] reverses each step. Derived values come back as
//! explicit overrides, since their sources are usually not stored.

use indexmap::map::{IntoIter, Iter};
use indexmap::IndexMap;
use log::{debug, trace, warn};

use spine_core::{binarize, FieldReader, FieldValue, FieldWriter, ObjectError};

use crate::config::ProjectionConfig;
use crate::object::{OutObject, Variant};

/// Field name to stored value, in registry order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoredRecord {
    fields: IndexMap<String, FieldValue>,
}

impl StoredRecord {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(name.into(), value)
    }

    /// Stored value of `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Whether `name` is stored.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Stored field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// `(name, value)` pairs in order.
    pub fn iter(&self) -> Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    /// Number of stored fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is stored.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for StoredRecord {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for StoredRecord {
    type Item = (String, FieldValue);
    type IntoIter = IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a StoredRecord {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn decode_bool(name: &str, value: &FieldValue) -> Result<bool, ObjectError> {
    match value {
        FieldValue::Int(0) => Ok(false),
        FieldValue::Int(1) => Ok(true),
        FieldValue::Bool(b) => Ok(*b),
        FieldValue::Int(other) => Err(ObjectError::DomainRange {
            field: name.to_string(),
            detail: format!("stored boolean must be 0 or 1, got {other}"),
        }),
        other => Err(ObjectError::TypeMismatch {
            field: name.to_string(),
            expected: "int",
            found: other.kind_name(),
        }),
    }
}

impl<V: Variant> OutObject<V> {
    /// Project the object to its persisted form.
    ///
    /// Fails with [`ObjectError::InvalidConfig`] if `config` does not
    /// validate, with [`ObjectError::InvalidState`] if a stored derived field
    /// has neither an override nor its source, or (when
    /// `config.validate_lengths` is set) if a length invariant is broken;
    /// and with [`ObjectError::DomainRange`] if a binarized value does not
    /// fit in `config.bit_width` bits.
    pub fn project(&self, config: &ProjectionConfig) -> Result<StoredRecord, ObjectError> {
        config.validate()?;
        if config.validate_lengths {
            self.validate()?;
        }
        let registry = V::registry();
        let mut record = StoredRecord::new();
        for def in registry.stored_fields() {
            let name = def.name;
            let value = match self.read_field(name)? {
                Some(v) => v,
                None => FieldValue::empty_of(&def.field_type).ok_or_else(|| {
                    ObjectError::invalid_state(name, "scalar field has no value")
                })?,
            };
            let value = if def.is_binarizable() {
                let bits = binarize::encode(name, &value.into_ints(name)?, config.bit_width)?;
                trace!("project: '{name}' binarized to {bits:#x}");
                FieldValue::Int(bits as i64)
            } else if def.is_boolean() {
                FieldValue::Int(i64::from(value.into_bool(name)?))
            } else {
                value
            };
            record.insert(name, value);
        }
        debug!(
            "projected {} {} with {} stored fields",
            V::NAME,
            self.id(),
            record.len()
        );
        Ok(record)
    }

    /// Rebuild an object from its persisted form.
    ///
    /// Fields absent from `record` keep their defaults; names the registry
    /// does not declare are skipped with a warning. `is_truth`, if stored,
    /// must agree with `V` ([`ObjectError::VariantMismatch`]). The rebuilt
    /// object must pass [`validate`](OutObject::validate).
    pub fn restore(record: &StoredRecord) -> Result<Self, ObjectError> {
        let registry = V::registry();
        let mut obj = Self::new();
        for (name, value) in record {
            let Some(def) = registry.get(name) else {
                warn!("restore: skipping '{name}', not a field of {}", V::NAME);
                continue;
            };
            if name == "is_truth" {
                let stored = decode_bool(name, value)?;
                if stored != V::IS_TRUTH {
                    return Err(ObjectError::VariantMismatch {
                        expected: V::NAME,
                        found: format!("a record with is_truth = {stored}"),
                    });
                }
                continue;
            }
            let value = if def.is_binarizable() {
                let bits = value.clone().into_int(name)?;
                FieldValue::Ints(binarize::decode(bits as u64).to_vec())
            } else if def.is_boolean() {
                FieldValue::Bool(decode_bool(name, value)?)
            } else {
                value.clone()
            };
            obj.write_field(name, value)?;
        }
        obj.validate()?;
        debug!("restored {} {} from {} fields", V::NAME, obj.id(), record.len());
        Ok(obj)
    }
}
