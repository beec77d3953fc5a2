//! Core abstraction traits for name-keyed field access.

use crate::error::ObjectError;
use crate::registry::FieldRegistry;
use crate::value::FieldValue;

/// Associates a record type with its static field registry.
pub trait Schema {
    /// The registry describing every field of this type.
    fn registry() -> &'static FieldRegistry;
}

/// Read access to a record's fields by name.
pub trait FieldReader {
    /// Read one field.
    ///
    /// Returns `Ok(None)` for an unset array, the current value for any
    /// other declared field, [`ObjectError::UnknownField`] for an
    /// undeclared name, and [`ObjectError::InvalidState`] for a derived
    /// field that has neither an explicit value nor its source.
    fn read_field(&self, name: &str) -> Result<Option<FieldValue>, ObjectError>;
}

/// Write access to a record's fields by name.
pub trait FieldWriter {
    /// Assign one field. Writing a derived field stores an explicit value.
    fn write_field(&mut self, name: &str, value: FieldValue) -> Result<(), ObjectError>;

    /// Reset one field to its default. Clearing a derived field drops its
    /// explicit value so it is computed again.
    fn clear_field(&mut self, name: &str) -> Result<(), ObjectError>;
}
