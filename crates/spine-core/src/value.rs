//! Dynamically typed field values.
//!
//! [`FieldValue`] is the currency of the generic protocols: parsers assign
//! fields through it, merge concatenates it, and storage projection emits
//! it. Typed accessors on the records avoid it entirely.

use crate::array::RowArray;
use crate::error::ObjectError;
use crate::field::{DType, FieldEncoding, FieldType};

/// A single field's value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Signed integer scalar.
    Int(i64),
    /// Float scalar.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Text label.
    Text(String),
    /// Variable-length integer array.
    Ints(Vec<i64>),
    /// Variable-length float array.
    Floats(Vec<f32>),
    /// Variable-length integer rows.
    IntRows(RowArray<i64>),
    /// Variable-length float rows.
    FloatRows(RowArray<f32>),
}

impl FieldValue {
    /// Short name of the value kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Ints(_) => "int array",
            Self::Floats(_) => "float array",
            Self::IntRows(_) => "int rows",
            Self::FloatRows(_) => "float rows",
        }
    }

    /// The empty array for a variable-length field type; `None` for scalars.
    pub fn empty_of(field_type: &FieldType) -> Option<Self> {
        let enc = field_type.encoding()?;
        Some(match enc {
            FieldEncoding::Element(DType::I64) => Self::Ints(Vec::new()),
            FieldEncoding::Element(DType::F32) => Self::Floats(Vec::new()),
            FieldEncoding::Rows {
                dims,
                dtype: DType::I64,
            } => Self::IntRows(RowArray::new(dims as usize)),
            FieldEncoding::Rows {
                dims,
                dtype: DType::F32,
            } => Self::FloatRows(RowArray::new(dims as usize)),
        })
    }

    /// Number of entries (rows for row arrays), or `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Ints(v) => Some(v.len()),
            Self::Floats(v) => Some(v.len()),
            Self::IntRows(r) => Some(r.len()),
            Self::FloatRows(r) => Some(r.len()),
            _ => None,
        }
    }

    /// Append `other` element-wise.
    ///
    /// Both values must be arrays of the same kind; row arrays must also
    /// share a row width.
    pub fn concat(&mut self, field: &str, other: &FieldValue) -> Result<(), ObjectError> {
        match (&mut *self, other) {
            (Self::Ints(a), Self::Ints(b)) => a.extend_from_slice(b),
            (Self::Floats(a), Self::Floats(b)) => a.extend_from_slice(b),
            (Self::IntRows(a), Self::IntRows(b)) => a.concat(field, b)?,
            (Self::FloatRows(a), Self::FloatRows(b)) => a.concat(field, b)?,
            (a, b) => {
                let expected = if a.len().is_some() {
                    a.kind_name()
                } else {
                    "array"
                };
                return Err(ObjectError::TypeMismatch {
                    field: field.to_string(),
                    expected,
                    found: b.kind_name(),
                });
            }
        }
        Ok(())
    }

    fn mismatch(&self, field: &str, expected: &'static str) -> ObjectError {
        ObjectError::TypeMismatch {
            field: field.to_string(),
            expected,
            found: self.kind_name(),
        }
    }

    /// Unwrap an `Int`.
    pub fn into_int(self, field: &str) -> Result<i64, ObjectError> {
        match self {
            Self::Int(v) => Ok(v),
            other => Err(other.mismatch(field, "int")),
        }
    }

    /// Unwrap a `Float`. Integers are widened.
    pub fn into_float(self, field: &str) -> Result<f64, ObjectError> {
        match self {
            Self::Float(v) => Ok(v),
            Self::Int(v) => Ok(v as f64),
            other => Err(other.mismatch(field, "float")),
        }
    }

    /// Unwrap a `Bool`.
    pub fn into_bool(self, field: &str) -> Result<bool, ObjectError> {
        match self {
            Self::Bool(v) => Ok(v),
            other => Err(other.mismatch(field, "bool")),
        }
    }

    /// Unwrap a `Text`.
    pub fn into_text(self, field: &str) -> Result<String, ObjectError> {
        match self {
            Self::Text(v) => Ok(v),
            other => Err(other.mismatch(field, "text")),
        }
    }

    /// Unwrap an `Ints` array.
    pub fn into_ints(self, field: &str) -> Result<Vec<i64>, ObjectError> {
        match self {
            Self::Ints(v) => Ok(v),
            other => Err(other.mismatch(field, "int array")),
        }
    }

    /// Unwrap a `Floats` array.
    pub fn into_floats(self, field: &str) -> Result<Vec<f32>, ObjectError> {
        match self {
            Self::Floats(v) => Ok(v),
            other => Err(other.mismatch(field, "float array")),
        }
    }

    /// Unwrap `IntRows` of width `dims`.
    pub fn into_int_rows(self, field: &str, dims: usize) -> Result<RowArray<i64>, ObjectError> {
        match self {
            Self::IntRows(r) if r.dims() == dims => Ok(r),
            Self::IntRows(r) => Err(ObjectError::ShapeMismatch {
                field: field.to_string(),
                expected: dims,
                found: r.dims(),
            }),
            other => Err(other.mismatch(field, "int rows")),
        }
    }

    /// Unwrap `FloatRows` of width `dims`.
    pub fn into_float_rows(self, field: &str, dims: usize) -> Result<RowArray<f32>, ObjectError> {
        match self {
            Self::FloatRows(r) if r.dims() == dims => Ok(r),
            Self::FloatRows(r) => Err(ObjectError::ShapeMismatch {
                field: field.to_string(),
                expected: dims,
                found: r.dims(),
            }),
            other => Err(other.mismatch(field, "float rows")),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(v: Vec<i64>) -> Self {
        Self::Ints(v)
    }
}

impl From<Vec<f32>> for FieldValue {
    fn from(v: Vec<f32>) -> Self {
        Self::Floats(v)
    }
}

impl From<RowArray<i64>> for FieldValue {
    fn from(v: RowArray<i64>) -> Self {
        Self::IntRows(v)
    }
}

impl From<RowArray<f32>> for FieldValue {
    fn from(v: RowArray<f32>) -> Self {
        Self::FloatRows(v)
    }
}
