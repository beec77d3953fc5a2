//! Error types for the spine object model.
//!
//! Organized by when the failure is detected: [`SchemaError`] while a
//! field registry is being built, [`ObjectError`] while records are read,
//! written, merged or projected. Every variant is a caller or programmer
//! error; nothing here is retried.

use std::error::Error;
use std::fmt;

/// Errors detected while building a [`FieldRegistry`](crate::FieldRegistry).
///
/// A registry that fails to build is a defect in the declaring code, so
/// callers usually treat these as fatal at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// The same field name was declared twice, either within one
    /// declaration list or by an extension re-declaring a base field.
    DuplicateField {
        /// Registry being built.
        registry: String,
        /// The field declared more than once.
        field: String,
    },
    /// A field was placed in categories that cannot hold together
    /// (e.g. a scalar marked concatenable).
    ConflictingCategories {
        /// The offending field.
        field: String,
        /// Which rule was broken.
        reason: String,
    },
    /// A derived field names a source that cannot back it.
    InvalidDerivedSource {
        /// The derived field.
        field: String,
        /// The declared source field.
        source_field: String,
        /// Why the source was rejected.
        reason: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateField { registry, field } => {
                write!(f, "registry '{registry}' declares field '{field}' more than once")
            }
            Self::ConflictingCategories { field, reason } => {
                write!(f, "field '{field}' has conflicting categories: {reason}")
            }
            Self::InvalidDerivedSource {
                field,
                source_field,
                reason,
            } => {
                write!(
                    f,
                    "derived field '{field}' cannot be computed from '{source_field}': {reason}"
                )
            }
        }
    }
}

impl Error for SchemaError {}

/// Errors from reading, writing, merging or projecting a record.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectError {
    /// The record is not in a state that supports the request, e.g. a
    /// derived field read while its source array is unset, or parallel
    /// arrays whose lengths disagree.
    InvalidState {
        /// Field the request was about.
        field: String,
        /// What is missing or inconsistent.
        reason: String,
    },
    /// Two structured arrays cannot be combined because their row widths
    /// differ.
    ShapeMismatch {
        /// Field being combined.
        field: String,
        /// Row width of the accumulated array.
        expected: usize,
        /// Row width of the incoming array.
        found: usize,
    },
    /// A value lies outside the domain its encoding can represent.
    DomainRange {
        /// Field being encoded or decoded.
        field: String,
        /// Description of the offending value and the allowed range.
        detail: String,
    },
    /// The field name is not declared by the record's registry.
    UnknownField {
        /// Registry that was consulted.
        registry: String,
        /// The unrecognized field name.
        field: String,
    },
    /// The supplied value has the wrong kind for the field.
    TypeMismatch {
        /// Field being written or combined.
        field: String,
        /// Kind the field requires.
        expected: &'static str,
        /// Kind that was supplied.
        found: &'static str,
    },
    /// The field is fixed by the record variant and cannot be written.
    ReadOnlyField {
        /// The read-only field.
        field: String,
    },
    /// A merge was requested with no input objects.
    EmptyMerge,
    /// A `RequireEqual` merge policy found differing input values.
    MergeConflict {
        /// Field whose inputs disagree.
        field: String,
    },
    /// A merge policy was supplied for a field that merging never copies.
    NotMergeable {
        /// The rejected field.
        field: String,
        /// Why the field takes no policy.
        reason: &'static str,
    },
    /// A configuration value handed to an operation is out of range.
    InvalidConfig {
        /// What was wrong with the configuration.
        detail: String,
    },
    /// Stored data belongs to the other record variant.
    VariantMismatch {
        /// Variant the caller asked for.
        expected: &'static str,
        /// Variant found in the data.
        found: String,
    },
}

impl ObjectError {
    /// Shorthand for an [`ObjectError::InvalidState`].
    pub fn invalid_state(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState { field, reason } => {
                write!(f, "invalid state for '{field}': {reason}")
            }
            Self::ShapeMismatch {
                field,
                expected,
                found,
            } => {
                write!(
                    f,
                    "shape mismatch in '{field}': expected rows of width {expected}, got {found}"
                )
            }
            Self::DomainRange { field, detail } => {
                write!(f, "value out of range for '{field}': {detail}")
            }
            Self::UnknownField { registry, field } => {
                write!(f, "'{field}' is not a field of {registry}")
            }
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => {
                write!(f, "field '{field}' expects {expected}, got {found}")
            }
            Self::ReadOnlyField { field } => write!(f, "field '{field}' is read-only"),
            Self::EmptyMerge => write!(f, "cannot merge an empty set of objects"),
            Self::MergeConflict { field } => {
                write!(f, "merge inputs disagree on '{field}'")
            }
            Self::NotMergeable { field, reason } => {
                write!(f, "field '{field}' takes no merge policy: {reason}")
            }
            Self::InvalidConfig { detail } => write!(f, "invalid configuration: {detail}"),
            Self::VariantMismatch { expected, found } => {
                write!(f, "expected a {expected} record, found {found}")
            }
        }
    }
}

impl Error for ObjectError {}
