//! Field declarations: element types, field types and category flags.

use crate::error::SchemaError;

/// Element type of a numeric array field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// 64-bit signed integer.
    I64,
    /// 32-bit float.
    F32,
}

impl DType {
    /// Short lowercase name, used in diagnostics and schema hashing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::I64 => "i64",
            Self::F32 => "f32",
        }
    }
}

/// Element encoding of a variable-length field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldEncoding {
    /// One scalar element per entry.
    Element(DType),
    /// Fixed-width rows per entry.
    Rows {
        /// Row width (e.g. 3 for voxel coordinates).
        dims: u32,
        /// Element type within a row.
        dtype: DType,
    },
}

impl FieldEncoding {
    /// Element type regardless of row structure.
    pub fn dtype(&self) -> DType {
        match self {
            Self::Element(dtype) | Self::Rows { dtype, .. } => *dtype,
        }
    }
}

/// Classification of a field's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A single signed integer.
    Int,
    /// A single double-precision float.
    Float,
    /// A true/false flag, stored as `0`/`1`.
    Bool,
    /// A short text label.
    Text,
    /// An array whose length varies per object.
    VarLength(FieldEncoding),
}

impl FieldType {
    /// Whether the field holds a per-object variable-length array.
    pub fn is_variable_length(&self) -> bool {
        matches!(self, Self::VarLength(_))
    }

    /// Element encoding for variable-length fields.
    pub fn encoding(&self) -> Option<FieldEncoding> {
        match self {
            Self::VarLength(enc) => Some(*enc),
            _ => None,
        }
    }
}

/// Cross-cutting category flags attached to a field declaration.
///
/// Variable-length and boolean membership follow from [`FieldType`];
/// the flags here cover the groups that do not.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Categories(u8);

impl Categories {
    /// No categories.
    pub const NONE: Self = Self(0);
    /// Concatenated element-wise when objects are merged.
    pub const CONCATENABLE: Self = Self(1);
    /// Never written to persistent storage.
    pub const STORAGE_EXCLUDED: Self = Self(1 << 1);
    /// Packed into one integer (bit per value) when stored.
    pub const BINARIZABLE: Self = Self(1 << 2);
    /// Holds coordinates that follow the record's units.
    pub const POSITIONAL: Self = Self(1 << 3);

    /// Union of two flag sets.
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every flag in `other` is present.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Declaration of one field of a record type.
///
/// Declarations are `const`-constructible so each record type can keep
/// its table in a `static` slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name, unique within a registry.
    pub name: &'static str,
    /// Value classification.
    pub field_type: FieldType,
    /// Category flags.
    pub categories: Categories,
    /// Source field for derived fields. `None` for plain fields.
    pub derived_from: Option<&'static str>,
}

impl FieldDef {
    /// A plain field with no categories.
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            categories: Categories::NONE,
            derived_from: None,
        }
    }

    /// Add category flags.
    pub const fn with(mut self, categories: Categories) -> Self {
        self.categories = self.categories.with(categories);
        self
    }

    /// Mark the field as computed from `source` unless overridden.
    pub const fn derived_from(mut self, source: &'static str) -> Self {
        self.derived_from = Some(source);
        self
    }

    /// Whether merging concatenates this field.
    pub fn is_concatenable(&self) -> bool {
        self.categories.contains(Categories::CONCATENABLE)
    }

    /// Whether storage projection drops this field.
    pub fn is_storage_excluded(&self) -> bool {
        self.categories.contains(Categories::STORAGE_EXCLUDED)
    }

    /// Whether the stored form packs this field into an integer.
    pub fn is_binarizable(&self) -> bool {
        self.categories.contains(Categories::BINARIZABLE)
    }

    /// Whether the field holds unit-bearing coordinates.
    pub fn is_positional(&self) -> bool {
        self.categories.contains(Categories::POSITIONAL)
    }

    /// Whether the field is stored as `0`/`1`.
    pub fn is_boolean(&self) -> bool {
        self.field_type == FieldType::Bool
    }

    /// Whether the field is computed from another one.
    pub fn is_derived(&self) -> bool {
        self.derived_from.is_some()
    }

    /// Check that the category flags agree with the field type.
    ///
    /// Cross-field rules (duplicates, derived sources) are checked by
    /// [`RegistryBuilder::build`](crate::RegistryBuilder::build).
    pub fn validate(&self) -> Result<(), SchemaError> {
        let conflict = |reason: &str| SchemaError::ConflictingCategories {
            field: self.name.to_string(),
            reason: reason.to_string(),
        };
        if self.is_concatenable() && !self.field_type.is_variable_length() {
            return Err(conflict("concatenable fields must be variable-length"));
        }
        if self.is_binarizable() {
            if self.field_type != FieldType::VarLength(FieldEncoding::Element(DType::I64)) {
                return Err(conflict(
                    "binarizable fields must be variable-length i64 elements",
                ));
            }
            if self.is_concatenable() {
                return Err(conflict("binarizable fields cannot be concatenable"));
            }
        }
        if self.is_positional()
            && self.field_type
                != FieldType::VarLength(FieldEncoding::Rows {
                    dims: 3,
                    dtype: DType::F32,
                })
        {
            return Err(conflict("positional fields must be rows of three f32"));
        }
        if self.is_derived() && self.is_concatenable() {
            return Err(conflict(
                "derived fields are recomputed after a merge and cannot be concatenable",
            ));
        }
        if let FieldType::VarLength(FieldEncoding::Rows { dims: 0, .. }) = self.field_type {
            return Err(conflict("row width must be at least 1"));
        }
        Ok(())
    }
}
