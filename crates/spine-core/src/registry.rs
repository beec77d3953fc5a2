//! Per-type field registries.
//!
//! A [`FieldRegistry`] is the metadata table for one record type. Generic
//! operations (merge, storage projection, binarization) consult it rather
//! than branching on the concrete type. Registries are immutable once
//! built; a variant registry is composed from its base with
//! [`RegistryBuilder::extend`] and may only add fields.

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::error::SchemaError;
use crate::field::{FieldDef, FieldEncoding};

/// Immutable field metadata for one record type.
///
/// Field order is declaration order (base fields first for extended
/// registries). All category views are precomputed at build time.
#[derive(Clone, Debug)]
pub struct FieldRegistry {
    name: String,
    fields: IndexMap<&'static str, FieldDef>,
    variable_length: IndexMap<&'static str, FieldEncoding>,
    concatenable: Vec<&'static str>,
    storage_excluded: IndexSet<&'static str>,
    binarizable: Vec<&'static str>,
    boolean: Vec<&'static str>,
    positional: Vec<&'static str>,
}

impl FieldRegistry {
    /// Start a new registry named `name`.
    pub fn builder(name: impl Into<String>) -> RegistryBuilder {
        RegistryBuilder::new(name)
    }

    /// Registry name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field declaration.
    pub fn get(&self, field: &str) -> Option<&FieldDef> {
        self.fields.get(field)
    }

    /// Whether `field` is declared.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate over declarations in order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the registry declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every field whose length varies per object, with its element encoding.
    pub fn variable_length_fields(&self) -> &IndexMap<&'static str, FieldEncoding> {
        &self.variable_length
    }

    /// Fields concatenated when objects are merged, in merge output order.
    pub fn concatenable_fields(&self) -> &[&'static str] {
        &self.concatenable
    }

    /// Fields never written to persistent storage.
    pub fn storage_excluded_fields(&self) -> &IndexSet<&'static str> {
        &self.storage_excluded
    }

    /// Fields packed into a single integer when stored.
    pub fn binarizable_fields(&self) -> &[&'static str] {
        &self.binarizable
    }

    /// Fields serialized as `0`/`1`.
    pub fn boolean_fields(&self) -> &[&'static str] {
        &self.boolean
    }

    /// Fields holding coordinates expressed in the record's units.
    pub fn positional_fields(&self) -> &[&'static str] {
        &self.positional
    }

    /// Declarations that survive storage projection, in order.
    pub fn stored_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .values()
            .filter(|def| !self.storage_excluded.contains(def.name))
    }

    /// Derived declarations, in order.
    pub fn derived_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values().filter(|def| def.is_derived())
    }
}

/// Collects declarations and validates them into a [`FieldRegistry`].
///
/// Validation is deferred to [`build`](Self::build) so declaration lists
/// can be chained without intermediate `Result`s.
#[derive(Clone, Debug)]
pub struct RegistryBuilder {
    name: String,
    inherited: Vec<FieldDef>,
    declared: Vec<FieldDef>,
}

impl RegistryBuilder {
    /// An empty builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inherited: Vec::new(),
            declared: Vec::new(),
        }
    }

    /// A builder seeded with every declaration of `base`.
    ///
    /// Fields added afterwards must not repeat a base name.
    pub fn extend(name: impl Into<String>, base: &FieldRegistry) -> Self {
        Self {
            name: name.into(),
            inherited: base.iter().copied().collect(),
            declared: Vec::new(),
        }
    }

    /// Declare one field.
    pub fn field(mut self, def: FieldDef) -> Self {
        self.declared.push(def);
        self
    }

    /// Declare a list of fields.
    pub fn fields(mut self, defs: &[FieldDef]) -> Self {
        self.declared.extend_from_slice(defs);
        self
    }

    /// Validate the declarations and freeze them.
    ///
    /// Fails with [`SchemaError`] on a duplicate name, a per-field
    /// category conflict, or a derived field whose source is missing,
    /// itself derived, or not concatenable (merging could not recompute it).
    pub fn build(self) -> Result<FieldRegistry, SchemaError> {
        let mut fields: IndexMap<&'static str, FieldDef> =
            IndexMap::with_capacity(self.inherited.len() + self.declared.len());
        for def in self.inherited.into_iter().chain(self.declared) {
            def.validate()?;
            if fields.insert(def.name, def).is_some() {
                return Err(SchemaError::DuplicateField {
                    registry: self.name,
                    field: def.name.to_string(),
                });
            }
        }

        for def in fields.values() {
            let Some(source) = def.derived_from else {
                continue;
            };
            let invalid = |reason: &str| SchemaError::InvalidDerivedSource {
                field: def.name.to_string(),
                source_field: source.to_string(),
                reason: reason.to_string(),
            };
            match fields.get(source) {
                None => return Err(invalid("source is not declared")),
                Some(src) if src.is_derived() => {
                    return Err(invalid("source is itself derived"));
                }
                Some(src) if !src.is_concatenable() => {
                    return Err(invalid("source is not concatenable"));
                }
                Some(_) => {}
            }
        }

        let mut variable_length = IndexMap::new();
        let mut concatenable = Vec::new();
        let mut storage_excluded = IndexSet::new();
        let mut binarizable = Vec::new();
        let mut boolean = Vec::new();
        let mut positional = Vec::new();
        for def in fields.values() {
            if let Some(enc) = def.field_type.encoding() {
                variable_length.insert(def.name, enc);
            }
            if def.is_concatenable() {
                concatenable.push(def.name);
            }
            if def.is_storage_excluded() {
                storage_excluded.insert(def.name);
            }
            if def.is_binarizable() {
                binarizable.push(def.name);
            }
            if def.is_boolean() {
                boolean.push(def.name);
            }
            if def.is_positional() {
                positional.push(def.name);
            }
        }

        debug!(
            "built registry '{}': {} fields, {} variable-length, {} concatenable, {} storage-excluded",
            self.name,
            fields.len(),
            variable_length.len(),
            concatenable.len(),
            storage_excluded.len(),
        );

        Ok(FieldRegistry {
            name: self.name,
            fields,
            variable_length,
            concatenable,
            storage_excluded,
            binarizable,
            boolean,
            positional,
        })
    }
}
