//! Reconstructed-object variant.

use std::sync::OnceLock;

use spine_core::{
    FieldReader, FieldRegistry, FieldValue, FieldWriter, ObjectError, RegistryBuilder, RowArray,
};

use crate::base::{base_registry, OutBase};
use crate::object::Variant;

/// Extension of a reconstructed object. Carries no fields of its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecoExt;

impl RecoExt {
    fn unknown(name: &str) -> ObjectError {
        ObjectError::UnknownField {
            registry: Self::NAME.to_string(),
            field: name.to_string(),
        }
    }
}

impl Variant for RecoExt {
    const IS_TRUTH: bool = false;
    const NAME: &'static str = "RecoObject";

    /// # Panics
    ///
    /// Panics if the base table is invalid (see [`base_registry`]).
    fn registry() -> &'static FieldRegistry {
        static REGISTRY: OnceLock<FieldRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            RegistryBuilder::extend(Self::NAME, base_registry())
                .build()
                .unwrap_or_else(|e| panic!("invalid reco field table: {e}"))
        })
    }

    fn validate(&self, _base: &OutBase) -> Result<(), ObjectError> {
        Ok(())
    }

    fn for_each_positional(&mut self, _f: &mut dyn FnMut(&mut RowArray<f32>)) {}
}

impl FieldReader for RecoExt {
    fn read_field(&self, name: &str) -> Result<Option<FieldValue>, ObjectError> {
        Err(Self::unknown(name))
    }
}

impl FieldWriter for RecoExt {
    fn write_field(&mut self, name: &str, _value: FieldValue) -> Result<(), ObjectError> {
        Err(Self::unknown(name))
    }

    fn clear_field(&mut self, name: &str) -> Result<(), ObjectError> {
        Err(Self::unknown(name))
    }
}
