//! Schema fingerprinting.
//!
//! Uses FNV-1a over the stored part of a registry: every field that is
//! written to storage, in order, with its name, kind and encoding. Two
//! registries hash equal iff a record projected under one decodes field
//! for field under the other. Not cryptographically secure.

use spine_core::{DType, FieldDef, FieldEncoding, FieldRegistry, FieldType};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Feed a single byte into an FNV-1a hash state.
#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

/// Feed a u32 (as 4 LE bytes) into an FNV-1a hash state.
#[inline]
fn fnv1a_u32(mut hash: u64, v: u32) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    hash = fnv1a_u32(hash, bytes.len() as u32);
    for &b in bytes {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

fn dtype_byte(dtype: DType) -> u8 {
    match dtype {
        DType::I64 => 0,
        DType::F32 => 1,
    }
}

fn fold_field(mut hash: u64, def: &FieldDef) -> u64 {
    hash = fnv1a_bytes(hash, def.name.as_bytes());
    hash = match def.field_type {
        FieldType::Int => fnv1a_byte(hash, 0),
        FieldType::Float => fnv1a_byte(hash, 1),
        FieldType::Bool => fnv1a_byte(hash, 2),
        FieldType::Text => fnv1a_byte(hash, 3),
        FieldType::VarLength(FieldEncoding::Element(dtype)) => {
            fnv1a_byte(fnv1a_byte(hash, 4), dtype_byte(dtype))
        }
        FieldType::VarLength(FieldEncoding::Rows { dims, dtype }) => {
            fnv1a_byte(fnv1a_u32(fnv1a_byte(hash, 5), dims), dtype_byte(dtype))
        }
    };
    fnv1a_byte(hash, u8::from(def.is_binarizable()))
}

/// Fingerprint of the fields `registry` writes to storage.
///
/// Storage-excluded fields do not contribute, so adding or removing one
/// leaves existing files readable.
pub fn schema_hash(registry: &FieldRegistry) -> u64 {
    registry.stored_fields().fold(FNV_OFFSET, fold_field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_core::Categories;
    use spine_data::{RecoExt, TruthExt, Variant};

    const INTS: FieldType = FieldType::VarLength(FieldEncoding::Element(DType::I64));

    fn registry(defs: &[FieldDef]) -> FieldRegistry {
        FieldRegistry::builder("T").fields(defs).build().unwrap()
    }

    #[test]
    fn variants_hash_differently() {
        assert_ne!(
            schema_hash(RecoExt::registry()),
            schema_hash(TruthExt::registry())
        );
    }

    #[test]
    fn hash_is_stable() {
        assert_eq!(
            schema_hash(TruthExt::registry()),
            schema_hash(TruthExt::registry())
        );
    }

    #[test]
    fn excluded_fields_do_not_contribute() {
        let a = registry(&[FieldDef::new("id", FieldType::Int)]);
        let b = registry(&[
            FieldDef::new("id", FieldType::Int),
            FieldDef::new("raw", INTS).with(Categories::STORAGE_EXCLUDED),
        ]);
        assert_eq!(schema_hash(&a), schema_hash(&b));
    }

    #[test]
    fn kind_and_order_contribute() {
        let a = registry(&[
            FieldDef::new("a", FieldType::Int),
            FieldDef::new("b", FieldType::Float),
        ]);
        let swapped = registry(&[
            FieldDef::new("b", FieldType::Float),
            FieldDef::new("a", FieldType::Int),
        ]);
        let retyped = registry(&[
            FieldDef::new("a", FieldType::Float),
            FieldDef::new("b", FieldType::Float),
        ]);
        assert_ne!(schema_hash(&a), schema_hash(&swapped));
        assert_ne!(schema_hash(&a), schema_hash(&retyped));
    }

    #[test]
    fn empty_registry_hashes_to_offset_basis() {
        assert_eq!(schema_hash(&registry(&[])), FNV_OFFSET);
    }
}
