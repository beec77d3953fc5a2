//! The record shape shared by every physics object.
//!
//! [`OutBase`] carries identity, voxel footprint, depositions, provenance,
//! containment and matching state. It knows nothing about whether the
//! object is reconstructed or true; that is fixed by the
//! [`Variant`](crate::Variant) it is wrapped with.

use std::sync::OnceLock;

use spine_core::derived::{count, total, unique_modules};
use spine_core::{
    Categories, DType, Derived, DerivedRule, FieldDef, FieldEncoding, FieldReader,
    FieldRegistry, FieldType, FieldValue, FieldWriter, ModuleIds, ObjectError, ObjectId,
    RowArray,
};

use crate::units::Units;

pub(crate) const INT_ARRAY: FieldType = FieldType::VarLength(FieldEncoding::Element(DType::I64));
pub(crate) const FLOAT_ARRAY: FieldType =
    FieldType::VarLength(FieldEncoding::Element(DType::F32));
pub(crate) const POINTS: FieldType = FieldType::VarLength(FieldEncoding::Rows {
    dims: 3,
    dtype: DType::F32,
});
pub(crate) const SOURCES: FieldType = FieldType::VarLength(FieldEncoding::Rows {
    dims: 2,
    dtype: DType::I64,
});

/// Raw per-voxel arrays: merged by concatenation, recomputed on load.
pub(crate) const RAW: Categories = Categories::CONCATENABLE.with(Categories::STORAGE_EXCLUDED);

/// `size = len(index)`.
pub const SIZE: DerivedRule<[i64], usize> = DerivedRule {
    field: "size",
    source: "index",
    compute: count::<i64>,
};

/// `depositions_sum = sum(depositions)`.
pub const DEPOSITIONS_SUM: DerivedRule<[f32], f64> = DerivedRule {
    field: "depositions_sum",
    source: "depositions",
    compute: total,
};

/// `module_ids = unique(sources[:, 0])`.
pub const MODULE_IDS: DerivedRule<RowArray<i64>, ModuleIds> = DerivedRule {
    field: "module_ids",
    source: "sources",
    compute: unique_modules,
};

/// Field declarations of [`OutBase`], in storage order.
pub static BASE_FIELDS: &[FieldDef] = &[
    FieldDef::new("id", FieldType::Int),
    FieldDef::new("index", INT_ARRAY).with(Categories::CONCATENABLE),
    FieldDef::new("size", FieldType::Int).derived_from("index"),
    FieldDef::new("points", POINTS).with(RAW.with(Categories::POSITIONAL)),
    FieldDef::new("depositions", FLOAT_ARRAY).with(RAW),
    FieldDef::new("depositions_sum", FieldType::Float).derived_from("depositions"),
    FieldDef::new("sources", SOURCES).with(RAW),
    FieldDef::new("module_ids", INT_ARRAY)
        .with(Categories::BINARIZABLE)
        .derived_from("sources"),
    FieldDef::new("is_contained", FieldType::Bool),
    FieldDef::new("is_matched", FieldType::Bool),
    FieldDef::new("match_ids", INT_ARRAY),
    FieldDef::new("match_overlaps", FLOAT_ARRAY),
    FieldDef::new("is_cathode_crosser", FieldType::Bool),
    FieldDef::new("cathode_offset", FieldType::Float),
    FieldDef::new("is_truth", FieldType::Bool),
    FieldDef::new("units", FieldType::Text),
];

/// Registry of the fields every physics object carries.
///
/// # Panics
///
/// Panics on first use if [`BASE_FIELDS`] is not a valid declaration
/// list. The table is static, so this is unreachable outside of an edit
/// that breaks it (covered by this module's tests).
pub fn base_registry() -> &'static FieldRegistry {
    static REGISTRY: OnceLock<FieldRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        FieldRegistry::builder("OutBase")
            .fields(BASE_FIELDS)
            .build()
            .unwrap_or_else(|e| panic!("invalid base field table: {e}"))
    })
}

/// Check that every populated array of a parallel family has one length.
pub(crate) fn check_parallel(family: &[(&str, Option<usize>)]) -> Result<(), ObjectError> {
    let mut reference: Option<(&str, usize)> = None;
    for &(name, len) in family {
        let Some(len) = len else { continue };
        match reference {
            None => reference = Some((name, len)),
            Some((ref_name, ref_len)) if ref_len != len => {
                return Err(ObjectError::invalid_state(
                    name,
                    format!("has {len} entries but '{ref_name}' has {ref_len}"),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn check_matches(
    is_matched: bool,
    ids: &[ObjectId],
    overlaps: &[f32],
) -> Result<(), ObjectError> {
    if ids.len() != overlaps.len() {
        return Err(ObjectError::invalid_state(
            "match_overlaps",
            format!(
                "has {} entries but 'match_ids' has {}",
                overlaps.len(),
                ids.len()
            ),
        ));
    }
    if let Some(bad) = overlaps.iter().find(|o| !(0.0..=1.0).contains(*o)) {
        return Err(ObjectError::DomainRange {
            field: "match_overlaps".to_string(),
            detail: format!("overlap {bad} is outside [0, 1]"),
        });
    }
    if is_matched == ids.is_empty() {
        return Err(ObjectError::invalid_state(
            "is_matched",
            format!("is {is_matched} but 'match_ids' has {} entries", ids.len()),
        ));
    }
    Ok(())
}

pub(crate) fn to_count(field: &str, v: i64) -> Result<usize, ObjectError> {
    usize::try_from(v).map_err(|_| ObjectError::DomainRange {
        field: field.to_string(),
        detail: format!("count must be non-negative, got {v}"),
    })
}

pub(crate) fn to_ids(values: Vec<i64>) -> Vec<ObjectId> {
    values.into_iter().map(ObjectId).collect()
}

/// Fields common to reconstructed and truth objects.
///
/// Arrays are `None` until the parser attaches them. Derived fields
/// (`size`, `depositions_sum`, `module_ids`) are read through methods
/// that compute them from their source unless an explicit value was set.
#[derive(Clone, Debug, PartialEq)]
pub struct OutBase {
    /// Identity within the object list; [`ObjectId::UNASSIGNED`] if unset.
    pub id: ObjectId,
    /// `(N)` voxel indexes into the input tensor.
    pub index: Option<Vec<i64>>,
    /// `(N, 3)` voxel coordinates.
    pub points: Option<RowArray<f32>>,
    /// `(N)` deposition per voxel.
    pub depositions: Option<Vec<f32>>,
    /// `(N, 2)` `(module, tpc)` source per voxel.
    pub sources: Option<RowArray<i64>>,
    size: Derived<usize>,
    depositions_sum: Derived<f64>,
    module_ids: Derived<ModuleIds>,
    /// Whether the object is fully contained in the detector.
    pub is_contained: bool,
    is_matched: bool,
    match_ids: Vec<ObjectId>,
    match_overlaps: Vec<f32>,
    /// Whether the object crosses a cathode (space points from more than
    /// one TPC of a module).
    pub is_cathode_crosser: bool,
    /// Offset that aligns the cathode-crossing components. Negative
    /// infinity when not applicable.
    pub cathode_offset: f64,
    /// Units of the positional fields.
    pub units: Units,
}

impl Default for OutBase {
    fn default() -> Self {
        Self {
            id: ObjectId::UNASSIGNED,
            index: None,
            points: None,
            depositions: None,
            sources: None,
            size: Derived::unset(),
            depositions_sum: Derived::unset(),
            module_ids: Derived::unset(),
            is_contained: false,
            is_matched: false,
            match_ids: Vec::new(),
            match_overlaps: Vec::new(),
            is_cathode_crosser: false,
            cathode_offset: f64::NEG_INFINITY,
            units: Units::Cm,
        }
    }
}

impl OutBase {
    derived_field! {
        /// Number of voxels, `len(index)` unless set explicitly.
        size, set_size, clear_size, size_override: usize,
        rule = SIZE,
        source = |this| this.index.as_deref(),
    }

    derived_field! {
        /// Total deposition, `sum(depositions)` unless set explicitly.
        depositions_sum, set_depositions_sum, clear_depositions_sum,
        depositions_sum_override: f64,
        rule = DEPOSITIONS_SUM,
        source = |this| this.depositions.as_deref(),
    }

    derived_field! {
        /// Sorted unique modules in `sources` unless set explicitly.
        module_ids, set_module_ids, clear_module_ids, module_ids_override: ModuleIds,
        rule = MODULE_IDS,
        source = |this| this.sources.as_ref(),
    }

    /// Whether a match in the other domain was found.
    pub fn is_matched(&self) -> bool {
        self.is_matched
    }

    /// Ids of matched objects in the other domain.
    pub fn match_ids(&self) -> &[ObjectId] {
        &self.match_ids
    }

    /// Overlap score per entry of [`match_ids`](Self::match_ids).
    pub fn match_overlaps(&self) -> &[f32] {
        &self.match_overlaps
    }

    /// Record the outcome of a matching pass.
    ///
    /// `ids` and `overlaps` must have the same length
    /// ([`ObjectError::InvalidState`] otherwise) and every overlap must lie
    /// in `[0, 1]` ([`ObjectError::DomainRange`]). `is_matched` becomes
    /// `true` iff `ids` is non-empty. Nothing is changed on error.
    pub fn set_matches(&mut self, ids: Vec<ObjectId>, overlaps: Vec<f32>) -> Result<(), ObjectError> {
        check_matches(!ids.is_empty(), &ids, &overlaps)?;
        self.is_matched = !ids.is_empty();
        self.match_ids = ids;
        self.match_overlaps = overlaps;
        Ok(())
    }

    /// Forget any match.
    pub fn clear_matches(&mut self) {
        self.is_matched = false;
        self.match_ids.clear();
        self.match_overlaps.clear();
    }

    /// Check the length invariants of the parallel arrays and the matching
    /// state.
    ///
    /// Matching state must look like the outcome of
    /// [`set_matches`](Self::set_matches): lists of one length, overlaps in
    /// `[0, 1]` and `is_matched` set iff `match_ids` is non-empty.
    pub fn validate(&self) -> Result<(), ObjectError> {
        check_parallel(&[
            ("index", self.index.as_ref().map(Vec::len)),
            ("points", self.points.as_ref().map(RowArray::len)),
            ("depositions", self.depositions.as_ref().map(Vec::len)),
            ("sources", self.sources.as_ref().map(RowArray::len)),
        ])?;
        check_matches(self.is_matched, &self.match_ids, &self.match_overlaps)
    }

    pub(crate) fn positional_mut(&mut self) -> Option<&mut RowArray<f32>> {
        self.points.as_mut()
    }
}

impl FieldReader for OutBase {
    fn read_field(&self, name: &str) -> Result<Option<FieldValue>, ObjectError> {
        let value = match name {
            "id" => FieldValue::Int(self.id.0),
            "index" => return Ok(self.index.clone().map(FieldValue::Ints)),
            "size" => FieldValue::Int(self.size()? as i64),
            "points" => return Ok(self.points.clone().map(FieldValue::FloatRows)),
            "depositions" => return Ok(self.depositions.clone().map(FieldValue::Floats)),
            "depositions_sum" => FieldValue::Float(self.depositions_sum()?),
            "sources" => return Ok(self.sources.clone().map(FieldValue::IntRows)),
            "module_ids" => FieldValue::Ints(self.module_ids()?.to_vec()),
            "is_contained" => FieldValue::Bool(self.is_contained),
            "is_matched" => FieldValue::Bool(self.is_matched),
            "match_ids" => FieldValue::Ints(self.match_ids.iter().map(|id| id.0).collect()),
            "match_overlaps" => FieldValue::Floats(self.match_overlaps.clone()),
            "is_cathode_crosser" => FieldValue::Bool(self.is_cathode_crosser),
            "cathode_offset" => FieldValue::Float(self.cathode_offset),
            "units" => FieldValue::Text(self.units.as_str().to_string()),
            "is_truth" => {
                return Err(ObjectError::invalid_state(
                    name,
                    "fixed by the record variant, not by the base shape",
                ))
            }
            _ => {
                return Err(ObjectError::UnknownField {
                    registry: base_registry().name().to_string(),
                    field: name.to_string(),
                })
            }
        };
        Ok(Some(value))
    }
}

impl FieldWriter for OutBase {
    fn write_field(&mut self, name: &str, value: FieldValue) -> Result<(), ObjectError> {
        match name {
            "id" => self.id = ObjectId(value.into_int(name)?),
            "index" => self.index = Some(value.into_ints(name)?),
            "size" => self.set_size(to_count(name, value.into_int(name)?)?),
            "points" => self.points = Some(value.into_float_rows(name, 3)?),
            "depositions" => self.depositions = Some(value.into_floats(name)?),
            "depositions_sum" => self.set_depositions_sum(value.into_float(name)?),
            "sources" => self.sources = Some(value.into_int_rows(name, 2)?),
            "module_ids" => self.set_module_ids(value.into_ints(name)?.into_iter().collect()),
            "is_contained" => self.is_contained = value.into_bool(name)?,
            "is_matched" => self.is_matched = value.into_bool(name)?,
            "match_ids" => self.match_ids = to_ids(value.into_ints(name)?),
            "match_overlaps" => self.match_overlaps = value.into_floats(name)?,
            "is_cathode_crosser" => self.is_cathode_crosser = value.into_bool(name)?,
            "cathode_offset" => self.cathode_offset = value.into_float(name)?,
            "units" => self.units = value.into_text(name)?.parse()?,
            "is_truth" => {
                return Err(ObjectError::ReadOnlyField {
                    field: name.to_string(),
                })
            }
            _ => {
                return Err(ObjectError::UnknownField {
                    registry: base_registry().name().to_string(),
                    field: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn clear_field(&mut self, name: &str) -> Result<(), ObjectError> {
        let defaults = OutBase::default();
        match name {
            "id" => self.id = defaults.id,
            "index" => self.index = None,
            "size" => {
                self.clear_size();
            }
            "points" => self.points = None,
            "depositions" => self.depositions = None,
            "depositions_sum" => {
                self.clear_depositions_sum();
            }
            "sources" => self.sources = None,
            "module_ids" => {
                self.clear_module_ids();
            }
            "is_contained" => self.is_contained = defaults.is_contained,
            "is_matched" => self.is_matched = defaults.is_matched,
            "match_ids" => self.match_ids.clear(),
            "match_overlaps" => self.match_overlaps.clear(),
            "is_cathode_crosser" => self.is_cathode_crosser = defaults.is_cathode_crosser,
            "cathode_offset" => self.cathode_offset = defaults.cathode_offset,
            "units" => self.units = defaults.units,
            "is_truth" => {
                return Err(ObjectError::ReadOnlyField {
                    field: name.to_string(),
                })
            }
            _ => {
                return Err(ObjectError::UnknownField {
                    registry: base_registry().name().to_string(),
                    field: name.to_string(),
                })
            }
        }
        Ok(())
    }
}
