//! Truth-object variant.
//!
//! A truth object carries three array families beyond the base ones:
//!
//! - original-unit: `depositions_q`, parallel to the base `index`
//! - adapted-label: `index_adapt`, `points_adapt`, `sources_adapt`,
//!   `depositions_adapt`, `depositions_adapt_q`
//! - simulation-truth: `index_g4`, `points_g4`, `depositions_g4`
//!
//! Each family has its own derived count and sums, resolved with the same
//! override-first contract as the base fields.

use std::sync::OnceLock;

use spine_core::derived::{count, total};
use spine_core::{
    Categories, Derived, DerivedRule, FieldDef, FieldReader, FieldRegistry, FieldType,
    FieldValue, FieldWriter, ObjectError, ObjectId, RegistryBuilder, RowArray,
};

use crate::base::{
    base_registry, check_parallel, to_count, OutBase, FLOAT_ARRAY, INT_ARRAY, POINTS, RAW,
    SOURCES,
};
use crate::object::Variant;

/// `depositions_q_sum = sum(depositions_q)`.
pub const DEPOSITIONS_Q_SUM: DerivedRule<[f32], f64> = DerivedRule {
    field: "depositions_q_sum",
    source: "depositions_q",
    compute: total,
};

/// `size_adapt = len(index_adapt)`.
pub const SIZE_ADAPT: DerivedRule<[i64], usize> = DerivedRule {
    field: "size_adapt",
    source: "index_adapt",
    compute: count::<i64>,
};

/// `depositions_adapt_sum = sum(depositions_adapt)`.
pub const DEPOSITIONS_ADAPT_SUM: DerivedRule<[f32], f64> = DerivedRule {
    field: "depositions_adapt_sum",
    source: "depositions_adapt",
    compute: total,
};

/// `depositions_adapt_q_sum = sum(depositions_adapt_q)`.
pub const DEPOSITIONS_ADAPT_Q_SUM: DerivedRule<[f32], f64> = DerivedRule {
    field: "depositions_adapt_q_sum",
    source: "depositions_adapt_q",
    compute: total,
};

/// `size_g4 = len(index_g4)`.
pub const SIZE_G4: DerivedRule<[i64], usize> = DerivedRule {
    field: "size_g4",
    source: "index_g4",
    compute: count::<i64>,
};

/// `depositions_g4_sum = sum(depositions_g4)`.
pub const DEPOSITIONS_G4_SUM: DerivedRule<[f32], f64> = DerivedRule {
    field: "depositions_g4_sum",
    source: "depositions_g4",
    compute: total,
};

/// Truth-only field declarations, appended to the base table.
pub static TRUTH_FIELDS: &[FieldDef] = &[
    FieldDef::new("orig_id", FieldType::Int),
    FieldDef::new("depositions_q", FLOAT_ARRAY).with(RAW),
    FieldDef::new("depositions_q_sum", FieldType::Float).derived_from("depositions_q"),
    FieldDef::new("index_adapt", INT_ARRAY).with(Categories::CONCATENABLE),
    FieldDef::new("size_adapt", FieldType::Int).derived_from("index_adapt"),
    FieldDef::new("points_adapt", POINTS).with(RAW.with(Categories::POSITIONAL)),
    FieldDef::new("sources_adapt", SOURCES).with(RAW),
    FieldDef::new("depositions_adapt", FLOAT_ARRAY).with(RAW),
    FieldDef::new("depositions_adapt_sum", FieldType::Float).derived_from("depositions_adapt"),
    FieldDef::new("depositions_adapt_q", FLOAT_ARRAY).with(RAW),
    FieldDef::new("depositions_adapt_q_sum", FieldType::Float)
        .derived_from("depositions_adapt_q"),
    FieldDef::new("index_g4", INT_ARRAY).with(Categories::CONCATENABLE),
    FieldDef::new("size_g4", FieldType::Int).derived_from("index_g4"),
    FieldDef::new("points_g4", POINTS).with(RAW.with(Categories::POSITIONAL)),
    FieldDef::new("depositions_g4", FLOAT_ARRAY).with(RAW),
    FieldDef::new("depositions_g4_sum", FieldType::Float).derived_from("depositions_g4"),
];

/// Fields a truth object adds to [`OutBase`].
#[derive(Clone, Debug, PartialEq)]
pub struct TruthExt {
    /// Identity in the original (pre-merge) truth list;
    /// [`ObjectId::UNASSIGNED`] if unset.
    pub orig_id: ObjectId,
    /// `(N)` depositions in the units of the input image.
    pub depositions_q: Option<Vec<f32>>,
    depositions_q_sum: Derived<f64>,
    /// `(N')` voxel indexes in the adapted label tensor.
    pub index_adapt: Option<Vec<i64>>,
    size_adapt: Derived<usize>,
    /// `(N', 3)` adapted voxel coordinates.
    pub points_adapt: Option<RowArray<f32>>,
    /// `(N', 2)` adapted `(module, tpc)` sources.
    pub sources_adapt: Option<RowArray<i64>>,
    /// `(N')` adapted depositions.
    pub depositions_adapt: Option<Vec<f32>>,
    depositions_adapt_sum: Derived<f64>,
    /// `(N')` adapted depositions in the units of the input image.
    pub depositions_adapt_q: Option<Vec<f32>>,
    depositions_adapt_q_sum: Derived<f64>,
    /// `(N'')` voxel indexes in the simulation deposition tensor.
    pub index_g4: Option<Vec<i64>>,
    size_g4: Derived<usize>,
    /// `(N'', 3)` simulation voxel coordinates.
    pub points_g4: Option<RowArray<f32>>,
    /// `(N'')` simulated energy depositions.
    pub depositions_g4: Option<Vec<f32>>,
    depositions_g4_sum: Derived<f64>,
}

impl Default for TruthExt {
    fn default() -> Self {
        Self {
            orig_id: ObjectId::UNASSIGNED,
            depositions_q: None,
            depositions_q_sum: Derived::unset(),
            index_adapt: None,
            size_adapt: Derived::unset(),
            points_adapt: None,
            sources_adapt: None,
            depositions_adapt: None,
            depositions_adapt_sum: Derived::unset(),
            depositions_adapt_q: None,
            depositions_adapt_q_sum: Derived::unset(),
            index_g4: None,
            size_g4: Derived::unset(),
            points_g4: None,
            depositions_g4: None,
            depositions_g4_sum: Derived::unset(),
        }
    }
}

impl TruthExt {
    derived_field! {
        /// Total original-unit deposition.
        depositions_q_sum, set_depositions_q_sum, clear_depositions_q_sum,
        depositions_q_sum_override: f64,
        rule = DEPOSITIONS_Q_SUM,
        source = |this| this.depositions_q.as_deref(),
    }

    derived_field! {
        /// Number of voxels in the adapted label tensor.
        size_adapt, set_size_adapt, clear_size_adapt, size_adapt_override: usize,
        rule = SIZE_ADAPT,
        source = |this| this.index_adapt.as_deref(),
    }

    derived_field! {
        /// Total adapted deposition.
        depositions_adapt_sum, set_depositions_adapt_sum, clear_depositions_adapt_sum,
        depositions_adapt_sum_override: f64,
        rule = DEPOSITIONS_ADAPT_SUM,
        source = |this| this.depositions_adapt.as_deref(),
    }

    derived_field! {
        /// Total adapted deposition in original units.
        depositions_adapt_q_sum, set_depositions_adapt_q_sum, clear_depositions_adapt_q_sum,
        depositions_adapt_q_sum_override: f64,
        rule = DEPOSITIONS_ADAPT_Q_SUM,
        source = |this| this.depositions_adapt_q.as_deref(),
    }

    derived_field! {
        /// Number of voxels in the simulation tensor.
        size_g4, set_size_g4, clear_size_g4, size_g4_override: usize,
        rule = SIZE_G4,
        source = |this| this.index_g4.as_deref(),
    }

    derived_field! {
        /// Total simulated deposition.
        depositions_g4_sum, set_depositions_g4_sum, clear_depositions_g4_sum,
        depositions_g4_sum_override: f64,
        rule = DEPOSITIONS_G4_SUM,
        source = |this| this.depositions_g4.as_deref(),
    }

    fn unknown(name: &str) -> ObjectError {
        ObjectError::UnknownField {
            registry: Self::NAME.to_string(),
            field: name.to_string(),
        }
    }
}

impl Variant for TruthExt {
    const IS_TRUTH: bool = true;
    const NAME: &'static str = "TruthObject";

    /// # Panics
    ///
    /// Panics on first use if [`TRUTH_FIELDS`] repeats a base field or is
    /// otherwise invalid.
    fn registry() -> &'static FieldRegistry {
        static REGISTRY: OnceLock<FieldRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            RegistryBuilder::extend(Self::NAME, base_registry())
                .fields(TRUTH_FIELDS)
                .build()
                .unwrap_or_else(|e| panic!("invalid truth field table: {e}"))
        })
    }

    fn validate(&self, base: &OutBase) -> Result<(), ObjectError> {
        check_parallel(&[
            ("index", base.index.as_ref().map(Vec::len)),
            ("depositions", base.depositions.as_ref().map(Vec::len)),
            ("depositions_q", self.depositions_q.as_ref().map(Vec::len)),
        ])?;
        check_parallel(&[
            ("index_adapt", self.index_adapt.as_ref().map(Vec::len)),
            ("points_adapt", self.points_adapt.as_ref().map(RowArray::len)),
            ("sources_adapt", self.sources_adapt.as_ref().map(RowArray::len)),
            ("depositions_adapt", self.depositions_adapt.as_ref().map(Vec::len)),
            ("depositions_adapt_q", self.depositions_adapt_q.as_ref().map(Vec::len)),
        ])?;
        check_parallel(&[
            ("index_g4", self.index_g4.as_ref().map(Vec::len)),
            ("points_g4", self.points_g4.as_ref().map(RowArray::len)),
            ("depositions_g4", self.depositions_g4.as_ref().map(Vec::len)),
        ])
    }

    fn for_each_positional(&mut self, f: &mut dyn FnMut(&mut RowArray<f32>)) {
        for points in [self.points_adapt.as_mut(), self.points_g4.as_mut()]
            .into_iter()
            .flatten()
        {
            f(points);
        }
    }
}

impl FieldReader for TruthExt {
    fn read_field(&self, name: &str) -> Result<Option<FieldValue>, ObjectError> {
        let floats = |v: &Option<Vec<f32>>| v.clone().map(FieldValue::Floats);
        let ints = |v: &Option<Vec<i64>>| v.clone().map(FieldValue::Ints);
        Ok(match name {
            "orig_id" => Some(FieldValue::Int(self.orig_id.0)),
            "depositions_q" => floats(&self.depositions_q),
            "depositions_q_sum" => Some(FieldValue::Float(self.depositions_q_sum()?)),
            "index_adapt" => ints(&self.index_adapt),
            "size_adapt" => Some(FieldValue::Int(self.size_adapt()? as i64)),
            "points_adapt" => self.points_adapt.clone().map(FieldValue::FloatRows),
            "sources_adapt" => self.sources_adapt.clone().map(FieldValue::IntRows),
            "depositions_adapt" => floats(&self.depositions_adapt),
            "depositions_adapt_sum" => Some(FieldValue::Float(self.depositions_adapt_sum()?)),
            "depositions_adapt_q" => floats(&self.depositions_adapt_q),
            "depositions_adapt_q_sum" => {
                Some(FieldValue::Float(self.depositions_adapt_q_sum()?))
            }
            "index_g4" => ints(&self.index_g4),
            "size_g4" => Some(FieldValue::Int(self.size_g4()? as i64)),
            "points_g4" => self.points_g4.clone().map(FieldValue::FloatRows),
            "depositions_g4" => floats(&self.depositions_g4),
            "depositions_g4_sum" => Some(FieldValue::Float(self.depositions_g4_sum()?)),
            _ => return Err(Self::unknown(name)),
        })
    }
}

impl FieldWriter for TruthExt {
    fn write_field(&mut self, name: &str, value: FieldValue) -> Result<(), ObjectError> {
        match name {
            "orig_id" => self.orig_id = ObjectId(value.into_int(name)?),
            "depositions_q" => self.depositions_q = Some(value.into_floats(name)?),
            "depositions_q_sum" => self.set_depositions_q_sum(value.into_float(name)?),
            "index_adapt" => self.index_adapt = Some(value.into_ints(name)?),
            "size_adapt" => self.set_size_adapt(to_count(name, value.into_int(name)?)?),
            "points_adapt" => self.points_adapt = Some(value.into_float_rows(name, 3)?),
            "sources_adapt" => self.sources_adapt = Some(value.into_int_rows(name, 2)?),
            "depositions_adapt" => self.depositions_adapt = Some(value.into_floats(name)?),
            "depositions_adapt_sum" => self.set_depositions_adapt_sum(value.into_float(name)?),
            "depositions_adapt_q" => self.depositions_adapt_q = Some(value.into_floats(name)?),
            "depositions_adapt_q_sum" => {
                self.set_depositions_adapt_q_sum(value.into_float(name)?)
            }
            "index_g4" => self.index_g4 = Some(value.into_ints(name)?),
            "size_g4" => self.set_size_g4(to_count(name, value.into_int(name)?)?),
            "points_g4" => self.points_g4 = Some(value.into_float_rows(name, 3)?),
            "depositions_g4" => self.depositions_g4 = Some(value.into_floats(name)?),
            "depositions_g4_sum" => self.set_depositions_g4_sum(value.into_float(name)?),
            _ => return Err(Self::unknown(name)),
        }
        Ok(())
    }

    fn clear_field(&mut self, name: &str) -> Result<(), ObjectError> {
        match name {
            "orig_id" => self.orig_id = ObjectId::UNASSIGNED,
            "depositions_q" => self.depositions_q = None,
            "depositions_q_sum" => {
                self.clear_depositions_q_sum();
            }
            "index_adapt" => self.index_adapt = None,
            "size_adapt" => {
                self.clear_size_adapt();
            }
            "points_adapt" => self.points_adapt = None,
            "sources_adapt" => self.sources_adapt = None,
            "depositions_adapt" => self.depositions_adapt = None,
            "depositions_adapt_sum" => {
                self.clear_depositions_adapt_sum();
            }
            "depositions_adapt_q" => self.depositions_adapt_q = None,
            "depositions_adapt_q_sum" => {
                self.clear_depositions_adapt_q_sum();
            }
            "index_g4" => self.index_g4 = None,
            "size_g4" => {
                self.clear_size_g4();
            }
            "points_g4" => self.points_g4 = None,
            "depositions_g4" => self.depositions_g4 = None,
            "depositions_g4_sum" => {
                self.clear_depositions_g4_sum();
            }
            _ => return Err(Self::unknown(name)),
        }
        Ok(())
    }
}
