//! Parameterized physics-object record.
//!
//! An [`OutObject<V>`] is an [`OutBase`] composed with a variant extension
//! `V`. The variant fixes `is_truth` at the type level, contributes its
//! own fields and registry, and is the only thing that differs between a
//! [`RecoObject`] and a [`TruthObject`].

use std::fmt::Debug;

use spine_core::{
    FieldReader, FieldRegistry, FieldValue, FieldWriter, ModuleIds, ObjectError, ObjectId,
    RowArray, Schema,
};

use crate::base::{base_registry, OutBase};
use crate::reco::RecoExt;
use crate::truth::TruthExt;
use crate::units::{Units, VoxelMeta};

/// A record variant: the extension fields that sit next to [`OutBase`].
///
/// The [`FieldReader`] / [`FieldWriter`] impls of a variant cover only
/// its own fields; [`OutObject`] routes base fields to [`OutBase`].
pub trait Variant:
    FieldReader + FieldWriter + Clone + Debug + Default + PartialEq + Send + Sync + 'static
{
    /// Value reported for `is_truth`.
    const IS_TRUTH: bool;

    /// Registry name of the complete record (base plus extension).
    const NAME: &'static str;

    /// Registry of the complete record: the base entries extended with
    /// the variant's own.
    fn registry() -> &'static FieldRegistry;

    /// Check the variant's own length invariants, some of which refer to
    /// base arrays.
    fn validate(&self, base: &OutBase) -> Result<(), ObjectError>;

    /// Visit every populated positional array of the extension.
    fn for_each_positional(&mut self, f: &mut dyn FnMut(&mut RowArray<f32>));
}

/// A physics object of variant `V`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutObject<V: Variant> {
    base: OutBase,
    ext: V,
}

/// A reconstructed physics object.
pub type RecoObject = OutObject<RecoExt>;

/// A ground-truth physics object.
pub type TruthObject = OutObject<TruthExt>;

impl<V: Variant> OutObject<V> {
    /// An object with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble an object from its two halves.
    pub fn from_parts(base: OutBase, ext: V) -> Self {
        Self { base, ext }
    }

    /// Build an object from name-keyed values, as a parser would.
    ///
    /// Any subset of declared fields may be given; the rest keep their
    /// defaults. `is_truth` is not accepted: it is fixed by `V`. The result
    /// must pass [`validate`](Self::validate).
    pub fn from_fields<I, K>(fields: I) -> Result<Self, ObjectError>
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: AsRef<str>,
    {
        let mut obj = Self::new();
        for (name, value) in fields {
            obj.write_field(name.as_ref(), value)?;
        }
        obj.validate()?;
        Ok(obj)
    }

    /// Split into the base and the extension.
    pub fn into_parts(self) -> (OutBase, V) {
        (self.base, self.ext)
    }

    /// The shared fields.
    pub fn base(&self) -> &OutBase {
        &self.base
    }

    /// The shared fields, mutably.
    pub fn base_mut(&mut self) -> &mut OutBase {
        &mut self.base
    }

    /// The variant's own fields.
    pub fn ext(&self) -> &V {
        &self.ext
    }

    /// The variant's own fields, mutably.
    pub fn ext_mut(&mut self) -> &mut V {
        &mut self.ext
    }

    /// Identity within the containing list.
    pub fn id(&self) -> ObjectId {
        self.base.id
    }

    /// Whether this is a truth object. Fixed by `V`.
    pub fn is_truth(&self) -> bool {
        V::IS_TRUTH
    }

    /// Check every parallel-length invariant of the record.
    pub fn validate(&self) -> Result<(), ObjectError> {
        self.base.validate()?;
        self.ext.validate(&self.base)
    }

    /// Convert every positional field from voxel indices to cm.
    ///
    /// Fails with [`ObjectError::InvalidState`] if the object is already
    /// in cm.
    pub fn to_cm(&mut self, meta: &VoxelMeta) -> Result<(), ObjectError> {
        self.convert(Units::Cm, |p| meta.to_cm(p))
    }

    /// Convert every positional field from cm to voxel indices.
    ///
    /// Fails with [`ObjectError::InvalidState`] if the object is already
    /// in px.
    pub fn to_px(&mut self, meta: &VoxelMeta) -> Result<(), ObjectError> {
        self.convert(Units::Px, |p| meta.to_px(p))
    }

    fn convert(
        &mut self,
        target: Units,
        mut apply: impl FnMut(&mut RowArray<f32>),
    ) -> Result<(), ObjectError> {
        if self.base.units == target {
            return Err(ObjectError::invalid_state(
                "units",
                format!("coordinates are already expressed in {target}"),
            ));
        }
        if let Some(points) = self.base.positional_mut() {
            apply(points);
        }
        self.ext.for_each_positional(&mut apply);
        self.base.units = target;
        Ok(())
    }

    fn unknown(name: &str) -> ObjectError {
        ObjectError::UnknownField {
            registry: V::NAME.to_string(),
            field: name.to_string(),
        }
    }
}

impl<V: Variant> Schema for OutObject<V> {
    fn registry() -> &'static FieldRegistry {
        V::registry()
    }
}

impl<V: Variant> FieldReader for OutObject<V> {
    fn read_field(&self, name: &str) -> Result<Option<FieldValue>, ObjectError> {
        if name == "is_truth" {
            return Ok(Some(FieldValue::Bool(V::IS_TRUTH)));
        }
        if base_registry().contains(name) {
            self.base.read_field(name)
        } else if V::registry().contains(name) {
            self.ext.read_field(name)
        } else {
            Err(Self::unknown(name))
        }
    }
}

impl<V: Variant> FieldWriter for OutObject<V> {
    fn write_field(&mut self, name: &str, value: FieldValue) -> Result<(), ObjectError> {
        if base_registry().contains(name) {
            self.base.write_field(name, value)
        } else if V::registry().contains(name) {
            self.ext.write_field(name, value)
        } else {
            Err(Self::unknown(name))
        }
    }

    fn clear_field(&mut self, name: &str) -> Result<(), ObjectError> {
        if base_registry().contains(name) {
            self.base.clear_field(name)
        } else if V::registry().contains(name) {
            self.ext.clear_field(name)
        } else {
            Err(Self::unknown(name))
        }
    }
}

/// Read capabilities shared by reconstructed and truth objects.
///
/// Object-safe, so mixed collections can be handled as
/// `&dyn PhysicsObject`.
pub trait PhysicsObject {
    /// Identity within the containing list.
    fn id(&self) -> ObjectId;
    /// Whether this is a truth object.
    fn is_truth(&self) -> bool;
    /// Voxel indexes, if attached.
    fn index(&self) -> Option<&[i64]>;
    /// Voxel coordinates, if attached.
    fn points(&self) -> Option<&RowArray<f32>>;
    /// Per-voxel depositions, if attached.
    fn depositions(&self) -> Option<&[f32]>;
    /// Per-voxel `(module, tpc)` sources, if attached.
    fn sources(&self) -> Option<&RowArray<i64>>;
    /// Number of voxels.
    fn size(&self) -> Result<usize, ObjectError>;
    /// Total deposition.
    fn depositions_sum(&self) -> Result<f64, ObjectError>;
    /// Contributing modules.
    fn module_ids(&self) -> Result<ModuleIds, ObjectError>;
    /// Whether a match was found.
    fn is_matched(&self) -> bool;
    /// Matched ids in the other domain.
    fn match_ids(&self) -> &[ObjectId];
    /// Overlap per matched id.
    fn match_overlaps(&self) -> &[f32];
    /// Units of the positional fields.
    fn units(&self) -> Units;
}

impl<V: Variant> PhysicsObject for OutObject<V> {
    fn id(&self) -> ObjectId {
        self.base.id
    }

    fn is_truth(&self) -> bool {
        V::IS_TRUTH
    }

    fn index(&self) -> Option<&[i64]> {
        self.base.index.as_deref()
    }

    fn points(&self) -> Option<&RowArray<f32>> {
        self.base.points.as_ref()
    }

    fn depositions(&self) -> Option<&[f32]> {
        self.base.depositions.as_deref()
    }

    fn sources(&self) -> Option<&RowArray<i64>> {
        self.base.sources.as_ref()
    }

    fn size(&self) -> Result<usize, ObjectError> {
        self.base.size()
    }

    fn depositions_sum(&self) -> Result<f64, ObjectError> {
        self.base.depositions_sum()
    }

    fn module_ids(&self) -> Result<ModuleIds, ObjectError> {
        self.base.module_ids()
    }

    fn is_matched(&self) -> bool {
        self.base.is_matched()
    }

    fn match_ids(&self) -> &[ObjectId] {
        self.base.match_ids()
    }

    fn match_overlaps(&self) -> &[f32] {
        self.base.match_overlaps()
    }

    fn units(&self) -> Units {
        self.base.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_fixes_is_truth() {
        let reco = RecoObject::new();
        let truth = TruthObject::new();
        assert!(!reco.is_truth());
        assert!(truth.is_truth());
        assert_eq!(
            reco.read_field("is_truth").unwrap(),
            Some(FieldValue::Bool(false))
        );
        assert_eq!(
            truth.read_field("is_truth").unwrap(),
            Some(FieldValue::Bool(true))
        );
    }

    #[test]
    fn parts_round_trip() {
        let mut base = OutBase::default();
        base.id = ObjectId(5);
        let mut ext = TruthExt::default();
        ext.orig_id = ObjectId(2);
        let truth = TruthObject::from_parts(base.clone(), ext.clone());
        assert_eq!(truth.id(), ObjectId(5));
        assert!(truth.is_truth());
        assert_eq!(truth.into_parts(), (base, ext));
    }

    #[test]
    fn is_truth_cannot_be_supplied() {
        let err = RecoObject::from_fields([("is_truth", FieldValue::Bool(true))]).unwrap_err();
        assert!(matches!(err, ObjectError::ReadOnlyField { .. }));
        let mut truth = TruthObject::new();
        assert!(truth.write_field("is_truth", FieldValue::Bool(false)).is_err());
        assert!(truth.clear_field("is_truth").is_err());
        assert!(truth.is_truth());
    }

    #[test]
    fn from_fields_routes_by_registry() {
        let truth = TruthObject::from_fields([
            ("id", FieldValue::Int(3)),
            ("index", FieldValue::Ints(vec![1, 2, 3])),
            ("orig_id", FieldValue::Int(11)),
            ("index_g4", FieldValue::Ints(vec![7])),
        ])
        .unwrap();
        assert_eq!(truth.id(), ObjectId(3));
        assert_eq!(truth.base().size().unwrap(), 3);
        assert_eq!(truth.ext().orig_id, ObjectId(11));
        assert_eq!(truth.ext().size_g4().unwrap(), 1);
    }

    #[test]
    fn from_fields_rejects_inconsistent_matches() {
        let ragged = RecoObject::from_fields([
            ("is_matched", FieldValue::Bool(true)),
            ("match_ids", FieldValue::Ints(vec![1, 2, 3])),
            ("match_overlaps", FieldValue::Floats(vec![0.5])),
        ]);
        assert!(matches!(ragged, Err(ObjectError::InvalidState { .. })));

        let ragged_family = RecoObject::from_fields([
            ("index", FieldValue::Ints(vec![1, 2])),
            ("depositions", FieldValue::Floats(vec![1.0])),
        ]);
        assert!(ragged_family.is_err());

        let matched = RecoObject::from_fields([
            ("is_matched", FieldValue::Bool(true)),
            ("match_ids", FieldValue::Ints(vec![1])),
            ("match_overlaps", FieldValue::Floats(vec![0.5])),
        ])
        .unwrap();
        assert_eq!(matched.base().match_ids(), &[ObjectId(1)]);
    }

    #[test]
    fn reco_rejects_truth_only_fields() {
        let err = RecoObject::from_fields([("orig_id", FieldValue::Int(1))]).unwrap_err();
        match err {
            ObjectError::UnknownField { registry, field } => {
                assert_eq!(registry, "RecoObject");
                assert_eq!(field, "orig_id");
            }
            other => panic!("expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn unit_conversion_touches_every_positional_field() {
        let meta = VoxelMeta::new([0.0; 3], [2.0; 3]).unwrap();
        let mut truth = TruthObject::new();
        truth.base_mut().points = Some(RowArray::from_rows(&[[0.0f32, 1.0, 2.0]]));
        truth.ext_mut().points_g4 = Some(RowArray::from_rows(&[[1.0f32, 1.0, 1.0]]));
        truth.base_mut().units = Units::Px;

        truth.to_cm(&meta).unwrap();
        assert_eq!(truth.units(), Units::Cm);
        assert_eq!(truth.points().unwrap().as_flat(), &[1.0, 3.0, 5.0]);
        assert_eq!(
            truth.ext().points_g4.as_ref().unwrap().as_flat(),
            &[3.0, 3.0, 3.0]
        );
        assert!(truth.ext().points_adapt.is_none());
    }

    #[test]
    fn converting_to_current_unit_fails() {
        let meta = VoxelMeta::new([0.0; 3], [1.0; 3]).unwrap();
        let mut reco = RecoObject::new();
        reco.base_mut().points = Some(RowArray::from_rows(&[[1.0f32, 1.0, 1.0]]));
        assert!(matches!(
            reco.to_cm(&meta),
            Err(ObjectError::InvalidState { .. })
        ));
        reco.to_px(&meta).unwrap();
        assert_eq!(reco.units(), Units::Px);
        assert_eq!(reco.points().unwrap().as_flat(), &[0.5, 0.5, 0.5]);
        assert!(reco.to_px(&meta).is_err());
    }

    #[test]
    fn dyn_physics_object_over_mixed_variants() {
        let mut reco = RecoObject::new();
        reco.base_mut().index = Some(vec![0, 1]);
        let mut truth = TruthObject::new();
        truth.base_mut().index = Some(vec![4, 5, 6]);
        let objects: Vec<&dyn PhysicsObject> = vec![&reco, &truth];
        let sizes: Vec<usize> = objects.iter().map(|o| o.size().unwrap()).collect();
        assert_eq!(sizes, vec![2, 3]);
        assert_eq!(objects.iter().filter(|o| o.is_truth()).count(), 1);
    }
}
