//! Combining several objects of one variant into a single object.
//!
//! Every field the registry lists as concatenable is appended across the
//! inputs in input order. Derived fields are not copied; the result
//! computes them from its merged source arrays. Every other scalar needs
//! a policy in the caller's [`MergePlan`]; [`MergePlan::defaults`] opts
//! into resetting them to their defaults. Identity and matching state are
//! never merged: the caller assigns them to the result.

use indexmap::IndexMap;
use log::{debug, trace};

use spine_core::{FieldReader, FieldRegistry, FieldValue, FieldWriter, ObjectError};

use crate::object::{OutObject, Variant};

fn not_mergeable(field: &str) -> Option<&'static str> {
    NOT_MERGEABLE
        .iter()
        .find(|(name, _)| *name == field)
        .map(|&(_, reason)| reason)
}

/// Scalar fields of `registry` that need a policy.
fn policy_fields(registry: &FieldRegistry) -> impl Iterator<Item = &'static str> + '_ {
    registry
        .iter()
        .filter(|def| !def.is_derived() && !def.is_concatenable())
        .map(|def| def.name)
        .filter(|name| not_mergeable(name).is_none())
}

/// Fields that take no policy, with the reason reported to the caller.
const NOT_MERGEABLE: &[(&str, &str)] = &[
    ("id", "identity of the result is assigned by the caller"),
    ("orig_id", "identity of the result is assigned by the caller"),
    ("is_matched", "matching state is assigned by the caller"),
    ("match_ids", "matching state is assigned by the caller"),
    ("match_overlaps", "matching state is assigned by the caller"),
    ("is_truth", "fixed by the record variant"),
    ("units", "inputs must share units, which the result keeps"),
];

/// How the inputs' values of one scalar field become the result's value.
#[derive(Clone, Debug, PartialEq)]
pub enum MergePolicy {
    /// Value of the first input.
    First,
    /// Value of the last input.
    Last,
    /// Logical OR of boolean values.
    AnyTrue,
    /// Logical AND of boolean values.
    AllTrue,
    /// Smallest numeric value.
    Min,
    /// Largest numeric value.
    Max,
    /// All inputs must agree; that value is kept.
    RequireEqual,
    /// A fixed value, ignoring the inputs.
    Value(FieldValue),
}

impl MergePolicy {
    /// Reduce the inputs' values (in input order, at least one) to one.
    pub fn resolve(&self, field: &str, values: Vec<FieldValue>) -> Result<FieldValue, ObjectError> {
        let mut iter = values.into_iter();
        let first = iter.next().ok_or(ObjectError::EmptyMerge)?;
        match self {
            Self::First => Ok(first),
            Self::Last => Ok(iter.last().unwrap_or(first)),
            Self::AnyTrue => {
                let mut acc = first.into_bool(field)?;
                for v in iter {
                    acc |= v.into_bool(field)?;
                }
                Ok(FieldValue::Bool(acc))
            }
            Self::AllTrue => {
                let mut acc = first.into_bool(field)?;
                for v in iter {
                    acc &= v.into_bool(field)?;
                }
                Ok(FieldValue::Bool(acc))
            }
            Self::Min => extremum(field, first, iter, |a, b| a < b),
            Self::Max => extremum(field, first, iter, |a, b| a > b),
            Self::RequireEqual => {
                for v in iter {
                    if v != first {
                        return Err(ObjectError::MergeConflict {
                            field: field.to_string(),
                        });
                    }
                }
                Ok(first)
            }
            Self::Value(v) => Ok(v.clone()),
        }
    }
}

fn extremum(
    field: &str,
    first: FieldValue,
    rest: impl Iterator<Item = FieldValue>,
    better: fn(f64, f64) -> bool,
) -> Result<FieldValue, ObjectError> {
    let numeric = |v: &FieldValue| match v {
        FieldValue::Int(i) => Ok(*i as f64),
        FieldValue::Float(x) => Ok(*x),
        other => Err(ObjectError::TypeMismatch {
            field: field.to_string(),
            expected: "int or float",
            found: other.kind_name(),
        }),
    };
    let mut best_key = numeric(&first)?;
    let mut best = first;
    for v in rest {
        let key = numeric(&v)?;
        if better(key, best_key) || best_key.is_nan() {
            best_key = key;
            best = v;
        }
    }
    Ok(best)
}

/// Caller-chosen policies for the scalar fields of a merge, by field name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergePlan {
    policies: IndexMap<String, MergePolicy>,
}

impl MergePlan {
    /// A plan with no policies. Merging with it succeeds only for a
    /// record type whose scalars all come from concatenation or are
    /// assigned by the caller.
    pub fn new() -> Self {
        Self::default()
    }

    /// A plan that resets every policy-taking scalar of `V` to the value
    /// of a freshly constructed record.
    pub fn defaults<V: Variant>() -> Self {
        let blank = OutObject::<V>::new();
        let mut plan = Self::new();
        for name in policy_fields(V::registry()) {
            if let Ok(Some(value)) = blank.read_field(name) {
                plan.set(name, MergePolicy::Value(value));
            }
        }
        plan
    }

    /// Add (or replace) the policy for `field`.
    pub fn with(mut self, field: impl Into<String>, policy: MergePolicy) -> Self {
        self.set(field, policy);
        self
    }

    /// Add (or replace) the policy for `field` in place.
    pub fn set(&mut self, field: impl Into<String>, policy: MergePolicy) {
        self.policies.insert(field.into(), policy);
    }

    /// Policy for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&MergePolicy> {
        self.policies.get(field)
    }

    /// Policies in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MergePolicy)> {
        self.policies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the plan has no policies.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Check every policy targets a declared, policy-taking field and
    /// every policy-taking field has a policy.
    pub fn check(&self, registry: &FieldRegistry) -> Result<(), ObjectError> {
        for field in self.policies.keys() {
            let def = registry
                .get(field)
                .ok_or_else(|| ObjectError::UnknownField {
                    registry: registry.name().to_string(),
                    field: field.clone(),
                })?;
            let reason = if def.is_derived() {
                Some("recomputed from the merged source arrays")
            } else if def.is_concatenable() {
                Some("concatenated across inputs")
            } else {
                not_mergeable(field)
            };
            if let Some(reason) = reason {
                return Err(ObjectError::NotMergeable {
                    field: field.clone(),
                    reason,
                });
            }
        }
        let mut missing = policy_fields(registry).filter(|name| !self.policies.contains_key(*name));
        if let Some(missing) = missing.next() {
            return Err(ObjectError::invalid_state(missing, "no merge policy given"));
        }
        Ok(())
    }
}

/// Merge `objects` into one object of the same variant.
///
/// Fails with:
/// - [`ObjectError::EmptyMerge`] when `objects` is empty
/// - [`ObjectError::InvalidState`] when a scalar field has no policy in
///   `plan`
/// - [`ObjectError::MergeConflict`] when inputs disagree on `units`
/// - [`ObjectError::InvalidState`] when a concatenable field is set on
///   some inputs and unset on others
/// - [`ObjectError::ShapeMismatch`] when row widths of a structured
///   field disagree
/// - any error of [`MergePlan::check`] or of a policy
pub fn merge<V: Variant>(
    objects: &[OutObject<V>],
    plan: &MergePlan,
) -> Result<OutObject<V>, ObjectError> {
    let first = objects.first().ok_or(ObjectError::EmptyMerge)?;
    let registry = V::registry();
    plan.check(registry)?;

    let units = first.base().units;
    if objects.iter().any(|o| o.base().units != units) {
        return Err(ObjectError::MergeConflict {
            field: "units".to_string(),
        });
    }

    let mut merged = OutObject::<V>::new();
    merged.base_mut().units = units;

    for &name in registry.concatenable_fields() {
        let mut parts = Vec::with_capacity(objects.len());
        for obj in objects {
            parts.push(obj.read_field(name)?);
        }
        let set = parts.iter().filter(|p| p.is_some()).count();
        if set == 0 {
            trace!("merge: '{name}' unset on every input");
            continue;
        }
        if set != parts.len() {
            return Err(ObjectError::invalid_state(
                name,
                format!("set on {set} of {} merge inputs", parts.len()),
            ));
        }
        let mut parts = parts.into_iter().flatten();
        let Some(mut acc) = parts.next() else {
            continue;
        };
        for part in parts {
            acc.concat(name, &part)?;
        }
        trace!("merge: '{name}' concatenated to {:?} entries", acc.len());
        merged.write_field(name, acc)?;
    }

    for (name, policy) in plan.iter() {
        let mut values = Vec::with_capacity(objects.len());
        for obj in objects {
            values.extend(obj.read_field(name)?);
        }
        let value = policy.resolve(name, values)?;
        merged.write_field(name, value)?;
    }

    debug!(
        "merged {} {} objects ({} policies)",
        objects.len(),
        V::NAME,
        plan.len()
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{RecoObject, TruthObject};
    use crate::{RecoExt, TruthExt};
    use crate::units::Units;
    use spine_core::{ObjectId, RowArray};

    fn reco(index: Vec<i64>) -> RecoObject {
        let n = index.len();
        let mut obj = RecoObject::new();
        let base = obj.base_mut();
        base.depositions = Some(vec![1.0; n]);
        base.points = Some(RowArray::from_flat(3, vec![0.0; 3 * n]).unwrap());
        base.sources = Some(RowArray::from_flat(2, vec![0; 2 * n]).unwrap());
        base.index = Some(index);
        obj
    }

    fn defaults() -> MergePlan {
        MergePlan::defaults::<RecoExt>()
    }

    #[test]
    fn concatenates_in_input_order() {
        let merged = merge(&[reco(vec![1, 2]), reco(vec![5, 6, 7])], &defaults()).unwrap();
        assert_eq!(merged.base().index.as_deref(), Some(&[1, 2, 5, 6, 7][..]));
        assert_eq!(merged.base().size().unwrap(), 5);
        assert_eq!(merged.base().depositions_sum().unwrap(), 5.0);
        assert_eq!(merged.base().points.as_ref().unwrap().len(), 5);
    }

    #[test]
    fn duplicates_are_preserved() {
        let merged = merge(&[reco(vec![3]), reco(vec![3])], &defaults()).unwrap();
        assert_eq!(merged.base().index.as_deref(), Some(&[3, 3][..]));
    }

    #[test]
    fn derived_overrides_are_recomputed() {
        let mut a = reco(vec![1, 2]);
        a.base_mut().set_size(100);
        a.base_mut().set_depositions_sum(-1.0);
        let merged = merge(&[a, reco(vec![9])], &defaults()).unwrap();
        assert_eq!(merged.base().size_override(), None);
        assert_eq!(merged.base().size().unwrap(), 3);
        assert_eq!(merged.base().depositions_sum().unwrap(), 3.0);
    }

    #[test]
    fn identity_and_matching_are_reset() {
        let mut a = reco(vec![1]);
        a.base_mut().id = ObjectId(4);
        a.base_mut()
            .set_matches(vec![ObjectId(2)], vec![0.8])
            .unwrap();
        let merged = merge(&[a], &defaults()).unwrap();
        assert_eq!(merged.id(), ObjectId::UNASSIGNED);
        assert!(!merged.base().is_matched());
        assert!(merged.base().match_ids().is_empty());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(
            merge::<RecoExt>(&[], &defaults()),
            Err(ObjectError::EmptyMerge)
        );
    }

    #[test]
    fn row_width_mismatch_is_shape_error() {
        let a = reco(vec![1]);
        let mut b = reco(vec![2]);
        b.base_mut().points = Some(RowArray::from_rows(&[[0.0f32, 0.0]]));
        match merge(&[a, b], &defaults()) {
            Err(ObjectError::ShapeMismatch {
                field,
                expected,
                found,
            }) => {
                assert_eq!(field, "points");
                assert_eq!((expected, found), (3, 2));
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn partially_set_array_is_invalid_state() {
        let a = reco(vec![1]);
        let mut b = reco(vec![2]);
        b.base_mut().depositions = None;
        assert!(matches!(
            merge(&[a, b], &defaults()),
            Err(ObjectError::InvalidState { .. })
        ));
    }

    #[test]
    fn unset_everywhere_stays_unset() {
        let mut a = RecoObject::new();
        a.base_mut().index = Some(vec![1]);
        let mut b = RecoObject::new();
        b.base_mut().index = Some(vec![2]);
        let merged = merge(&[a, b], &defaults()).unwrap();
        assert!(merged.base().points.is_none());
        assert!(merged.base().depositions_sum().is_err());
    }

    #[test]
    fn scalars_follow_the_plan() {
        let mut a = reco(vec![1]);
        a.base_mut().is_contained = true;
        a.base_mut().cathode_offset = 2.0;
        let mut b = reco(vec![2]);
        b.base_mut().cathode_offset = -3.5;

        let reset = merge(&[a.clone(), b.clone()], &defaults()).unwrap();
        assert!(!reset.base().is_contained);
        assert_eq!(reset.base().cathode_offset, f64::NEG_INFINITY);

        let plan = MergePlan::new()
            .with("is_contained", MergePolicy::AllTrue)
            .with("cathode_offset", MergePolicy::Min)
            .with("is_cathode_crosser", MergePolicy::Value(FieldValue::Bool(true)));
        let merged = merge(&[a.clone(), b.clone()], &plan).unwrap();
        assert!(!merged.base().is_contained);
        assert_eq!(merged.base().cathode_offset, -3.5);
        assert!(merged.base().is_cathode_crosser);

        let plan = defaults().with("is_contained", MergePolicy::AnyTrue);
        assert!(merge(&[a, b], &plan).unwrap().base().is_contained);
    }

    #[test]
    fn scalar_without_policy_is_rejected() {
        let mut a = reco(vec![1]);
        a.base_mut().is_contained = true;
        a.base_mut().is_cathode_crosser = true;
        let b = a.clone();
        match merge(&[a.clone(), b.clone()], &MergePlan::new()) {
            Err(ObjectError::InvalidState { field, .. }) => assert_eq!(field, "is_contained"),
            other => panic!("expected InvalidState, got {other:?}"),
        }

        let plan = MergePlan::new()
            .with("is_contained", MergePolicy::AllTrue)
            .with("is_cathode_crosser", MergePolicy::AnyTrue);
        match merge(&[a, b], &plan) {
            Err(ObjectError::InvalidState { field, .. }) => assert_eq!(field, "cathode_offset"),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn defaults_cover_every_policy_field() {
        let plan = MergePlan::defaults::<RecoExt>();
        let names: Vec<&str> = plan.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["is_contained", "is_cathode_crosser", "cathode_offset"]);
        assert_eq!(
            plan.get("cathode_offset"),
            Some(&MergePolicy::Value(FieldValue::Float(f64::NEG_INFINITY)))
        );
        assert!(plan.check(RecoExt::registry()).is_ok());
        assert!(MergePlan::defaults::<TruthExt>().check(TruthExt::registry()).is_ok());
        assert!(MergePlan::new().check(RecoExt::registry()).is_err());
    }

    #[test]
    fn require_equal_detects_conflict() {
        let mut a = reco(vec![1]);
        a.base_mut().is_contained = true;
        let b = reco(vec![2]);
        let plan = defaults().with("is_contained", MergePolicy::RequireEqual);
        assert_eq!(
            merge(&[a, b], &plan),
            Err(ObjectError::MergeConflict {
                field: "is_contained".to_string()
            })
        );
    }

    #[test]
    fn plan_rejects_non_mergeable_fields() {
        for field in ["id", "match_ids", "is_truth", "size", "index", "units"] {
            let plan = MergePlan::new().with(field, MergePolicy::First);
            assert!(
                matches!(
                    merge(&[reco(vec![1])], &plan),
                    Err(ObjectError::NotMergeable { .. })
                ),
                "{field}"
            );
        }
        let plan = MergePlan::new().with("bogus", MergePolicy::First);
        assert!(matches!(
            merge(&[reco(vec![1])], &plan),
            Err(ObjectError::UnknownField { .. })
        ));
    }

    #[test]
    fn mixed_units_are_rejected() {
        let a = reco(vec![1]);
        let mut b = reco(vec![2]);
        b.base_mut().units = Units::Px;
        assert_eq!(
            merge(&[a, b], &defaults()),
            Err(ObjectError::MergeConflict {
                field: "units".to_string()
            })
        );
    }

    #[test]
    fn truth_families_concatenate_independently() {
        let mut a = TruthObject::new();
        a.base_mut().index = Some(vec![0]);
        a.ext_mut().index_g4 = Some(vec![10, 11]);
        a.ext_mut().orig_id = ObjectId(7);
        let mut b = TruthObject::new();
        b.base_mut().index = Some(vec![1]);
        b.ext_mut().index_g4 = Some(vec![12]);
        let merged = merge(&[a, b], &MergePlan::defaults::<TruthExt>()).unwrap();
        assert_eq!(merged.ext().size_g4().unwrap(), 3);
        assert_eq!(merged.ext().orig_id, ObjectId::UNASSIGNED);
        assert!(merged.ext().index_adapt.is_none());
        assert!(merged.is_truth());
    }

    #[test]
    fn min_max_policies_on_ints() {
        let values = vec![FieldValue::Int(4), FieldValue::Int(-2), FieldValue::Int(9)];
        assert_eq!(
            MergePolicy::Min.resolve("n", values.clone()).unwrap(),
            FieldValue::Int(-2)
        );
        assert_eq!(
            MergePolicy::Max.resolve("n", values.clone()).unwrap(),
            FieldValue::Int(9)
        );
        assert_eq!(
            MergePolicy::Last.resolve("n", values).unwrap(),
            FieldValue::Int(9)
        );
        assert!(matches!(
            MergePolicy::Min.resolve("n", vec![FieldValue::Bool(true)]),
            Err(ObjectError::TypeMismatch { .. })
        ));
    }
}
