//! Proptest strategies for arbitrary, invariant-respecting objects.

use std::collections::BTreeSet;

use proptest::prelude::*;
use spine_core::{ObjectId, RowArray};
use spine_data::{RecoObject, TruthExt, TruthObject};

/// Sets of module ids that fit in a 64-bit packed word.
pub fn arb_module_set() -> impl Strategy<Value = BTreeSet<i64>> {
    prop::collection::btree_set(0i64..64, 0..16)
}

fn arb_family(max: usize) -> impl Strategy<Value = (Vec<i64>, Vec<f32>, Vec<i64>)> {
    (0..max).prop_flat_map(|n| {
        (
            prop::collection::vec(0i64..1_000_000, n),
            prop::collection::vec(0.0f32..100.0, n),
            prop::collection::vec((0i64..8, 0i64..4), n),
        )
            .prop_map(|(index, deps, srcs)| {
                let flat = srcs.into_iter().flat_map(|(m, t)| [m, t]).collect();
                (index, deps, flat)
            })
    })
}

fn rows3(n: usize) -> RowArray<f32> {
    let flat = (0..n).flat_map(|i| [i as f32, -(i as f32), 0.5]).collect();
    RowArray::from_flat(3, flat).unwrap_or_else(|| RowArray::new(3))
}

fn rows2(flat: Vec<i64>) -> RowArray<i64> {
    RowArray::from_flat(2, flat).unwrap_or_else(|| RowArray::new(2))
}

/// Reco objects with consistent base arrays of up to 64 voxels.
pub fn arb_reco_object() -> impl Strategy<Value = RecoObject> {
    (0i64..1000, arb_family(64), any::<bool>(), any::<bool>()).prop_map(
        |(id, (index, deps, srcs), contained, crosser)| {
            let n = index.len();
            let mut obj = RecoObject::new();
            let base = obj.base_mut();
            base.id = ObjectId(id);
            base.index = Some(index);
            base.points = Some(rows3(n));
            base.depositions = Some(deps);
            base.sources = Some(rows2(srcs));
            base.is_contained = contained;
            base.is_cathode_crosser = crosser;
            if crosser {
                base.cathode_offset = n as f64 * 0.25;
            }
            obj
        },
    )
}

/// Truth objects with consistent base, adapted and simulation families.
pub fn arb_truth_object() -> impl Strategy<Value = TruthObject> {
    (arb_reco_object(), arb_family(32), arb_family(32), 0i64..1000).prop_map(
        |(reco, (index_adapt, deps_adapt, srcs_adapt), (index_g4, deps_g4, _), orig)| {
            let (base, _) = reco.into_parts();
            let n = base.index.as_ref().map_or(0, Vec::len);
            let adapt = index_adapt.len();
            let g4 = index_g4.len();
            let mut ext = TruthExt::default();
            ext.orig_id = ObjectId(orig);
            ext.depositions_q = Some(vec![2.0; n]);
            ext.index_adapt = Some(index_adapt);
            ext.points_adapt = Some(rows3(adapt));
            ext.sources_adapt = Some(rows2(srcs_adapt));
            ext.depositions_adapt_q = Some(deps_adapt.iter().map(|d| d * 2.0).collect());
            ext.depositions_adapt = Some(deps_adapt);
            ext.index_g4 = Some(index_g4);
            ext.points_g4 = Some(rows3(g4));
            ext.depositions_g4 = Some(deps_g4);
            TruthObject::from_parts(base, ext)
        },
    )
}
