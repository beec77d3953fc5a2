//! Benchmark profiles for the spine physics-object schema.
//!
//! Provides deterministic object batches sized like a real event:
//!
//! - [`reference_event`]: 64 reco objects of 512 voxels each
//! - [`truth_event`]: 16 truth objects with all three voxel families
//! - [`voxel_sources`]: sources spread over a fixed number of modules

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use spine_core::{ObjectId, RowArray};
use spine_data::{RecoObject, TruthExt, TruthObject};

/// Number of detector modules the profiles spread voxels over.
pub const MODULES: i64 = 4;

/// `(module, tpc)` rows for `n` voxels, cycling through [`MODULES`].
pub fn voxel_sources(n: usize) -> RowArray<i64> {
    let flat = (0..n as i64)
        .flat_map(|i| [i % MODULES, (i / MODULES) % 2])
        .collect();
    RowArray::from_flat(2, flat).unwrap_or_else(|| RowArray::new(2))
}

fn voxel_points(n: usize) -> RowArray<f32> {
    let flat = (0..n)
        .flat_map(|i| {
            let f = i as f32;
            [f * 0.3, f * 0.7, f * 0.11]
        })
        .collect();
    RowArray::from_flat(3, flat).unwrap_or_else(|| RowArray::new(3))
}

/// One reco object of `n` voxels with every base array attached.
pub fn reco_profile(id: i64, n: usize) -> RecoObject {
    let mut obj = RecoObject::new();
    let base = obj.base_mut();
    base.id = ObjectId(id);
    base.index = Some((0..n as i64).map(|i| id * 100_000 + i).collect());
    base.points = Some(voxel_points(n));
    base.depositions = Some((0..n).map(|i| 0.5 + (i % 7) as f32).collect());
    base.sources = Some(voxel_sources(n));
    obj
}

/// The reference event: 64 reco objects of 512 voxels each.
pub fn reference_event() -> Vec<RecoObject> {
    (0..64).map(|id| reco_profile(id, 512)).collect()
}

/// Sixteen truth objects; object `i` has 256 reconstructed, 320 adapted
/// and 1024 simulated voxels.
pub fn truth_event() -> Vec<TruthObject> {
    (0..16)
        .map(|id| {
            let (base, _) = reco_profile(id, 256).into_parts();
            let mut ext = TruthExt::default();
            ext.orig_id = ObjectId(id);
            ext.depositions_q = Some(vec![40.0; 256]);
            ext.index_adapt = Some((0..320).collect());
            ext.points_adapt = Some(voxel_points(320));
            ext.sources_adapt = Some(voxel_sources(320));
            ext.depositions_adapt = Some(vec![1.0; 320]);
            ext.depositions_adapt_q = Some(vec![40.0; 320]);
            ext.index_g4 = Some((0..1024).collect());
            ext.points_g4 = Some(voxel_points(1024));
            ext.depositions_g4 = Some(vec![0.25; 1024]);
            TruthObject::from_parts(base, ext)
        })
        .collect()
}
