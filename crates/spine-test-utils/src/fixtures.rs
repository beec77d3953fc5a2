//! Deterministic, fully populated objects.
//!
//! Object `id` with `n` voxels gets indexes `id * 1000 + 0..n`, one unit
//! of deposition per voxel (`0.5` in original units) and sources that
//! alternate between modules 0 and 1. Truth objects carry an adapted
//! family of `n + 1` voxels and a simulation family of `2 * n`.

use spine_core::{ObjectId, RowArray};
use spine_data::{ObjectList, RecoExt, RecoObject, TruthExt, TruthObject};

fn index(id: i64, n: usize) -> Vec<i64> {
    (0..n as i64).map(|i| id * 1000 + i).collect()
}

fn points(n: usize) -> RowArray<f32> {
    let flat = (0..n).flat_map(|i| [i as f32, 0.0, 1.0]).collect();
    RowArray::from_flat(3, flat).unwrap_or_else(|| RowArray::new(3))
}

fn sources(n: usize) -> RowArray<i64> {
    let flat = (0..n as i64).flat_map(|i| [i % 2, i % 4]).collect();
    RowArray::from_flat(2, flat).unwrap_or_else(|| RowArray::new(2))
}

/// A reconstructed object with every base array attached.
pub fn reco_object(id: i64, n: usize) -> RecoObject {
    let mut obj = RecoObject::new();
    let base = obj.base_mut();
    base.id = ObjectId(id);
    base.index = Some(index(id, n));
    base.points = Some(points(n));
    base.depositions = Some(vec![1.0; n]);
    base.sources = Some(sources(n));
    base.is_contained = true;
    obj
}

/// A truth object with every array family attached.
pub fn truth_object(id: i64, n: usize) -> TruthObject {
    let (base, _) = reco_object(id, n).into_parts();
    let adapt = n + 1;
    let g4 = 2 * n;
    let mut ext = TruthExt::default();
    ext.orig_id = ObjectId(id);
    ext.depositions_q = Some(vec![0.5; n]);
    ext.index_adapt = Some(index(id, adapt));
    ext.points_adapt = Some(points(adapt));
    ext.sources_adapt = Some(sources(adapt));
    ext.depositions_adapt = Some(vec![1.0; adapt]);
    ext.depositions_adapt_q = Some(vec![0.5; adapt]);
    ext.index_g4 = Some(index(id, g4));
    ext.points_g4 = Some(points(g4));
    ext.depositions_g4 = Some(vec![0.25; g4]);
    TruthObject::from_parts(base, ext)
}

/// `count` reco objects with ids `0..count`, object `i` holding `i + 1`
/// voxels.
pub fn reco_list(count: usize) -> ObjectList<RecoExt> {
    let mut list = ObjectList::new();
    for i in 0..count {
        list.push(reco_object(i as i64, i + 1)).expect("fixture ids are distinct");
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_satisfy_length_invariants() {
        assert!(reco_object(1, 5).validate().is_ok());
        assert!(truth_object(2, 4).validate().is_ok());
        assert!(truth_object(3, 0).validate().is_ok());
    }

    #[test]
    fn truth_fixture_sizes() {
        let t = truth_object(1, 3);
        assert_eq!(t.base().size().unwrap(), 3);
        assert_eq!(t.ext().size_adapt().unwrap(), 4);
        assert_eq!(t.ext().size_g4().unwrap(), 6);
        assert_eq!(t.ext().depositions_g4_sum().unwrap(), 1.5);
    }

    #[test]
    fn list_ids_are_sequential() {
        let list = reco_list(3);
        let ids: Vec<_> = list.ids().map(|id| id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
