//! Strongly-typed object identifiers and the [`ModuleIds`] set type.

use smallvec::SmallVec;
use std::fmt;

/// Identifies a physics object within its object list.
///
/// Identity is positional within one list and carries no meaning across
/// lists. Cross-domain references (reco to truth and back) are stored as
/// plain `ObjectId` values, never as owning pointers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub i64);

impl ObjectId {
    /// Sentinel for an object that has not been assigned an identity yet.
    pub const UNASSIGNED: ObjectId = ObjectId(-1);

    /// Returns `true` unless this is the [`UNASSIGNED`](Self::UNASSIGNED) sentinel.
    pub fn is_assigned(&self) -> bool {
        self.0 >= 0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ObjectId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Sorted set of detector module indexes contributing to an object.
///
/// Uses `SmallVec<[i64; 4]>` since an object rarely spans more than a
/// handful of modules. Larger sets spill to the heap transparently.
pub type ModuleIds = SmallVec<[i64; 4]>;
