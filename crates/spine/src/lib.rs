//! Spine: the physics-object schema of particle-detector reconstruction
//! output.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all spine sub-crates. For most users, adding `spine` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use spine::prelude::*;
//!
//! // Two fragments of one reconstructed particle.
//! let mut a = RecoObject::new();
//! a.base_mut().index = Some(vec![0, 1]);
//! a.base_mut().depositions = Some(vec![1.0, 2.0]);
//! a.base_mut().sources = Some(RowArray::from_rows(&[[0i64, 0], [0, 1]]));
//! let mut b = RecoObject::new();
//! b.base_mut().index = Some(vec![7]);
//! b.base_mut().depositions = Some(vec![0.5]);
//! b.base_mut().sources = Some(RowArray::from_rows(&[[2i64, 0]]));
//!
//! // Every scalar the fragments disagree on needs a policy.
//! let plan = MergePlan::new()
//!     .with("is_contained", MergePolicy::AllTrue)
//!     .with("is_cathode_crosser", MergePolicy::AnyTrue)
//!     .with("cathode_offset", MergePolicy::Max);
//! let mut merged = merge(&[a, b], &plan).unwrap();
//! merged.base_mut().id = ObjectId(0);
//! assert_eq!(merged.base().size().unwrap(), 3);
//! assert_eq!(merged.base().module_ids().unwrap().as_slice(), &[0, 2]);
//!
//! // Persist and read back.
//! let mut writer = RecordWriter::<_, RecoExt>::new(Vec::new()).unwrap();
//! writer.write(&merged).unwrap();
//! let buf = writer.into_inner();
//! let mut reader = RecordReader::<_, RecoExt>::open(buf.as_slice()).unwrap();
//! let back = reader.next_object().unwrap().unwrap();
//! assert_eq!(back.base().depositions_sum().unwrap(), 3.5);
//! assert!(back.base().depositions.is_none());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `spine-core` | IDs, field definitions, registries, values, core traits |
//! | [`data`] | `spine-data` | Reco and truth records, merging, projection, units |
//! | [`store`] | `spine-store` | Binary record streams |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`spine-core`).
///
/// Contains field definitions, the [`types::FieldRegistry`], dynamic
/// [`types::FieldValue`]s and the name-keyed access traits
/// ([`types::FieldReader`], [`types::FieldWriter`]).
pub use spine_core as types;

/// Physics-object records (`spine-data`).
///
/// Provides [`data::OutBase`], the [`data::RecoObject`] and
/// [`data::TruthObject`] variants, [`data::merge`] and the projection to
/// [`data::StoredRecord`].
pub use spine_data as data;

/// Binary record streams (`spine-store`).
///
/// Write projected objects with [`store::RecordWriter`] and read them
/// back with [`store::RecordReader`].
pub use spine_store as store;

/// Common imports for typical spine usage.
///
/// ```rust
/// use spine::prelude::*;
/// ```
///
/// This imports the record types, the access traits, merging and
/// projection, and the stream reader and writer.
pub mod prelude {
    // Core types and traits
    pub use spine_core::{
        FieldReader, FieldRegistry, FieldValue, FieldWriter, ModuleIds, ObjectId, RowArray,
        Schema,
    };

    // Errors
    pub use spine_core::{ObjectError, SchemaError};
    pub use spine_data::ConfigError;
    pub use spine_store::StoreError;

    // Records
    pub use spine_data::{
        ObjectList, OutBase, OutObject, PhysicsObject, RecoExt, RecoObject, TruthExt,
        TruthObject, Units, Variant, VoxelMeta,
    };

    // Merging and projection
    pub use spine_data::{merge, MergePlan, MergePolicy, ProjectionConfig, StoredRecord};

    // Streams
    pub use spine_store::{RecordReader, RecordWriter};
}
