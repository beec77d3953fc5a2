//! Physics-object records for the spine reconstruction chain.
//!
//! A record is an [`OutObject<V>`]: the shared [`OutBase`] shape plus a
//! variant extension `V`. [`RecoExt`] adds nothing and marks a
//! reconstructed object; [`TruthExt`] adds the original-unit, adapted-label
//! and simulation-truth array families.
//!
//! # Architecture
//!
//! - Field metadata lives in static registries ([`base_registry`],
//!   [`RecoExt`]'s and [`TruthExt`]'s via [`Variant::registry`])
//! - [`merge`] concatenates registry-listed arrays across objects
//! - [`OutObject::project`] / [`OutObject::restore`] convert to and from
//!   the persisted [`StoredRecord`] form
//! - [`ObjectList`] provides lookup by identity and the matching update

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

pub mod base;
pub mod config;
pub mod list;
pub mod merge;
pub mod object;
pub mod project;
pub mod reco;
pub mod truth;
pub mod units;

pub use base::{base_registry, OutBase};
pub use config::{ConfigError, ProjectionConfig};
pub use list::ObjectList;
pub use merge::{merge, MergePlan, MergePolicy};
pub use object::{OutObject, PhysicsObject, RecoObject, TruthObject, Variant};
pub use project::StoredRecord;
pub use reco::RecoExt;
pub use truth::TruthExt;
pub use units::{Units, VoxelMeta};
