//! Test fixtures and proptest strategies for spine development.
//!
//! [`fixtures`] builds fully populated, invariant-respecting reco and
//! truth objects with predictable contents. [`strategies`] generates
//! arbitrary ones for property tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod strategies;

pub use fixtures::{reco_list, reco_object, truth_object};
pub use strategies::{arb_module_set, arb_reco_object, arb_truth_object};
