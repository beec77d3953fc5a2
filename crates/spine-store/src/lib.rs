//! Binary container for projected spine physics-object records.
//!
//! Stores the [`StoredRecord`](spine_data::StoredRecord) form of reco or
//! truth objects in a compact stream. Only the fields a record type
//! persists are written; the header pins the variant and a fingerprint of
//! the stored schema so a file is never read back under another layout.
//!
//! # Architecture
//!
//! - [`RecordWriter`] projects objects and writes records to any `Write` sink
//! - [`RecordReader`] reads records from any `Read` source and restores objects
//! - [`schema_hash`] fingerprints a registry's stored fields
//! - All I/O uses a custom binary codec (no serde dependency)
//!
//! # Format
//!
//! ```text
//! [MAGIC "SPNE"] [VERSION u8] [variant u8] [schema hash u64]
//! [field count u32] [field name]*
//! [Record 1] [Record 2] ... [Record N]
//! ```
//!
//! Each record is a `u32` field count followed by `(name, tag, payload)`
//! triples in registry order.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod hash;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::StoreError;
pub use hash::schema_hash;
pub use reader::{ObjectIter, RecordIter, RecordReader};
pub use types::{StoreHeader, VariantTag};
pub use writer::RecordWriter;

/// Magic bytes at the start of every record file.
pub const MAGIC: [u8; 4] = *b"SPNE";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
