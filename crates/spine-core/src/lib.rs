//! Core types for the spine physics-object data model.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the schema layer shared by every reconstructed and truth record:
//! identifiers, array containers, dynamically typed field values, the
//! [`FieldRegistry`], the derived-attribute engine, binarization and
//! the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod binarize;
pub mod derived;
pub mod error;
pub mod field;
pub mod id;
pub mod registry;
pub mod traits;
pub mod value;

pub use array::RowArray;
pub use derived::{Derived, DerivedRule};
pub use error::{ObjectError, SchemaError};
pub use field::{Categories, DType, FieldDef, FieldEncoding, FieldType};
pub use id::{ModuleIds, ObjectId};
pub use registry::{FieldRegistry, RegistryBuilder};
pub use traits::{FieldReader, FieldWriter, Schema};
pub use value::FieldValue;
