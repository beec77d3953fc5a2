//! Error types for the record container.

use std::fmt;
use std::io;

use spine_core::ObjectError;
use spine_data::ConfigError;

/// Errors that can occur while writing or reading a record stream.
#[derive(Debug)]
pub enum StoreError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The stream does not start with the expected `b"SPNE"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// A header or record could not be decoded (truncated or corrupt data).
    MalformedRecord {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A value tag is not recognized.
    UnknownValueTag {
        /// The unrecognized tag.
        tag: u8,
    },
    /// The stream was written under a different stored-field schema.
    SchemaMismatch {
        /// Hash from the stream header.
        recorded: u64,
        /// Hash of the reader's registry.
        current: u64,
    },
    /// The stream holds the other record variant.
    VariantMismatch {
        /// Variant the reader expects.
        expected: &'static str,
        /// Variant named by the header.
        found: &'static str,
    },
    /// The projection configuration is invalid.
    Config(ConfigError),
    /// Projecting or restoring an object failed.
    Object(ObjectError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"SPNE\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::MalformedRecord { detail } => write!(f, "malformed record: {detail}"),
            Self::UnknownValueTag { tag } => write!(f, "unknown value tag {tag}"),
            Self::SchemaMismatch { recorded, current } => {
                write!(
                    f,
                    "schema hash mismatch: recorded={recorded:#018x}, current={current:#018x}"
                )
            }
            Self::VariantMismatch { expected, found } => {
                write!(f, "stream holds {found} records, expected {expected}")
            }
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Object(e) => write!(f, "object: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Object(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ConfigError> for StoreError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ObjectError> for StoreError {
    fn from(e: ObjectError) -> Self {
        Self::Object(e)
    }
}
