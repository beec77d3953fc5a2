//! Header types of the record container.

use spine_data::Variant;

/// Which record variant a stream holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariantTag {
    /// Reconstructed objects.
    Reco,
    /// Truth objects.
    Truth,
}

impl VariantTag {
    /// Tag of the variant `V`.
    pub fn of<V: Variant>() -> Self {
        if V::IS_TRUTH {
            Self::Truth
        } else {
            Self::Reco
        }
    }

    /// Encoded byte.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Reco => 0,
            Self::Truth => 1,
        }
    }

    /// Decode a byte, `None` if unrecognized.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Reco),
            1 => Some(Self::Truth),
            _ => None,
        }
    }

    /// Record type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Reco => "RecoObject",
            Self::Truth => "TruthObject",
        }
    }
}

/// Decoded stream header.
///
/// # Examples
///
/// ```
/// use spine_store::{StoreHeader, VariantTag};
///
/// let header = StoreHeader {
///     variant: VariantTag::Truth,
///     schema_hash: 0xDEAD_BEEF,
///     fields: vec!["id".into(), "index".into()],
/// };
/// assert_eq!(header.variant.name(), "TruthObject");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreHeader {
    /// Record variant of every record in the stream.
    pub variant: VariantTag,
    /// Fingerprint of the stored fields of the writer's registry.
    pub schema_hash: u64,
    /// Stored field names, in registry order.
    pub fields: Vec<String>,
}
