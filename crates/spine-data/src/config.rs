//! Projection configuration and its validation errors.

use std::error::Error;
use std::fmt;

use spine_core::binarize::MAX_BIT_WIDTH;
use spine_core::ObjectError;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`ProjectionConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `bit_width` is zero or wider than the packed word.
    InvalidBitWidth {
        /// The configured width.
        value: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBitWidth { value } => {
                write!(f, "bit_width must be in 1..={MAX_BIT_WIDTH}, got {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl From<ConfigError> for ObjectError {
    fn from(e: ConfigError) -> Self {
        ObjectError::InvalidConfig {
            detail: e.to_string(),
        }
    }
}

// ── ProjectionConfig ───────────────────────────────────────────────

/// Controls how a record is projected to its persisted form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectionConfig {
    /// Width of the integer that binarized fields are packed into.
    /// Values must lie in `[0, bit_width)`. Default: 64.
    pub bit_width: u32,
    /// Run the parallel-length checks before projecting. Default: true.
    pub validate_lengths: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            bit_width: MAX_BIT_WIDTH,
            validate_lengths: true,
        }
    }
}

impl ProjectionConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bit_width == 0 || self.bit_width > MAX_BIT_WIDTH {
            return Err(ConfigError::InvalidBitWidth {
                value: self.bit_width,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = ProjectionConfig::default();
        assert_eq!(cfg.bit_width, 64);
        assert!(cfg.validate_lengths);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bit_width_bounds() {
        for bad in [0, 65, u32::MAX] {
            let cfg = ProjectionConfig {
                bit_width: bad,
                ..ProjectionConfig::default()
            };
            assert_eq!(
                cfg.validate(),
                Err(ConfigError::InvalidBitWidth { value: bad })
            );
        }
        let narrow = ProjectionConfig {
            bit_width: 1,
            ..ProjectionConfig::default()
        };
        assert!(narrow.validate().is_ok());
    }

    #[test]
    fn converts_into_object_error() {
        let err: ObjectError = ConfigError::InvalidBitWidth { value: 70 }.into();
        match err {
            ObjectError::InvalidConfig { detail } => assert!(detail.contains("70")),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn error_message_names_the_range() {
        let msg = ConfigError::InvalidBitWidth { value: 0 }.to_string();
        assert!(msg.contains("1..=64"));
    }
}
