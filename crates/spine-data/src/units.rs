//! Coordinate units and voxel-grid conversion.

use std::fmt;
use std::str::FromStr;

use spine_core::{ObjectError, RowArray};

/// Unit in which positional fields are expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Units {
    /// Detector coordinates in centimetres.
    #[default]
    Cm,
    /// Voxel (pixel) indices on the image grid.
    Px,
}

impl Units {
    /// Stored label (`"cm"` or `"px"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cm => "cm",
            Self::Px => "px",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cm" => Ok(Self::Cm),
            "px" => Ok(Self::Px),
            other => Err(ObjectError::DomainRange {
                field: "units".to_string(),
                detail: format!("unknown unit label '{other}', expected 'cm' or 'px'"),
            }),
        }
    }
}

/// Geometry of the voxel grid: lower corner and voxel pitch, in cm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelMeta {
    /// Lower corner of the grid.
    pub lower: [f64; 3],
    /// Voxel size along each axis. Must be finite and positive.
    pub size: [f64; 3],
}

impl VoxelMeta {
    /// Build grid metadata, rejecting non-positive or non-finite pitches.
    pub fn new(lower: [f64; 3], size: [f64; 3]) -> Result<Self, ObjectError> {
        if let Some(bad) = size.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(ObjectError::DomainRange {
                field: "size".to_string(),
                detail: format!("voxel size must be finite and positive, got {bad}"),
            });
        }
        Ok(Self { lower, size })
    }

    /// Convert voxel indices to cm, placing each point at its voxel centre.
    pub fn to_cm(&self, points: &mut RowArray<f32>) {
        for row in points.rows_mut() {
            for (axis, v) in row.iter_mut().enumerate().take(3) {
                *v = (self.lower[axis] + (f64::from(*v) + 0.5) * self.size[axis]) as f32;
            }
        }
    }

    /// Convert cm to voxel indices; inverse of [`to_cm`](Self::to_cm).
    pub fn to_px(&self, points: &mut RowArray<f32>) {
        for row in points.rows_mut() {
            for (axis, v) in row.iter_mut().enumerate().take(3) {
                *v = ((f64::from(*v) - self.lower[axis]) / self.size[axis] - 0.5) as f32;
            }
        }
    }
}
