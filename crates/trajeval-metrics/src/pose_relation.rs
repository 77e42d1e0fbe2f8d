use std::str::FromStr;

use glam::{DMat3, DMat4};
use serde::{Deserialize, Serialize};
use trajeval_lie::{se3, so3};
use trajeval_trajectory::Unit;

use crate::MetricsError;

/// Which part of an SE(3) error pose is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseRelation {
    /// Norm of the translation, in meters.
    #[default]
    TranslationPart,
    /// Frobenius norm of `R - I`.
    RotationPart,
    /// Frobenius norm of `E - I`.
    FullTransformation,
    /// Rotation angle in radians.
    RotationAngleRad,
    /// Rotation angle in degrees.
    RotationAngleDeg,
}

impl PoseRelation {
    /// All pose relations.
    pub const ALL: [PoseRelation; 5] = [
        PoseRelation::TranslationPart,
        PoseRelation::RotationPart,
        PoseRelation::FullTransformation,
        PoseRelation::RotationAngleRad,
        PoseRelation::RotationAngleDeg,
    ];

    /// Human readable name, e.g. `"translation part"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoseRelation::TranslationPart => "translation part",
            PoseRelation::RotationPart => "rotation part",
            PoseRelation::FullTransformation => "full transformation",
            PoseRelation::RotationAngleRad => "rotation angle in radians",
            PoseRelation::RotationAngleDeg => "rotation angle in degrees",
        }
    }

    /// Unit of the resulting errors.
    pub fn unit(&self) -> Unit {
        match self {
            PoseRelation::TranslationPart => Unit::Meters,
            PoseRelation::RotationAngleRad => Unit::Radians,
            PoseRelation::RotationAngleDeg => Unit::Degrees,
            PoseRelation::RotationPart | PoseRelation::FullTransformation => Unit::None,
        }
    }

    /// Reduces an error pose to a scalar. A perfect match gives zero.
    pub fn reduce(&self, e: &DMat4) -> Result<f64, MetricsError> {
        let error = match self {
            PoseRelation::TranslationPart => se3::translation(e).length(),
            PoseRelation::RotationPart => frobenius_norm3(&(se3::rotation(e) - DMat3::IDENTITY)),
            PoseRelation::FullTransformation => frobenius_norm4(&(*e - DMat4::IDENTITY)),
            PoseRelation::RotationAngleRad => so3::log_angle(&se3::rotation(e))?,
            PoseRelation::RotationAngleDeg => so3::log_angle(&se3::rotation(e))?.to_degrees(),
        };
        Ok(error)
    }
}

impl FromStr for PoseRelation {
    type Err = MetricsError;

    /// Accepts the snake case names and the short forms `trans_part`, `rot_part`,
    /// `full`, `angle_rad` and `angle_deg`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "translation_part" | "trans_part" => Ok(PoseRelation::TranslationPart),
            "rotation_part" | "rot_part" => Ok(PoseRelation::RotationPart),
            "full_transformation" | "full" => Ok(PoseRelation::FullTransformation),
            "rotation_angle_rad" | "angle_rad" => Ok(PoseRelation::RotationAngleRad),
            "rotation_angle_deg" | "angle_deg" => Ok(PoseRelation::RotationAngleDeg),
            _ => Err(MetricsError::UnsupportedPoseRelation(s.to_string())),
        }
    }
}

impl std::fmt::Display for PoseRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn frobenius_norm3(m: &DMat3) -> f64 {
    m.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn frobenius_norm4(m: &DMat4) -> f64 {
    m.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt()
}
