#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Trajeval Lie Groups
//!
//! Poses are plain `glam` matrices: rotations are [`glam::DMat3`] and rigid or
//! similarity transforms are homogeneous [`glam::DMat4`]. The functions in this
//! crate construct, validate, invert and relate those matrices.
//!
//! ## Example
//!
//! ```rust
//! use glam::DVec3;
//! use trajeval_lie::{se3, so3};
//!
//! let r = so3::exp(DVec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2));
//! let pose = se3::se3(r, DVec3::new(1.0, 2.0, 3.0));
//! let identity = se3::inverse(&pose) * pose;
//! assert!(se3::is_se3(&identity));
//! ```

mod error;
pub use error::LieError;

/// Euler angle conventions for rotation matrices.
pub mod euler;

/// Special Euclidean group SE(3) as 4x4 homogeneous matrices.
pub mod se3;

/// Similarity group Sim(3) as 4x4 homogeneous matrices.
pub mod sim3;

/// Special Orthogonal group SO(3) as 3x3 matrices.
pub mod so3;

/// Absolute tolerance used by the group membership predicates.
pub const GROUP_TOLERANCE: f64 = 1e-6;
