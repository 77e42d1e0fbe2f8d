#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Arc length and accumulated distances of ordered point sequences.
pub mod distance;

/// Least-squares alignment of corresponding point sets.
pub mod umeyama;

pub use distance::{accumulated_distances, arc_len};
pub use umeyama::{best_yaw, rot_z, umeyama_alignment, GeometryError, UmeyamaOutput};
