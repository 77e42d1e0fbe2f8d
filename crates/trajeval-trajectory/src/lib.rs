#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
pub use error::TrajectoryError;

/// Index pair selection over pose sequences.
pub mod filters;

/// Readers and writers for trajectory files.
pub mod io;

/// Un-timed sequences of SE(3) poses.
pub mod path;

/// Timestamp based association of two trajectories.
pub mod sync;

/// Timestamped sequences of SE(3) poses.
pub mod trajectory;

/// Physical units attached to deltas and errors.
pub mod units;

pub use path::{Plane, PosePath3D};
pub use trajectory::PoseTrajectory3D;
pub use units::Unit;
