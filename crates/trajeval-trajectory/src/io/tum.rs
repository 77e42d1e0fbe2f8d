use std::path::Path;

use glam::{DQuat, DVec3};

use super::{read_rows, write_rows, FileInterfaceError};
use crate::PoseTrajectory3D;

/// Reads a trajectory in TUM format.
///
/// Each line holds `timestamp tx ty tz qx qy qz qw`, separated by spaces or commas.
/// Lines starting with `#` are ignored.
///
/// # Arguments
///
/// * `file_path` - The path to the trajectory file.
///
/// # Returns
///
/// The trajectory with timestamps in seconds.
pub fn read_tum_trajectory_file(
    file_path: impl AsRef<Path>,
) -> Result<PoseTrajectory3D, FileInterfaceError> {
    let rows = read_rows::<8>(file_path.as_ref())?;

    let mut timestamps = Vec::with_capacity(rows.len());
    let mut positions = Vec::with_capacity(rows.len());
    let mut orientations = Vec::with_capacity(rows.len());
    for row in rows {
        timestamps.push(row[0]);
        positions.push(DVec3::new(row[1], row[2], row[3]));
        orientations.push(DQuat::from_xyzw(row[4], row[5], row[6], row[7]));
    }

    Ok(PoseTrajectory3D::from_positions_orientations(
        positions,
        orientations,
        timestamps,
    )?)
}

/// Writes a trajectory in TUM format, one `timestamp tx ty tz qx qy qz qw` line per pose.
///
/// Values are written with the shortest representation that parses back to the
/// same number.
pub fn write_tum_trajectory_file(
    file_path: impl AsRef<Path>,
    traj: &PoseTrajectory3D,
) -> Result<(), FileInterfaceError> {
    let rows: Vec<[f64; 8]> = traj
        .timestamps()
        .iter()
        .zip(traj.positions())
        .zip(traj.orientations())
        .map(|((t, p), q)| [*t, p.x, p.y, p.z, q.x, q.y, q.z, q.w])
        .collect();
    write_rows(file_path.as_ref(), rows.iter().map(|r| r.as_slice()))?;
    log::debug!("trajectory saved to {}", file_path.as_ref().display());
    Ok(())
}
