use std::path::Path;

use glam::{DMat4, DVec4};

use super::{read_rows, write_rows, FileInterfaceError};
use crate::PosePath3D;

/// Reads a pose file in KITTI format.
///
/// Each line holds the upper 3x4 block of an SE(3) matrix in row-major order.
pub fn read_kitti_poses_file(file_path: impl AsRef<Path>) -> Result<PosePath3D, FileInterfaceError> {
    let rows = read_rows::<12>(file_path.as_ref())?;
    let poses = rows
        .iter()
        .map(|r| {
            DMat4::from_cols(
                DVec4::new(r[0], r[4], r[8], 0.0),
                DVec4::new(r[1], r[5], r[9], 0.0),
                DVec4::new(r[2], r[6], r[10], 0.0),
                DVec4::new(r[3], r[7], r[11], 1.0),
            )
        })
        .collect();
    Ok(PosePath3D::from_poses(poses)?)
}

/// Writes the SE(3) poses of a path in KITTI format.
pub fn write_kitti_poses_file(
    file_path: impl AsRef<Path>,
    path: &PosePath3D,
) -> Result<(), FileInterfaceError> {
    let rows: Vec<[f64; 12]> = path
        .poses()
        .iter()
        .map(|p| {
            let mut row = [0.0; 12];
            for (i, value) in row.iter_mut().enumerate() {
                *value = p.row(i / 4)[i % 4];
            }
            row
        })
        .collect();
    write_rows(file_path.as_ref(), rows.iter().map(|r| r.as_slice()))?;
    log::debug!("poses saved to {}", file_path.as_ref().display());
    Ok(())
}
