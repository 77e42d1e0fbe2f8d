use glam::DMat4;
use trajeval_lie::se3;
use trajeval_trajectory::{PosePath3D, Unit};

use crate::metric::{check_lengths, PoseErrorMetric};
use crate::{MetricsError, PoseRelation};

/// Absolute pose error.
///
/// Measures the global consistency of an estimate by comparing each estimated
/// pose with the reference pose at the same index.
#[derive(Debug, Clone, Default)]
pub struct Ape {
    pose_relation: PoseRelation,
    error_poses: Vec<DMat4>,
    error: Vec<f64>,
}

impl Ape {
    /// Creates an APE metric for the given pose relation.
    pub fn new(pose_relation: PoseRelation) -> Self {
        Self {
            pose_relation,
            ..Default::default()
        }
    }

    /// Switches the pose relation and clears all computed values.
    pub fn reset_parameters(&mut self, pose_relation: PoseRelation) {
        *self = Self::new(pose_relation);
    }

    /// The measured pose relation.
    pub fn pose_relation(&self) -> PoseRelation {
        self.pose_relation
    }

    /// Error poses `est_i^-1 * ref_i` of the last call to `process_data`.
    ///
    /// Empty for [`PoseRelation::TranslationPart`], which only compares positions.
    pub fn error_poses(&self) -> &[DMat4] {
        &self.error_poses
    }
}

impl PoseErrorMetric for Ape {
    fn name(&self) -> &'static str {
        "APE"
    }

    fn process_data(
        &mut self,
        reference: &PosePath3D,
        estimate: &PosePath3D,
    ) -> Result<(), MetricsError> {
        check_lengths(reference, estimate)?;

        if self.pose_relation == PoseRelation::TranslationPart {
            self.error_poses.clear();
            self.error = estimate
                .positions()
                .iter()
                .zip(reference.positions())
                .map(|(p_est, p_ref)| (*p_est - *p_ref).length())
                .collect();
        } else {
            self.error_poses = estimate
                .poses()
                .iter()
                .zip(reference.poses())
                .map(|(x_t, x_t_star)| se3::relative(x_t, x_t_star))
                .collect();
            self.error = self
                .error_poses
                .iter()
                .map(|e| self.pose_relation.reduce(e))
                .collect::<Result<_, _>>()?;
        }

        log::debug!(
            "compared {} absolute pose pairs w.r.t. {}",
            self.error.len(),
            self.pose_relation
        );
        Ok(())
    }

    fn error(&self) -> &[f64] {
        &self.error
    }

    fn unit(&self) -> Unit {
        self.pose_relation.unit()
    }

    fn title(&self) -> String {
        format!("APE w.r.t. {} ({})", self.pose_relation, self.unit())
    }
}
