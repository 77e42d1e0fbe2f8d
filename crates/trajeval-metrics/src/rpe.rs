use glam::DMat4;
use serde::{Deserialize, Serialize};
use trajeval_lie::se3;
use trajeval_trajectory::filters::{id_pairs_from_delta, IdPairs};
use trajeval_trajectory::{PosePath3D, Unit};

use crate::metric::{check_lengths, PoseErrorMetric};
use crate::{MetricsError, PoseRelation};

/// Configuration of the relative pose error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpeConfig {
    /// The measured pose relation.
    pub pose_relation: PoseRelation,
    /// Distance between the poses of a pair, in `delta_unit`.
    pub delta: f64,
    /// One of frames, meters, degrees or radians.
    pub delta_unit: Unit,
    /// Tolerance of the all-pairs mode, relative to `delta`.
    pub rel_delta_tol: f64,
    /// Use all pairs within the tolerance instead of consecutive pairs.
    pub all_pairs: bool,
}

impl Default for RpeConfig {
    fn default() -> Self {
        Self {
            pose_relation: PoseRelation::TranslationPart,
            delta: 1.0,
            delta_unit: Unit::Frames,
            rel_delta_tol: 0.1,
            all_pairs: false,
        }
    }
}

impl RpeConfig {
    fn validate(&self) -> Result<(), MetricsError> {
        if self.delta < 0.0 {
            return Err(MetricsError::NegativeDelta(self.delta));
        }
        if self.delta_unit == Unit::Frames && self.delta.fract() != 0.0 {
            return Err(MetricsError::NonIntegerDelta {
                delta: self.delta,
                unit: self.delta_unit,
            });
        }
        Ok(())
    }
}

/// Relative pose error.
///
/// Measures drift by comparing the motion between two poses of the estimate
/// with the motion between the same poses of the reference.
#[derive(Debug, Clone)]
pub struct Rpe {
    config: RpeConfig,
    error_poses: Vec<DMat4>,
    error: Vec<f64>,
    delta_ids: Vec<usize>,
}

impl Rpe {
    /// Creates an RPE metric.
    ///
    /// # Errors
    ///
    /// Fails if `delta` is negative, or not an integer for [`Unit::Frames`].
    pub fn new(config: RpeConfig) -> Result<Self, MetricsError> {
        config.validate()?;
        Ok(Self {
            config,
            error_poses: Vec::new(),
            error: Vec::new(),
            delta_ids: Vec::new(),
        })
    }

    /// The current configuration.
    pub fn config(&self) -> &RpeConfig {
        &self.config
    }

    /// Replaces the configuration and clears all computed values.
    pub fn reset_parameters(&mut self, config: RpeConfig) -> Result<(), MetricsError> {
        *self = Self::new(config)?;
        Ok(())
    }

    /// Second index of every compared pair.
    ///
    /// In consecutive mode the trajectories can be reduced to these ids to plot
    /// exactly the compared poses.
    pub fn delta_ids(&self) -> &[usize] {
        &self.delta_ids
    }

    /// Error poses of the last processed pairs.
    pub fn error_poses(&self) -> &[DMat4] {
        &self.error_poses
    }

    /// Computes the errors for externally selected index pairs.
    pub fn process_data_with_pairs(
        &mut self,
        reference: &PosePath3D,
        estimate: &PosePath3D,
        id_pairs: &[(usize, usize)],
    ) -> Result<(), MetricsError> {
        check_lengths(reference, estimate)?;
        let len = reference.num_poses();
        if let Some(&(i, j)) = id_pairs.iter().find(|(i, j)| *i >= len || *j >= len) {
            return Err(MetricsError::PairOutOfBounds(i, j, len));
        }

        let q = reference.poses();
        let p = estimate.poses();
        let error_poses: Vec<DMat4> = id_pairs
            .iter()
            .map(|&(i, j)| rpe_base(&q[i], &q[j], &p[i], &p[j]))
            .collect();
        let error = error_poses
            .iter()
            .map(|e| self.config.pose_relation.reduce(e))
            .collect::<Result<_, _>>()?;

        self.delta_ids = id_pairs.iter().map(|&(_, j)| j).collect();
        self.error_poses = error_poses;
        self.error = error;

        log::debug!(
            "compared {} relative pose pairs, delta = {} ({}) with {} pairs",
            self.error.len(),
            self.config.delta,
            self.config.delta_unit,
            if self.config.all_pairs { "all" } else { "consecutive" }
        );
        Ok(())
    }
}

impl PoseErrorMetric for Rpe {
    fn name(&self) -> &'static str {
        "RPE"
    }

    /// Selects the pairs on the estimate's poses, then compares them.
    fn process_data(
        &mut self,
        reference: &PosePath3D,
        estimate: &PosePath3D,
    ) -> Result<(), MetricsError> {
        check_lengths(reference, estimate)?;
        let id_pairs: IdPairs = id_pairs_from_delta(
            estimate.poses(),
            self.config.delta,
            self.config.delta_unit,
            self.config.rel_delta_tol,
            self.config.all_pairs,
        )?;
        self.process_data_with_pairs(reference, estimate, &id_pairs)
    }

    fn error(&self) -> &[f64] {
        &self.error
    }

    fn unit(&self) -> Unit {
        self.config.pose_relation.unit()
    }

    fn title(&self) -> String {
        format!(
            "RPE w.r.t. {} ({})\nfor delta = {} ({}) using {} pairs",
            self.config.pose_relation,
            self.unit(),
            self.config.delta,
            self.config.delta_unit,
            if self.config.all_pairs { "all" } else { "consecutive" }
        )
    }
}

/// Error pose between the reference motion `q_i -> q_j` and the estimated motion `p_i -> p_j`.
pub fn rpe_base(q_i: &DMat4, q_j: &DMat4, p_i: &DMat4, p_j: &DMat4) -> DMat4 {
    let q_rel = se3::relative(q_i, q_j);
    let p_rel = se3::relative(p_i, p_j);
    se3::relative(&q_rel, &p_rel)
}
