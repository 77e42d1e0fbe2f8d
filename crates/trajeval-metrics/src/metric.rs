use std::collections::BTreeMap;

use trajeval_trajectory::{PosePath3D, Unit};

use crate::{MetricResult, MetricsError, StatisticsType};

/// A metric producing one error value per compared pose or pose pair.
///
/// Implementors are stateful: [`PoseErrorMetric::process_data`] replaces the
/// errors of any previous call.
pub trait PoseErrorMetric {
    /// Short name used in result labels, e.g. `"APE"`.
    fn name(&self) -> &'static str;

    /// Compares `estimate` against `reference`. Poses correspond by index.
    fn process_data(
        &mut self,
        reference: &PosePath3D,
        estimate: &PosePath3D,
    ) -> Result<(), MetricsError>;

    /// Errors of the last [`PoseErrorMetric::process_data`] call.
    fn error(&self) -> &[f64];

    /// Unit of the errors.
    fn unit(&self) -> Unit;

    /// Human readable description of the configuration.
    fn title(&self) -> String;

    /// A single statistic over the errors.
    fn statistic(&self, statistics_type: StatisticsType) -> Result<f64, MetricsError> {
        statistics_type.compute(self.error())
    }

    /// All statistics that can be computed, keyed by name.
    ///
    /// Statistics that fail are left out, so this is empty before any data was
    /// processed.
    fn all_statistics(&self) -> BTreeMap<String, f64> {
        StatisticsType::ALL
            .iter()
            .filter_map(|t| {
                self.statistic(*t)
                    .ok()
                    .map(|value| (t.as_str().to_string(), value))
            })
            .collect()
    }

    /// Snapshot of the metric as a [`MetricResult`].
    ///
    /// The result holds the title, the data names and a label in its info, all
    /// statistics, and the errors as `"error_array"`.
    fn result(&self, ref_name: &str, est_name: &str) -> MetricResult {
        let mut result = MetricResult::default();
        result.add_info([
            ("title", self.title()),
            ("ref_name", ref_name.to_string()),
            ("est_name", est_name.to_string()),
            ("label", format!("{} ({})", self.name(), self.unit())),
        ]);
        result.add_stats(self.all_statistics());
        result.add_array("error_array", self.error().to_vec());
        result
    }
}

pub(crate) fn check_lengths(
    reference: &PosePath3D,
    estimate: &PosePath3D,
) -> Result<(), MetricsError> {
    if reference.num_poses() != estimate.num_poses() {
        return Err(MetricsError::LengthMismatch {
            reference: reference.num_poses(),
            estimate: estimate.num_poses(),
        });
    }
    Ok(())
}
