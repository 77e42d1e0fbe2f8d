use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MetricsError;

/// Summary statistic of an error array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsType {
    /// Root mean squared error.
    Rmse,
    /// Arithmetic mean.
    Mean,
    /// Median, averaging the two middle values for even lengths.
    Median,
    /// Population standard deviation.
    Std,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// Sum of squared errors.
    Sse,
}

impl StatisticsType {
    /// All statistics in their canonical order.
    pub const ALL: [StatisticsType; 7] = [
        StatisticsType::Rmse,
        StatisticsType::Mean,
        StatisticsType::Median,
        StatisticsType::Std,
        StatisticsType::Min,
        StatisticsType::Max,
        StatisticsType::Sse,
    ];

    /// Name used as key in result statistics.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticsType::Rmse => "rmse",
            StatisticsType::Mean => "mean",
            StatisticsType::Median => "median",
            StatisticsType::Std => "std",
            StatisticsType::Min => "min",
            StatisticsType::Max => "max",
            StatisticsType::Sse => "sse",
        }
    }

    /// Computes the statistic over `errors`.
    ///
    /// # Errors
    ///
    /// Fails with [`MetricsError::NoData`] if `errors` is empty.
    pub fn compute(&self, errors: &[f64]) -> Result<f64, MetricsError> {
        if errors.is_empty() {
            return Err(MetricsError::NoData);
        }
        let n = errors.len() as f64;
        let sse = || errors.iter().map(|e| e * e).sum::<f64>();
        let mean = || errors.iter().sum::<f64>() / n;

        let value = match self {
            StatisticsType::Rmse => (sse() / n).sqrt(),
            StatisticsType::Sse => sse(),
            StatisticsType::Mean => mean(),
            StatisticsType::Median => {
                let mut sorted = errors.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            StatisticsType::Std => {
                let mean = mean();
                (errors.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n).sqrt()
            }
            StatisticsType::Min => errors.iter().copied().fold(f64::INFINITY, f64::min),
            StatisticsType::Max => errors.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Ok(value)
    }
}

impl FromStr for StatisticsType {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatisticsType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MetricsError::UnsupportedStatistic(s.to_string()))
    }
}

impl std::fmt::Display for StatisticsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
