use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// An error type for results.
#[derive(Debug, thiserror::Error)]
pub enum ResultError {
    /// Nothing to merge.
    #[error("no results to merge")]
    Empty,

    /// Results with different statistics or arrays cannot be merged.
    #[error("cannot merge results with non-matching {0} keys")]
    MismatchedKeys(&'static str),

    /// Failed to read or write a result file.
    #[error("Failed to manipulate the file. {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode or decode JSON.
    #[error("Failed to encode or decode the result. {0}")]
    Json(#[from] serde_json::Error),
}

/// Output of a metric: metadata, statistics and named arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Free-form metadata such as `"title"`, `"ref_name"`, `"est_name"` and `"label"`.
    pub info: BTreeMap<String, String>,
    /// Statistics by name.
    pub stats: BTreeMap<String, f64>,
    /// Arrays by name, e.g. `"error_array"`.
    pub arrays: BTreeMap<String, Vec<f64>>,
}

impl MetricResult {
    /// Inserts or replaces metadata entries.
    pub fn add_info<K, V>(&mut self, info: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.info
            .extend(info.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Inserts or replaces statistics.
    pub fn add_stats<K: Into<String>>(&mut self, stats: impl IntoIterator<Item = (K, f64)>) {
        self.stats
            .extend(stats.into_iter().map(|(k, v)| (k.into(), v)));
    }

    /// Inserts or replaces an array.
    pub fn add_array(&mut self, name: impl Into<String>, array: Vec<f64>) {
        self.arrays.insert(name.into(), array);
    }

    /// The `"title"` entry of the metadata.
    pub fn title(&self) -> Option<&str> {
        self.info.get("title").map(String::as_str)
    }

    /// Renders the title, the statistics and the metadata, each optionally.
    ///
    /// Statistics are printed with six decimals, sorted by name.
    pub fn pretty_string(&self, title: bool, stats: bool, info: bool) -> String {
        let mut out = String::new();
        if title {
            out += &format!("{}\n\n", self.title().unwrap_or_default());
        }
        if stats {
            for (name, value) in &self.stats {
                out += &format!("{name:>10}\t{value:.6}\n");
            }
        }
        if info {
            for (name, value) in &self.info {
                out += &format!("{name:>10}\t{value}\n");
            }
        }
        out
    }

    /// Serializes the result to a JSON string.
    pub fn to_json_string(&self) -> Result<String, ResultError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a result from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ResultError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Writes the result as JSON.
    pub fn write_json(&self, file_path: impl AsRef<Path>) -> Result<(), ResultError> {
        std::fs::write(file_path.as_ref(), self.to_json_string()?)?;
        log::debug!("result saved to {}", file_path.as_ref().display());
        Ok(())
    }

    /// Reads a result written by [`MetricResult::write_json`].
    pub fn read_json(file_path: impl AsRef<Path>) -> Result<Self, ResultError> {
        Self::from_json_str(&std::fs::read_to_string(file_path)?)
    }
}

impl std::fmt::Display for MetricResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pretty_string(true, false, false).replace('\n', " "))
    }
}

/// Merges results of the same kind, e.g. of several runs.
///
/// Statistics are averaged. Arrays are averaged element-wise if all of them have
/// the same length, otherwise they are concatenated. The metadata is taken
/// from the first result.
///
/// # Errors
///
/// Fails if `results` is empty or if the results differ in their statistics or
/// array names.
pub fn merge_results(results: &[MetricResult]) -> Result<MetricResult, ResultError> {
    let Some(first) = results.first() else {
        return Err(ResultError::Empty);
    };
    let stat_keys: BTreeSet<&String> = first.stats.keys().collect();
    let array_keys: BTreeSet<&String> = first.arrays.keys().collect();
    for r in &results[1..] {
        if r.stats.keys().collect::<BTreeSet<_>>() != stat_keys {
            return Err(ResultError::MismatchedKeys("statistics"));
        }
        if r.arrays.keys().collect::<BTreeSet<_>>() != array_keys {
            return Err(ResultError::MismatchedKeys("array"));
        }
    }

    let n = results.len() as f64;
    let mut merged = first.clone();
    for (key, value) in merged.stats.iter_mut() {
        *value = results.iter().map(|r| r.stats[key]).sum::<f64>() / n;
    }
    for (key, array) in merged.arrays.iter_mut() {
        let len = array.len();
        if results.iter().all(|r| r.arrays[key].len() == len) {
            for (i, value) in array.iter_mut().enumerate() {
                *value = results.iter().map(|r| r.arrays[key][i]).sum::<f64>() / n;
            }
        } else {
            log::warn!("arrays {key} differ in length, appending instead of averaging");
            *array = results
                .iter()
                .flat_map(|r| r.arrays[key].iter().copied())
                .collect();
        }
    }
    Ok(merged)
}
