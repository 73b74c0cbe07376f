//! Detection over many independent inputs.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::detect::{DetectionResult, detect_value};

/// Outcome for one element of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    /// Position in the original batch.
    pub index: usize,
    pub data: Value,
    pub result: DetectionResult,
    pub has_resettlement: bool,
}

/// Totals over a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub resettled: usize,
}

impl BatchSummary {
    pub fn of(entries: &[BatchEntry]) -> Self {
        Self {
            total: entries.len(),
            resettled: entries.iter().filter(|e| e.has_resettlement).count(),
        }
    }
}

/// Detect each element of `inputs` in order. A non-array yields no entries.
pub fn batch_detect(inputs: &Value) -> Vec<BatchEntry> {
    let Some(items) = inputs.as_array() else {
        debug!("batch input is not an array");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .map(|(index, data)| {
            let result = detect_value(data);
            BatchEntry {
                index,
                data: data.clone(),
                has_resettlement: result.is_resettlement,
                result,
            }
        })
        .collect()
}

/// [`batch_detect`], keeping only the resettled entries.
pub fn filter_resettled(inputs: &Value) -> Vec<BatchEntry> {
    batch_detect(inputs)
        .into_iter()
        .filter(|entry| entry.has_resettlement)
        .collect()
}
