use serde::Serialize;
use std::io;
use thiserror::Error;

use crate::batch::BatchEntry;

/// Errors that can occur when writing the batch summary
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("entry {index}: failed to write csv row: {source}")]
    Row { index: usize, source: csv::Error },

    #[error("failed to flush csv writer: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    index: usize,
    has_resettlement: bool,
    method: &'static str,
    count: usize,
}

/// Write one csv row per batch entry: `index,has_resettlement,method,count`.
pub fn write_batch_summary<'a>(
    entries: impl IntoIterator<Item = &'a BatchEntry>,
    writer: impl io::Write,
) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_writer(writer);

    for entry in entries {
        let result = &entry.result;
        let row = SummaryRow {
            index: entry.index,
            has_resettlement: entry.has_resettlement,
            method: result.method.as_str(),
            count: result
                .credit_count
                .or(result.settlement_count)
                .or(result.input_count)
                .unwrap_or(0),
        };
        writer.serialize(&row).map_err(|source| OutputError::Row {
            index: entry.index,
            source,
        })?;
    }

    writer.flush()?;
    Ok(())
}
