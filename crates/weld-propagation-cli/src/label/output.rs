use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::WriterBuilder;

use weld_propagation::data_handling::passed_column_name;
use weld_propagation::weld_learner::{AccuracyReport, FittedLabels};

use crate::util::delimiter_for;

/// Name of the combined verdict column.
pub const COMBINED_COLUMN: &str = "Combined";

/// Write one line per fitted sample: its data row, the resolved label of
/// every criterion and the combined verdict.
pub fn write_labels<P: AsRef<Path>>(
    path: P,
    row_ids: &[usize],
    labels: &FittedLabels,
) -> Result<()> {
    let path = path.as_ref();
    if labels.combined.len() != row_ids.len() {
        return Err(anyhow!(
            "Row id count {} does not match {} labeled samples",
            row_ids.len(),
            labels.combined.len()
        ));
    }

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter_for(path))
        .from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    let mut header = vec!["row".to_string()];
    header.extend(labels.resolved.criteria().map(passed_column_name));
    header.push(COMBINED_COLUMN.to_string());
    writer.write_record(&header)?;

    let columns: Vec<_> = labels.resolved.iter().map(|(_, column)| column).collect();
    for (i, row_id) in row_ids.iter().enumerate() {
        let mut record = vec![row_id.to_string()];
        record.extend(columns.iter().map(|column| column[i].to_string()));
        record.push(labels.combined[i].to_string());
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write labels: {}", path.display()))?;
    log::info!("Wrote {} labeled samples to {}", row_ids.len(), path.display());
    Ok(())
}

/// Write the accuracy report as pretty-printed JSON.
pub fn write_accuracy<P: AsRef<Path>>(path: P, report: &AccuracyReport) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report)?;
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create accuracy file: {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write accuracy file: {}", path.display()))?;
    Ok(())
}
