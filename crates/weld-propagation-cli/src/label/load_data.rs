//! CSV/TSV reader producing the feature matrix and criterion targets.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use ndarray::{Array1, Array2};

use weld_propagation::data_handling::TargetFrame;

use crate::util::{delimiter_for, is_missing};

/// Dataset ready for splitting and fitting.
#[derive(Debug)]
pub struct LabelData {
    pub x: Array2<f64>,
    pub y: TargetFrame,
    pub feature_names: Vec<String>,
    /// 0-based data row (header excluded) of every kept sample.
    pub row_ids: Vec<usize>,
}

/// Load a dataset, treating `target_columns` as criteria and every other
/// purely numeric column as a feature.
///
/// Columns holding any non-numeric value are not features and are skipped.
/// Samples with a missing feature value are dropped, since propagation needs
/// a complete feature matrix. Missing target values are kept as NaN.
pub fn load_label_data<P: AsRef<Path>>(path: P, target_columns: &[String]) -> Result<LabelData> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open data file: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read header row")?
        .clone();

    let target_indices = target_columns
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| anyhow!("Missing target column '{}' in {}", name, path.display()))
        })
        .collect::<Result<Vec<usize>>>()?;

    let records = reader
        .records()
        .enumerate()
        .map(|(row_idx, r)| r.with_context(|| format!("Failed to read row {}", row_idx + 1)))
        .collect::<Result<Vec<_>>>()?;

    let mut feature_indices = Vec::new();
    for (col_idx, name) in headers.iter().enumerate() {
        if target_indices.contains(&col_idx) {
            continue;
        }
        let mut observed = 0;
        let numeric = records.iter().all(|record| {
            let value = record.get(col_idx).unwrap_or("");
            if is_missing(value) {
                return true;
            }
            observed += 1;
            value.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false)
        });
        if numeric && observed > 0 {
            feature_indices.push(col_idx);
        } else {
            log::info!("Skipping non-numeric column '{}'", name);
        }
    }
    if feature_indices.is_empty() {
        return Err(anyhow!("No numeric feature columns detected in {}", path.display()));
    }

    let mut features = Vec::with_capacity(records.len() * feature_indices.len());
    let mut targets: Vec<Vec<f64>> = vec![Vec::with_capacity(records.len()); target_indices.len()];
    let mut row_ids = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for (row_idx, record) in records.iter().enumerate() {
        let row: Option<Vec<f64>> = feature_indices
            .iter()
            .map(|&c| {
                let value = record.get(c).unwrap_or("");
                if is_missing(value) {
                    None
                } else {
                    value.trim().parse::<f64>().ok()
                }
            })
            .collect();
        let Some(row) = row else {
            dropped += 1;
            continue;
        };

        for (t, &c) in target_indices.iter().enumerate() {
            let value = record.get(c).unwrap_or("");
            let parsed = if is_missing(value) {
                f64::NAN
            } else {
                value.trim().parse::<f64>().with_context(|| {
                    format!(
                        "Invalid value '{}' in target column '{}' at row {}",
                        value,
                        target_columns[t],
                        row_idx + 1
                    )
                })?
            };
            targets[t].push(parsed);
        }

        features.extend(row);
        row_ids.push(row_idx);
    }

    if dropped > 0 {
        log::warn!(
            "Dropped {} of {} rows with missing feature values",
            dropped,
            records.len()
        );
    }

    let x = Array2::from_shape_vec((row_ids.len(), feature_indices.len()), features)
        .context("Failed to assemble feature matrix")?;
    let y = TargetFrame::new(
        target_columns
            .iter()
            .cloned()
            .zip(targets.into_iter().map(Array1::from_vec))
            .collect(),
    )?;

    log::info!(
        "Loaded {} samples with {} features and {} criteria from {}",
        x.nrows(),
        x.ncols(),
        y.ncols(),
        path.display()
    );

    Ok(LabelData {
        x,
        y,
        feature_names: feature_indices
            .iter()
            .map(|&c| headers.get(c).unwrap_or_default().to_string())
            .collect(),
        row_ids,
    })
}
