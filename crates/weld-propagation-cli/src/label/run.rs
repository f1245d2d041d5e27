use anyhow::{anyhow, Result};

use weld_propagation::data_handling::train_test_split;
use weld_propagation::weld_learner::{AccuracyReport, WeldLabelPropagation};

use crate::label::input::LabelRunConfig;
use crate::label::load_data::load_label_data;
use crate::label::output::{write_accuracy, write_labels};

/// Outcome of a labeling run.
#[derive(Debug)]
pub struct LabelRunSummary {
    pub n_train: usize,
    pub n_test: usize,
    pub n_combined_pass: usize,
    pub report: AccuracyReport,
}

/// Load the data, hold out fully observed samples, fit on the rest, score the
/// held-out part and write labels plus accuracy.
pub fn run_labeling(config: &LabelRunConfig) -> Result<LabelRunSummary> {
    let criteria = config.criteria();
    if criteria.is_empty() {
        return Err(anyhow!("No criteria configured; add entries to 'thresholds'"));
    }

    let data = load_label_data(&config.data, &criteria)?;
    log::info!("Using feature columns: {}", data.feature_names.join(", "));
    let split = train_test_split(&data.x, &data.y, config.test_ratio, config.seed)?;
    if split.test_indices.is_empty() {
        return Err(anyhow!(
            "No fully observed samples to hold out at test ratio {}",
            config.test_ratio
        ));
    }

    let mut learner = WeldLabelPropagation::new(config.thresholds.clone(), config.learner.clone());
    let labels = learner.fit(&split.x_train, &split.y_train)?.clone();
    learner.avg_accuracy(&split.x_test, &split.y_test)?;
    let report = learner
        .accuracy_report()
        .cloned()
        .ok_or_else(|| anyhow!("Evaluation produced no accuracy report"))?;

    let train_rows: Vec<usize> = split
        .train_indices
        .iter()
        .map(|&i| data.row_ids[i])
        .collect();
    write_labels(&config.output_file, &train_rows, &labels)?;
    write_accuracy(&config.accuracy_file, &report)?;

    Ok(LabelRunSummary {
        n_train: split.train_indices.len(),
        n_test: split.test_indices.len(),
        n_combined_pass: labels.combined.iter().filter(|&&l| l == 1).count(),
        report,
    })
}
