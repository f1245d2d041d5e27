//! Thresholding of continuous criterion measurements into ternary labels.
use ndarray::{Array1, ArrayView1};

use crate::error::Result;
use crate::hooks::{BinarizedEvent, LabelingHooks};
use crate::thresholds::Thresholds;

pub const FAIL: i32 = 0;
pub const PASS: i32 = 1;
/// Marks a missing measurement. The classifier treats it as unlabeled.
pub const UNKNOWN: i32 = -1;

/// Map a measurement column to {fail = 0, pass = 1, unknown = -1}.
///
/// Values at or above `threshold` pass, values below fail. The comparison is
/// done first on a float intermediate in which missing (NaN) samples stay NaN,
/// because both `>=` and `<` are false for NaN. The intermediate is then
/// re-masked so those samples become [`UNKNOWN`] instead of silently failing.
pub fn binarize(values: ArrayView1<f64>, threshold: f64) -> Array1<i32> {
    let thresholded = values.mapv(|v| {
        if v >= threshold {
            1.0
        } else if v < threshold {
            0.0
        } else {
            f64::NAN
        }
    });

    thresholded.mapv(|v| if v.is_nan() { UNKNOWN } else { v as i32 })
}

/// Look up the cutoff of `criterion`, binarize its column and report the
/// label counts through `hooks`.
pub fn binarize_criterion(
    criterion: &str,
    values: ArrayView1<f64>,
    thresholds: &Thresholds,
    hooks: &dyn LabelingHooks,
) -> Result<Array1<i32>> {
    let threshold = thresholds.cutoff(criterion)?;
    let labels = binarize(values, threshold);

    hooks.on_binarized(&BinarizedEvent {
        criterion: criterion.to_string(),
        threshold,
        n_samples: labels.len(),
        n_pass: count_label(&labels, PASS),
        n_fail: count_label(&labels, FAIL),
        n_unknown: count_label(&labels, UNKNOWN),
    });

    Ok(labels)
}

pub(crate) fn count_label(labels: &Array1<i32>, label: i32) -> usize {
    labels.iter().filter(|&&l| l == label).count()
}
