//! Feature standardization applied before graph construction.
//!
//! Distances in the propagation graph are Euclidean, so features measured on
//! very different scales can dominate the neighborhoods. The learner fits a
//! `Scaler` on the training features when `scale_features` is enabled and
//! reuses it on held-out features.
use ndarray::{Array1, Array2, Axis};

use crate::error::{Result, WeldError};

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq)]
pub struct Scaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f64 = 1e-6;
}

/// Fit a `Scaler` where rows are samples and columns are features.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    let (nrows, ncols) = x.dim();
    if nrows == 0 || ncols == 0 {
        return Err(WeldError::precondition(
            "fit_scaler",
            "scaler requires a non-empty matrix",
        ));
    }

    let mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| WeldError::precondition("fit_scaler", "empty axis"))?;
    let std = x.std_axis(Axis(0), 0.0).mapv(|s| s.max(Scaler::MIN_STD));

    Ok(Scaler { mean, std })
}

/// Transform all rows using the provided `Scaler` and return a new matrix.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>> {
    if x.ncols() != sc.mean.len() {
        return Err(WeldError::shape("scaled feature columns", sc.mean.len(), x.ncols()));
    }
    Ok((x - &sc.mean) / &sc.std)
}

/// Convenience: fit a scaler and return it together with the transformed matrix.
pub fn fit_transform(x: &Array2<f64>) -> Result<(Scaler, Array2<f64>)> {
    let sc = fit_scaler(x)?;
    let transformed = transform_all(x, &sc)?;
    Ok((sc, transformed))
}
