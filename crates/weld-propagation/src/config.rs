use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Central configuration for the label propagation classifier.
///
/// `max_iter` and `tol` fall back to their defaults when omitted; the kernel
/// entry (`Knn` or `Rbf`) must be present.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Upper bound on propagation sweeps before giving up on convergence.
    pub max_iter: usize,
    /// L1 change between sweeps below which propagation is considered converged.
    pub tol: f64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported graph kernels and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    Knn { n_neighbors: usize },
    Rbf { gamma: f64 },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Knn { n_neighbors: 25 }
    }
}

impl ModelType {
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::Knn { .. } => "knn",
            ModelType::Rbf { .. } => "rbf",
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "knn" => Ok(ModelType::Knn { n_neighbors: 25 }),
            "rbf" => Ok(ModelType::Rbf { gamma: 20.0 }),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: knn, rbf",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            ..Self::default()
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-3,
            model_type: ModelType::default(),
        }
    }
}

/// Whether criteria share one classifier instance or each keep their own.
///
/// `Shared` refits the same classifier for every criterion, so only the state
/// of the last criterion survives fitting and evaluation predicts every
/// criterion with it. `PerCriterion` retains one fitted classifier per
/// criterion and evaluates each criterion against its own.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierScope {
    #[default]
    Shared,
    PerCriterion,
}

/// Parameters for the multi-criterion learner.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct LearnerConfig {
    pub model: ModelConfig,
    pub scale_features: bool,
    pub classifier_scope: ClassifierScope,
}
