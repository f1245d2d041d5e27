use thiserror::Error;

/// Errors raised while labeling, propagating or evaluating criteria.
///
/// Every variant names the criterion or stage that failed so callers can
/// report exactly where a run stopped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeldError {
    #[error("configuration error for {criterion}: {reason}")]
    Configuration { criterion: String, reason: String },

    #[error("precondition failed ({stage}): {reason}")]
    Precondition { stage: String, reason: String },

    #[error("model not fitted: expected state {expected}, found {found}")]
    State { expected: String, found: String },

    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    Shape {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("label propagation failed for criterion {criterion}: {reason}")]
    Propagation { criterion: String, reason: String },
}

impl WeldError {
    pub fn configuration(criterion: impl Into<String>, reason: impl Into<String>) -> Self {
        WeldError::Configuration {
            criterion: criterion.into(),
            reason: reason.into(),
        }
    }

    pub fn precondition(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        WeldError::Precondition {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    pub fn shape(what: impl Into<String>, expected: usize, found: usize) -> Self {
        WeldError::Shape {
            what: what.into(),
            expected,
            found,
        }
    }

    pub fn propagation(criterion: impl Into<String>, reason: impl Into<String>) -> Self {
        WeldError::Propagation {
            criterion: criterion.into(),
            reason: reason.into(),
        }
    }

    /// Attach a criterion name to errors raised below the fitter, where the
    /// classifier only knows the stage it was in.
    pub fn for_criterion(self, criterion: &str) -> Self {
        match self {
            WeldError::Precondition { stage, reason } => WeldError::Precondition {
                stage: format!("{} / {}", criterion, stage),
                reason,
            },
            WeldError::Propagation { reason, .. } => WeldError::Propagation {
                criterion: criterion.to_string(),
                reason,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, WeldError>;
