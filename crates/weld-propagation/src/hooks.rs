//! Observability hooks for the labeling pipeline.
//!
//! The learner reports what it does through a [`LabelingHooks`] object rather
//! than printing. Callers can plug in persistence, progress reporting or
//! assertions in tests; the default [`LogHooks`] forwards to the `log` facade.

/// Emitted after a criterion column has been thresholded.
#[derive(Debug, Clone, PartialEq)]
pub struct BinarizedEvent {
    pub criterion: String,
    pub threshold: f64,
    pub n_samples: usize,
    pub n_pass: usize,
    pub n_fail: usize,
    pub n_unknown: usize,
}

/// Emitted after the classifier resolved every sample of a criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatedEvent {
    pub criterion: String,
    pub n_samples: usize,
    pub n_pass: usize,
    pub n_iterations: usize,
    pub converged: bool,
}

/// Emitted after a criterion has been scored against held-out truth.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedEvent {
    pub criterion: String,
    pub accuracy: f64,
    pub n_samples: usize,
}

pub trait LabelingHooks {
    fn on_binarized(&self, _event: &BinarizedEvent) {}

    fn on_propagated(&self, _event: &PropagatedEvent) {}

    fn on_evaluated(&self, _event: &EvaluatedEvent) {}
}

/// Hooks that swallow every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl LabelingHooks for NoopHooks {}

/// Hooks that forward every event to `log::debug!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHooks;

impl LabelingHooks for LogHooks {
    fn on_binarized(&self, event: &BinarizedEvent) {
        log::debug!(
            "Binarized '{}' at threshold {}: {} samples ({} pass, {} fail, {} unknown)",
            event.criterion,
            event.threshold,
            event.n_samples,
            event.n_pass,
            event.n_fail,
            event.n_unknown
        );
    }

    fn on_propagated(&self, event: &PropagatedEvent) {
        log::debug!(
            "Propagated '{}': {} of {} samples pass after {} iterations (converged: {})",
            event.criterion,
            event.n_pass,
            event.n_samples,
            event.n_iterations,
            event.converged
        );
    }

    fn on_evaluated(&self, event: &EvaluatedEvent) {
        log::debug!(
            "Evaluated '{}' on {} held-out samples: accuracy {:.4}",
            event.criterion,
            event.n_samples,
            event.accuracy
        );
    }
}
