use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::binarize::{binarize_criterion, count_label, PASS};
use crate::combine::combine_labels;
use crate::config::{ClassifierScope, LearnerConfig};
use crate::data_handling::{validate_features, LabelTable, TargetFrame};
use crate::error::{Result, WeldError};
use crate::hooks::{EvaluatedEvent, LabelingHooks, LogHooks, PropagatedEvent};
use crate::models::classifier_trait::SemiSupervisedModel;
use crate::models::factory::build_model;
use crate::preprocessing::{fit_transform, transform_all, Scaler};
use crate::stats::{accuracy_score, mean_accuracy};
use crate::thresholds::Thresholds;

/// Lifecycle of a learner. There is no way back to `Unfitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnerState {
    Unfitted,
    Fitted,
    Evaluated,
}

impl fmt::Display for LearnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LearnerState::Unfitted => "Unfitted",
            LearnerState::Fitted => "Fitted",
            LearnerState::Evaluated => "Evaluated",
        };
        write!(f, "{}", name)
    }
}

/// Labels produced by a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLabels {
    /// Overall pass/fail verdict per sample.
    pub combined: Array1<i32>,
    /// Fully resolved 0/1 column per criterion, in fitting order.
    pub resolved: LabelTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionAccuracy {
    pub criterion: String,
    pub accuracy: f64,
}

/// Accuracy of the fitted classifier(s) against held-out truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub per_criterion: Vec<CriterionAccuracy>,
    pub mean: f64,
}

impl AccuracyReport {
    pub fn get(&self, criterion: &str) -> Option<f64> {
        self.per_criterion
            .iter()
            .find(|c| c.criterion == criterion)
            .map(|c| c.accuracy)
    }
}

enum FittedClassifiers {
    /// One instance refit for every criterion; holds the last criterion's fit.
    Shared(Box<dyn SemiSupervisedModel>),
    PerCriterion(Vec<(String, Box<dyn SemiSupervisedModel>)>),
}

impl FittedClassifiers {
    fn for_criterion(&self, criterion: &str) -> Result<&dyn SemiSupervisedModel> {
        match self {
            FittedClassifiers::Shared(model) => Ok(model.as_ref()),
            FittedClassifiers::PerCriterion(models) => models
                .iter()
                .find(|(name, _)| name == criterion)
                .map(|(_, model)| model.as_ref())
                .ok_or_else(|| {
                    WeldError::configuration(criterion, "criterion was not part of the fit")
                }),
        }
    }
}

struct FittedState {
    labels: FittedLabels,
    classifiers: FittedClassifiers,
    scaler: Option<Scaler>,
    report: Option<AccuracyReport>,
}

/// Run the classifier on one criterion's ternary labels and return the
/// resolved 0/1 column.
///
/// `model` keeps the state of this fit afterwards; any earlier state it held
/// is overwritten.
pub fn propagate_column(
    model: &mut dyn SemiSupervisedModel,
    criterion: &str,
    x: &Array2<f64>,
    labels: &Array1<i32>,
    hooks: &dyn LabelingHooks,
) -> Result<Array1<i32>> {
    let summary = model
        .fit(x, labels)
        .map_err(|e| e.for_criterion(criterion))?;
    let resolved = model.transduction()?;

    hooks.on_propagated(&PropagatedEvent {
        criterion: criterion.to_string(),
        n_samples: resolved.len(),
        n_pass: count_label(&resolved, PASS),
        n_iterations: summary.n_iterations,
        converged: summary.converged,
    });

    Ok(resolved)
}

/// Multi-criterion semi-supervised labeler.
///
/// Every criterion column is thresholded into pass / fail / unknown, the
/// unknowns are resolved by label propagation over the feature graph, and the
/// resolved columns are combined into one verdict per sample.
pub struct WeldLabelPropagation {
    thresholds: Thresholds,
    config: LearnerConfig,
    hooks: Box<dyn LabelingHooks>,
    fitted: Option<FittedState>,
}

impl WeldLabelPropagation {
    /// Create a new learner
    ///
    /// # Arguments
    ///
    /// * `thresholds` - Cutoff table; every criterion passed to `fit` needs an entry
    /// * `config` - Classifier and learner parameters
    pub fn new(thresholds: Thresholds, config: LearnerConfig) -> Self {
        WeldLabelPropagation {
            thresholds,
            config,
            hooks: Box::new(LogHooks),
            fitted: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Box<dyn LabelingHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn state(&self) -> LearnerState {
        match &self.fitted {
            None => LearnerState::Unfitted,
            Some(FittedState { report: None, .. }) => LearnerState::Fitted,
            Some(FittedState { report: Some(_), .. }) => LearnerState::Evaluated,
        }
    }

    pub fn fitted_labels(&self) -> Option<&FittedLabels> {
        self.fitted.as_ref().map(|f| &f.labels)
    }

    pub fn combined_labels(&self) -> Option<&Array1<i32>> {
        self.fitted_labels().map(|l| &l.combined)
    }

    pub fn resolved_labels(&self) -> Option<&LabelTable> {
        self.fitted_labels().map(|l| &l.resolved)
    }

    /// Report from the most recent `avg_accuracy` call.
    pub fn accuracy_report(&self) -> Option<&AccuracyReport> {
        self.fitted.as_ref().and_then(|f| f.report.as_ref())
    }

    fn prepare_features(&self, x: &Array2<f64>, scaler: Option<&Scaler>) -> Result<Array2<f64>> {
        match scaler {
            Some(sc) => transform_all(x, sc),
            None => Ok(x.to_owned()),
        }
    }

    /// Fit the learner
    ///
    /// Criteria are processed strictly in the column order of `y`. The input
    /// frame is left untouched; resolved columns are collected in a separate
    /// `LabelTable`. A failed fit leaves any previous fit in place.
    ///
    /// # Arguments
    ///
    /// * `x` - Continuous features without missing values, shape (n_samples, n_features)
    /// * `y` - Raw criterion measurements with the same rows as `x`
    ///
    /// # Returns
    ///
    /// The combined verdict and the resolved per-criterion labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &TargetFrame) -> Result<&FittedLabels> {
        if y.ncols() == 0 {
            return Err(WeldError::precondition("fit", "no criterion columns to fit"));
        }
        if x.nrows() != y.nrows() {
            return Err(WeldError::shape("target rows", x.nrows(), y.nrows()));
        }
        validate_features(x, "fit")?;

        let (scaler, features) = if self.config.scale_features {
            let (sc, scaled) = fit_transform(x)?;
            (Some(sc), scaled)
        } else {
            (None, x.to_owned())
        };

        y.log_input_data_summary();

        let mut resolved = LabelTable::new();
        let mut shared = build_model(self.config.model.clone());
        let mut per_criterion = Vec::new();
        let n_criteria = y.ncols();

        for (idx, (criterion, values)) in y.iter().enumerate() {
            log::info!(
                "Propagating labels for criterion '{}' ({}/{})",
                criterion,
                idx + 1,
                n_criteria
            );

            let labels = binarize_criterion(
                criterion,
                values.view(),
                &self.thresholds,
                self.hooks.as_ref(),
            )?;

            let column = match self.config.classifier_scope {
                ClassifierScope::Shared => propagate_column(
                    shared.as_mut(),
                    criterion,
                    &features,
                    &labels,
                    self.hooks.as_ref(),
                )?,
                ClassifierScope::PerCriterion => {
                    let mut model = build_model(self.config.model.clone());
                    let column = propagate_column(
                        model.as_mut(),
                        criterion,
                        &features,
                        &labels,
                        self.hooks.as_ref(),
                    )?;
                    per_criterion.push((criterion.to_string(), model));
                    column
                }
            };

            resolved.insert(criterion, column)?;
        }

        let combined = combine_labels(&resolved)?;
        log::info!(
            "Combined verdict: {} of {} samples pass",
            count_label(&combined, PASS),
            combined.len()
        );

        let classifiers = match self.config.classifier_scope {
            ClassifierScope::Shared => FittedClassifiers::Shared(shared),
            ClassifierScope::PerCriterion => FittedClassifiers::PerCriterion(per_criterion),
        };

        let state = self.fitted.insert(FittedState {
            labels: FittedLabels { combined, resolved },
            classifiers,
            scaler,
            report: None,
        });

        Ok(&state.labels)
    }

    /// Mean accuracy of the fitted classifier(s) on held-out samples.
    ///
    /// Each criterion of `y` is thresholded with the same cutoff used for
    /// fitting and compared against the classifier's prediction for `x`.
    /// With `ClassifierScope::Shared` every criterion is predicted by the
    /// classifier state left by the last fitted criterion. Held-out samples
    /// with a missing measurement are labeled -1 and always count as misses.
    ///
    /// Per-criterion accuracies are kept and available through
    /// [`accuracy_report`](Self::accuracy_report).
    pub fn avg_accuracy(&mut self, x: &Array2<f64>, y: &TargetFrame) -> Result<f64> {
        let state = self.state();
        let fitted = self.fitted.as_ref().ok_or_else(|| WeldError::State {
            expected: LearnerState::Fitted.to_string(),
            found: state.to_string(),
        })?;

        if y.ncols() == 0 {
            return Err(WeldError::precondition("evaluate", "no criterion columns to evaluate"));
        }
        if x.nrows() != y.nrows() {
            return Err(WeldError::shape("held-out target rows", x.nrows(), y.nrows()));
        }
        validate_features(x, "evaluate")?;
        let features = self.prepare_features(x, fitted.scaler.as_ref())?;

        let mut per_criterion = Vec::with_capacity(y.ncols());
        for (criterion, values) in y.iter() {
            let model = fitted.classifiers.for_criterion(criterion)?;
            let predicted = model.predict(&features)?;

            let truth = binarize_criterion(
                criterion,
                values.view(),
                &self.thresholds,
                self.hooks.as_ref(),
            )?;
            let accuracy = accuracy_score(truth.view(), predicted.view())?;

            self.hooks.on_evaluated(&EvaluatedEvent {
                criterion: criterion.to_string(),
                accuracy,
                n_samples: truth.len(),
            });
            per_criterion.push(CriterionAccuracy {
                criterion: criterion.to_string(),
                accuracy,
            });
        }

        let accuracies: Vec<f64> = per_criterion.iter().map(|c| c.accuracy).collect();
        let mean = mean_accuracy(&accuracies)?;
        log::info!(
            "Mean accuracy over {} criteria: {:.4}",
            accuracies.len(),
            mean
        );

        if let Some(fitted) = self.fitted.as_mut() {
            fitted.report = Some(AccuracyReport {
                per_criterion,
                mean,
            });
        }

        Ok(mean)
    }
}
