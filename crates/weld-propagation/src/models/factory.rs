use crate::config::ModelConfig;
use crate::models::classifier_trait::SemiSupervisedModel;
use crate::models::label_propagation::LabelPropagation;

/// Build a boxed classifier model from a `ModelConfig`.
/// Both kernels are served by the same propagation model; the kernel only
/// changes how the graph is built.
pub fn build_model(params: ModelConfig) -> Box<dyn SemiSupervisedModel> {
    Box::new(LabelPropagation::new(params))
}
