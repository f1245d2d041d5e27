//! weld-propagation: multi-criterion semi-supervised pass/fail labeling.
//!
//! Each quality criterion (a continuous measurement with gaps) is thresholded
//! into pass / fail / unknown, the unknowns are resolved by graph-based label
//! propagation over the feature matrix, and the resolved criteria are combined
//! into one verdict per sample. A held-out evaluation reports per-criterion
//! and mean accuracy.
//!
//! The entry point is [`weld_learner::WeldLabelPropagation`].
pub mod binarize;
pub mod combine;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod hooks;
pub mod models;
pub mod preprocessing;
pub mod stats;
pub mod thresholds;
pub mod weld_learner;

pub use error::{Result, WeldError};
