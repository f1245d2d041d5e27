//! weld-propagation-cli: dataset loading, run configuration and output
//! writing around the `weld-propagation` learner.
pub mod label;
pub mod util;
