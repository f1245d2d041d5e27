use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use weld_propagation::config::{ClassifierScope, LearnerConfig, ModelType};
use weld_propagation::thresholds::Thresholds;

use crate::util::validate_tsv_or_csv_file;

/// Parameters of one `weldprop label` run.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LabelRunConfig {
    pub version: String,
    /// CSV/TSV with feature columns and one column per criterion.
    pub data: String,
    pub thresholds: Thresholds,
    /// Criterion columns in processing order. Defaults to the threshold order.
    pub target_columns: Option<Vec<String>>,
    pub test_ratio: f64,
    pub seed: u64,
    pub output_file: String,
    pub accuracy_file: String,
    pub learner: LearnerConfig,
}

impl Default for LabelRunConfig {
    fn default() -> Self {
        LabelRunConfig {
            version: clap::crate_version!().to_string(),
            data: String::new(),
            thresholds: Thresholds::new(),
            target_columns: None,
            test_ratio: 0.3,
            seed: 42,
            output_file: String::from("weldprop_labels.csv"),
            accuracy_file: String::from("weldprop_accuracy.json"),
            learner: LearnerConfig::default(),
        }
    }
}

impl LabelRunConfig {
    /// Criterion columns in the order they are fitted.
    pub fn criteria(&self) -> Vec<String> {
        match &self.target_columns {
            Some(columns) => columns.clone(),
            None => self.thresholds.criteria().map(str::to_string).collect(),
        }
    }

    /// Read a JSON config, falling back to defaults field by field.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let partial: serde_json::Value = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        let mut config = LabelRunConfig::default();

        macro_rules! load_or_default {
            ($field:ident) => {
                if let Some(val) = partial.get(stringify!($field)) {
                    if let Ok(parsed) = serde_json::from_value(val.clone()) {
                        config.$field = parsed;
                    } else {
                        log::warn!(
                            "Config Invalid value for '{}', using default: {:?}",
                            stringify!($field), config.$field
                        );
                    }
                } else {
                    log::warn!(
                        "Config Missing field '{}', using default: {:?}",
                        stringify!($field), config.$field
                    );
                }
            };
        }

        load_or_default!(data);
        load_or_default!(target_columns);
        load_or_default!(test_ratio);
        load_or_default!(seed);
        load_or_default!(output_file);
        load_or_default!(accuracy_file);

        // A learner section that is present but malformed must not silently
        // fall back to the default classifier.
        match partial.get("learner") {
            Some(learner) => {
                config.learner = serde_json::from_value(learner.clone())
                    .with_context(|| format!("Invalid 'learner' section in {:?}", config_path))?;
            }
            None => log::warn!(
                "Config Missing field 'learner', using default: {:?}",
                config.learner
            ),
        }

        // A broken threshold table must not silently become an empty one.
        let thresholds = partial
            .get("thresholds")
            .with_context(|| format!("Config {:?} has no 'thresholds' table", config_path))?;
        config.thresholds = serde_json::from_value(thresholds.clone())
            .with_context(|| format!("Invalid 'thresholds' table in {:?}", config_path))?;

        Ok(config)
    }

    pub fn from_arguments<P: AsRef<Path>>(config_path: P, matches: &ArgMatches) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;

        // Apply CLI overrides
        if let Some(data) = matches.get_one::<String>("data") {
            config.data = data.clone();
        }
        validate_tsv_or_csv_file(&config.data)?;

        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = output_file.clone();
        }
        if let Some(accuracy_file) = matches.get_one::<String>("accuracy_file") {
            config.accuracy_file = accuracy_file.clone();
        }
        if let Some(model_type) = matches.get_one::<String>("model_type") {
            config.learner.model.model_type =
                ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
        }
        if let Some(test_ratio) = matches.get_one::<f64>("test_ratio") {
            config.test_ratio = *test_ratio;
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.seed = *seed;
        }
        if matches.get_flag("per_criterion") {
            config.learner.classifier_scope = ClassifierScope::PerCriterion;
        }
        if matches.get_flag("scale_features") {
            config.learner.scale_features = true;
        }

        Ok(config)
    }
}
