//! Integration tests for run config parsing, data loading and output writing.

use weld_propagation::config::{ClassifierScope, ModelType};
use weld_propagation_cli::label::input::LabelRunConfig;
use weld_propagation_cli::label::load_data::load_label_data;
use weld_propagation_cli::label::run::run_labeling;
use weld_propagation_cli::util::{delimiter_for, is_missing, validate_tsv_or_csv_file};

const DATA: &str = "\
id,Current,Voltage,Operator,Tensile,Bend
a,100.0,20.0,ann,60,0.9
b,101.0,20.5,bob,,0.8
c,100.5,20.2,ann,61,
d,102.0,21.0,bob,62,0.7
e,100.2,20.1,ann,63,0.9
f,200.0,40.0,bob,10,0.1
g,201.0,40.5,ann,12,
h,200.5,40.2,bob,,0.2
i,202.0,41.0,ann,11,0.0
j,200.2,40.1,bob,9,0.1
k,,40.3,ann,8,0.1
";

fn thresholds_json() -> &'static str {
    r#"{"Tensile": {"AWS": 50.0, "ISO": 55.0}, "Bend": {"AWS": 0.5}}"#
}

// ---------------------------------------------------------------------------
// util helpers
// ---------------------------------------------------------------------------

#[test]
fn validate_csv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(path.to_str().unwrap()).is_ok());
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(path.to_str().unwrap()).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_tsv_or_csv_file("/nonexistent/path/data.tsv").is_err());
}

#[test]
fn delimiter_and_missing_markers() {
    assert_eq!(delimiter_for("a.tsv"), b'\t');
    assert_eq!(delimiter_for("a.TSV"), b'\t');
    assert_eq!(delimiter_for("a.csv"), b',');
    assert!(is_missing(""));
    assert!(is_missing(" NA "));
    assert!(is_missing("NaN"));
    assert!(!is_missing("0"));
}

// ---------------------------------------------------------------------------
// LabelRunConfig
// ---------------------------------------------------------------------------

#[test]
fn config_defaults_missing_fields_and_keeps_threshold_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(&path, format!(r#"{{"thresholds": {}}}"#, thresholds_json())).unwrap();

    let config = LabelRunConfig::from_file(&path).unwrap();
    assert_eq!(config.criteria(), vec!["Tensile".to_string(), "Bend".to_string()]);
    assert_eq!(config.thresholds.cutoff("Tensile").unwrap(), 50.0);
    assert!((config.test_ratio - 0.3).abs() < 1e-12);
    assert_eq!(config.seed, 42);
    assert_eq!(config.learner.model.model_type, ModelType::Knn { n_neighbors: 25 });
}

#[test]
fn config_without_thresholds_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(&path, r#"{"seed": 1}"#).unwrap();
    assert!(LabelRunConfig::from_file(&path).is_err());
}

#[test]
fn config_reads_learner_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    let json = format!(
        r#"{{
            "thresholds": {},
            "target_columns": ["Bend", "Tensile"],
            "learner": {{
                "model": {{"max_iter": 50, "tol": 0.01, "Rbf": {{"gamma": 2.0}}}},
                "classifier_scope": "per_criterion"
            }}
        }}"#,
        thresholds_json()
    );
    std::fs::write(&path, json).unwrap();

    let config = LabelRunConfig::from_file(&path).unwrap();
    assert_eq!(config.criteria(), vec!["Bend".to_string(), "Tensile".to_string()]);
    assert_eq!(config.learner.model.model_type, ModelType::Rbf { gamma: 2.0 });
    assert_eq!(config.learner.model.max_iter, 50);
    assert_eq!(config.learner.classifier_scope, ClassifierScope::PerCriterion);
}

#[test]
fn config_keeps_partial_learner_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    let json = format!(
        r#"{{
            "thresholds": {},
            "learner": {{"classifier_scope": "per_criterion", "model": {{"Rbf": {{"gamma": 5.0}}}}}}
        }}"#,
        thresholds_json()
    );
    std::fs::write(&path, json).unwrap();

    let config = LabelRunConfig::from_file(&path).unwrap();
    assert_eq!(config.learner.classifier_scope, ClassifierScope::PerCriterion);
    assert_eq!(config.learner.model.model_type, ModelType::Rbf { gamma: 5.0 });
    assert_eq!(config.learner.model.max_iter, 1000);
}

#[test]
fn config_with_invalid_learner_section_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    let json = format!(
        r#"{{"thresholds": {}, "learner": {{"classifier_scope": "per_row"}}}}"#,
        thresholds_json()
    );
    std::fs::write(&path, json).unwrap();

    let err = LabelRunConfig::from_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid 'learner' section"));
}

// ---------------------------------------------------------------------------
// Data loading and full run
// ---------------------------------------------------------------------------

#[test]
fn loader_selects_numeric_features_and_drops_incomplete_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("welds.csv");
    std::fs::write(&path, DATA).unwrap();

    let criteria = vec!["Tensile".to_string(), "Bend".to_string()];
    let data = load_label_data(&path, &criteria).unwrap();

    assert_eq!(data.feature_names, vec!["Current".to_string(), "Voltage".to_string()]);
    assert_eq!(data.x.dim(), (10, 2));
    assert_eq!(data.row_ids, (0..10).collect::<Vec<_>>());
    let tensile = data.y.column("Tensile").unwrap();
    assert!(tensile[1].is_nan());
    assert_eq!(tensile[0], 60.0);
}

#[test]
fn loader_requires_target_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("welds.csv");
    std::fs::write(&path, DATA).unwrap();
    assert!(load_label_data(&path, &["Porosity".to_string()]).is_err());
}

#[test]
fn run_writes_labels_and_accuracy() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("welds.csv");
    std::fs::write(&data_path, DATA).unwrap();

    let mut config = LabelRunConfig::default();
    config.data = data_path.to_str().unwrap().to_string();
    config.thresholds = serde_json::from_str(thresholds_json()).unwrap();
    config.output_file = dir.path().join("labels.csv").to_str().unwrap().to_string();
    config.accuracy_file = dir.path().join("accuracy.json").to_str().unwrap().to_string();
    config.learner.scale_features = true;
    config.test_ratio = 0.3;

    let summary = run_labeling(&config).unwrap();
    // 6 fully observed samples -> 2 held out
    assert_eq!(summary.n_test, 2);
    assert_eq!(summary.n_train, 8);
    assert!((0.0..=1.0).contains(&summary.report.mean));

    let labels = std::fs::read_to_string(&config.output_file).unwrap();
    let mut lines = labels.lines();
    assert_eq!(lines.next(), Some("row,Passed Tensile,Passed Bend,Combined"));
    assert_eq!(lines.count(), 8);

    let accuracy: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.accuracy_file).unwrap()).unwrap();
    assert_eq!(accuracy["per_criterion"].as_array().unwrap().len(), 2);
}
