use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use weld_propagation_cli::label::input::LabelRunConfig;
use weld_propagation_cli::label::run::run_labeling;

fn main() -> Result<()> {
    let matches = Command::new("weldprop")
        .version(clap::crate_version!())
        .about("Multi-criterion semi-supervised pass/fail labeling for weld quality data")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v debug, -vv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("label")
                .about("Threshold, propagate and combine criterion labels, then score them")
                .arg(
                    Arg::new("config")
                        .help("Path to the JSON run configuration file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the CSV/TSV dataset. Overrides the data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path for the resolved label table (*.csv or *.tsv)")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("accuracy_file")
                        .long("accuracy-output")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path for the JSON accuracy report")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("model_type")
                        .long("model-type")
                        .help("Override the propagation kernel from the JSON config.")
                        .value_parser(["knn", "rbf"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("test_ratio")
                        .long("test-ratio")
                        .help("Fraction of fully observed samples held out for evaluation")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the held-out sampler")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("per_criterion")
                        .long("per-criterion")
                        .help("Keep one fitted classifier per criterion for evaluation.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("scale_features")
                        .long("scale-features")
                        .help("Standardize features before building the propagation graph.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("thresholds")
                .about("Print the cutoff used for every criterion of a configuration")
                .arg(
                    Arg::new("config")
                        .help("Path to the JSON run configuration file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .get_matches();

    init_logging(matches.get_count("verbose"));

    match matches.subcommand() {
        Some(("label", label_matches)) => handle_label(label_matches),
        Some(("thresholds", threshold_matches)) => handle_thresholds(threshold_matches),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn init_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::default();
    builder
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("WELDPROP_LOG", "error,weld=info"));
    match verbosity {
        0 => {}
        1 => {
            builder.filter_module("weld", LevelFilter::Debug);
        }
        _ => {
            builder.filter_module("weld", LevelFilter::Trace);
        }
    }
    builder.init();
}

fn handle_label(matches: &ArgMatches) -> Result<()> {
    let config_path: &PathBuf = matches
        .get_one("config")
        .ok_or_else(|| anyhow::anyhow!("missing config path"))?;
    log::info!("[WeldProp::Label] Labeling using config: {:?}", config_path);

    let config = LabelRunConfig::from_arguments(config_path, matches)?;

    match run_labeling(&config) {
        Ok(summary) => {
            eprintln!(
                "[WeldProp::Label] {} training samples labeled ({} pass combined), {} held out.",
                summary.n_train, summary.n_combined_pass, summary.n_test
            );
            for criterion in &summary.report.per_criterion {
                eprintln!(
                    "[WeldProp::Label]   {:<24} accuracy {:.4}",
                    criterion.criterion, criterion.accuracy
                );
            }
            eprintln!(
                "[WeldProp::Label] Mean accuracy: {:.4}",
                summary.report.mean
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Labeling failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_thresholds(matches: &ArgMatches) -> Result<()> {
    let config_path: &PathBuf = matches
        .get_one("config")
        .ok_or_else(|| anyhow::anyhow!("missing config path"))?;
    let config = LabelRunConfig::from_file(config_path)?;

    for criterion in config.criteria() {
        match config.thresholds.cutoff(&criterion) {
            Ok(cutoff) => println!("{}\t{}", criterion, cutoff),
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1)
            }
        }
    }
    Ok(())
}
