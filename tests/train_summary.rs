use clap::Parser;
use meta_trace::{
    cli::commands::train::{TrainArgs, execute},
    pipeline::{Algorithm, ExperimentConfig, TrainingConfig},
    td::TogtdConfig,
};
use tempfile::tempdir;

fn parse_args<I, T>(args: I) -> TrainArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    TrainArgs::parse_from(args)
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
    let contents = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&contents).unwrap()
}

#[test]
fn summary_without_extension_appends_json() {
    let tmp = tempdir().unwrap();
    let summary_stem = tmp.path().join("run_overview");

    let args = parse_args([
        "meta-trace-train",
        "togtd",
        "--episodes",
        "20",
        "--runs",
        "2",
        "--seed",
        "3",
        "--summary",
        summary_stem.to_str().unwrap(),
    ]);

    execute(args).expect("training with summary should succeed");

    let expected_path = summary_stem.with_extension("json");
    assert!(
        expected_path.exists(),
        "expected summary at {}",
        expected_path.display()
    );

    let parsed = read_json(&expected_path);
    assert_eq!(parsed["algorithm"], "togtd");
    assert_eq!(parsed["config"]["training"]["episodes"], 20);
    assert_eq!(parsed["runs"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["ground_truth"]["values"].as_array().unwrap().len(), 5);
}

#[test]
fn summary_directory_argument_creates_default_file() {
    let tmp = tempdir().unwrap();
    let summary_dir = tmp.path().join("summaries");
    let summary_arg = format!("{}/", summary_dir.display());

    let args = parse_args([
        "meta-trace-train",
        "mta",
        "--episodes",
        "10",
        "--runs",
        "1",
        "--seed",
        "4",
        "--summary",
        &summary_arg,
    ]);

    execute(args).expect("training with directory summary should succeed");

    let expected_path = summary_dir.join("training_summary.json");
    assert!(
        expected_path.exists(),
        "expected summary at {}",
        expected_path.display()
    );

    let parsed = read_json(&expected_path);
    assert_eq!(parsed["algorithm"], "mta");
    assert_eq!(parsed["config"]["algorithm"]["kind"], "mta");
}

#[test]
fn csv_and_observation_artifacts_are_written() {
    let tmp = tempdir().unwrap();
    let csv_path = tmp.path().join("curves").join("mse.csv");
    let observations = tmp.path().join("episodes");

    let args = parse_args([
        "meta-trace-train",
        "mta",
        "--episodes",
        "12",
        "--runs",
        "2",
        "--threads",
        "2",
        "--seed",
        "5",
        "--csv",
        csv_path.to_str().unwrap(),
        "--observations",
        observations.to_str().unwrap(),
        "--record-steps",
    ]);

    execute(args).expect("training with artifacts should succeed");

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 13);
    assert!(csv.starts_with("episode,runs,mean,std_error,ci95"));

    for run in ["run-000.jsonl", "run-001.jsonl"] {
        let log = std::fs::read_to_string(observations.join(run)).unwrap();
        assert_eq!(log.lines().count(), 12);
        let first: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
        assert_eq!(first["episode"], 0);
        assert!(first["steps"].as_u64().unwrap() >= 2);
        assert_eq!(
            first["transitions"].as_array().unwrap().len() as u64,
            first["steps"].as_u64().unwrap()
        );
    }
}

#[test]
fn config_file_supplies_defaults_that_flags_override() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("experiment.json");
    let summary_path = tmp.path().join("summary.json");
    ExperimentConfig::default()
        .with_runs(3)
        .with_training(TrainingConfig::default().with_episodes(8).with_seed(1))
        .with_algorithm(Algorithm::Togtd(TogtdConfig::new(0.2, 0.01)))
        .save(&config_path)
        .unwrap();

    let args = parse_args([
        "meta-trace-train",
        "togtd",
        "--config",
        config_path.to_str().unwrap(),
        "--runs",
        "2",
        "--summary",
        summary_path.to_str().unwrap(),
    ]);

    execute(args).expect("training from a config file should succeed");

    let parsed = read_json(&summary_path);
    assert_eq!(parsed["config"]["runs"], 2);
    assert_eq!(parsed["config"]["training"]["episodes"], 8);
    assert_eq!(parsed["config"]["algorithm"]["alpha"], 0.2);
    assert_eq!(parsed["runs"].as_array().unwrap().len(), 2);
}

#[test]
fn unsupported_policy_is_rejected() {
    let args = parse_args([
        "meta-trace-train",
        "togtd",
        "--episodes",
        "1",
        "--target-right",
        "0.5",
        "--behavior-right",
        "1.0",
    ]);

    assert!(execute(args).is_err());
}
