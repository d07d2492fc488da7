//! Tests for the run orchestrator and the experiment runner

mod common;

use common::RecordingObserver;
use meta_trace::{
    Termination,
    adapters::CategoricalSampler,
    mta::{MtaConfig, MtaController},
    pipeline::{
        Algorithm, EpisodeRecord, ErrorMetric, ExperimentConfig, ExperimentRunner,
        JsonlObserver, MetricsObserver, RandomWalkTask, RunSetup, TrainingConfig,
        TrainingPipeline, TrainingResult,
    },
    td::{LambdaConfig, LambdaFunction, TogtdConfig},
};
use tempfile::tempdir;

fn train_mta(seed: u64, episodes: usize) -> TrainingResult {
    let task = RandomWalkTask::default().with_policies(0.6, 0.5);
    let mut scenario = task.scenario().unwrap();
    let mut agent =
        MtaController::new(MtaConfig::default(), LambdaFunction::constant(5, 0.9)).unwrap();
    let mut sampler = CategoricalSampler::seeded(seed);
    let mut pipeline = TrainingPipeline::new(TrainingConfig::default().with_episodes(episodes));
    pipeline.run(&mut agent, &mut scenario, &mut sampler).unwrap()
}

fn experiment_config(runs: usize, threads: usize) -> ExperimentConfig {
    ExperimentConfig::default()
        .with_runs(runs)
        .with_threads(threads)
        .with_training(
            TrainingConfig::default()
                .with_episodes(40)
                .with_seed(9),
        )
        .with_algorithm(Algorithm::Togtd(TogtdConfig::default()))
        .with_lambda(LambdaConfig::Constant { value: 0.8 })
}

fn walk_setup(config: &ExperimentConfig, seed: Option<u64>) -> meta_trace::Result<RunSetup> {
    let task = RandomWalkTask::default();
    Ok(RunSetup::new(
        config.build_learner(task.states)?,
        task.scenario()?,
        Box::new(CategoricalSampler::new(seed)),
    ))
}

#[test]
fn same_seed_gives_identical_runs() {
    let first = train_mta(5, 60);
    let second = train_mta(5, 60);
    assert_eq!(first, second);
    assert_eq!(first.final_weights, second.final_weights);
}

#[test]
fn different_seeds_diverge() {
    let first = train_mta(5, 60);
    let second = train_mta(6, 60);
    assert_ne!(first.final_weights, second.final_weights);
}

#[test]
fn evaluator_reading_is_recorded_per_episode() {
    let result = train_mta(1, 25);
    assert_eq!(result.evaluations.len(), 25);
    assert_eq!(result.evaluations[0], 0.0);
    for (summary, evaluation) in result.episodes.iter().zip(&result.evaluations) {
        assert_eq!(summary.evaluation, Some(*evaluation));
    }
}

#[test]
fn observers_see_every_committed_step() {
    let task = RandomWalkTask::default();
    let mut scenario = task.scenario().unwrap();
    let mut agent =
        MtaController::new(MtaConfig::default(), LambdaFunction::constant(5, 0.9)).unwrap();
    let mut sampler = CategoricalSampler::seeded(3);
    let (observer, recording) = RecordingObserver::new();
    let mut pipeline = TrainingPipeline::new(TrainingConfig::default().with_episodes(15))
        .with_observer(Box::new(observer))
        .with_observer(Box::new(MetricsObserver::new()));

    let result = pipeline.run(&mut agent, &mut scenario, &mut sampler).unwrap();

    let recording = recording.lock().unwrap();
    assert_eq!(recording.training_starts, 1);
    assert_eq!(recording.training_ends, 1);
    assert_eq!(recording.episode_starts, (0..15).collect::<Vec<_>>());
    assert_eq!(recording.steps.len(), result.total_steps());
    assert_eq!(recording.episodes, result.episodes);

    for summary in &recording.episodes {
        assert_eq!(summary.termination, Termination::Terminal);
        let steps: Vec<_> = recording
            .steps
            .iter()
            .filter(|s| s.episode == summary.episode)
            .collect();
        assert_eq!(steps.len(), summary.steps);
        // episodes start in the middle and end at either end
        assert_eq!(steps[0].observation, 2);
        let last = steps[steps.len() - 1];
        assert!(last.next_observation == 0 || last.next_observation == 4);
        assert_eq!(last.reward, if last.next_observation == 4 { 1.0 } else { 0.0 });
    }
}

#[test]
fn jsonl_observer_writes_steps_when_asked() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("episodes.jsonl");
    let task = RandomWalkTask::default();
    let mut scenario = task.scenario().unwrap();
    let mut agent =
        MtaController::new(MtaConfig::default(), LambdaFunction::constant(5, 0.9)).unwrap();
    let mut sampler = CategoricalSampler::seeded(8);
    let observer = JsonlObserver::new(&path).unwrap().with_steps();
    let mut pipeline = TrainingPipeline::new(TrainingConfig::default().with_episodes(6))
        .with_observer(Box::new(observer));

    let result = pipeline.run(&mut agent, &mut scenario, &mut sampler).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let records: Vec<EpisodeRecord> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 6);
    for (record, summary) in records.iter().zip(&result.episodes) {
        assert_eq!(&record.summary, summary);
        assert_eq!(record.transitions.len(), summary.steps);
    }
}

#[test]
fn training_result_round_trips_through_json() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("result.json");
    let result = train_mta(2, 10);

    result.save(&path).unwrap();
    let loaded = TrainingResult::load(&path).unwrap();

    assert_eq!(loaded, result);
    assert_eq!(loaded.snapshots.len(), 10);
    assert_eq!(loaded.learner, "mta");
}

#[test]
fn experiment_results_are_independent_of_thread_count() {
    let sequential_config = experiment_config(6, 1);
    let parallel_config = experiment_config(6, 4);

    let sequential = ExperimentRunner::new(sequential_config.clone())
        .run(|_, seed| walk_setup(&sequential_config, seed))
        .unwrap();
    let parallel = ExperimentRunner::new(parallel_config.clone())
        .run(|_, seed| walk_setup(&parallel_config, seed))
        .unwrap();

    assert_eq!(sequential.metric, ErrorMetric::Evaluation);
    assert_eq!(sequential.errors, parallel.errors);
    for (a, b) in sequential.runs.iter().zip(&parallel.runs) {
        assert_eq!(a.final_weights, b.final_weights);
    }
}

#[test]
fn experiment_runs_use_offset_seeds_in_order() {
    let config = experiment_config(3, 3);
    let result = ExperimentRunner::new(config.clone())
        .run(|_, seed| walk_setup(&config, seed))
        .unwrap();

    for (run_index, run) in result.runs.iter().enumerate() {
        let alone = {
            let mut setup = walk_setup(&config, Some(9 + run_index as u64)).unwrap();
            let mut pipeline = TrainingPipeline::new(config.training.clone());
            pipeline
                .run(
                    setup.agent.as_mut(),
                    &mut setup.scenario,
                    setup.sampler.as_mut(),
                )
                .unwrap()
        };
        assert_eq!(run, &alone);
    }
}

#[test]
fn ground_truth_switches_to_weighted_mse() {
    let config = experiment_config(2, 2);
    let truth = RandomWalkTask::default().ground_truth().unwrap();
    let result = ExperimentRunner::new(config.clone())
        .with_ground_truth(truth.clone())
        .run(|_, seed| walk_setup(&config, seed))
        .unwrap();

    assert_eq!(result.metric, ErrorMetric::WeightedMse);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].len(), 40);
    // zero weights score the distribution-weighted mean of v²
    let expected: f64 = truth
        .values
        .iter()
        .zip(&truth.distribution)
        .map(|(v, d)| d * v * v)
        .sum();
    assert!((result.errors[0][0] - expected).abs() < 1e-12);

    let summary = result.summary();
    assert_eq!(summary.len(), 40);
    assert!(summary.iter().all(|s| s.runs == 2));
}

#[test]
fn experiment_summary_csv_has_one_row_per_episode() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("curve.csv");
    let config = experiment_config(2, 1);
    let result = ExperimentRunner::new(config.clone())
        .run(|_, seed| walk_setup(&config, seed))
        .unwrap();

    result.write_csv(&path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["episode", "runs", "mean", "std_error", "ci95"]
    );
    assert_eq!(reader.records().count(), 40);
}
