//! Random-walk convergence of both learners against exact values

mod common;

use common::{l2_distance, mean_tail_snapshot};
use meta_trace::{
    adapters::CategoricalSampler,
    analysis::tail_mean,
    mta::MtaConfig,
    pipeline::{
        Algorithm, ExperimentConfig, ExperimentResult, ExperimentRunner, RandomWalkTask, RunSetup,
        TrainingConfig,
    },
    td::{LambdaConfig, TogtdConfig},
    utils::logit,
};

const EPISODES: usize = 1000;
const RUNS: usize = 8;

fn run_experiment(
    task: &RandomWalkTask,
    algorithm: Algorithm,
    lambda: LambdaConfig,
) -> ExperimentResult {
    let config = ExperimentConfig::default()
        .with_runs(RUNS)
        .with_threads(4)
        .with_training(
            TrainingConfig::default()
                .with_episodes(EPISODES)
                .with_seed(2024),
        )
        .with_algorithm(algorithm)
        .with_lambda(lambda);
    let truth = task.ground_truth().unwrap();

    ExperimentRunner::new(config.clone())
        .with_ground_truth(truth)
        .run(|_, seed| {
            Ok(RunSetup::new(
                config.build_learner(task.states)?,
                task.scenario()?,
                Box::new(CategoricalSampler::new(seed)),
            ))
        })
        .unwrap()
}

fn assert_converged(task: &RandomWalkTask, result: &ExperimentResult) {
    let truth = task.ground_truth().unwrap();
    let snapshots: Vec<Vec<Vec<f64>>> =
        result.runs.iter().map(|r| r.snapshots.clone()).collect();
    let averaged = mean_tail_snapshot(&snapshots, 200);
    let distance = l2_distance(&averaged, &truth.values);
    assert!(
        distance < 0.05,
        "averaged late weights {averaged:?} are {distance} from {:?}",
        truth.values
    );

    for run in &result.runs {
        let last = run.snapshots.last().unwrap();
        assert!(
            l2_distance(last, &truth.values) < 0.2,
            "single run ended at {last:?}"
        );
    }
}

#[test]
fn fixed_lambda_converges_on_policy() {
    let task = RandomWalkTask::default();
    let result = run_experiment(
        &task,
        Algorithm::Togtd(TogtdConfig::new(0.05, 0.05)),
        LambdaConfig::Constant { value: 0.9 },
    );
    assert_converged(&task, &result);
}

#[test]
fn adaptive_lambda_converges_on_policy() {
    let task = RandomWalkTask::default();
    let result = run_experiment(
        &task,
        Algorithm::Mta(MtaConfig::default().with_step_sizes(0.05, 0.05)),
        LambdaConfig::Adaptive {
            approximator: Default::default(),
            init: logit(0.9),
        },
    );
    assert_converged(&task, &result);
    assert!(result.runs.iter().all(|r| r.halted_episodes() == 0));
}

#[test]
fn off_policy_error_shrinks() {
    let task = RandomWalkTask::default().with_policies(0.6, 0.5);
    let result = run_experiment(
        &task,
        Algorithm::Mta(MtaConfig::default()),
        LambdaConfig::Adaptive {
            approximator: Default::default(),
            init: logit(0.9),
        },
    );

    let stats = result.summary();
    let initial = stats[0].mean;
    let late: Vec<f64> = stats.iter().map(|s| s.mean).collect();
    let late = tail_mean(&late, 200);
    assert!(initial > 0.0);
    assert!(
        late < 0.5 * initial,
        "late error {late} not below half of initial {initial}"
    );
}
