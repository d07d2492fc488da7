//! Parallel multi-run experiments
//!
//! Each run gets a private scenario, learner and sampler built by a factory,
//! runs strictly sequentially on one worker, and shares nothing with the
//! other runs. Results are gathered once, in run order.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::training::{Scenario, TrainingConfig, TrainingPipeline, TrainingResult};
use crate::{
    Error, Result,
    analysis::{EpisodeStats, GroundTruth, summarize},
    mta::{MtaConfig, MtaController},
    ports::{ActionSampler, Learner, Observer},
    td::{LambdaConfig, LambdaFunction, TogtdAgent, TogtdConfig},
};

/// Which learner an experiment trains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Algorithm {
    /// Meta-trace adaptation on top of true-online GTD(λ)
    Mta(MtaConfig),
    /// True-online GTD(λ) with a fixed λ(x)
    Togtd(TogtdConfig),
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Mta(MtaConfig::default())
    }
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Mta(_) => "mta",
            Algorithm::Togtd(_) => "togtd",
        }
    }

    /// Build a fresh learner over `lambda`'s feature dimension.
    pub fn build(&self, lambda: LambdaFunction) -> Result<Box<dyn Learner>> {
        Ok(match self {
            Algorithm::Mta(config) => Box::new(MtaController::new(*config, lambda)?),
            Algorithm::Togtd(config) => Box::new(TogtdAgent::new(*config, lambda)?),
        })
    }
}

/// Experiment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Number of independent runs
    pub runs: usize,

    /// Worker threads (0 lets rayon decide)
    pub threads: usize,

    pub training: TrainingConfig,

    pub algorithm: Algorithm,

    /// Initial λ(x) for every run
    pub lambda: LambdaConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            runs: 8,
            threads: 0,
            training: TrainingConfig::default(),
            algorithm: Algorithm::default(),
            lambda: LambdaConfig::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_lambda(mut self, lambda: LambdaConfig) -> Self {
        self.lambda = lambda;
        self
    }

    /// Seed of run `run_index`, if the experiment is seeded.
    pub fn run_seed(&self, run_index: usize) -> Option<u64> {
        self.training
            .seed
            .map(|seed| seed.wrapping_add(run_index as u64))
    }

    /// Build the configured learner for a `dim`-feature problem.
    pub fn build_learner(&self, dim: usize) -> Result<Box<dyn Learner>> {
        self.algorithm
            .build(LambdaFunction::from_config(&self.lambda, dim))
    }

    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(Error::InvalidConfiguration {
                message: "an experiment needs at least one run".to_string(),
            });
        }
        match &self.algorithm {
            Algorithm::Mta(config) => config.validate(),
            Algorithm::Togtd(config) => config.step_sizes().validate(),
        }
    }

    /// Save configuration to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }
}

/// Everything private to one run.
pub struct RunSetup {
    pub agent: Box<dyn Learner>,
    pub scenario: Scenario,
    pub sampler: Box<dyn ActionSampler>,
    pub observers: Vec<Box<dyn Observer>>,
}

impl RunSetup {
    pub fn new(
        agent: Box<dyn Learner>,
        scenario: Scenario,
        sampler: Box<dyn ActionSampler>,
    ) -> Self {
        Self {
            agent,
            scenario,
            sampler,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }
}

/// How the per-episode error table was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorMetric {
    /// Weighted MSE against exact values
    WeightedMse,
    /// Raw evaluator readings
    Evaluation,
}

/// Gathered results of every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub algorithm: String,
    pub metric: ErrorMetric,
    /// `runs × episodes`
    pub errors: Vec<Vec<f64>>,
    pub runs: Vec<TrainingResult>,
}

impl ExperimentResult {
    /// Per-episode mean and spread across runs
    pub fn summary(&self) -> Vec<EpisodeStats> {
        summarize(&self.errors)
    }

    /// Write the per-episode summary as CSV
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in self.summary() {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Runs an experiment across a rayon thread pool
pub struct ExperimentRunner {
    config: ExperimentConfig,
    ground_truth: Option<GroundTruth>,
}

impl ExperimentRunner {
    pub fn new(config: ExperimentConfig) -> Self {
        Self {
            config,
            ground_truth: None,
        }
    }

    /// Score snapshots by weighted MSE against `truth`.
    pub fn with_ground_truth(mut self, truth: GroundTruth) -> Self {
        self.ground_truth = Some(truth);
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Run every configured run.
    ///
    /// `factory(run_index, seed)` builds the run's private setup; `seed` is
    /// the run's seed derived from the training configuration.
    ///
    /// # Errors
    ///
    /// Fails if the pool cannot be built or if any run fails.
    pub fn run<F>(&self, factory: F) -> Result<ExperimentResult>
    where
        F: Fn(usize, Option<u64>) -> Result<RunSetup> + Sync,
    {
        self.config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| Error::ThreadPool {
                message: e.to_string(),
            })?;

        let runs: Vec<TrainingResult> = pool.install(|| {
            (0..self.config.runs)
                .into_par_iter()
                .map(|run_index| self.run_one(run_index, &factory))
                .collect::<Result<Vec<_>>>()
        })?;

        let (metric, errors) = match &self.ground_truth {
            Some(truth) => (
                ErrorMetric::WeightedMse,
                runs.iter()
                    .map(|run| run.error_curve(truth))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => (
                ErrorMetric::Evaluation,
                runs.iter().map(|run| run.evaluations.clone()).collect(),
            ),
        };

        Ok(ExperimentResult {
            algorithm: self.config.algorithm.name().to_string(),
            metric,
            errors,
            runs,
        })
    }

    fn run_one<F>(&self, run_index: usize, factory: &F) -> Result<TrainingResult>
    where
        F: Fn(usize, Option<u64>) -> Result<RunSetup>,
    {
        let seed = self.config.run_seed(run_index);
        let RunSetup {
            mut agent,
            mut scenario,
            mut sampler,
            observers,
        } = factory(run_index, seed)?;

        info!(run = run_index, ?seed, learner = agent.name(), "run started");
        let mut pipeline = observers.into_iter().fold(
            TrainingPipeline::new(self.config.training.clone()),
            TrainingPipeline::with_observer,
        );
        let result = pipeline.run(agent.as_mut(), &mut scenario, sampler.as_mut())?;
        info!(
            run = run_index,
            steps = result.total_steps(),
            halted = result.halted_episodes(),
            overflow_skips = result.overflow_skips(),
            "run finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::td::LambdaApproximator;

    #[test]
    fn algorithm_is_tagged_in_json() {
        let config = ExperimentConfig::default()
            .with_algorithm(Algorithm::Togtd(TogtdConfig::new(0.1, 0.01)))
            .with_lambda(LambdaConfig::Constant { value: 0.9 });
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""kind":"togtd""#));

        let back: ExperimentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_config_takes_defaults() {
        let config: ExperimentConfig = serde_json::from_str(r#"{"runs": 3}"#).unwrap();
        assert_eq!(config.runs, 3);
        assert_eq!(config.training, TrainingConfig::default());
        assert_eq!(
            config.lambda,
            LambdaConfig::Adaptive {
                approximator: LambdaApproximator::Linear,
                init: 1.0
            }
        );
    }

    #[test]
    fn run_seeds_are_offset_by_index() {
        let config = ExperimentConfig::default()
            .with_training(TrainingConfig::default().with_seed(100));
        assert_eq!(config.run_seed(0), Some(100));
        assert_eq!(config.run_seed(7), Some(107));
        assert_eq!(ExperimentConfig::default().run_seed(3), None);
    }

    #[test]
    fn zero_runs_is_invalid() {
        assert!(ExperimentConfig::default().with_runs(0).validate().is_err());
    }
}
