//! Run orchestrator: drives one learner through a sequence of episodes

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Error, Result,
    analysis::GroundTruth,
    policy::PolicyPair,
    ports::{
        ActionSampler, DiscountSchedule, EpisodeSummary, Environment, Evaluator, FeatureEncoder,
        Learner, Observer, StepEvent, StepOutcome, Transition,
    },
    types::{EvaluationMode, Termination},
};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of episodes per run
    pub episodes: usize,

    /// Base random seed; run `i` of an experiment uses `seed + i`
    pub seed: Option<u64>,

    /// Optional cap on committed steps per episode
    pub max_steps: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            seed: None,
            max_steps: None,
        }
    }
}

impl TrainingConfig {
    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}

/// Everything a run needs besides the learner and the sampler.
pub struct Scenario {
    env: Box<dyn Environment>,
    policies: PolicyPair,
    encoder: Box<dyn FeatureEncoder>,
    discount: Box<dyn DiscountSchedule>,
    evaluator: Option<Box<dyn Evaluator>>,
}

impl Scenario {
    /// Assemble a scenario, checking the policies fit the environment.
    pub fn new(
        env: Box<dyn Environment>,
        policies: PolicyPair,
        encoder: Box<dyn FeatureEncoder>,
        discount: Box<dyn DiscountSchedule>,
    ) -> Result<Self> {
        let behavior = policies.behavior();
        if behavior.num_states() != env.num_states() || behavior.num_actions() != env.num_actions()
        {
            return Err(Error::InvalidPolicy {
                policy: behavior.name().to_string(),
                reason: format!(
                    "shape {}x{} does not match environment {}x{}",
                    behavior.num_states(),
                    behavior.num_actions(),
                    env.num_states(),
                    env.num_actions()
                ),
            });
        }

        Ok(Self {
            env,
            policies,
            encoder,
            discount,
            evaluator: None,
        })
    }

    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn policies(&self) -> &PolicyPair {
        &self.policies
    }

    pub fn feature_dim(&self) -> usize {
        self.encoder.dim()
    }
}

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Learner name
    pub learner: String,

    /// Committed value weights at the start of every episode
    pub snapshots: Vec<Vec<f64>>,

    /// Evaluator reading per episode (empty without an evaluator)
    pub evaluations: Vec<f64>,

    /// Per-episode outcome
    pub episodes: Vec<EpisodeSummary>,

    /// Value weights after the last episode
    pub final_weights: Vec<f64>,

    /// λ parameters after the last episode
    pub lambda_parameters: Vec<f64>,
}

impl TrainingResult {
    /// Total committed steps over all episodes
    pub fn total_steps(&self) -> usize {
        self.episodes.iter().map(|e| e.steps).sum()
    }

    /// Number of episodes cut short by the trust region
    pub fn halted_episodes(&self) -> usize {
        self.episodes
            .iter()
            .filter(|e| e.termination == Termination::TrustRegion)
            .count()
    }

    /// Total variance-signal updates skipped because of overflow
    pub fn overflow_skips(&self) -> usize {
        self.episodes.iter().map(|e| e.overflow_skips).sum()
    }

    /// Weighted MSE of every episode snapshot against `truth`
    pub fn error_curve(&self, truth: &GroundTruth) -> Result<Vec<f64>> {
        self.snapshots
            .iter()
            .map(|weights| truth.weighted_mse(weights))
            .collect()
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Training pipeline for a single learner in a single scenario
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run every configured episode.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed transition (dimension mismatch, invalid
    /// action) or observer error. Trust-region halts only end the episode.
    pub fn run(
        &mut self,
        agent: &mut dyn Learner,
        scenario: &mut Scenario,
        sampler: &mut dyn ActionSampler,
    ) -> Result<TrainingResult> {
        let dim = agent.value_weights().len();
        if scenario.feature_dim() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                got: scenario.feature_dim(),
                context: "feature encoder".to_string(),
            });
        }

        let mut snapshots = Vec::with_capacity(self.config.episodes);
        let mut evaluations = Vec::new();
        let mut summaries = Vec::with_capacity(self.config.episodes);

        for observer in &mut self.observers {
            observer.on_training_start(self.config.episodes)?;
        }

        for episode in 0..self.config.episodes {
            agent.begin_episode();

            let weights = agent.value_weights();
            snapshots.push(weights.iter().copied().collect());
            let evaluation = scenario
                .evaluator
                .as_ref()
                .map(|evaluator| evaluator.evaluate(weights, EvaluationMode::Expectation));
            if let Some(value) = evaluation {
                evaluations.push(value);
            }

            for observer in &mut self.observers {
                observer.on_episode_start(episode)?;
            }

            let summary = self.run_episode(episode, agent, scenario, sampler, evaluation)?;

            for observer in &mut self.observers {
                observer.on_episode_end(&summary)?;
            }
            summaries.push(summary);
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        Ok(TrainingResult {
            learner: agent.name().to_string(),
            snapshots,
            evaluations,
            episodes: summaries,
            final_weights: agent.value_weights().iter().copied().collect(),
            lambda_parameters: agent.lambda().parameters().iter().copied().collect(),
        })
    }

    fn run_episode(
        &mut self,
        episode: usize,
        agent: &mut dyn Learner,
        scenario: &mut Scenario,
        sampler: &mut dyn ActionSampler,
        evaluation: Option<f64>,
    ) -> Result<EpisodeSummary> {
        let skips_before = agent.overflow_skips();
        let mut observation = scenario.env.reset();
        let mut x_curr = scenario.encoder.encode(observation);
        let mut log_rho_accu = 0.0;
        let mut steps = 0;

        let termination = loop {
            if self.config.max_steps.is_some_and(|max| steps >= max) {
                break Termination::StepLimit;
            }

            let action = sampler.sample(scenario.policies.behavior().row(observation));
            let rho = scenario.policies.importance_ratio(observation, action)?;
            log_rho_accu += scenario.policies.log_importance_ratio(observation, action)?;

            let outcome = scenario.env.step(action)?;
            let x_next = scenario.encoder.encode(outcome.observation);

            let transition = Transition {
                x_curr: &x_curr,
                x_next: &x_next,
                reward: outcome.reward,
                gamma_curr: scenario.discount.gamma(&x_curr),
                gamma_next: scenario.discount.gamma(&x_next),
                rho,
                log_rho_accu,
            };

            if agent.step(&transition)? == StepOutcome::Halted {
                debug!(
                    learner = agent.name(),
                    episode,
                    steps,
                    log_rho_accu,
                    "trust region exceeded, ending episode"
                );
                break Termination::TrustRegion;
            }

            let event = StepEvent {
                episode,
                step: steps,
                observation,
                action,
                next_observation: outcome.observation,
                reward: outcome.reward,
                rho,
                log_rho_accu,
                lambda: agent.lambda().value(&x_curr)?,
            };
            for observer in &mut self.observers {
                observer.on_step(&event)?;
            }

            steps += 1;
            observation = outcome.observation;
            x_curr = x_next;

            if outcome.done {
                break Termination::Terminal;
            }
        };

        Ok(EpisodeSummary {
            episode,
            steps,
            termination,
            log_rho_accu,
            overflow_skips: agent.overflow_skips() - skips_before,
            evaluation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::{CategoricalSampler, OneHotEncoder, RandomWalk, TerminalDiscount},
        policy::PolicyMatrix,
        td::{LambdaFunction, TogtdAgent, TogtdConfig},
    };

    fn walk_scenario() -> Scenario {
        let env = RandomWalk::new(5).unwrap();
        let terminals = env.terminal_states();
        let policy = PolicyMatrix::uniform_rows("uniform", 5, &[0.5, 0.5]).unwrap();
        Scenario::new(
            Box::new(env),
            PolicyPair::on_policy(policy),
            Box::new(OneHotEncoder::new(5)),
            Box::new(TerminalDiscount::new(1.0, terminals)),
        )
        .unwrap()
    }

    #[test]
    fn every_episode_records_a_snapshot() {
        let mut agent =
            TogtdAgent::new(TogtdConfig::default(), LambdaFunction::constant(5, 0.5)).unwrap();
        let mut scenario = walk_scenario();
        let mut sampler = CategoricalSampler::seeded(3);
        let mut pipeline = TrainingPipeline::new(TrainingConfig::default().with_episodes(10));

        let result = pipeline.run(&mut agent, &mut scenario, &mut sampler).unwrap();

        assert_eq!(result.snapshots.len(), 10);
        assert_eq!(result.episodes.len(), 10);
        assert!(result.snapshots[0].iter().all(|w| *w == 0.0));
        assert!(
            result
                .episodes
                .iter()
                .all(|e| e.termination == Termination::Terminal && e.steps >= 2)
        );
        assert!(result.evaluations.is_empty());
    }

    #[test]
    fn step_limit_ends_episode() {
        let mut agent =
            TogtdAgent::new(TogtdConfig::default(), LambdaFunction::constant(5, 0.5)).unwrap();
        let mut scenario = walk_scenario();
        let mut sampler = CategoricalSampler::seeded(3);
        let config = TrainingConfig::default().with_episodes(5).with_max_steps(1);
        let mut pipeline = TrainingPipeline::new(config);

        let result = pipeline.run(&mut agent, &mut scenario, &mut sampler).unwrap();

        assert!(
            result
                .episodes
                .iter()
                .all(|e| e.steps == 1 && e.termination == Termination::StepLimit)
        );
    }

    #[test]
    fn encoder_dimension_must_match_learner() {
        let mut agent =
            TogtdAgent::new(TogtdConfig::default(), LambdaFunction::constant(3, 0.5)).unwrap();
        let mut scenario = walk_scenario();
        let mut sampler = CategoricalSampler::seeded(0);
        let mut pipeline = TrainingPipeline::new(TrainingConfig::default().with_episodes(1));

        let result = pipeline.run(&mut agent, &mut scenario, &mut sampler);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn mismatched_policy_shape_is_rejected() {
        let policy = PolicyMatrix::uniform_rows("small", 3, &[0.5, 0.5]).unwrap();
        let result = Scenario::new(
            Box::new(RandomWalk::new(5).unwrap()),
            PolicyPair::on_policy(policy),
            Box::new(OneHotEncoder::new(5)),
            Box::new(TerminalDiscount::new(1.0, vec![0, 4])),
        );
        assert!(matches!(result, Err(Error::InvalidPolicy { .. })));
    }
}
