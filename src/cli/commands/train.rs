//! Train command - Run a random-walk prediction experiment

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    adapters::CategoricalSampler,
    analysis::{EpisodeStats, GroundTruth, tail_mean},
    cli::output::{
        create_training_progress, format_number, format_vector, print_curve, print_kv,
        print_section, print_subsection,
    },
    mta::MtaConfig,
    pipeline::{
        Algorithm, ExperimentConfig, ExperimentResult, ExperimentRunner, JsonlObserver,
        ProgressObserver, RandomWalkTask, RunSetup,
    },
    td::{LambdaApproximator, LambdaConfig, TogtdConfig},
    utils::logit,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AlgorithmType {
    /// Meta-trace adaptation (λ adapted online)
    Mta,
    /// True-online GTD(λ) with a fixed λ
    Togtd,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ApproximatorType {
    Linear,
    Tabular,
}

impl From<ApproximatorType> for LambdaApproximator {
    fn from(value: ApproximatorType) -> Self {
        match value {
            ApproximatorType::Linear => LambdaApproximator::Linear,
            ApproximatorType::Tabular => LambdaApproximator::Tabular,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Run a random-walk prediction experiment")]
pub struct TrainArgs {
    /// Learner to train
    #[arg(value_enum)]
    pub algorithm: AlgorithmType,

    /// Base experiment configuration (JSON); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of random-walk states, both ends included
    #[arg(long, default_value_t = 5)]
    pub states: usize,

    /// Discount on non-terminal arrivals
    #[arg(long, default_value_t = 0.95)]
    pub gamma: f64,

    /// Probability of moving right under the target policy
    #[arg(long, default_value_t = 0.5)]
    pub target_right: f64,

    /// Probability of moving right under the behavior policy
    #[arg(long, default_value_t = 0.5)]
    pub behavior_right: f64,

    /// Episodes per run
    #[arg(long, short = 'e')]
    pub episodes: Option<usize>,

    /// Independent runs
    #[arg(long, short = 'n')]
    pub runs: Option<usize>,

    /// Worker threads (0 = one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Primary step size α
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Auxiliary step size β
    #[arg(long)]
    pub beta: Option<f64>,

    /// Meta step size κ (mta only)
    #[arg(long)]
    pub kappa: Option<f64>,

    /// Initial λ (mta) or fixed λ (togtd), in (0, 1)
    #[arg(long)]
    pub lambda: Option<f64>,

    /// Parametric form of λ(x) for mta (config file form, else linear)
    #[arg(long, value_enum)]
    pub approximator: Option<ApproximatorType>,

    /// Optional cap on steps per episode
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Random seed for reproducibility (run i uses seed + i)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Optional path for the per-episode error curve as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Optional directory for per-run JSONL episode logs
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Include every step in the JSONL logs
    #[arg(long, default_value_t = false)]
    pub record_steps: bool,

    /// Show progress bar
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

#[derive(Debug, Serialize)]
struct RunStats {
    total_steps: usize,
    halted_episodes: usize,
    overflow_skips: usize,
    final_weights: Vec<f64>,
    final_lambda: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorStats {
    metric: String,
    first: Option<EpisodeStats>,
    last: Option<EpisodeStats>,
    /// Mean error over the last tenth of episodes, averaged across runs
    tail_mean: f64,
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    algorithm: String,
    config: ExperimentConfig,
    task: RandomWalkTask,
    ground_truth: GroundTruth,
    error: ErrorStats,
    runs: Vec<RunStats>,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Treat trailing separators or missing filename as a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}

fn check_unit_interval(flag: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("{flag} must lie in [0, 1], got {value}"));
    }
    Ok(())
}

/// Merge the base configuration with command-line overrides.
fn build_config(args: &TrainArgs) -> Result<ExperimentConfig> {
    let mut config = match &args.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ExperimentConfig::default(),
    };

    if let Some(episodes) = args.episodes {
        config.training.episodes = episodes;
    }
    if let Some(runs) = args.runs {
        config.runs = runs;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if args.seed.is_some() {
        config.training.seed = args.seed;
    }
    if args.max_steps.is_some() {
        config.training.max_steps = args.max_steps;
    }

    config.algorithm = match (args.algorithm, &config.algorithm) {
        (AlgorithmType::Mta, Algorithm::Mta(base)) => Algorithm::Mta(mta_overrides(*base, args)),
        (AlgorithmType::Mta, _) => Algorithm::Mta(mta_overrides(MtaConfig::default(), args)),
        (AlgorithmType::Togtd, Algorithm::Togtd(base)) => {
            Algorithm::Togtd(togtd_overrides(*base, args))
        }
        (AlgorithmType::Togtd, _) => {
            Algorithm::Togtd(togtd_overrides(TogtdConfig::default(), args))
        }
    };

    if let Some(lambda) = args.lambda {
        if !(lambda > 0.0 && lambda < 1.0) {
            return Err(anyhow!("--lambda must lie in (0, 1), got {lambda}"));
        }
        config.lambda = match args.algorithm {
            AlgorithmType::Mta => LambdaConfig::Adaptive {
                approximator: adaptive_approximator(&config.lambda, args),
                init: logit(lambda),
            },
            AlgorithmType::Togtd => LambdaConfig::Constant { value: lambda },
        };
    } else if let (AlgorithmType::Mta, Some(_)) = (args.algorithm, args.approximator) {
        let init = match config.lambda {
            LambdaConfig::Adaptive { init, .. } => init,
            LambdaConfig::Constant { value } => logit(value),
        };
        config.lambda = LambdaConfig::Adaptive {
            approximator: adaptive_approximator(&config.lambda, args),
            init,
        };
    }

    config.validate()?;
    Ok(config)
}

/// The `--approximator` flag, else the base configuration's, else linear.
fn adaptive_approximator(base: &LambdaConfig, args: &TrainArgs) -> LambdaApproximator {
    match (args.approximator, base) {
        (Some(flag), _) => flag.into(),
        (None, LambdaConfig::Adaptive { approximator, .. }) => *approximator,
        (None, LambdaConfig::Constant { .. }) => LambdaApproximator::Linear,
    }
}

fn mta_overrides(mut config: MtaConfig, args: &TrainArgs) -> MtaConfig {
    config = config.with_step_sizes(
        args.alpha.unwrap_or(config.alpha),
        args.beta.unwrap_or(config.beta),
    );
    if let Some(kappa) = args.kappa {
        config = config.with_kappa(kappa);
    }
    config
}

fn togtd_overrides(config: TogtdConfig, args: &TrainArgs) -> TogtdConfig {
    TogtdConfig::new(
        args.alpha.unwrap_or(config.alpha),
        args.beta.unwrap_or(config.beta),
    )
}

fn summarize_errors(result: &ExperimentResult) -> ErrorStats {
    let stats = result.summary();
    let window = (stats.len() / 10).max(1);
    let tails: Vec<f64> = result
        .errors
        .iter()
        .map(|row| tail_mean(row, window))
        .collect();

    ErrorStats {
        metric: format!("{:?}", result.metric),
        first: stats.first().cloned(),
        last: stats.last().cloned(),
        tail_mean: tail_mean(&tails, tails.len()),
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    check_unit_interval("--gamma", args.gamma)?;
    check_unit_interval("--target-right", args.target_right)?;
    check_unit_interval("--behavior-right", args.behavior_right)?;

    let config = build_config(&args)?;
    let task = RandomWalkTask::default()
        .with_states(args.states)
        .with_gamma(args.gamma)
        .with_policies(args.target_right, args.behavior_right);
    let truth = task.ground_truth()?;

    if let Some(dir) = &args.observations {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating observation directory {}", dir.display()))?;
    }

    print_section(&format!(
        "Training {} on a {}-state random walk",
        config.algorithm.name(),
        task.states
    ));
    print_kv("Runs", &config.runs.to_string());
    print_kv("Episodes per run", &format_number(config.training.episodes));
    print_kv("True values", &format_vector(&truth.values));
    if let Some(seed) = config.training.seed {
        print_kv("Seed", &seed.to_string());
    }

    let progress = if args.progress {
        let total = config.runs.saturating_mul(config.training.episodes);
        Some(create_training_progress(total as u64)?)
    } else {
        None
    };

    let runner = ExperimentRunner::new(config.clone()).with_ground_truth(truth.clone());
    let result = runner.run(|run_index, seed| {
        let mut setup = RunSetup::new(
            config.build_learner(task.states)?,
            task.scenario()?,
            Box::new(CategoricalSampler::new(seed)),
        );
        if let Some(pb) = &progress {
            setup = setup.with_observer(Box::new(ProgressObserver::shared(pb.clone())));
        }
        if let Some(dir) = &args.observations {
            let mut observer = JsonlObserver::new(dir.join(format!("run-{run_index:03}.jsonl")))?;
            if args.record_steps {
                observer = observer.with_steps();
            }
            setup = setup.with_observer(Box::new(observer));
        }
        Ok(setup)
    })?;

    if let Some(pb) = &progress {
        pb.finish_with_message("done");
    }

    let error = summarize_errors(&result);
    let stats = result.summary();

    print_subsection("Weighted MSE across runs");
    print_curve(&stats, (stats.len() / 10).max(1));
    print_kv("Tail mean MSE", &format!("{:.6}", error.tail_mean));

    let halted: usize = result.runs.iter().map(|r| r.halted_episodes()).sum();
    let skips: usize = result.runs.iter().map(|r| r.overflow_skips()).sum();
    print_kv("Halted episodes", &format_number(halted));
    if skips > 0 {
        eprintln!("Warning: {skips} variance updates were skipped after numeric overflow.");
    }
    if let Some(first) = result.runs.first() {
        print_kv("Run 0 weights", &format_vector(&first.final_weights));
    }

    if let Some(csv_path) = &args.csv {
        ensure_parent(csv_path)?;
        result
            .write_csv(csv_path)
            .with_context(|| format!("writing {}", csv_path.display()))?;
        println!("\nError curve written to {}", csv_path.display());
    }

    if let Some(raw) = &args.summary {
        let summary_path = sanitize_summary_path(raw);
        ensure_parent(&summary_path)?;

        let summary = TrainingSummaryFile {
            algorithm: result.algorithm.clone(),
            config,
            task,
            ground_truth: truth,
            error,
            runs: result
                .runs
                .iter()
                .map(|run| RunStats {
                    total_steps: run.total_steps(),
                    halted_episodes: run.halted_episodes(),
                    overflow_skips: run.overflow_skips(),
                    final_weights: run.final_weights.clone(),
                    final_lambda: run.lambda_parameters.clone(),
                })
                .collect(),
        };

        let file = File::create(&summary_path)?;
        to_writer_pretty(file, &summary)?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}
