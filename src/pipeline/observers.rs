//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    ports::{EpisodeSummary, Observer, StepEvent},
    types::Termination,
};

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    label: String,
    halted: usize,
    shared: bool,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self::labelled("episodes")
    }

    /// Progress observer whose bar reads `{pos}/{len} <label>`
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            progress_bar: None,
            label: label.into(),
            halted: 0,
            shared: false,
        }
    }

    /// Tick an existing bar once per episode, leaving its length and
    /// completion to the owner. Lets parallel runs feed one bar.
    pub fn shared(progress_bar: ProgressBar) -> Self {
        Self {
            progress_bar: Some(progress_bar),
            label: String::new(),
            halted: 0,
            shared: true,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        if self.shared {
            return Ok(());
        }
        let pb = ProgressBar::new(total_episodes as u64);
        let template = format!(
            "[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {} (halted: {{msg}})",
            self.label
        );
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&template)
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        pb.set_message("0");
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        if summary.termination == Termination::TrustRegion {
            self.halted += 1;
        }
        match &self.progress_bar {
            Some(pb) if self.shared => pb.inc(1),
            Some(pb) => {
                pb.set_position(summary.episode as u64 + 1);
                pb.set_message(self.halted.to_string());
            }
            None => {}
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = self.progress_bar.as_ref().filter(|_| !self.shared) {
            pb.finish_with_message(self.halted.to_string());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks episode-level metrics
#[derive(Debug, Default)]
pub struct MetricsObserver {
    episode_lengths: Vec<usize>,
    terminal: usize,
    halted: usize,
    step_limited: usize,
    overflow_skips: usize,
    lambda_sum: f64,
    lambda_min: Option<f64>,
    lambda_max: Option<f64>,
    steps: usize,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get average episode length in committed steps
    pub fn avg_episode_length(&self) -> f64 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f64 / self.episode_lengths.len() as f64
        }
    }

    /// Get mean λ over all committed steps
    pub fn mean_lambda(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.lambda_sum / self.steps as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_episodes: self.episode_lengths.len(),
            total_steps: self.steps,
            terminal: self.terminal,
            halted: self.halted,
            step_limited: self.step_limited,
            overflow_skips: self.overflow_skips,
            avg_episode_length: self.avg_episode_length(),
            mean_lambda: self.mean_lambda(),
            min_lambda: self.lambda_min,
            max_lambda: self.lambda_max,
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_episodes: usize,
    pub total_steps: usize,
    pub terminal: usize,
    pub halted: usize,
    pub step_limited: usize,
    pub overflow_skips: usize,
    pub avg_episode_length: f64,
    pub mean_lambda: f64,
    pub min_lambda: Option<f64>,
    pub max_lambda: Option<f64>,
}

impl Observer for MetricsObserver {
    fn on_step(&mut self, event: &StepEvent) -> Result<()> {
        self.steps += 1;
        self.lambda_sum += event.lambda;
        self.lambda_min = Some(self.lambda_min.map_or(event.lambda, |m| m.min(event.lambda)));
        self.lambda_max = Some(self.lambda_max.map_or(event.lambda, |m| m.max(event.lambda)));
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.episode_lengths.push(summary.steps);
        self.overflow_skips += summary.overflow_skips;
        match summary.termination {
            Termination::Terminal => self.terminal += 1,
            Termination::TrustRegion => self.halted += 1,
            Termination::StepLimit => self.step_limited += 1,
        }
        Ok(())
    }
}

/// One exported episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    #[serde(flatten)]
    pub summary: EpisodeSummary,
    /// Committed steps of the episode (present when steps are recorded)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<StepEvent>,
}

/// JSONL observer - Exports episodes to JSON Lines format
pub struct JsonlObserver {
    writer: BufWriter<File>,
    record_steps: bool,
    current_steps: Vec<StepEvent>,
}

impl JsonlObserver {
    /// Create a new JSONL observer writing one summary line per episode
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self {
            writer,
            record_steps: false,
            current_steps: Vec::new(),
        })
    }

    /// Also embed every committed step in its episode's line
    pub fn with_steps(mut self) -> Self {
        self.record_steps = true;
        self
    }
}

impl Observer for JsonlObserver {
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        self.current_steps.clear();
        Ok(())
    }

    fn on_step(&mut self, event: &StepEvent) -> Result<()> {
        if self.record_steps {
            self.current_steps.push(*event);
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let record = EpisodeRecord {
            summary: summary.clone(),
            transitions: std::mem::take(&mut self.current_steps),
        };

        // Write as JSONL (one JSON object per line)
        serde_json::to_writer(&mut self.writer, &record)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
