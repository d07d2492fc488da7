//! Common test utilities for the meta-trace test suite.
//!
//! Scripted collaborators that make runs fully predictable, plus a recording
//! observer that shares what it saw with the test body.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use meta_trace::{
    Features, Result,
    ports::{ActionSampler, EnvStep, Environment, EpisodeSummary, Observer, StepEvent},
};

/// Always picks the same action.
pub struct ScriptedSampler {
    pub action: usize,
}

impl ActionSampler for ScriptedSampler {
    fn sample(&mut self, _probabilities: &[f64]) -> usize {
        self.action
    }
}

/// Single-observation environment that never terminates.
pub struct EndlessEnv {
    pub reward: f64,
}

impl Environment for EndlessEnv {
    fn num_states(&self) -> usize {
        1
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn reset(&mut self) -> usize {
        0
    }

    fn step(&mut self, _action: usize) -> Result<EnvStep> {
        Ok(EnvStep {
            observation: 0,
            reward: self.reward,
            done: false,
        })
    }
}

/// Everything a [`RecordingObserver`] saw.
#[derive(Debug, Default)]
pub struct Recording {
    pub training_starts: usize,
    pub training_ends: usize,
    pub episode_starts: Vec<usize>,
    pub steps: Vec<StepEvent>,
    pub episodes: Vec<EpisodeSummary>,
}

/// Observer writing into a shared [`Recording`].
pub struct RecordingObserver {
    pub recording: Arc<Mutex<Recording>>,
}

impl RecordingObserver {
    pub fn new() -> (Self, Arc<Mutex<Recording>>) {
        let recording = Arc::new(Mutex::new(Recording::default()));
        (
            Self {
                recording: Arc::clone(&recording),
            },
            recording,
        )
    }
}

impl Observer for RecordingObserver {
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        self.recording.lock().unwrap().training_starts += 1;
        Ok(())
    }

    fn on_episode_start(&mut self, episode: usize) -> Result<()> {
        self.recording.lock().unwrap().episode_starts.push(episode);
        Ok(())
    }

    fn on_step(&mut self, event: &StepEvent) -> Result<()> {
        self.recording.lock().unwrap().steps.push(*event);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.recording.lock().unwrap().episodes.push(summary.clone());
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.recording.lock().unwrap().training_ends += 1;
        Ok(())
    }
}

/// Euclidean distance between two equal-length slices.
pub fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Element-wise mean of the last `window` snapshots of every run.
pub fn mean_tail_snapshot(runs: &[Vec<Vec<f64>>], window: usize) -> Vec<f64> {
    let dim = runs[0][0].len();
    let mut total = vec![0.0; dim];
    let mut count = 0.0;
    for snapshots in runs {
        let start = snapshots.len().saturating_sub(window);
        for snapshot in &snapshots[start..] {
            for (t, w) in total.iter_mut().zip(snapshot) {
                *t += w;
            }
            count += 1.0;
        }
    }
    total.iter().map(|t| t / count).collect()
}

pub fn features(values: &[f64]) -> Features {
    Features::from_column_slice(values)
}
