//! CLI infrastructure for the meta-trace toolkit
//!
//! This module provides the command-line interface for running
//! trace-adaptation experiments.

pub mod commands;
pub mod output;
