//! Subcommands

pub mod train;
