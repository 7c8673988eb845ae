//! Command line interface for whitebg
//!
//! Only available with the `cli` feature.

mod config;
#[path = "main.rs"]
mod main_impl;

pub use main_impl::{main, BatchSummary, Cli, CliDetector, CliLogFormat, CliOutputFormat};
