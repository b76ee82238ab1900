//! Scenario driver for the reassembly core.
//!
//! Provides scenario definitions (built-in and TOML), deterministic
//! in-process impairment, and a runner that renders buffer events through
//! `tracing` and produces serializable reports.

pub mod config;
pub mod impairment;
pub mod runner;
pub mod scenario;

pub use runner::{run_scenario, ScenarioReport};
pub use scenario::{Scenario, Step};
