/// Parametric sweep over NACA 4-digit sections and flow conditions
///
/// This module provides functionality to:
/// - Define the full-factorial set of cases from a TOML configuration
/// - Render one JavaFoil macro per case and run them in parallel
/// - Collect polars and geometry into a single wide-format dataset

pub mod config;
pub mod export;
pub mod runner;


pub use config::{SweepCase, SweepConfig};
pub use export::{DatasetRow, DatasetWriter, RunSummary};
pub use runner::SweepRunner;
