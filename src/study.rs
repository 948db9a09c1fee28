//! # Grid-refinement study
//!
//! Reads a TOML case description, writes the solver's input files for every grid level, runs
//! the solver through a [`driver::CaseRunner`] and reports the observed order of accuracy.
//!
//!# Example
//! ```rust, ignore
//! use RustedMMS::study::config::StudyConfig;
//! use RustedMMS::study::driver::{ShellRunner, run_study};
//! let config = StudyConfig::load(Path::new("mms-config.toml"))?;
//! let report = run_study(&config, &mut ShellRunner)?;
//! for q in &report.quantities {
//!     println!("{}: L2 order {:?}", q.name(), q.l2.order());
//! }
//! ```
/// typed case configuration with rejected unknown keys
pub mod config;
/// generated files of a level and the run script
pub mod tasks;
/// per-level workspaces, solver runs and the final analysis
pub mod driver;
