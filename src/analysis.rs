//! # Convergence analysis
//!
//! Turns the error norms the solver reports on each grid into observed orders of accuracy.
//!
//! ```rust, ignore
//! use RustedMMS::analysis::convergence::ConvergenceReport;
//! use RustedMMS::analysis::norm_log::gather_results;
//! let norms = vec!["rho".to_string(), "p".to_string()];
//! let records = gather_results(Path::new("."), &[8, 16, 32, 64], &norms)?;
//! let report = ConvergenceReport::analyze(&records);
//! report.log_summary();
//! println!("{:?}", report.get("rho").and_then(|q| q.l2.order()));
//! ```

/// parsing of the per-level `log.txt` norm files
pub mod norm_log;
/// least-squares global order, local orders, table and CSV output
pub mod convergence;
/// multi-panel SVG figure of the norms and orders
pub mod report_plot;
