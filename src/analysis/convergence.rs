//! Observed order of accuracy from error norms on successively refined grids.
//!
//! With `e = C h^p` the points `(log10 h, log10 e)` lie on a line of slope `p`. The global
//! order is the least-squares slope through every level; local orders come from each pair of
//! consecutive levels.

use crate::analysis::norm_log::NormRecord;
use crate::errors::{MmsError, MmsResult};
use itertools::Itertools;
use log::{info, warn};
use nalgebra::{DMatrix, DVector};
use std::fs::File;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

/// Straight line `log10 e = order * log10 h + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderFit {
    pub order: f64,
    pub intercept: f64,
}

impl OrderFit {
    /// Norm predicted by the line at spacing `dx`.
    pub fn predict(&self, dx: f64) -> f64 {
        10f64.powf(self.order * dx.log10() + self.intercept)
    }
}

/// Least-squares line through the levels with a positive norm; `None` with fewer than two.
pub fn fit_order(dx: &[f64], errors: &[f64]) -> Option<OrderFit> {
    let points: Vec<(f64, f64)> = dx
        .iter()
        .zip(errors)
        .filter(|&(&h, &e)| h > 0.0 && e > 0.0 && e.is_finite())
        .map(|(&h, &e)| (h.log10(), e.log10()))
        .collect();
    if points.len() < 2 {
        return None;
    }
    let a = DMatrix::from_fn(points.len(), 2, |i, j| if j == 0 { points[i].0 } else { 1.0 });
    let b = DVector::from_iterator(points.len(), points.iter().map(|p| p.1));
    let solution = a.svd(true, true).solve(&b, 1e-12).ok()?;
    Some(OrderFit {
        order: solution[0],
        intercept: solution[1],
    })
}

/// Order between each pair of consecutive levels; pairs touching a non-positive norm give
/// `None`.
pub fn local_orders(dx: &[f64], errors: &[f64]) -> Vec<Option<f64>> {
    dx.iter()
        .zip(errors)
        .tuple_windows()
        .map(|((&h0, &e0), (&h1, &e1))| {
            if e0 > 0.0 && e1 > 0.0 && h0 != h1 {
                Some((e0 / e1).ln() / (h0 / h1).ln())
            } else {
                None
            }
        })
        .collect()
}

/// Spacing at which each local order is reported.
pub fn midpoints(dx: &[f64]) -> Vec<f64> {
    dx.iter().tuple_windows().map(|(a, b)| 0.5 * (a + b)).collect()
}

/// Convergence of one norm series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConvergence {
    pub fit: Option<OrderFit>,
    pub local: Vec<Option<f64>>,
}

impl SeriesConvergence {
    pub fn analyze(dx: &[f64], errors: &[f64]) -> Self {
        SeriesConvergence {
            fit: fit_order(dx, errors),
            local: local_orders(dx, errors),
        }
    }

    pub fn order(&self) -> Option<f64> {
        self.fit.map(|fit| fit.order)
    }
}

/// Convergence of L2 and L∞ of one quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityConvergence {
    pub record: NormRecord,
    pub l2: SeriesConvergence,
    pub linf: SeriesConvergence,
    pub midpoints: Vec<f64>,
}

impl QuantityConvergence {
    pub fn analyze(record: &NormRecord) -> Self {
        let l2 = SeriesConvergence::analyze(&record.dx, &record.l2);
        let linf = SeriesConvergence::analyze(&record.dx, &record.linf);
        for (norm, values, series) in [("L2", &record.l2, &l2), ("Linf", &record.linf, &linf)] {
            if values.iter().all(|&e| e == 0.0) {
                warn!("{} of '{}' is zero on every level, no order fitted", norm, record.name);
            } else if series.fit.is_none() {
                warn!(
                    "{} of '{}' has fewer than two positive values, no order fitted",
                    norm, record.name
                );
            }
        }
        QuantityConvergence {
            record: record.clone(),
            l2,
            linf,
            midpoints: midpoints(&record.dx),
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }
}

fn format_order(order: Option<f64>) -> String {
    order.map_or_else(|| "-".to_string(), |p| format!("{:.3}", p))
}

/// Observed orders of every tracked quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceReport {
    pub quantities: Vec<QuantityConvergence>,
}

impl ConvergenceReport {
    pub fn analyze(records: &[NormRecord]) -> Self {
        ConvergenceReport {
            quantities: records.iter().map(QuantityConvergence::analyze).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&QuantityConvergence> {
        self.quantities.iter().find(|q| q.name() == name)
    }

    /// Summary table: observed orders and the norms on the finest level.
    pub fn summary_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record([
            "quantity".to_string(),
            "L2 order".to_string(),
            "Linf order".to_string(),
            "finest L2".to_string(),
            "finest Linf".to_string(),
        ]);
        for q in &self.quantities {
            let last = |values: &[f64]| values.last().map_or_else(|| "-".to_string(), |e| format!("{:.4e}", e));
            builder.push_record([
                q.name().to_string(),
                format_order(q.l2.order()),
                format_order(q.linf.order()),
                last(&q.record.l2),
                last(&q.record.linf),
            ]);
        }
        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.to_string()
    }

    pub fn log_summary(&self) {
        info!("\n \n OBSERVED ORDER OF ACCURACY \n \n {}", self.summary_table());
    }

    /// One row per quantity and level with the norms and the local orders reached at that
    /// level.
    pub fn write_csv(&self, path: &Path) -> MmsResult<()> {
        let file = File::create(path).map_err(|e| MmsError::io(path, e))?;
        let mut wtr = csv::Writer::from_writer(file);
        let report_err = |e: csv::Error| MmsError::Report(format!("{}: {}", path.display(), e));
        wtr.write_record(["quantity", "ncells", "dx", "L2", "Linf", "L2 local order", "Linf local order"])
            .map_err(report_err)?;
        for q in &self.quantities {
            let r = &q.record;
            for i in 0..r.len() {
                let local = |series: &SeriesConvergence| {
                    i.checked_sub(1)
                        .and_then(|k| series.local.get(k).copied().flatten())
                        .map_or_else(String::new, |p| p.to_string())
                };
                wtr.write_record([
                    r.name.clone(),
                    format!("{}", (1.0 / r.dx[i]).round()),
                    r.dx[i].to_string(),
                    r.l2[i].to_string(),
                    r.linf[i].to_string(),
                    local(&q.l2),
                    local(&q.linf),
                ])
                .map_err(report_err)?;
            }
        }
        wtr.flush().map_err(|e| MmsError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn synthetic(name: &str, c: f64, p: f64, ncells: &[usize]) -> NormRecord {
        let mut record = NormRecord::new(name);
        for &n in ncells {
            let dx = 1.0 / n as f64;
            record.push(c * dx.powf(p), 3.0 * c * dx.powf(p), dx);
        }
        record
    }

    #[test]
    fn test_global_order_recovered() {
        for p in [1.0, 2.0, 3.0] {
            let record = synthetic("rho", 0.7, p, &[8, 16, 32, 64]);
            let fit = fit_order(&record.dx, &record.l2).unwrap();
            assert!((fit.order - p).abs() < 0.05);
            assert_relative_eq!(fit.predict(0.125), record.l2[0], max_relative = 1e-9);
        }
    }

    #[test]
    fn test_local_orders_recovered() {
        let record = synthetic("p", 2.0, 2.0, &[8, 16, 32, 64]);
        let local = local_orders(&record.dx, &record.l2);
        assert_eq!(local.len(), 3);
        for p in local {
            assert!((p.unwrap() - 2.0).abs() < 0.05);
        }
        assert_eq!(midpoints(&record.dx), vec![0.09375, 0.046875, 0.0234375]);
    }

    #[test]
    fn test_noisy_series_fits_least_squares_slope() {
        let dx = [0.125, 0.0625, 0.03125, 0.015625];
        let errors: Vec<f64> = dx
            .iter()
            .zip([1.02, 0.98, 1.01, 0.99])
            .map(|(h, noise)| noise * 5.0 * h * h)
            .collect();
        let fit = fit_order(&dx, &errors).unwrap();
        assert!((fit.order - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_all_zero_series_is_excluded() {
        let mut record = NormRecord::new("nuhat");
        for n in [8usize, 16, 32] {
            record.push(0.0, 0.0, 1.0 / n as f64);
        }
        let q = QuantityConvergence::analyze(&record);
        assert_eq!(q.l2.fit, None);
        assert_eq!(q.linf.order(), None);
        assert_eq!(q.l2.local, vec![None, None]);
    }

    #[test]
    fn test_partially_zero_series() {
        let dx = [0.125, 0.0625, 0.03125, 0.015625];
        let errors = [4.0 * dx[0] * dx[0], 0.0, 4.0 * dx[2] * dx[2], 4.0 * dx[3] * dx[3]];
        let fit = fit_order(&dx, &errors).unwrap();
        assert_relative_eq!(fit.order, 2.0, epsilon = 1e-9);
        let local = local_orders(&dx, &errors);
        assert_eq!(local[0], None);
        assert_eq!(local[1], None);
        assert_relative_eq!(local[2].unwrap(), 2.0, epsilon = 1e-9);

        let single = [1.0, 0.0, 0.0, 0.0];
        assert_eq!(fit_order(&dx, &single), None);
    }

    #[test]
    fn test_report_table_and_csv() {
        let records = vec![synthetic("rho", 1.0, 2.0, &[8, 16, 32]), synthetic("T", 1.0, 1.0, &[8, 16, 32])];
        let report = ConvergenceReport::analyze(&records);
        assert!((report.get("T").unwrap().linf.order().unwrap() - 1.0).abs() < 0.05);
        assert!(report.get("nuhat").is_none());
        let table = report.summary_table();
        assert!(table.contains("rho"));
        assert!(table.contains("2.000"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("norms.csv");
        report.write_csv(&path).unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(&rows[0][0], "rho");
        assert_eq!(&rows[0][1], "8");
        assert_eq!(&rows[0][5], "");
        let p: f64 = rows[1][5].parse().unwrap();
        assert_relative_eq!(p, 2.0, epsilon = 1e-9);
    }
}
