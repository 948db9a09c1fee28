//! Convergence figure: one panel per quantity with the L2 and L∞ norms on log-log axes, their
//! fitted trend lines and the local order on a secondary axis.

use crate::analysis::convergence::{ConvergenceReport, QuantityConvergence, SeriesConvergence};
use crate::errors::{MmsError, MmsResult};
use log::info;
use plotters::coord::Shift;
use plotters::coord::combinators::LogCoord;
use plotters::prelude::*;
use std::path::Path;

type LogLogCoord = Cartesian2d<LogCoord<f64>, LogCoord<f64>>;

const PANEL_SIZE: (u32, u32) = (640, 480);

fn plot_err<E: std::fmt::Display>(e: E) -> MmsError {
    MmsError::Report(e.to_string())
}

/// Rows and columns of a grid holding `n` panels.
pub fn panel_grid(n: usize) -> (usize, usize) {
    let rows = ((n as f64).sqrt().floor() as usize).max(1);
    let cols = n.div_ceil(rows).max(1);
    (rows, cols)
}

fn positive_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| *v > 0.0 && v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

fn draw_norm_series(
    chart: &mut ChartContext<'_, SVGBackend<'_>, LogLogCoord>,
    dx: &[f64],
    errors: &[f64],
    series: &SeriesConvergence,
    norm: &str,
    col: usize,
) -> MmsResult<()> {
    let points: Vec<(f64, f64)> = dx
        .iter()
        .zip(errors)
        .filter(|&(_, &e)| e > 0.0)
        .map(|(&h, &e)| (h, e))
        .collect();
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, Palette99::pick(col).filled())))
        .map_err(plot_err)?
        .label(norm.to_string())
        .legend(move |(x, y)| Circle::new((x + 10, y), 4, Palette99::pick(col).filled()));
    if let Some(fit) = series.fit {
        let line: Vec<(f64, f64)> = dx.iter().map(|&h| (h, fit.predict(h))).collect();
        chart
            .draw_series(LineSeries::new(line, &Palette99::pick(col)))
            .map_err(plot_err)?
            .label(format!("{} fit, p = {:.2}", norm, fit.order))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &Palette99::pick(col)));
    }
    Ok(())
}

fn draw_panel(area: &DrawingArea<SVGBackend<'_>, Shift>, q: &QuantityConvergence) -> MmsResult<()> {
    let record = &q.record;
    let norms = positive_range(record.l2.iter().chain(&record.linf).copied());
    let (Some((x_min, x_max)), Some((y_min, y_max))) = (positive_range(record.dx.iter().copied()), norms) else {
        area.titled(&format!("{}: no positive norms", record.name), ("sans-serif", 30))
            .map_err(plot_err)?;
        return Ok(());
    };
    let local_max = q
        .l2
        .local
        .iter()
        .chain(&q.linf.local)
        .flatten()
        .fold(3.0f64, |acc, &p| acc.max(p.ceil() + 1.0));

    let mut chart = ChartBuilder::on(area)
        .caption(&record.name, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(40)
        .build_cartesian_2d(
            (x_min * 0.8..x_max * 1.25).log_scale(),
            (y_min * 0.5..y_max * 2.0).log_scale(),
        )
        .map_err(plot_err)?
        .set_secondary_coord((x_min * 0.8..x_max * 1.25).log_scale(), 0.0..local_max);

    chart
        .configure_mesh()
        .x_desc("dx")
        .y_desc("error norm")
        .draw()
        .map_err(plot_err)?;
    chart
        .configure_secondary_axes()
        .y_desc("local order")
        .draw()
        .map_err(plot_err)?;

    draw_norm_series(&mut chart, &record.dx, &record.l2, &q.l2, "L2", 0)?;
    draw_norm_series(&mut chart, &record.dx, &record.linf, &q.linf, "Linf", 1)?;

    for (norm, series, col) in [("L2", &q.l2, 2), ("Linf", &q.linf, 3)] {
        let local: Vec<(f64, f64)> = q
            .midpoints
            .iter()
            .zip(&series.local)
            .filter_map(|(&h, p)| p.map(|p| (h, p)))
            .collect();
        if local.is_empty() {
            continue;
        }
        chart
            .draw_secondary_series(LineSeries::new(local, &Palette99::pick(col)))
            .map_err(plot_err)?
            .label(format!("{} local order", norm))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &Palette99::pick(col)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    Ok(())
}

/// Writes the convergence figure of every quantity in `report` to an SVG file.
pub fn write_report_plot(report: &ConvergenceReport, path: &Path) -> MmsResult<()> {
    let (rows, cols) = panel_grid(report.quantities.len());
    let size = (PANEL_SIZE.0 * cols as u32, PANEL_SIZE.1 * rows as u32);
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let panels = root.split_evenly((rows, cols));
    for (area, q) in panels.iter().zip(&report.quantities) {
        draw_panel(area, q)?;
    }
    root.present().map_err(plot_err)?;
    info!("convergence plot written to {}", path.display());
    Ok(())
}
