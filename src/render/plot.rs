/// Terminal line charts and histograms drawn on a character grid.
use std::fmt::Write as _;

use console::style;

use crate::errors::{FlowctlError, Result};

const POINT: char = '•';
const TRACE: char = '·';
const BAR: char = '█';

/// Size and labels of a plot.
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// Plot area width in columns, excluding the y axis.
    pub width: usize,
    /// Plot area height in rows.
    pub height: usize,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            x_label: None,
            y_label: None,
            width: 60,
            height: 15,
        }
    }
}

impl PlotOptions {
    #[must_use]
    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }
}

/// Draw `ys` as a line chart. `x_bounds` labels the first and last points.
///
/// # Errors
///
/// Returns `FlowctlError::Render` when there are no finite values.
pub fn line_plot(ys: &[f64], x_bounds: Option<(&str, &str)>, opts: &PlotOptions) -> Result<String> {
    let ys: Vec<f64> = ys.iter().copied().filter(|y| y.is_finite()).collect();
    if ys.is_empty() {
        return Err(FlowctlError::render("plot", "no data points"));
    }

    let width = opts.width.max(2);
    let height = opts.height.max(2);
    let (lo, hi) = padded_range(&ys);
    let mut grid = vec![vec![' '; width]; height];

    let points: Vec<(usize, usize)> = ys
        .iter()
        .enumerate()
        .map(|(i, &y)| (spread(i, ys.len(), width), scale(y, lo, hi, height)))
        .collect();

    for pair in points.windows(2) {
        let ((c0, r0), (c1, r1)) = (pair[0], pair[1]);
        trace(&mut grid, (c0, r0), (c1, r1));
    }
    for &(col, row) in &points {
        grid[row][col] = POINT;
    }

    let labels = y_labels(lo, hi, height, |v| format!("{v:.2}"));
    Ok(compose(&grid, &labels, x_bounds, opts))
}

/// Bin `values` into `bins` buckets and draw the counts as vertical bars.
///
/// # Errors
///
/// Returns `FlowctlError::Render` when there are no finite values or no bins.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn histogram(values: &[f64], bins: usize, opts: &PlotOptions) -> Result<String> {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return Err(FlowctlError::render("histogram", "no data points"));
    }
    if bins == 0 {
        return Err(FlowctlError::render("histogram", "at least one bin is required"));
    }

    let counts = bin_counts(&values, bins);
    let max_count = counts.iter().copied().max().unwrap_or(0).max(1);
    let bar_width = (opts.width / bins).max(1);
    let width = bar_width * bins;
    let height = opts.height.max(2);
    let mut grid = vec![vec![' '; width]; height];

    for (bin, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let top = scale(count as f64, 0.0, max_count as f64, height);
        for row in grid.iter_mut().skip(top) {
            for cell in row.iter_mut().skip(bin * bar_width).take(bar_width.saturating_sub(1).max(1)) {
                *cell = BAR;
            }
        }
    }

    let (lo, hi) = min_max(&values);
    let (lo_label, hi_label) = (format!("{lo:.2}"), format!("{hi:.2}"));
    let labels = y_labels(0.0, max_count as f64, height, |v| format!("{v:.0}"));
    Ok(compose(&grid, &labels, Some((&lo_label, &hi_label)), opts))
}

/// Count values per equal-width bin over `[min, max]`. The maximum lands in
/// the last bin.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bin_counts(values: &[f64], bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 || values.is_empty() {
        return counts;
    }
    let (lo, hi) = min_max(values);
    let span = hi - lo;
    for &v in values {
        let idx = if span > 0.0 {
            (((v - lo) / span) * bins as f64) as usize
        } else {
            0
        };
        counts[idx.min(bins - 1)] += 1;
    }
    counts
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Value range with room for flat series.
fn padded_range(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = min_max(values);
    if (hi - lo).abs() < f64::EPSILON {
        let pad = if lo.abs() < f64::EPSILON { 1.0 } else { lo.abs() * 0.1 };
        (lo - pad, hi + pad)
    } else {
        (lo, hi)
    }
}

/// Column of point `i` out of `n` across `width` columns.
fn spread(i: usize, n: usize, width: usize) -> usize {
    if n <= 1 { 0 } else { i * (width - 1) / (n - 1) }
}

/// Grid row (0 at the top) for `value` in `[lo, hi]`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(value: f64, lo: f64, hi: f64, height: usize) -> usize {
    let span = hi - lo;
    let frac = if span > 0.0 { ((value - lo) / span).clamp(0.0, 1.0) } else { 0.0 };
    let from_bottom = (frac * (height - 1) as f64).round() as usize;
    height - 1 - from_bottom
}

/// Connect two points with trace marks.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn trace(grid: &mut [Vec<char>], (c0, r0): (usize, usize), (c1, r1): (usize, usize)) {
    let steps = c1.saturating_sub(c0).max(r0.abs_diff(r1)).max(1);
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let col = (c0 as f64 + t * (c1 as f64 - c0 as f64)).round() as usize;
        let row = (r0 as f64 + t * (r1 as f64 - r0 as f64)).round() as usize;
        if grid[row][col] == ' ' {
            grid[row][col] = TRACE;
        }
    }
}

/// Labels for the top, middle and bottom rows; blank elsewhere.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn y_labels(lo: f64, hi: f64, height: usize, fmt: impl Fn(f64) -> String) -> Vec<String> {
    let mid_row = height / 2;
    (0..height)
        .map(|row| {
            if row == 0 || row == mid_row || row == height - 1 {
                let frac = (height - 1 - row) as f64 / (height - 1) as f64;
                fmt(lo + frac * (hi - lo))
            } else {
                String::new()
            }
        })
        .collect()
}

fn compose(
    grid: &[Vec<char>],
    labels: &[String],
    x_bounds: Option<(&str, &str)>,
    opts: &PlotOptions,
) -> String {
    let margin = labels.iter().map(String::len).max().unwrap_or(0);
    let width = grid.first().map_or(0, Vec::len);
    let mut out = String::new();

    if let Some(y_label) = &opts.y_label {
        let _ = writeln!(out, "{}", style(y_label).dim());
    }

    for (row, label) in grid.iter().zip(labels) {
        let tick = if label.is_empty() { '│' } else { '┤' };
        let line: String = row.iter().collect();
        let _ = writeln!(out, "{label:>margin$}{tick}{}", line.trim_end());
    }
    let _ = writeln!(out, "{}└{}", " ".repeat(margin), "─".repeat(width));

    if let Some((first, last)) = x_bounds {
        let gap = width.saturating_sub(first.chars().count() + last.chars().count()).max(1);
        let _ = writeln!(out, "{} {first}{}{last}", " ".repeat(margin), " ".repeat(gap));
    }
    if let Some(x_label) = &opts.x_label {
        let pad = margin + 1 + width.saturating_sub(x_label.chars().count()) / 2;
        let _ = writeln!(out, "{}{}", " ".repeat(pad), style(x_label).dim());
    }

    out
}
