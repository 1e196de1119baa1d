//! Least-squares trend helpers shared by the weakness analysis and the
//! progress forecast.

use crate::types::EPSILON;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// max - min, 0 for an empty slice.
pub fn spread(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let max = values.iter().cloned().fold(f64::MIN, f64::max);
    let min = values.iter().cloned().fold(f64::MAX, f64::min);
    max - min
}

/// Ordinary least-squares slope of `ys` against `xs`.
///
/// Uses centered sums so large x offsets (e.g. days since epoch) do not lose
/// precision. Degenerate inputs (fewer than two points, mismatched lengths,
/// no x variance) give 0.
pub fn slope(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }

    let x_mean = mean(xs);
    let y_mean = mean(ys);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }

    if sxx.abs() < EPSILON {
        return 0.0;
    }
    sxy / sxx
}

/// Slope of `ys` against their position (0, 1, 2, ...).
pub fn index_slope(ys: &[f64]) -> f64 {
    let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
    slope(&xs, ys)
}
