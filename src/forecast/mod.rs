//! Progress Forecaster
//!
//! Extrapolates aggregate mastery to a deadline from its observed weekly
//! rate and compares the result against a target.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::PredictionConfig;
use crate::error::{PredictError, PredictResult};
use crate::regression::slope;
use crate::sanitize::{clamp_mastery, is_valid_mastery};
use crate::types::{days_between, MasteryPoint, ProgressPrediction, DAYS_PER_WEEK};

fn weeks_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    days_between(from, to) / DAYS_PER_WEEK
}

/// Mastery points gained per week.
///
/// Regression over the whole series once it has `minRegressionPoints`
/// samples; below that, the average rate between the first and last point.
/// A single point has no rate.
pub fn observed_weekly_rate(series: &[MasteryPoint], config: &PredictionConfig) -> f64 {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return 0.0;
    };
    if series.len() < 2 {
        return 0.0;
    }

    if series.len() >= config.min_regression_points {
        let xs: Vec<f64> = series.iter().map(|p| weeks_between(first.timestamp, p.timestamp)).collect();
        let ys: Vec<f64> = series.iter().map(|p| p.mastery).collect();
        return slope(&xs, &ys);
    }

    let weeks = weeks_between(first.timestamp, last.timestamp);
    if weeks <= 0.0 {
        return 0.0;
    }
    (last.mastery - first.mastery) / weeks
}

/// Forecast aggregate mastery at `deadline`.
///
/// Returns `Ok(None)` for an empty series. A deadline at or before `as_of`
/// reports on-track from the current value and no required rate.
pub fn forecast_progress(
    series: &[MasteryPoint],
    target_mastery: f64,
    deadline: DateTime<Utc>,
    as_of: DateTime<Utc>,
    config: &PredictionConfig,
) -> PredictResult<Option<ProgressPrediction>> {
    if !is_valid_mastery(target_mastery) {
        return Err(PredictError::domain(format!(
            "target mastery {target_mastery} outside [0, 100]"
        )));
    }
    if let Some(bad) = series.iter().find(|p| !is_valid_mastery(p.mastery)) {
        return Err(PredictError::domain(format!(
            "aggregate mastery {} at {} outside [0, 100]",
            bad.mastery, bad.timestamp
        )));
    }
    if series.windows(2).any(|pair| pair[1].timestamp <= pair[0].timestamp) {
        return Err(PredictError::domain("aggregate series must be strictly time-ordered"));
    }

    let Some(latest) = series.last() else {
        return Ok(None);
    };

    let current_mastery = latest.mastery;
    let observed_weekly_rate = observed_weekly_rate(series, config);
    let weeks_remaining = weeks_between(as_of, deadline);

    let prediction = if weeks_remaining <= 0.0 {
        ProgressPrediction {
            current_mastery,
            target_mastery,
            predicted_mastery: current_mastery,
            on_track: current_mastery >= target_mastery,
            required_weekly_rate: None,
            observed_weekly_rate,
            weeks_remaining,
        }
    } else {
        let predicted_mastery = clamp_mastery(current_mastery + observed_weekly_rate * weeks_remaining);
        let required = ((target_mastery - current_mastery) / weeks_remaining).max(0.0);
        ProgressPrediction {
            current_mastery,
            target_mastery,
            predicted_mastery,
            on_track: predicted_mastery >= target_mastery,
            required_weekly_rate: Some(required),
            observed_weekly_rate,
            weeks_remaining,
        }
    };

    debug!(
        current = format!("{:.2}", prediction.current_mastery),
        predicted = format!("{:.2}", prediction.predicted_mastery),
        target = prediction.target_mastery,
        on_track = prediction.on_track,
        "Progress forecast computed"
    );

    Ok(Some(prediction))
}
