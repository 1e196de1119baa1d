//! Retention Model
//!
//! Forgetting-curve estimate of how much of a topic's last observed mastery
//! is still retained, and the review urgency that follows from it.
//!
//! Mathematical formulas:
//! - Retention: R = M · e^(−k·D)
//!   - M: last observed mastery [0, 100]
//!   - D: days since last practice
//!   - k: per-day decay rate, clamped to [minDecayRate, maxDecayRate]
//! - Decay estimate from the last two scores M₁ > M₂, Δt days apart:
//!   k = ln(M₁ / M₂) / Δt
//! - Day at which R reaches threshold T: D = ln(M / T) / k

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::PredictionConfig;
use crate::error::{PredictError, PredictResult};
use crate::sanitize::is_valid_mastery;
use crate::types::{days_between, TopicPrediction, TopicState, Urgency, EPSILON};

/// R = M · e^(−k·D).
///
/// Negative elapsed days or a non-positive decay rate are caller bugs and
/// are reported, not clamped.
pub fn retention(mastery: f64, days_elapsed: f64, decay_rate: f64) -> PredictResult<f64> {
    if !is_valid_mastery(mastery) {
        return Err(PredictError::domain(format!("mastery {mastery} outside [0, 100]")));
    }
    if !days_elapsed.is_finite() || days_elapsed < 0.0 {
        return Err(PredictError::domain(format!(
            "elapsed days must be non-negative, got {days_elapsed}"
        )));
    }
    if !decay_rate.is_finite() || decay_rate <= 0.0 {
        return Err(PredictError::domain(format!(
            "decay rate must be positive, got {decay_rate}"
        )));
    }

    Ok(mastery * (-decay_rate * days_elapsed).exp())
}

/// Per-day decay rate for a topic.
///
/// Only a drop between the last two observations carries a forgetting
/// signal; a single observation, a rise or an unchanged score falls back to
/// the configured default.
pub fn estimate_decay_rate(state: &TopicState, config: &PredictionConfig) -> f64 {
    let estimated = match state.previous() {
        Some(prev) if prev.mastery > state.latest_mastery => {
            let dt = days_between(prev.timestamp, state.last_practiced);
            if dt <= 0.0 {
                config.default_decay_rate
            } else if state.latest_mastery <= EPSILON {
                config.max_decay_rate
            } else {
                (prev.mastery / state.latest_mastery).ln() / dt
            }
        }
        _ => config.default_decay_rate,
    };

    if estimated.is_finite() {
        estimated.clamp(config.min_decay_rate, config.max_decay_rate)
    } else {
        config.max_decay_rate
    }
}

/// Urgency from retention and idle time only.
pub fn classify_urgency(retention: f64, days_idle: f64, config: &PredictionConfig) -> Urgency {
    if retention < config.low_retention_threshold || days_idle >= config.idle_days_long {
        Urgency::Critical
    } else if retention < config.mid_retention_threshold || days_idle >= config.idle_days_medium {
        Urgency::Warning
    } else if retention < config.high_retention_threshold || days_idle >= config.idle_days_short {
        Urgency::Stable
    } else {
        Urgency::Strong
    }
}

/// Retention threshold and idle bound that put a topic into `band`.
fn band_entry(band: Urgency, config: &PredictionConfig) -> Option<(f64, f64)> {
    match band {
        Urgency::Strong => None,
        Urgency::Stable => Some((config.high_retention_threshold, config.idle_days_short)),
        Urgency::Warning => Some((config.mid_retention_threshold, config.idle_days_medium)),
        Urgency::Critical => Some((config.low_retention_threshold, config.idle_days_long)),
    }
}

/// Days from now until the topic enters `band`, whichever of the retention
/// crossing or the idle bound comes first.
pub fn days_until_band(
    mastery: f64,
    days_idle: f64,
    decay_rate: f64,
    band: Urgency,
    config: &PredictionConfig,
) -> Option<f64> {
    let (threshold, idle_bound) = band_entry(band, config)?;

    let crossing_day = if mastery <= threshold {
        days_idle
    } else {
        (mastery / threshold).ln() / decay_rate
    };

    let entry_day = crossing_day.min(idle_bound);
    Some((entry_day - days_idle).max(0.0))
}

/// Days until the next worse band; `None` once critical.
pub fn days_until_escalation(
    mastery: f64,
    days_idle: f64,
    decay_rate: f64,
    urgency: Urgency,
    config: &PredictionConfig,
) -> Option<f64> {
    let next = urgency.worse()?;
    days_until_band(mastery, days_idle, decay_rate, next, config)
}

/// Full retention prediction for one topic as of `as_of`.
pub fn predict_topic(
    state: &TopicState,
    as_of: DateTime<Utc>,
    config: &PredictionConfig,
) -> PredictResult<TopicPrediction> {
    let days_idle = days_between(state.last_practiced, as_of);
    if days_idle < 0.0 {
        return Err(PredictError::domain(format!(
            "as-of {as_of} precedes last practice {} of topic {}",
            state.last_practiced, state.topic_id
        )));
    }

    let mastery = state.latest_mastery;
    let decay_rate = estimate_decay_rate(state, config);
    let predicted_retention = retention(mastery, days_idle, decay_rate)?;
    let urgency = classify_urgency(predicted_retention, days_idle, config);

    let days_until_escalation = days_until_escalation(mastery, days_idle, decay_rate, urgency, config);
    let days_until_critical = if urgency == Urgency::Critical {
        None
    } else {
        days_until_band(mastery, days_idle, decay_rate, Urgency::Critical, config)
    };

    debug!(
        topic_id = %state.topic_id,
        retention = format!("{:.2}", predicted_retention),
        days_idle = format!("{:.2}", days_idle),
        decay_rate = format!("{:.4}", decay_rate),
        urgency = urgency.as_str(),
        "Topic retention predicted"
    );

    Ok(TopicPrediction {
        topic_id: state.topic_id.clone(),
        last_mastery: mastery,
        predicted_retention,
        urgency,
        days_idle,
        decay_rate,
        days_until_escalation,
        days_until_critical,
    })
}
