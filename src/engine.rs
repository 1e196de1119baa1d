//! Prediction Engine
//!
//! Runs every component over one student's history and assembles the
//! [`PredictionReport`]. Topics are validated one at a time; a bad topic is
//! logged, listed in `rejected`, and left out of every other output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PredictionConfig;
use crate::error::{PredictError, PredictResult};
use crate::forecast::forecast_progress;
use crate::recommend::compose_recommendation;
use crate::retention::predict_topic;
use crate::sanitize::{build_topic_state, clamp_mastery, is_valid_mastery};
use crate::types::{History, MasteryPoint, PredictionReport, TopicRejection, TopicState};
use crate::weakness::analyze_topic;

/// A complete `predict` invocation as the presentation layer sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub history: History,
    pub target_mastery: f64,
    pub deadline: DateTime<Utc>,
    pub as_of: DateTime<Utc>,
    /// Overrides the caller's default config when present
    #[serde(default)]
    pub config: Option<PredictionConfig>,
}

impl PredictionRequest {
    pub fn run(&self, default_config: &PredictionConfig) -> PredictResult<PredictionReport> {
        let config = self.config.as_ref().unwrap_or(default_config);
        predict(&self.history, self.target_mastery, self.deadline, self.as_of, config)
    }
}

/// Mean of every topic's latest score at each distinct observation instant.
pub fn aggregate_series(states: &[TopicState]) -> Vec<MasteryPoint> {
    let mut events: Vec<(DateTime<Utc>, &str, f64)> = states
        .iter()
        .flat_map(|s| {
            s.observations
                .iter()
                .map(move |o| (o.timestamp, s.topic_id.as_str(), o.mastery))
        })
        .collect();
    events.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let mut latest: BTreeMap<&str, f64> = BTreeMap::new();
    let mut series: Vec<MasteryPoint> = Vec::new();

    for (timestamp, topic_id, mastery) in events {
        latest.insert(topic_id, mastery);
        // summed fresh each step: a running total drifts past 100 after enough updates
        let mean = latest.values().sum::<f64>() / latest.len() as f64;
        let point = MasteryPoint {
            timestamp,
            mastery: clamp_mastery(mean),
        };

        match series.last_mut() {
            Some(last) if last.timestamp == timestamp => *last = point,
            _ => series.push(point),
        }
    }

    series
}

fn reject(rejected: &mut Vec<TopicRejection>, topic_id: &str, err: &PredictError) {
    warn!(topic_id = %topic_id, error = %err, "Topic dropped from prediction");
    rejected.push(TopicRejection {
        topic_id: topic_id.to_string(),
        reason: err.to_string(),
    });
}

/// Run every component over one student's history.
///
/// Fails only on an invalid configuration or an out-of-range target. A topic
/// whose data is malformed, or which was observed after `as_of`, is left out
/// of every output and listed in `rejected`; other topics are unaffected.
pub fn predict(
    history: &History,
    target_mastery: f64,
    deadline: DateTime<Utc>,
    as_of: DateTime<Utc>,
    config: &PredictionConfig,
) -> PredictResult<PredictionReport> {
    config.validate()?;
    if !is_valid_mastery(target_mastery) {
        return Err(PredictError::domain(format!(
            "target mastery {target_mastery} outside [0, 100]"
        )));
    }

    let mut rejected = Vec::new();
    let mut accepted = Vec::new();
    let mut predictions = BTreeMap::new();

    for (topic_id, observations) in history {
        let state = match build_topic_state(topic_id, observations) {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!(topic_id = %topic_id, "Topic has no observations, skipping");
                continue;
            }
            Err(err) => {
                reject(&mut rejected, topic_id, &err);
                continue;
            }
        };

        match predict_topic(&state, as_of, config) {
            Ok(prediction) => {
                predictions.insert(topic_id.clone(), prediction);
                accepted.push(state);
            }
            Err(err) => reject(&mut rejected, topic_id, &err),
        }
    }

    let weaknesses: BTreeMap<_, _> = accepted
        .iter()
        .map(|state| (state.topic_id.clone(), analyze_topic(state, config)))
        .collect();

    let series = aggregate_series(&accepted);
    let progress = forecast_progress(&series, target_mastery, deadline, as_of, config)?;
    let recommendation = compose_recommendation(&predictions, &weaknesses, config);

    info!(
        topics = history.len(),
        predicted = predictions.len(),
        rejected = rejected.len(),
        priority = recommendation.priority.as_str(),
        focus = ?recommendation.focus_topics,
        "Prediction completed"
    );

    Ok(PredictionReport {
        predictions,
        weaknesses,
        progress,
        recommendation,
        rejected,
    })
}
