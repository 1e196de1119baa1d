//! Weakness Analyzer
//!
//! Classifies the trend of a topic's most recent assessments. The slope is
//! measured in mastery points per session, so only the order of the
//! observations matters and shifting every timestamp changes nothing.
//!
//! Tie-break when several patterns match: declining > stuck > slow_progress > normal.

use tracing::debug;

use crate::config::PredictionConfig;
use crate::error::{PredictError, PredictResult};
use crate::regression::{index_slope, spread};
use crate::types::{
    Confidence, TopicState, WeaknessAnalysis, WeaknessPattern, MIN_CONFIDENT_OBSERVATIONS,
};

/// The trailing `recentWindow` scores, or `InsufficientData` below the
/// confident minimum.
pub fn recent_window<'a>(scores: &'a [f64], config: &PredictionConfig) -> PredictResult<&'a [f64]> {
    if scores.len() < MIN_CONFIDENT_OBSERVATIONS {
        return Err(PredictError::InsufficientData {
            needed: MIN_CONFIDENT_OBSERVATIONS,
            got: scores.len(),
        });
    }
    let start = scores.len().saturating_sub(config.recent_window);
    Ok(&scores[start..])
}

pub fn confidence_for(observation_count: usize, config: &PredictionConfig) -> Confidence {
    if observation_count < MIN_CONFIDENT_OBSERVATIONS {
        Confidence::Low
    } else if observation_count >= config.recent_window {
        Confidence::High
    } else {
        Confidence::Moderate
    }
}

/// Pattern for a window of scores whose last element is the latest mastery.
pub fn classify_pattern(slope: f64, score_spread: f64, latest: f64, config: &PredictionConfig) -> WeaknessPattern {
    if slope < -config.decline_tolerance {
        WeaknessPattern::Declining
    } else if score_spread <= config.stuck_band && slope.abs() <= config.decline_tolerance {
        WeaknessPattern::Stuck
    } else if slope < config.expected_rate_per_session && latest < config.slow_progress_floor {
        WeaknessPattern::SlowProgress
    } else {
        WeaknessPattern::Normal
    }
}

pub fn analyze_topic(state: &TopicState, config: &PredictionConfig) -> WeaknessAnalysis {
    let scores = state.scores();
    let observation_count = scores.len();
    let confidence = confidence_for(observation_count, config);

    let (pattern, trend_slope, score_spread) = match recent_window(&scores, config) {
        Ok(window) => {
            let slope = index_slope(window);
            let window_spread = spread(window);
            (
                classify_pattern(slope, window_spread, state.latest_mastery, config),
                slope,
                window_spread,
            )
        }
        Err(PredictError::InsufficientData { got, .. }) => {
            debug!(topic_id = %state.topic_id, observations = got, "Too few observations for weakness pattern");
            (WeaknessPattern::Normal, index_slope(&scores), spread(&scores))
        }
        Err(_) => (WeaknessPattern::Normal, 0.0, 0.0),
    };

    debug!(
        topic_id = %state.topic_id,
        pattern = pattern.as_str(),
        slope = format!("{:.3}", trend_slope),
        "Topic weakness analysed"
    );

    WeaknessAnalysis {
        topic_id: state.topic_id.clone(),
        pattern,
        trend_slope,
        confidence,
        observation_count,
        score_spread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TopicObservation;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn state_at(start: DateTime<Utc>, scores: &[f64]) -> TopicState {
        let observations: Vec<TopicObservation> = scores
            .iter()
            .enumerate()
            .map(|(i, &mastery)| TopicObservation {
                topic_id: "essay-structure".to_string(),
                timestamp: start + Duration::days(i as i64 * 3),
                mastery,
                session_minutes: 60.0,
            })
            .collect();
        let last = observations.last().cloned().unwrap();
        TopicState {
            topic_id: "essay-structure".to_string(),
            latest_mastery: last.mastery,
            last_practiced: last.timestamp,
            observations,
        }
    }

    fn state(scores: &[f64]) -> TopicState {
        state_at(Utc.with_ymd_and_hms(2024, 2, 5, 15, 30, 0).unwrap(), scores)
    }

    #[test]
    fn test_flat_oscillation_is_stuck() {
        let config = PredictionConfig::default();
        let analysis = analyze_topic(&state(&[50.0, 52.0, 49.0, 51.0]), &config);
        assert_eq!(analysis.pattern, WeaknessPattern::Stuck);
        assert_eq!(analysis.score_spread, 3.0);
        assert_eq!(analysis.confidence, Confidence::Moderate);
    }

    #[test]
    fn test_strict_decrease_is_declining() {
        let config = PredictionConfig::default();
        let analysis = analyze_topic(&state(&[80.0, 60.0, 40.0]), &config);
        assert_eq!(analysis.pattern, WeaknessPattern::Declining);
        assert!((analysis.trend_slope + 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_declining_wins_over_stuck_band() {
        let config = PredictionConfig {
            stuck_band: 50.0,
            ..Default::default()
        };
        let analysis = analyze_topic(&state(&[80.0, 60.0, 40.0]), &config);
        assert_eq!(analysis.pattern, WeaknessPattern::Declining);
    }

    #[test]
    fn test_slow_gain_below_floor_is_slow_progress() {
        let config = PredictionConfig::default();
        let analysis = analyze_topic(&state(&[40.0, 41.5, 44.0, 45.0, 47.5, 49.0]), &config);
        assert_eq!(analysis.pattern, WeaknessPattern::SlowProgress);
        assert_eq!(analysis.confidence, Confidence::High);
    }

    #[test]
    fn test_fast_gain_is_normal() {
        let config = PredictionConfig::default();
        let analysis = analyze_topic(&state(&[30.0, 40.0, 50.0, 60.0]), &config);
        assert_eq!(analysis.pattern, WeaknessPattern::Normal);
    }

    #[test]
    fn test_slow_gain_above_floor_is_normal() {
        let config = PredictionConfig::default();
        let analysis = analyze_topic(&state(&[72.0, 74.0, 73.0, 76.0]), &config);
        assert!(analysis.trend_slope < config.expected_rate_per_session);
        assert_eq!(analysis.pattern, WeaknessPattern::Normal);
    }

    #[test]
    fn test_few_observations_low_confidence_normal() {
        let config = PredictionConfig::default();
        let analysis = analyze_topic(&state(&[90.0, 20.0]), &config);
        assert_eq!(analysis.pattern, WeaknessPattern::Normal);
        assert_eq!(analysis.confidence, Confidence::Low);
        assert_eq!(analysis.observation_count, 2);
    }

    #[test]
    fn test_only_recent_window_counts() {
        let config = PredictionConfig {
            recent_window: 3,
            ..Default::default()
        };
        // early collapse followed by a flat plateau
        let analysis = analyze_topic(&state(&[95.0, 70.0, 45.0, 46.0, 45.0, 46.0]), &config);
        assert_eq!(analysis.pattern, WeaknessPattern::Stuck);
    }

    #[test]
    fn test_timestamp_offset_invariant() {
        let config = PredictionConfig::default();
        let scores = [55.0, 58.0, 54.0, 61.0, 59.0];
        let a = analyze_topic(&state(&scores), &config);
        let shifted = state_at(Utc.with_ymd_and_hms(2031, 9, 17, 2, 0, 0).unwrap(), &scores);
        let b = analyze_topic(&shifted, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_recent_window_reports_insufficient_data() {
        let config = PredictionConfig::default();
        assert_eq!(
            recent_window(&[1.0, 2.0], &config),
            Err(PredictError::InsufficientData { needed: 3, got: 2 })
        );
        assert_eq!(recent_window(&[1.0; 10], &config).unwrap().len(), config.recent_window);
    }
}
