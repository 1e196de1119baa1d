//! Data Sanitization
//!
//! Validation of caller-supplied histories before any model runs.
//!
//! Functions:
//! - Mastery range checks
//! - Topic history validation into [`TopicState`]

use crate::error::{PredictError, PredictResult};
use crate::types::{TopicObservation, TopicState, MASTERY_MAX, MASTERY_MIN};

pub fn is_valid_mastery(value: f64) -> bool {
    value.is_finite() && (MASTERY_MIN..=MASTERY_MAX).contains(&value)
}

/// Clamp into [0, 100]; NaN maps to 0.
pub fn clamp_mastery(value: f64) -> f64 {
    if value.is_nan() {
        return MASTERY_MIN;
    }
    value.clamp(MASTERY_MIN, MASTERY_MAX)
}

/// Validate one topic's observations and derive its state.
///
/// Returns `Ok(None)` for an empty history: there is no baseline, which is
/// not an error. Any observation that is out of range, belongs to another
/// topic, or breaks strict time ordering rejects the whole topic.
pub fn build_topic_state(
    topic_id: &str,
    observations: &[TopicObservation],
) -> PredictResult<Option<TopicState>> {
    let Some(last) = observations.last() else {
        return Ok(None);
    };

    for (i, obs) in observations.iter().enumerate() {
        if obs.topic_id != topic_id {
            return Err(PredictError::malformed(
                topic_id,
                format!("observation {i} belongs to topic {}", obs.topic_id),
            ));
        }
        if !is_valid_mastery(obs.mastery) {
            return Err(PredictError::malformed(
                topic_id,
                format!("observation {i} has mastery {} outside [0, 100]", obs.mastery),
            ));
        }
        if !obs.session_minutes.is_finite() || obs.session_minutes < 0.0 {
            return Err(PredictError::malformed(
                topic_id,
                format!("observation {i} has invalid session duration {}", obs.session_minutes),
            ));
        }
    }

    for (i, pair) in observations.windows(2).enumerate() {
        if pair[1].timestamp == pair[0].timestamp {
            return Err(PredictError::malformed(
                topic_id,
                format!("duplicate timestamp {} at observation {}", pair[1].timestamp, i + 1),
            ));
        }
        if pair[1].timestamp < pair[0].timestamp {
            return Err(PredictError::malformed(
                topic_id,
                format!("observation {} is earlier than its predecessor", i + 1),
            ));
        }
    }

    Ok(Some(TopicState {
        topic_id: topic_id.to_string(),
        latest_mastery: last.mastery,
        last_practiced: last.timestamp,
        observations: observations.to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn obs(topic: &str, day: i64, mastery: f64) -> TopicObservation {
        TopicObservation {
            topic_id: topic.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(day),
            mastery,
            session_minutes: 30.0,
        }
    }

    // ==================== 范围检查 测试 ====================

    #[test]
    fn test_is_valid_mastery() {
        assert!(is_valid_mastery(0.0));
        assert!(is_valid_mastery(100.0));
        assert!(!is_valid_mastery(100.01));
        assert!(!is_valid_mastery(f64::NAN));
        assert!(!is_valid_mastery(f64::INFINITY));
    }

    #[test]
    fn test_clamp_mastery() {
        assert_eq!(clamp_mastery(-3.0), 0.0);
        assert_eq!(clamp_mastery(104.0), 100.0);
        assert_eq!(clamp_mastery(55.5), 55.5);
        assert_eq!(clamp_mastery(f64::NAN), 0.0);
    }

    // ==================== build_topic_state 测试 ====================

    #[test]
    fn test_empty_history_has_no_state() {
        assert_eq!(build_topic_state("algebra", &[]).unwrap(), None);
    }

    #[test]
    fn test_valid_history_builds_state() {
        let history = vec![obs("algebra", 0, 40.0), obs("algebra", 3, 55.0)];
        let state = build_topic_state("algebra", &history).unwrap().unwrap();
        assert_eq!(state.latest_mastery, 55.0);
        assert_eq!(state.last_practiced, history[1].timestamp);
        assert_eq!(state.observations.len(), 2);
        assert_eq!(state.previous().map(|o| o.mastery), Some(40.0));
    }

    #[test]
    fn test_zero_mastery_is_valid() {
        let state = build_topic_state("algebra", &[obs("algebra", 0, 0.0)]).unwrap();
        assert!(state.is_some());
    }

    #[test]
    fn test_out_of_range_mastery_rejected() {
        let err = build_topic_state("algebra", &[obs("algebra", 0, 101.0)]).unwrap_err();
        assert!(matches!(err, PredictError::MalformedHistory { .. }));
        assert!(build_topic_state("algebra", &[obs("algebra", 0, f64::NAN)]).is_err());
    }

    #[test]
    fn test_duplicate_and_unordered_timestamps_rejected() {
        let dup = vec![obs("algebra", 1, 40.0), obs("algebra", 1, 50.0)];
        assert!(build_topic_state("algebra", &dup).is_err());

        let unordered = vec![obs("algebra", 5, 40.0), obs("algebra", 1, 50.0)];
        assert!(build_topic_state("algebra", &unordered).is_err());
    }

    #[test]
    fn test_foreign_topic_rejected() {
        let history = vec![obs("algebra", 0, 40.0), obs("geometry", 1, 50.0)];
        let err = build_topic_state("algebra", &history).unwrap_err();
        assert!(err.to_string().contains("geometry"));
    }

    #[test]
    fn test_negative_session_duration_rejected() {
        let mut bad = obs("algebra", 0, 40.0);
        bad.session_minutes = -5.0;
        assert!(build_topic_state("algebra", &[bad]).is_err());
    }
}
