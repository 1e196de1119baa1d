//! Common Types and Constants
//!
//! Input records, derived state and the plain output records handed to the
//! presentation layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Lowest valid mastery score
pub const MASTERY_MIN: f64 = 0.0;

/// Highest valid mastery score
pub const MASTERY_MAX: f64 = 100.0;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

pub const DAYS_PER_WEEK: f64 = 7.0;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

/// Observations needed before a weakness classification is trusted
pub const MIN_CONFIDENT_OBSERVATIONS: usize = 3;

/// Elapsed days between two instants, fractional.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

// ==================== Input Types ====================

/// One assessed mastery score for a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicObservation {
    pub topic_id: String,
    pub timestamp: DateTime<Utc>,
    /// Mastery score [0, 100]
    pub mastery: f64,
    /// Session length in minutes
    #[serde(default)]
    pub session_minutes: f64,
}

/// Topic id -> time-ordered observations.
pub type History = BTreeMap<String, Vec<TopicObservation>>;

/// Validated per-topic state derived from its history.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicState {
    pub topic_id: String,
    pub latest_mastery: f64,
    pub last_practiced: DateTime<Utc>,
    /// Strictly increasing by timestamp, never empty
    pub observations: Vec<TopicObservation>,
}

impl TopicState {
    pub fn scores(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.mastery).collect()
    }

    /// The second-to-last observation, if any.
    pub fn previous(&self) -> Option<&TopicObservation> {
        let n = self.observations.len();
        if n >= 2 {
            self.observations.get(n - 2)
        } else {
            None
        }
    }
}

/// A timestamped aggregate mastery value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryPoint {
    pub timestamp: DateTime<Utc>,
    pub mastery: f64,
}

// ==================== Classification Types ====================

/// Review urgency, ordered by ascending severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Strong,
    Stable,
    Warning,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Stable => "stable",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// The next more severe band, `None` for critical.
    pub fn worse(&self) -> Option<Self> {
        match self {
            Self::Strong => Some(Self::Stable),
            Self::Stable => Some(Self::Warning),
            Self::Warning => Some(Self::Critical),
            Self::Critical => None,
        }
    }
}

/// Trend pattern of a topic's recent assessments, ordered by ascending severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaknessPattern {
    Normal,
    SlowProgress,
    Stuck,
    Declining,
}

impl WeaknessPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::SlowProgress => "slow_progress",
            Self::Stuck => "stuck",
            Self::Declining => "declining",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Priority {
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

// ==================== Output Types ====================

/// Retention estimate and urgency for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPrediction {
    pub topic_id: String,
    /// Last observed mastery [0, 100]
    pub last_mastery: f64,
    /// Modeled retention at the as-of time [0, 100]
    pub predicted_retention: f64,
    pub urgency: Urgency,
    pub days_idle: f64,
    /// Decay rate per day used for this topic
    pub decay_rate: f64,
    /// Days from as-of until the next worse band, `None` when already critical
    pub days_until_escalation: Option<f64>,
    /// Days from as-of until the critical band, `None` when already critical
    pub days_until_critical: Option<f64>,
}

/// Trend diagnosis for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaknessAnalysis {
    pub topic_id: String,
    pub pattern: WeaknessPattern,
    /// Mastery points per session over the recent window
    pub trend_slope: f64,
    pub confidence: Confidence,
    pub observation_count: usize,
    /// max - min over the recent window
    pub score_spread: f64,
}

/// Aggregate mastery forecast against a target and deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPrediction {
    pub current_mastery: f64,
    pub target_mastery: f64,
    pub predicted_mastery: f64,
    pub on_track: bool,
    /// `None` when the deadline has passed
    pub required_weekly_rate: Option<f64>,
    pub observed_weekly_rate: f64,
    pub weeks_remaining: f64,
}

/// What to teach next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSessionRecommendation {
    pub focus_topics: Vec<String>,
    pub suggested_duration_minutes: u32,
    pub priority: Priority,
    pub rationale: String,
}

/// A topic left out of the per-topic outputs, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRejection {
    pub topic_id: String,
    pub reason: String,
}

/// Everything one `predict` call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReport {
    pub predictions: BTreeMap<String, TopicPrediction>,
    pub weaknesses: BTreeMap<String, WeaknessAnalysis>,
    pub progress: Option<ProgressPrediction>,
    pub recommendation: NextSessionRecommendation,
    pub rejected: Vec<TopicRejection>,
}
