//! Error taxonomy for the prediction engine.
//!
//! Only configuration problems and whole-request contract violations fail
//! [`crate::predict`]. Per-topic problems are reported as
//! [`crate::types::TopicRejection`] entries and the rest of the run proceeds.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    /// Fewer observations than a sub-computation needs. Callers fall back to a
    /// lower-confidence default instead of surfacing this.
    #[error("insufficient data: need {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A tunable is outside its valid range or could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The caller broke an input contract (negative elapsed time, non-finite
    /// values, out-of-range target).
    #[error("computation domain error: {0}")]
    ComputationDomain(String),

    /// A topic's observation list is not usable as a history.
    #[error("malformed history for topic {topic_id}: {reason}")]
    MalformedHistory { topic_id: String, reason: String },
}

pub type PredictResult<T> = Result<T, PredictError>;

impl PredictError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        Self::ComputationDomain(msg.into())
    }

    pub fn malformed(topic_id: &str, reason: impl Into<String>) -> Self {
        Self::MalformedHistory {
            topic_id: topic_id.to_string(),
            reason: reason.into(),
        }
    }
}
