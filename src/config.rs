//! Configuration
//!
//! [`PredictionConfig`] holds every tunable the models read. It loads from
//! JSON, takes `PREDICT_*` environment overrides, and is validated before
//! any computation. [`AppConfig`] carries the CLI's process settings.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PredictError, PredictResult};
use crate::types::{MASTERY_MAX, MASTERY_MIN, MIN_CONFIDENT_OBSERVATIONS};

/// Tunables for every component. Values are placeholders that keep the band
/// structure; calibrate against real session data before trusting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictionConfig {
    pub low_retention_threshold: f64,
    pub mid_retention_threshold: f64,
    pub high_retention_threshold: f64,
    pub idle_days_short: f64,
    pub idle_days_medium: f64,
    pub idle_days_long: f64,
    pub stuck_band: f64,
    pub decline_tolerance: f64,
    pub slow_progress_floor: f64,
    pub expected_rate_per_session: f64,
    pub focus_topic_count: usize,
    pub baseline_duration_minutes: u32,
    pub duration_increment_minutes: u32,
    pub max_duration_minutes: u32,
    /// Per-day decay used when a topic has no forgetting signal
    pub default_decay_rate: f64,
    pub min_decay_rate: f64,
    pub max_decay_rate: f64,
    /// Sessions considered by the weakness analysis
    pub recent_window: usize,
    /// Below this many points the forecaster averages instead of regressing
    pub min_regression_points: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            low_retention_threshold: 40.0,
            mid_retention_threshold: 60.0,
            high_retention_threshold: 80.0,
            idle_days_short: 7.0,
            idle_days_medium: 14.0,
            idle_days_long: 30.0,
            stuck_band: 5.0,
            decline_tolerance: 1.0,
            slow_progress_floor: 70.0,
            expected_rate_per_session: 3.0,
            focus_topic_count: 3,
            baseline_duration_minutes: 45,
            duration_increment_minutes: 15,
            max_duration_minutes: 90,
            default_decay_rate: 0.05,
            min_decay_rate: 0.01,
            max_decay_rate: 0.5,
            recent_window: 6,
            min_regression_points: 3,
        }
    }
}

impl PredictionConfig {
    /// Parse a JSON document naming any subset of the options, then validate.
    pub fn from_json_str(json: &str) -> PredictResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PredictError::invalid_config(format!("unreadable config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `PREDICT_*` environment variables.
    pub fn from_env() -> PredictResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> PredictResult<()> {
        env_override("PREDICT_LOW_RETENTION_THRESHOLD", &mut self.low_retention_threshold)?;
        env_override("PREDICT_MID_RETENTION_THRESHOLD", &mut self.mid_retention_threshold)?;
        env_override("PREDICT_HIGH_RETENTION_THRESHOLD", &mut self.high_retention_threshold)?;
        env_override("PREDICT_IDLE_DAYS_SHORT", &mut self.idle_days_short)?;
        env_override("PREDICT_IDLE_DAYS_MEDIUM", &mut self.idle_days_medium)?;
        env_override("PREDICT_IDLE_DAYS_LONG", &mut self.idle_days_long)?;
        env_override("PREDICT_STUCK_BAND", &mut self.stuck_band)?;
        env_override("PREDICT_DECLINE_TOLERANCE", &mut self.decline_tolerance)?;
        env_override("PREDICT_SLOW_PROGRESS_FLOOR", &mut self.slow_progress_floor)?;
        env_override("PREDICT_EXPECTED_RATE_PER_SESSION", &mut self.expected_rate_per_session)?;
        env_override("PREDICT_FOCUS_TOPIC_COUNT", &mut self.focus_topic_count)?;
        env_override("PREDICT_BASELINE_DURATION_MINUTES", &mut self.baseline_duration_minutes)?;
        env_override("PREDICT_DURATION_INCREMENT_MINUTES", &mut self.duration_increment_minutes)?;
        env_override("PREDICT_MAX_DURATION_MINUTES", &mut self.max_duration_minutes)?;
        env_override("PREDICT_DEFAULT_DECAY_RATE", &mut self.default_decay_rate)?;
        env_override("PREDICT_MIN_DECAY_RATE", &mut self.min_decay_rate)?;
        env_override("PREDICT_MAX_DECAY_RATE", &mut self.max_decay_rate)?;
        env_override("PREDICT_RECENT_WINDOW", &mut self.recent_window)?;
        env_override("PREDICT_MIN_REGRESSION_POINTS", &mut self.min_regression_points)?;
        Ok(())
    }

    pub fn validate(&self) -> PredictResult<()> {
        let floats = [
            ("lowRetentionThreshold", self.low_retention_threshold),
            ("midRetentionThreshold", self.mid_retention_threshold),
            ("highRetentionThreshold", self.high_retention_threshold),
            ("idleDaysShort", self.idle_days_short),
            ("idleDaysMedium", self.idle_days_medium),
            ("idleDaysLong", self.idle_days_long),
            ("stuckBand", self.stuck_band),
            ("declineTolerance", self.decline_tolerance),
            ("slowProgressFloor", self.slow_progress_floor),
            ("expectedRatePerSession", self.expected_rate_per_session),
            ("defaultDecayRate", self.default_decay_rate),
            ("minDecayRate", self.min_decay_rate),
            ("maxDecayRate", self.max_decay_rate),
        ];
        if let Some((name, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PredictError::invalid_config(format!("{name} must be finite")));
        }

        if !(self.low_retention_threshold > MASTERY_MIN
            && self.low_retention_threshold < self.mid_retention_threshold
            && self.mid_retention_threshold < self.high_retention_threshold
            && self.high_retention_threshold <= MASTERY_MAX)
        {
            return Err(PredictError::invalid_config(format!(
                "retention thresholds must satisfy 0 < low < mid < high <= 100, got {} / {} / {}",
                self.low_retention_threshold, self.mid_retention_threshold, self.high_retention_threshold
            )));
        }

        if !(self.idle_days_short > 0.0
            && self.idle_days_short < self.idle_days_medium
            && self.idle_days_medium < self.idle_days_long)
        {
            return Err(PredictError::invalid_config(format!(
                "idle bounds must satisfy 0 < short < medium < long, got {} / {} / {}",
                self.idle_days_short, self.idle_days_medium, self.idle_days_long
            )));
        }

        if self.stuck_band < 0.0 {
            return Err(PredictError::invalid_config("stuckBand must be non-negative"));
        }
        if self.decline_tolerance < 0.0 {
            return Err(PredictError::invalid_config("declineTolerance must be non-negative"));
        }
        if self.expected_rate_per_session <= 0.0 {
            return Err(PredictError::invalid_config("expectedRatePerSession must be positive"));
        }
        if !(MASTERY_MIN..=MASTERY_MAX).contains(&self.slow_progress_floor) {
            return Err(PredictError::invalid_config("slowProgressFloor must be within [0, 100]"));
        }

        if !(self.min_decay_rate > 0.0
            && self.min_decay_rate <= self.default_decay_rate
            && self.default_decay_rate <= self.max_decay_rate)
        {
            return Err(PredictError::invalid_config(format!(
                "decay rates must satisfy 0 < min <= default <= max, got {} / {} / {}",
                self.min_decay_rate, self.default_decay_rate, self.max_decay_rate
            )));
        }

        if self.focus_topic_count == 0 {
            return Err(PredictError::invalid_config("focusTopicCount must be at least 1"));
        }
        if self.max_duration_minutes == 0 || self.baseline_duration_minutes > self.max_duration_minutes {
            return Err(PredictError::invalid_config(format!(
                "baselineDurationMinutes ({}) must not exceed a positive maxDurationMinutes ({})",
                self.baseline_duration_minutes, self.max_duration_minutes
            )));
        }
        if self.recent_window < MIN_CONFIDENT_OBSERVATIONS {
            return Err(PredictError::invalid_config(format!(
                "recentWindow must be at least {MIN_CONFIDENT_OBSERVATIONS}"
            )));
        }
        if self.min_regression_points < 2 {
            return Err(PredictError::invalid_config("minRegressionPoints must be at least 2"));
        }

        Ok(())
    }
}

fn file_log_dir(enabled: Option<&str>, dir: Option<String>) -> Option<PathBuf> {
    match enabled {
        Some("true") | Some("1") => Some(PathBuf::from(
            dir.filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "./logs".to_string()),
        )),
        _ => None,
    }
}

fn env_override<T: FromStr>(key: &str, target: &mut T) -> PredictResult<()> {
    if let Ok(raw) = std::env::var(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| PredictError::invalid_config(format!("{key}={raw} is not a valid value")))?;
    }
    Ok(())
}

/// Runtime settings for the command-line front end.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub config_path: Option<PathBuf>,
    /// Directory for daily log files, `None` when file logging is off
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let config_path = std::env::var("PREDICT_CONFIG_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let log_dir = file_log_dir(
            std::env::var("ENABLE_FILE_LOGS").ok().as_deref(),
            std::env::var("LOG_DIR").ok(),
        );

        Self {
            log_level,
            config_path,
            log_dir,
        }
    }

    /// File config (if any) overlaid with environment overrides.
    pub fn load_prediction_config(&self) -> PredictResult<PredictionConfig> {
        let mut config = match &self.config_path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    PredictError::invalid_config(format!("cannot read {}: {e}", path.display()))
                })?;
                serde_json::from_str(&text)
                    .map_err(|e| PredictError::invalid_config(format!("unreadable config: {e}")))?
            }
            None => PredictionConfig::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }
}
