//! Recommendation Composer
//!
//! Fuses per-topic retention and weakness results into the next-session plan.
//!
//! Ranking key, most important first:
//! 1. urgency severity (critical > warning > stable > strong)
//! 2. weakness severity (declining > stuck > slow_progress > normal)
//! 3. days idle, longest first
//! 4. topic id, ascending

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::PredictionConfig;
use crate::types::{
    NextSessionRecommendation, Priority, TopicPrediction, Urgency, WeaknessAnalysis, WeaknessPattern,
};

/// A topic present in both the prediction and weakness maps.
#[derive(Debug, Clone, Copy)]
pub struct RankedTopic<'a> {
    pub prediction: &'a TopicPrediction,
    pub weakness: &'a WeaknessAnalysis,
}

impl RankedTopic<'_> {
    pub fn topic_id(&self) -> &str {
        &self.prediction.topic_id
    }

    /// Critical retention or a declining trend.
    pub fn is_urgent(&self) -> bool {
        self.prediction.urgency == Urgency::Critical || self.weakness.pattern == WeaknessPattern::Declining
    }

    pub fn needs_attention(&self) -> bool {
        self.prediction.urgency == Urgency::Warning
            || matches!(
                self.weakness.pattern,
                WeaknessPattern::Stuck | WeaknessPattern::SlowProgress
            )
    }
}

fn rank_order(a: &RankedTopic<'_>, b: &RankedTopic<'_>) -> Ordering {
    b.prediction
        .urgency
        .cmp(&a.prediction.urgency)
        .then_with(|| b.weakness.pattern.cmp(&a.weakness.pattern))
        .then_with(|| b.prediction.days_idle.total_cmp(&a.prediction.days_idle))
        .then_with(|| a.topic_id().cmp(b.topic_id()))
}

/// All topics present in both maps, most pressing first. Topics missing from
/// either map are skipped.
pub fn rank_topics<'a>(
    predictions: &'a BTreeMap<String, TopicPrediction>,
    weaknesses: &'a BTreeMap<String, WeaknessAnalysis>,
) -> Vec<RankedTopic<'a>> {
    let mut ranked: Vec<RankedTopic<'a>> = predictions
        .iter()
        .filter_map(|(topic_id, prediction)| {
            weaknesses
                .get(topic_id)
                .map(|weakness| RankedTopic { prediction, weakness })
        })
        .collect();
    ranked.sort_by(rank_order);
    ranked
}

pub fn suggested_duration(urgent_selected: usize, config: &PredictionConfig) -> u32 {
    let additional = u32::try_from(urgent_selected.saturating_sub(1)).unwrap_or(u32::MAX);
    config
        .baseline_duration_minutes
        .saturating_add(config.duration_increment_minutes.saturating_mul(additional))
        .min(config.max_duration_minutes)
}

pub fn priority_for(selected: &[RankedTopic<'_>]) -> Priority {
    if selected.iter().any(RankedTopic::is_urgent) {
        Priority::Urgent
    } else if selected.iter().any(RankedTopic::needs_attention) {
        Priority::High
    } else {
        Priority::Normal
    }
}

fn join_topics(ids: &[String]) -> String {
    match ids {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Lead signal for the rationale, ordered by ascending severity. Urgent
/// topics map to `Declining` and above, attention topics to `SlowProgress`
/// through `Fading`, so the sentence agrees with [`priority_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Signal {
    OnTrack,
    SlowProgress,
    Stuck,
    Fading,
    Declining,
    Critical,
    CriticalDeclining,
}

fn signal_of(topic: &RankedTopic<'_>) -> Signal {
    match (topic.prediction.urgency, topic.weakness.pattern) {
        (Urgency::Critical, WeaknessPattern::Declining) => Signal::CriticalDeclining,
        (Urgency::Critical, _) => Signal::Critical,
        (_, WeaknessPattern::Declining) => Signal::Declining,
        (Urgency::Warning, _) => Signal::Fading,
        (_, WeaknessPattern::Stuck) => Signal::Stuck,
        (_, WeaknessPattern::SlowProgress) => Signal::SlowProgress,
        _ => Signal::OnTrack,
    }
}

/// Templated sentence led by the most severe signal among the selected
/// topics. Equal signals go to the higher-ranked topic.
pub fn rationale(selected: &[RankedTopic<'_>]) -> String {
    let lead_topic = selected
        .iter()
        .map(|t| (signal_of(t), t))
        .min_by_key(|&(signal, _)| std::cmp::Reverse(signal));
    let Some((signal, top)) = lead_topic else {
        return "No topic history yet; nothing to review.".to_string();
    };

    let ids: Vec<String> = selected.iter().map(|t| t.topic_id().to_string()).collect();
    let focus = join_topics(&ids);
    let name = top.topic_id();

    let lead = match signal {
        Signal::CriticalDeclining => {
            format!("{name} has dropped to critical retention and its scores are declining")
        }
        Signal::Critical => format!("{name} has dropped to critical retention"),
        Signal::Declining => format!("{name} scores are declining"),
        Signal::Fading => format!("{name} retention is fading"),
        Signal::Stuck => format!("{name} has plateaued"),
        Signal::SlowProgress => format!("{name} is progressing slower than expected"),
        Signal::OnTrack => return format!("All topics are on track; continue with {focus}."),
    };

    format!("{lead}; focus next session on {focus}.")
}

pub fn compose_recommendation(
    predictions: &BTreeMap<String, TopicPrediction>,
    weaknesses: &BTreeMap<String, WeaknessAnalysis>,
    config: &PredictionConfig,
) -> NextSessionRecommendation {
    let ranked = rank_topics(predictions, weaknesses);
    let selected: Vec<RankedTopic<'_>> = ranked.into_iter().take(config.focus_topic_count).collect();

    let urgent_selected = selected.iter().filter(|t| t.is_urgent()).count();

    NextSessionRecommendation {
        focus_topics: selected.iter().map(|t| t.topic_id().to_string()).collect(),
        suggested_duration_minutes: suggested_duration(urgent_selected, config),
        priority: priority_for(&selected),
        rationale: rationale(&selected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Confidence;

    fn prediction(topic: &str, urgency: Urgency, days_idle: f64) -> TopicPrediction {
        TopicPrediction {
            topic_id: topic.to_string(),
            last_mastery: 60.0,
            predicted_retention: 50.0,
            urgency,
            days_idle,
            decay_rate: 0.05,
            days_until_escalation: None,
            days_until_critical: None,
        }
    }

    fn weakness(topic: &str, pattern: WeaknessPattern) -> WeaknessAnalysis {
        WeaknessAnalysis {
            topic_id: topic.to_string(),
            pattern,
            trend_slope: 0.0,
            confidence: Confidence::High,
            observation_count: 6,
            score_spread: 4.0,
        }
    }

    fn maps(
        topics: &[(&str, Urgency, WeaknessPattern, f64)],
    ) -> (BTreeMap<String, TopicPrediction>, BTreeMap<String, WeaknessAnalysis>) {
        let mut predictions = BTreeMap::new();
        let mut weaknesses = BTreeMap::new();
        for &(topic, urgency, pattern, idle) in topics {
            predictions.insert(topic.to_string(), prediction(topic, urgency, idle));
            weaknesses.insert(topic.to_string(), weakness(topic, pattern));
        }
        (predictions, weaknesses)
    }

    #[test]
    fn test_critical_declining_ranks_first() {
        let (p, w) = maps(&[
            ("algebra", Urgency::Strong, WeaknessPattern::Normal, 1.0),
            ("vectors", Urgency::Critical, WeaknessPattern::Declining, 9.0),
        ]);
        let rec = compose_recommendation(&p, &w, &PredictionConfig::default());
        assert_eq!(rec.focus_topics.first().map(String::as_str), Some("vectors"));
        assert_eq!(rec.priority, Priority::Urgent);
        assert!(rec.rationale.starts_with("vectors has dropped to critical retention"));
    }

    #[test]
    fn test_ranking_key_order() {
        let (p, w) = maps(&[
            ("a-warning-stuck", Urgency::Warning, WeaknessPattern::Stuck, 3.0),
            ("b-warning-declining", Urgency::Warning, WeaknessPattern::Declining, 1.0),
            ("c-warning-stuck-idle", Urgency::Warning, WeaknessPattern::Stuck, 8.0),
            ("d-stable", Urgency::Stable, WeaknessPattern::Declining, 20.0),
            ("e-critical", Urgency::Critical, WeaknessPattern::Normal, 0.5),
        ]);
        let ranked = rank_topics(&p, &w);
        let order: Vec<&str> = ranked.iter().map(|t| t.topic_id()).collect();
        assert_eq!(
            order,
            vec![
                "e-critical",
                "b-warning-declining",
                "c-warning-stuck-idle",
                "a-warning-stuck",
                "d-stable"
            ]
        );
    }

    #[test]
    fn test_exact_ties_break_by_topic_id() {
        let (p, w) = maps(&[
            ("zeta", Urgency::Warning, WeaknessPattern::Normal, 2.0),
            ("alpha", Urgency::Warning, WeaknessPattern::Normal, 2.0),
        ]);
        let ranked = rank_topics(&p, &w);
        let order: Vec<&str> = ranked.iter().map(|t| t.topic_id()).collect();
        assert_eq!(order, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_focus_limited_to_k() {
        let (p, w) = maps(&[
            ("t1", Urgency::Warning, WeaknessPattern::Normal, 1.0),
            ("t2", Urgency::Warning, WeaknessPattern::Normal, 2.0),
            ("t3", Urgency::Warning, WeaknessPattern::Normal, 3.0),
            ("t4", Urgency::Warning, WeaknessPattern::Normal, 4.0),
        ]);
        let rec = compose_recommendation(&p, &w, &PredictionConfig::default());
        assert_eq!(rec.focus_topics, vec!["t4", "t3", "t2"]);
        assert_eq!(rec.priority, Priority::High);
        assert_eq!(rec.rationale, "t4 retention is fading; focus next session on t4, t3 and t2.");
    }

    #[test]
    fn test_duration_grows_per_additional_urgent_topic() {
        let config = PredictionConfig::default();
        assert_eq!(suggested_duration(0, &config), 45);
        assert_eq!(suggested_duration(1, &config), 45);
        assert_eq!(suggested_duration(2, &config), 60);
        assert_eq!(suggested_duration(3, &config), 75);
        assert_eq!(suggested_duration(10, &config), 90);
    }

    #[test]
    fn test_topic_missing_from_one_map_is_skipped() {
        let (mut p, mut w) = maps(&[
            ("kept", Urgency::Stable, WeaknessPattern::Normal, 2.0),
            ("orphan", Urgency::Critical, WeaknessPattern::Declining, 2.0),
        ]);
        p.remove("orphan");
        w.remove("kept");
        let rec = compose_recommendation(&p, &w, &PredictionConfig::default());
        assert!(rec.focus_topics.is_empty());
        assert_eq!(rec.priority, Priority::Normal);
    }

    #[test]
    fn test_empty_input_is_valid() {
        let rec = compose_recommendation(&BTreeMap::new(), &BTreeMap::new(), &PredictionConfig::default());
        assert!(rec.focus_topics.is_empty());
        assert_eq!(rec.suggested_duration_minutes, 45);
        assert_eq!(rec.priority, Priority::Normal);
        assert_eq!(rec.rationale, "No topic history yet; nothing to review.");
    }

    #[test]
    fn test_all_strong_is_normal_priority() {
        let (p, w) = maps(&[
            ("poetry", Urgency::Strong, WeaknessPattern::Normal, 1.0),
            ("grammar", Urgency::Stable, WeaknessPattern::Normal, 3.0),
        ]);
        let rec = compose_recommendation(&p, &w, &PredictionConfig::default());
        assert_eq!(rec.priority, Priority::Normal);
        assert_eq!(rec.rationale, "All topics are on track; continue with grammar and poetry.");
    }

    #[test]
    fn test_rationale_leads_with_lower_ranked_stuck_topic() {
        let (p, w) = maps(&[
            ("alpha", Urgency::Stable, WeaknessPattern::Normal, 8.0),
            ("beta", Urgency::Strong, WeaknessPattern::Stuck, 1.0),
        ]);
        let rec = compose_recommendation(&p, &w, &PredictionConfig::default());
        assert_eq!(rec.focus_topics, vec!["alpha", "beta"]);
        assert_eq!(rec.priority, Priority::High);
        assert_eq!(rec.rationale, "beta has plateaued; focus next session on alpha and beta.");
    }

    #[test]
    fn test_rationale_prefers_declining_over_higher_ranked_warning() {
        let (p, w) = maps(&[
            ("essays", Urgency::Warning, WeaknessPattern::Normal, 10.0),
            ("grammar", Urgency::Stable, WeaknessPattern::Declining, 2.0),
        ]);
        let rec = compose_recommendation(&p, &w, &PredictionConfig::default());
        assert_eq!(rec.focus_topics, vec!["essays", "grammar"]);
        assert_eq!(rec.priority, Priority::Urgent);
        assert!(rec.rationale.starts_with("grammar scores are declining"));
    }

    #[test]
    fn test_join_topics() {
        assert_eq!(join_topics(&[]), "");
        assert_eq!(join_topics(&["a".to_string()]), "a");
        assert_eq!(join_topics(&["a".to_string(), "b".to_string()]), "a and b");
    }
}
