//! Understanding scoring
//!
//! Combines elapsed time, expected time, and focus telemetry into a 0-1
//! understanding estimate with a discrete confusion tier, used to decide
//! whether content re-adaptation is warranted. All functions here are
//! deterministic, total, and free of failure modes.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;

/// Understanding below this maps to high confusion
const CONFUSION_HIGH_BELOW: f64 = 0.3;
/// Understanding below this maps to medium confusion
const CONFUSION_MEDIUM_BELOW: f64 = 0.5;
/// Understanding below this maps to low confusion
const CONFUSION_LOW_BELOW: f64 = 0.7;

/// Trailing window consulted by [`should_adjust_identity`]
const RECENT_SCORES_WINDOW: usize = 3;

/// Discrete confusion tier derived from the understanding score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfusionLevel {
    None,
    Low,
    Medium,
    High,
}

impl ConfusionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfusionLevel::None => "none",
            ConfusionLevel::Low => "low",
            ConfusionLevel::Medium => "medium",
            ConfusionLevel::High => "high",
        }
    }
}

/// Ephemeral understanding estimate for one slide visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderstandingAssessment {
    /// Overall understanding estimate (0-1)
    pub understanding_score: f64,
    /// Actual over expected time on the slide
    pub time_ratio: f64,
    /// Penalty from overtime or rushing
    pub time_penalty: f64,
    /// Penalty from lost focus
    pub focus_penalty: f64,
    pub confusion_level: ConfusionLevel,
    /// Whether the content generator should intervene
    pub requires_intervention: bool,
}

/// Aggregated focus telemetry over a session window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusAggregate {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    /// Population variance (divide by N)
    pub variance: f64,
}

/// Expected time in seconds for a slide at a chapter position.
///
/// `base + (position - 1) * growth * base`, clamped to the configured range.
/// Later slides in a chapter are expected to take longer; the result is
/// non-decreasing in position.
pub fn expected_time(base_time_sec: u32, chapter_position: u32, config: &AnalysisConfig) -> u32 {
    let position = chapter_position.max(1);
    let increase_per_slide = base_time_sec as f64 * config.expected_time_growth;
    let expected = base_time_sec as f64 + (position - 1) as f64 * increase_per_slide;

    (expected as u32).clamp(config.expected_time_min_sec, config.expected_time_max_sec)
}

/// Score understanding from time on task and average focus.
///
/// Both overtime and rushing are penalized, asymmetrically: rushing is
/// penalized more steeply per unit of deviation, overtime caps higher.
pub fn score_understanding(
    time_spent_sec: u32,
    expected_time_sec: u32,
    avg_focus_score: f64,
    config: &AnalysisConfig,
) -> UnderstandingAssessment {
    let expected = if expected_time_sec == 0 {
        config.default_expected_time_sec
    } else {
        expected_time_sec
    };

    let time_ratio = time_spent_sec as f64 / expected.max(1) as f64;

    let time_penalty = if time_ratio > config.overtime_ratio {
        ((time_ratio - 1.0) * config.overtime_penalty_slope).min(config.overtime_penalty_cap)
    } else if time_ratio < config.undertime_ratio {
        ((config.undertime_ratio - time_ratio) * config.undertime_penalty_slope)
            .min(config.undertime_penalty_cap)
    } else {
        0.0
    };

    let focus_penalty = (1.0 - avg_focus_score) * config.focus_penalty_weight;

    let understanding = (1.0 - (time_penalty + focus_penalty)).clamp(0.0, 1.0);

    UnderstandingAssessment {
        understanding_score: understanding,
        time_ratio,
        time_penalty,
        focus_penalty,
        confusion_level: confusion_level(understanding),
        requires_intervention: understanding < config.intervention_threshold,
    }
}

/// Step function from understanding score to confusion tier
fn confusion_level(understanding: f64) -> ConfusionLevel {
    if understanding < CONFUSION_HIGH_BELOW {
        ConfusionLevel::High
    } else if understanding < CONFUSION_MEDIUM_BELOW {
        ConfusionLevel::Medium
    } else if understanding < CONFUSION_LOW_BELOW {
        ConfusionLevel::Low
    } else {
        ConfusionLevel::None
    }
}

/// Aggregate a focus history into avg/min/max/variance.
///
/// An empty history reports full focus with zero variance.
pub fn aggregate_focus(history: &[f64]) -> FocusAggregate {
    if history.is_empty() {
        return FocusAggregate {
            avg: 1.0,
            min: 1.0,
            max: 1.0,
            variance: 0.0,
        };
    }

    let n = history.len() as f64;
    let avg = history.iter().sum::<f64>() / n;
    let min = history.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = history.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let variance = history.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;

    FocusAggregate {
        avg,
        min,
        max,
        variance,
    }
}

/// Decide whether the learner's identity should be re-adjusted.
///
/// Two independent triggers, OR-combined: the current score is below the
/// threshold, or the trailing three recent scores average below it. The
/// trailing-average branch needs at least three prior entries.
pub fn should_adjust_identity(
    current_score: f64,
    recent_scores: &[f64],
    threshold: f64,
) -> bool {
    if current_score < threshold {
        return true;
    }

    if recent_scores.len() >= RECENT_SCORES_WINDOW {
        let tail = &recent_scores[recent_scores.len() - RECENT_SCORES_WINDOW..];
        let recent_avg = tail.iter().sum::<f64>() / RECENT_SCORES_WINDOW as f64;
        if recent_avg < threshold {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    #[test]
    fn test_expected_time_grows_with_position() {
        let config = config();
        // base 60: position 1 = 60, position 2 = 69, position 5 = 96
        assert_eq!(expected_time(60, 1, &config), 60);
        assert_eq!(expected_time(60, 2, &config), 69);
        assert_eq!(expected_time(60, 5, &config), 96);
    }

    #[test]
    fn test_expected_time_monotone_and_clamped() {
        let config = config();
        let mut previous = 0;
        for position in 1..=60 {
            let t = expected_time(100, position, &config);
            assert!(t >= previous);
            assert!((30..=600).contains(&t));
            previous = t;
        }
        // Far positions hit the ceiling
        assert_eq!(expected_time(100, 60, &config), 600);
        // Tiny base times hit the floor
        assert_eq!(expected_time(10, 1, &config), 30);
    }

    #[test]
    fn test_expected_time_position_zero_treated_as_first() {
        let config = config();
        assert_eq!(expected_time(60, 0, &config), expected_time(60, 1, &config));
    }

    #[test]
    fn test_score_in_comfortable_band_no_time_penalty() {
        let assessment = score_understanding(60, 60, 1.0, &config());
        assert_eq!(assessment.time_penalty, 0.0);
        assert_eq!(assessment.focus_penalty, 0.0);
        assert_eq!(assessment.understanding_score, 1.0);
        assert_eq!(assessment.confusion_level, ConfusionLevel::None);
        assert!(!assessment.requires_intervention);
    }

    #[test]
    fn test_score_heavy_overtime() {
        // 600s on a 60s slide: ratio 10, penalty capped at 0.6
        let assessment = score_understanding(600, 60, 1.0, &config());
        assert_eq!(assessment.time_ratio, 10.0);
        assert_eq!(assessment.time_penalty, 0.6);
        assert_eq!(assessment.focus_penalty, 0.0);
        assert!((assessment.understanding_score - 0.4).abs() < 1e-9);
        assert_eq!(assessment.confusion_level, ConfusionLevel::Medium);
        assert!(assessment.requires_intervention);
    }

    #[test]
    fn test_score_rushing_penalized_steeply() {
        // 6s on a 60s slide: ratio 0.1, penalty (0.3-0.1)*0.4 = 0.08
        let assessment = score_understanding(6, 60, 1.0, &config());
        assert!((assessment.time_penalty - 0.08).abs() < 1e-9);

        // Instant skip: ratio 0, penalty 0.3*0.4 = 0.12 (cap 0.5 unreachable here)
        let assessment = score_understanding(0, 60, 1.0, &config());
        assert!((assessment.time_penalty - 0.12).abs() < 1e-9);
    }

    #[test]
    fn test_score_focus_penalty() {
        let assessment = score_understanding(60, 60, 0.4, &config());
        assert!((assessment.focus_penalty - 0.3).abs() < 1e-9);
        assert!((assessment.understanding_score - 0.7).abs() < 1e-9);
        assert_eq!(assessment.confusion_level, ConfusionLevel::None);
    }

    #[test]
    fn test_score_zero_expected_defaults() {
        let assessment = score_understanding(60, 0, 1.0, &config());
        assert_eq!(assessment.time_ratio, 1.0);
    }

    #[test]
    fn test_confusion_level_step_function() {
        assert_eq!(confusion_level(0.9), ConfusionLevel::None);
        assert_eq!(confusion_level(0.7), ConfusionLevel::None);
        assert_eq!(confusion_level(0.6), ConfusionLevel::Low);
        assert_eq!(confusion_level(0.4), ConfusionLevel::Medium);
        assert_eq!(confusion_level(0.2), ConfusionLevel::High);
        assert_eq!(confusion_level(0.0), ConfusionLevel::High);
    }

    #[test]
    fn test_understanding_always_in_unit_range() {
        let config = config();
        for &time in &[0u32, 10, 60, 300, 3600] {
            for &expected in &[0u32, 30, 60, 600] {
                for &focus in &[0.0, 0.3, 0.7, 1.0] {
                    let a = score_understanding(time, expected, focus, &config);
                    assert!((0.0..=1.0).contains(&a.understanding_score));
                }
            }
        }
    }

    #[test]
    fn test_aggregate_focus_empty_defaults() {
        let agg = aggregate_focus(&[]);
        assert_eq!(
            agg,
            FocusAggregate {
                avg: 1.0,
                min: 1.0,
                max: 1.0,
                variance: 0.0
            }
        );
    }

    #[test]
    fn test_aggregate_focus_population_variance() {
        let agg = aggregate_focus(&[0.2, 0.4, 0.6, 0.8]);
        assert!((agg.avg - 0.5).abs() < 1e-9);
        assert_eq!(agg.min, 0.2);
        assert_eq!(agg.max, 0.8);
        // Population variance: mean of squared deviations, divide by N
        assert!((agg.variance - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_focus_single_value() {
        let agg = aggregate_focus(&[0.75]);
        assert_eq!(agg.avg, 0.75);
        assert_eq!(agg.min, 0.75);
        assert_eq!(agg.max, 0.75);
        assert_eq!(agg.variance, 0.0);
    }

    #[test]
    fn test_should_adjust_current_below_threshold() {
        assert!(should_adjust_identity(0.4, &[], 0.5));
        assert!(!should_adjust_identity(0.6, &[], 0.5));
    }

    #[test]
    fn test_should_adjust_trailing_average_triggers() {
        // Current score passes, but the last three average 0.3
        assert!(should_adjust_identity(0.6, &[0.4, 0.3, 0.2], 0.5));
    }

    #[test]
    fn test_should_adjust_uses_last_three_only() {
        // Last three of the history average 0.9; earlier lows are ignored
        assert!(!should_adjust_identity(
            0.6,
            &[0.1, 0.1, 0.9, 0.9, 0.9],
            0.5
        ));
    }

    #[test]
    fn test_should_adjust_needs_three_recent_entries() {
        // Two low entries are not enough for the trailing branch
        assert!(!should_adjust_identity(0.6, &[0.1, 0.1], 0.5));
    }
}
