//! Analysis configuration
//!
//! Every heuristic threshold used by the extractor, detector, adjuster, and
//! scorer lives here so the decision policy can be swapped or tested
//! independently of the scoring arithmetic. `Default` reproduces the
//! production constants.

use serde::{Deserialize, Serialize};

/// Tunable thresholds for the behavioral analysis engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Identity extraction
    /// Exponential smoothing factor blending observed content preference into
    /// the prior (`new = (1-alpha)*prior + alpha*observed`)
    pub smoothing_alpha: f64,
    /// Lower bound of the extraction-time content-preference clamp
    pub preference_floor: f64,
    /// Upper bound of the extraction-time content-preference clamp
    pub preference_ceiling: f64,
    /// Average seconds per slide below which pace is `Fast`
    pub fast_pace_max_sec: f64,
    /// Average seconds per slide above which pace is `Slow`
    pub slow_pace_min_sec: f64,
    /// Focus score below which a focus-change event marks lost attention
    pub attention_focus_cutoff: f64,
    /// Attention span clamp, minutes
    pub attention_span_min: u32,
    pub attention_span_max: u32,
    /// Events needed for full extraction confidence
    pub full_confidence_events: usize,

    // Confusion detection
    /// Seconds on one slide before a stuck signal is emitted
    pub stuck_threshold_sec: f64,
    /// Seconds on one slide before a stuck signal escalates to high severity
    pub stuck_high_severity_sec: f64,
    /// Quiz score below which a submission counts as failed even when passed
    pub quiz_fail_score: f64,
    /// Quiz score at or above which a failure is low severity
    pub quiz_low_severity_floor: f64,
    /// Quiz score at or above which a failure is medium severity
    pub quiz_medium_severity_floor: f64,
    /// Navigations within the rolling window before rapid navigation fires
    pub rapid_nav_threshold: usize,
    /// Rolling window for rapid-navigation detection, seconds
    pub rapid_nav_window_sec: i64,
    /// Cooldown after a rapid-navigation signal, seconds
    pub rapid_nav_cooldown_sec: i64,

    // Identity adjustment
    /// Nudge per high-severity confusion signal
    pub adjustment_per_high: f64,
    /// Nudge per medium-severity confusion signal
    pub adjustment_per_medium: f64,

    // Understanding scoring
    /// Fallback expected time when the caller supplies a non-positive value
    pub default_expected_time_sec: u32,
    /// Time-ratio band with no penalty: [undertime_ratio, overtime_ratio]
    pub undertime_ratio: f64,
    pub overtime_ratio: f64,
    /// Penalty slope and cap for overtime
    pub overtime_penalty_slope: f64,
    pub overtime_penalty_cap: f64,
    /// Penalty slope and cap for rushing
    pub undertime_penalty_slope: f64,
    pub undertime_penalty_cap: f64,
    /// Weight of lost focus in the focus penalty
    pub focus_penalty_weight: f64,
    /// Understanding score below which intervention is required
    pub intervention_threshold: f64,
    /// Expected-time growth per chapter position, as a fraction of base time
    pub expected_time_growth: f64,
    /// Expected-time clamp, seconds
    pub expected_time_min_sec: u32,
    pub expected_time_max_sec: u32,

    // Session state
    /// Focus history length that triggers truncation
    pub focus_history_cap: usize,
    /// Entries kept (most recent) after truncation
    pub focus_history_keep: usize,
    /// Recent understanding scores retained per session
    pub understanding_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.3,
            preference_floor: 0.2,
            preference_ceiling: 0.8,
            fast_pace_max_sec: 30.0,
            slow_pace_min_sec: 90.0,
            attention_focus_cutoff: 0.6,
            attention_span_min: 5,
            attention_span_max: 30,
            full_confidence_events: 100,

            stuck_threshold_sec: 300.0,
            stuck_high_severity_sec: 600.0,
            quiz_fail_score: 0.6,
            quiz_low_severity_floor: 0.4,
            quiz_medium_severity_floor: 0.2,
            rapid_nav_threshold: 5,
            rapid_nav_window_sec: 30,
            rapid_nav_cooldown_sec: 60,

            adjustment_per_high: 0.15,
            adjustment_per_medium: 0.08,

            default_expected_time_sec: 60,
            undertime_ratio: 0.3,
            overtime_ratio: 1.5,
            overtime_penalty_slope: 0.3,
            overtime_penalty_cap: 0.6,
            undertime_penalty_slope: 0.4,
            undertime_penalty_cap: 0.5,
            focus_penalty_weight: 0.5,
            intervention_threshold: 0.5,
            expected_time_growth: 0.15,
            expected_time_min_sec: 30,
            expected_time_max_sec: 600,

            focus_history_cap: 1000,
            focus_history_keep: 500,
            understanding_window: 10,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
