//! Confusion signal detection
//!
//! Inspects slide-transition, quiz, and navigation behavior and emits typed,
//! severity-tagged confusion signals. Detection is stateless per call for
//! slide and quiz triggers: repeated calls with unchanged inputs produce
//! repeated signals, never deduplicated. Rapid-navigation detection keeps a
//! small per-session rolling window with an emission cooldown.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::AnalysisConfig;

/// Category of inferred confusion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    StuckOnSlide,
    QuizFailed,
    RapidNavigation,
    /// For custom/collaborator-defined categories
    #[serde(untagged)]
    Other(String),
}

impl SignalType {
    pub fn as_str(&self) -> &str {
        match self {
            SignalType::StuckOnSlide => "stuck_on_slide",
            SignalType::QuizFailed => "quiz_failed",
            SignalType::RapidNavigation => "rapid_navigation",
            SignalType::Other(name) => name.as_str(),
        }
    }
}

/// Signal severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// A discrete confusion signal inferred from behavior
///
/// Immutable after creation; appended to the session's signal list and to the
/// user's historical log by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionSignal {
    pub signal_id: Uuid,
    pub signal_type: SignalType,
    pub severity: Severity,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub detected_at: DateTime<Utc>,
}

impl ConfusionSignal {
    pub fn new(
        signal_type: SignalType,
        severity: Severity,
        metadata: HashMap<String, Value>,
    ) -> Self {
        Self {
            signal_id: Uuid::new_v4(),
            signal_type,
            severity,
            metadata,
            detected_at: Utc::now(),
        }
    }
}

/// Detects confusion from slide transitions and quiz results
pub struct ConfusionDetector {
    config: AnalysisConfig,
}

impl Default for ConfusionDetector {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl ConfusionDetector {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Check whether the learner was stuck on the slide they just left.
    ///
    /// Emits one `stuck_on_slide` signal when time on the previous slide
    /// exceeds the stuck threshold; severity escalates to high past the
    /// high-severity threshold.
    pub fn detect_slide_stuck(&self, time_on_previous_sec: f64) -> Option<ConfusionSignal> {
        if time_on_previous_sec <= self.config.stuck_threshold_sec {
            return None;
        }

        let severity = if time_on_previous_sec < self.config.stuck_high_severity_sec {
            Severity::Medium
        } else {
            Severity::High
        };

        let mut metadata = HashMap::new();
        metadata.insert(
            "time_on_slide_sec".to_string(),
            Value::from(time_on_previous_sec),
        );

        Some(ConfusionSignal::new(
            SignalType::StuckOnSlide,
            severity,
            metadata,
        ))
    }

    /// Check a quiz submission for failure.
    ///
    /// A submission counts as failed when it did not pass or the score falls
    /// below the failing cut-off; severity steps down as the score recovers.
    pub fn detect_quiz_failure(&self, score: f64, passed: bool) -> Option<ConfusionSignal> {
        if passed && score >= self.config.quiz_fail_score {
            return None;
        }

        let severity = if score >= self.config.quiz_low_severity_floor {
            Severity::Low
        } else if score >= self.config.quiz_medium_severity_floor {
            Severity::Medium
        } else {
            Severity::High
        };

        let mut metadata = HashMap::new();
        metadata.insert("score".to_string(), Value::from(score));
        metadata.insert("passed".to_string(), Value::from(passed));

        Some(ConfusionSignal::new(
            SignalType::QuizFailed,
            severity,
            metadata,
        ))
    }
}

/// Per-session rolling window for rapid-navigation detection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationWindow {
    timestamps: Vec<DateTime<Utc>>,
    suppressed_until: Option<DateTime<Utc>>,
}

impl NavigationWindow {
    /// Record one slide navigation at `now`.
    ///
    /// Emits a `rapid_navigation` signal (severity medium) when more
    /// navigations than the configured threshold land within the rolling
    /// window, then suppresses further emissions for the cooldown period.
    pub fn record(
        &mut self,
        now: DateTime<Utc>,
        config: &AnalysisConfig,
    ) -> Option<ConfusionSignal> {
        let window_start = now - Duration::seconds(config.rapid_nav_window_sec);
        self.timestamps.retain(|&t| t > window_start);
        self.timestamps.push(now);

        if self.timestamps.len() <= config.rapid_nav_threshold {
            return None;
        }
        if let Some(until) = self.suppressed_until {
            if now < until {
                return None;
            }
        }

        self.suppressed_until = Some(now + Duration::seconds(config.rapid_nav_cooldown_sec));

        let mut metadata = HashMap::new();
        metadata.insert(
            "navigations_in_window".to_string(),
            Value::from(self.timestamps.len()),
        );
        metadata.insert(
            "window_sec".to_string(),
            Value::from(config.rapid_nav_window_sec),
        );

        Some(ConfusionSignal::new(
            SignalType::RapidNavigation,
            Severity::Medium,
            metadata,
        ))
    }
}
