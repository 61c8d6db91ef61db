//! Mindpace - Behavioral analysis engine for adaptive learning
//!
//! Mindpace converts raw learner interaction events into two live outputs:
//! a continuous learning identity (visual/text preference, pace, attention
//! span, processing style) and real-time confusion/understanding signals that
//! tell the surrounding platform when content should be re-adapted.
//!
//! ## Modules
//!
//! - **Identity**: fold event windows into a [`LearningIdentity`] profile
//! - **Confusion**: detect stuck-on-slide, quiz-failure, and rapid-navigation
//!   signals per session
//! - **Scoring**: understanding estimates, expected-time model, focus
//!   aggregation, adjustment decisions
//! - **Session**: per-session live state behind an instance-scoped registry
//!
//! The engine performs no I/O: collaborators fetch event logs and persist
//! identities and snapshots around these pure computations.

pub mod adjuster;
pub mod config;
pub mod confusion;
pub mod error;
pub mod event;
pub mod identity;
pub mod pipeline;
pub mod scoring;
pub mod session;

pub use adjuster::adjust_for_confusion;
pub use config::AnalysisConfig;
pub use confusion::{ConfusionDetector, ConfusionSignal, NavigationWindow, Severity, SignalType};
pub use error::EngineError;
pub use event::{Event, EventType};
pub use identity::{IdentityExtractor, LearningIdentity, Pace, ProcessingStyle};
pub use pipeline::{events_to_identity, AnalysisEngine, SlideOutcome};
pub use scoring::{ConfusionLevel, FocusAggregate, UnderstandingAssessment};
pub use session::{SessionRegistry, SessionSnapshot, SessionState};

/// Engine version embedded in CLI output and snapshots
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for provenance
pub const PRODUCER_NAME: &str = "mindpace";

// ---------------------------------------------------------------------------
// Convenience entry points using the default analysis configuration.
// Service code that tunes thresholds should hold an `AnalysisEngine` (or the
// per-module types) with its own `AnalysisConfig` instead.
// ---------------------------------------------------------------------------

/// Fold an ordered event window into an updated identity
pub fn extract_identity(
    events: &[Event],
    prior: Option<&LearningIdentity>,
) -> LearningIdentity {
    IdentityExtractor::default().extract(events, prior)
}

/// Nudge an identity's visual/text balance from confusion signals
pub fn adjust_identity_for_confusion(
    identity: &LearningIdentity,
    signals: &[ConfusionSignal],
) -> LearningIdentity {
    adjuster::adjust_for_confusion(identity, signals, &AnalysisConfig::default())
}

/// Emit a stuck-on-slide signal if the learner lingered too long
pub fn detect_slide_stuck(time_on_previous_sec: f64) -> Option<ConfusionSignal> {
    ConfusionDetector::default().detect_slide_stuck(time_on_previous_sec)
}

/// Emit a quiz-failure signal for a failing submission
pub fn detect_quiz_failure(score: f64, passed: bool) -> Option<ConfusionSignal> {
    ConfusionDetector::default().detect_quiz_failure(score, passed)
}

/// Score understanding from time on task and average focus
pub fn score_understanding(
    time_spent_sec: u32,
    expected_time_sec: u32,
    avg_focus_score: f64,
) -> UnderstandingAssessment {
    scoring::score_understanding(
        time_spent_sec,
        expected_time_sec,
        avg_focus_score,
        &AnalysisConfig::default(),
    )
}

/// Expected seconds for a slide at a chapter position
pub fn expected_time(base_time_sec: u32, chapter_position: u32) -> u32 {
    scoring::expected_time(base_time_sec, chapter_position, &AnalysisConfig::default())
}

/// Aggregate a focus history into avg/min/max/variance
pub fn aggregate_focus(history: &[f64]) -> FocusAggregate {
    scoring::aggregate_focus(history)
}

/// Decide whether the learner's identity should be re-adjusted
pub fn should_adjust_identity(
    current_score: f64,
    recent_scores: &[f64],
    threshold: f64,
) -> bool {
    scoring::should_adjust_identity(current_score, recent_scores, threshold)
}
