//! Incremental identity adjustment from confusion signals
//!
//! Nudges the visual/text balance of an existing identity without a full
//! re-extraction. Confusion under the currently dominant modality is treated
//! as evidence that modality is not working, so the nudge always pushes away
//! from it. Pace, attention span, processing style, and confidence are left
//! untouched.

use crate::config::AnalysisConfig;
use crate::confusion::{ConfusionSignal, Severity};
use crate::identity::LearningIdentity;

/// Apply confusion signals to an identity's visual/text balance.
///
/// No-op for an empty signal list. The adjustment is
/// `per_high * count(high) + per_medium * count(medium)`; low-severity
/// signals contribute nothing. The result may use the full [0, 1] range,
/// unlike the narrower extraction-time clamp.
pub fn adjust_for_confusion(
    identity: &LearningIdentity,
    signals: &[ConfusionSignal],
    config: &AnalysisConfig,
) -> LearningIdentity {
    if signals.is_empty() {
        return identity.clone();
    }

    let high_count = signals
        .iter()
        .filter(|s| s.severity == Severity::High)
        .count() as f64;
    let medium_count = signals
        .iter()
        .filter(|s| s.severity == Severity::Medium)
        .count() as f64;

    let adjustment =
        high_count * config.adjustment_per_high + medium_count * config.adjustment_per_medium;

    // Push away from the dominant modality
    let new_score = if identity.visual_text_score > 0.5 {
        identity.visual_text_score - adjustment
    } else {
        identity.visual_text_score + adjustment
    };

    let mut adjusted = identity.clone();
    adjusted.visual_text_score = new_score.clamp(0.0, 1.0);
    adjusted
}
