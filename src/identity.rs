//! Learning identity extraction
//!
//! Folds a window of behavioral events (plus an optional prior identity) into
//! an updated [`LearningIdentity`]. Four independent sub-scores are computed
//! from the event set: content preference (visual vs. text), pace, attention
//! span, and processing style. Content preference is blended into the prior
//! with exponential smoothing; the other dimensions are replaced outright.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::event::{Event, EventType};

/// Learning pace classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Fast,
    Moderate,
    Slow,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Fast => "fast",
            Pace::Moderate => "moderate",
            Pace::Slow => "slow",
        }
    }
}

/// Preferred processing order: examples first (top-down) or theory first
/// (bottom-up)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStyle {
    TopDown,
    BottomUp,
}

impl ProcessingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStyle::TopDown => "top_down",
            ProcessingStyle::BottomUp => "bottom_up",
        }
    }
}

/// A learner's behavioral profile on a continuous spectrum
///
/// One identity per user, owned by the profile record. Mutated by full
/// re-extraction or by the confusion adjuster, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningIdentity {
    /// 0.0 = pure text preference, 1.0 = pure visual preference
    pub visual_text_score: f64,
    pub pace: Pace,
    /// Sustained attention estimate, minutes (5-30)
    pub attention_span_minutes: u32,
    pub processing_style: ProcessingStyle,
    /// How much behavioral evidence backs this identity (0-1)
    pub confidence_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl Default for LearningIdentity {
    fn default() -> Self {
        Self {
            visual_text_score: 0.5,
            pace: Pace::Moderate,
            attention_span_minutes: 15,
            processing_style: ProcessingStyle::BottomUp,
            confidence_score: 0.0,
            last_updated: Utc::now(),
        }
    }
}

impl LearningIdentity {
    /// Construct an identity, clamping fields into their valid ranges
    pub fn new(
        visual_text_score: f64,
        pace: Pace,
        attention_span_minutes: u32,
        processing_style: ProcessingStyle,
        confidence_score: f64,
    ) -> Self {
        Self {
            visual_text_score: visual_text_score.clamp(0.0, 1.0),
            pace,
            attention_span_minutes: attention_span_minutes.clamp(5, 30),
            processing_style,
            confidence_score: confidence_score.clamp(0.0, 1.0),
            last_updated: Utc::now(),
        }
    }
}

/// Extracts learning identity from behavioral event streams
pub struct IdentityExtractor {
    config: AnalysisConfig,
}

impl Default for IdentityExtractor {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl IdentityExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Fold events into an updated identity.
    ///
    /// With no events the prior (or the default identity) is returned
    /// unchanged except for `confidence_score = 0.0`. Total over any
    /// well-formed event sequence; malformed payload fields degrade to
    /// neutral values.
    pub fn extract(&self, events: &[Event], prior: Option<&LearningIdentity>) -> LearningIdentity {
        let mut identity = prior.cloned().unwrap_or_default();

        if events.is_empty() {
            identity.confidence_score = 0.0;
            return identity;
        }

        let observed_preference = analyze_content_preference(events, &self.config);
        let pace = analyze_pace(events, &self.config);
        let attention = analyze_attention_span(events, &self.config);
        let style = analyze_processing_style(events);

        // Blend content preference into the prior; recent behavior gets
        // `smoothing_alpha` weight. Pace, attention, and style are replaced.
        let alpha = self.config.smoothing_alpha;
        identity.visual_text_score =
            ((1.0 - alpha) * identity.visual_text_score + alpha * observed_preference)
                .clamp(0.0, 1.0);
        identity.pace = pace;
        identity.attention_span_minutes = attention;
        identity.processing_style = style;

        identity.confidence_score =
            (events.len() as f64 / self.config.full_confidence_events as f64).min(1.0);
        identity.last_updated = Utc::now();

        identity
    }
}

/// Weighted engagement per content-type bucket
#[derive(Debug, Default)]
struct Engagement {
    time_sec: f64,
    success: f64,
    views: f64,
}

impl Engagement {
    /// `time/60 + 5*success + 2*views`
    fn total(&self) -> f64 {
        self.time_sec / 60.0 + 5.0 * self.success + 2.0 * self.views
    }
}

/// Content preference from engagement with visual vs. text content.
///
/// Returns 0.0 (text-preferring) to 1.0 (visual-preferring), clamped to the
/// configured band to avoid overconfident extremes. Defaults to 0.5 when
/// neither bucket has any engagement.
fn analyze_content_preference(events: &[Event], config: &AnalysisConfig) -> f64 {
    let mut visual = Engagement::default();
    let mut text = Engagement::default();

    for event in events {
        match event.event_type {
            EventType::SlideViewed => {
                let content_type = match event.text("content_type") {
                    "" => "text-heavy",
                    other => other,
                };
                let time_spent = event.num("time_spent_seconds");

                if content_type.contains("diagram") || content_type.contains("visual") {
                    visual.time_sec += time_spent;
                    visual.views += 1.0;
                } else if content_type.contains("text") {
                    text.time_sec += time_spent;
                    text.views += 1.0;
                }

                // Interactions that signal modality preference
                if event.flag("zoomed_into_diagram") {
                    visual.success += 2.0;
                }
                if event.flag("replayed_animation") {
                    visual.success += 2.0;
                }
                if event.flag("scrolled_back") && content_type.contains("text") {
                    text.success += 1.0;
                }
            }
            EventType::KnowledgeCheckCompleted => {
                let format = event.text("slide_format_just_seen");
                if event.flag("correct") {
                    if format.contains("visual") || format.contains("diagram") {
                        visual.success += 3.0;
                    } else if format.contains("text") {
                        text.success += 3.0;
                    }
                }
            }
            _ => {}
        }
    }

    let visual_total = visual.total();
    let text_total = text.total();

    if visual_total + text_total == 0.0 {
        return 0.5;
    }

    let preference = visual_total / (visual_total + text_total);
    preference.clamp(config.preference_floor, config.preference_ceiling)
}

/// Pace from average time spent per viewed slide
fn analyze_pace(events: &[Event], config: &AnalysisConfig) -> Pace {
    let slide_times: Vec<f64> = events
        .iter()
        .filter(|e| e.event_type == EventType::SlideViewed)
        .map(|e| e.num("time_spent_seconds"))
        .filter(|&t| t > 0.0)
        .collect();

    if slide_times.is_empty() {
        return Pace::Moderate;
    }

    let avg = slide_times.iter().sum::<f64>() / slide_times.len() as f64;

    if avg < config.fast_pace_max_sec {
        Pace::Fast
    } else if avg > config.slow_pace_min_sec {
        Pace::Slow
    } else {
        Pace::Moderate
    }
}

/// Attention span in minutes from focus losses and confusion durations
fn analyze_attention_span(events: &[Event], config: &AnalysisConfig) -> u32 {
    let mut durations_min: Vec<f64> = Vec::new();

    for event in events {
        match event.event_type {
            EventType::FocusChange => {
                if event.num_or("focus_score", 1.0) < config.attention_focus_cutoff {
                    // Focus lost: how long into the session it held
                    durations_min.push(event.num_or("time_since_start", 15.0 * 60.0) / 60.0);
                }
            }
            EventType::ConfusionDetected => {
                let confused_min = event.num("time_spent_confused") / 60.0;
                if confused_min > 0.0 {
                    durations_min.push(confused_min);
                }
            }
            _ => {}
        }
    }

    if durations_min.is_empty() {
        return 15;
    }

    let avg = (durations_min.iter().sum::<f64>() / durations_min.len() as f64) as u32;
    avg.clamp(config.attention_span_min, config.attention_span_max)
}

/// Processing style from navigation order signals.
///
/// Examples-first behavior (tapping examples, skipping ahead) indicates
/// top-down processing; theory-first behavior (reading definitions, scrolling
/// back) indicates bottom-up. Ties resolve to bottom-up.
fn analyze_processing_style(events: &[Event]) -> ProcessingStyle {
    let mut examples_first = 0u32;
    let mut theory_first = 0u32;

    for event in events {
        match event.event_type {
            EventType::InteractionWithContent => {
                let interaction = event.text("interaction_type");
                if interaction.contains("example") {
                    examples_first += 1;
                } else if interaction.contains("definition") {
                    theory_first += 1;
                }
            }
            EventType::SlideViewed => {
                if event.flag("skipped_forward") {
                    examples_first += 1;
                } else if event.flag("scrolled_back") {
                    theory_first += 1;
                }
            }
            _ => {}
        }
    }

    if examples_first > theory_first {
        ProcessingStyle::TopDown
    } else {
        ProcessingStyle::BottomUp
    }
}
