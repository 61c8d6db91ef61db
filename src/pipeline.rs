//! Engine orchestration
//!
//! The public API surface for the behavioral analysis engine. Stateless
//! one-shot JSON entry points cover batch identity extraction; the stateful
//! [`AnalysisEngine`] owns the session registry and dispatches live events to
//! the detector, adjuster, and scorer. Nothing here performs I/O: event
//! retrieval and identity persistence belong to the calling collaborator.

use crate::adjuster::adjust_for_confusion;
use crate::config::AnalysisConfig;
use crate::confusion::{ConfusionDetector, ConfusionSignal};
use crate::error::EngineError;
use crate::event::{self, Event};
use crate::identity::{IdentityExtractor, LearningIdentity};
use crate::scoring::{self, UnderstandingAssessment};
use crate::session::{self, SessionRegistry, SessionSnapshot};

/// Outcome of assessing one slide visit
#[derive(Debug, Clone)]
pub struct SlideOutcome {
    pub assessment: UnderstandingAssessment,
    /// Whether the identity should be re-adjusted, combining the current
    /// score with the session's trailing understanding history
    pub adjust_identity: bool,
}

/// Convert an event-log JSON array into a learning identity JSON value
/// (stateless, one-shot).
///
/// Events are ordered by timestamp before extraction; an optional prior
/// identity JSON is blended in per the extraction contract.
pub fn events_to_identity(
    events_json: &str,
    prior_json: Option<&str>,
) -> Result<String, EngineError> {
    let mut events = event::parse_array(events_json)?;
    event::sort_by_timestamp(&mut events);

    let prior: Option<LearningIdentity> = match prior_json {
        Some(json) => Some(serde_json::from_str(json)?),
        None => None,
    };

    let extractor = IdentityExtractor::default();
    let identity = extractor.extract(&events, prior.as_ref());
    Ok(serde_json::to_string(&identity)?)
}

/// Stateful engine holding the configuration and the live session registry.
///
/// One instance per service process, constructed at startup and torn down at
/// shutdown. Safe to share across request workers.
pub struct AnalysisEngine {
    config: AnalysisConfig,
    extractor: IdentityExtractor,
    detector: ConfusionDetector,
    registry: SessionRegistry,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            extractor: IdentityExtractor::new(config.clone()),
            detector: ConfusionDetector::new(config.clone()),
            registry: SessionRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Pure computations over collaborator-supplied data
    // ------------------------------------------------------------------

    /// Fold an ordered event window into an updated identity
    pub fn extract_identity(
        &self,
        events: &[Event],
        prior: Option<&LearningIdentity>,
    ) -> LearningIdentity {
        self.extractor.extract(events, prior)
    }

    /// Nudge an identity's visual/text balance from confusion signals
    pub fn adjust_identity(
        &self,
        identity: &LearningIdentity,
        signals: &[ConfusionSignal],
    ) -> LearningIdentity {
        adjust_for_confusion(identity, signals, &self.config)
    }

    /// Expected seconds for a slide at a chapter position
    pub fn expected_time(&self, base_time_sec: u32, chapter_position: u32) -> u32 {
        scoring::expected_time(base_time_sec, chapter_position, &self.config)
    }

    // ------------------------------------------------------------------
    // Session lifecycle and live-event application
    // ------------------------------------------------------------------

    /// Begin tracking a session. Fails if the id is already active.
    pub fn start_session(&self, session_id: &str, user_id: &str) -> Result<(), EngineError> {
        self.registry.start(session_id, user_id)?;
        Ok(())
    }

    /// End a session, returning its final snapshot for persistence
    pub fn end_session(&self, session_id: &str) -> Result<SessionSnapshot, EngineError> {
        self.registry.end(session_id)
    }

    /// Number of sessions currently live
    pub fn active_sessions(&self) -> usize {
        self.registry.active_count()
    }

    /// Record a focus reading for a session
    pub fn record_focus(
        &self,
        session_id: &str,
        focus_score: f64,
        is_focused: bool,
    ) -> Result<(), EngineError> {
        let handle = self.registry.get(session_id)?;
        session::lock(&handle).apply_focus(focus_score, is_focused, &self.config);
        Ok(())
    }

    /// Record a slide transition, returning any confusion signals it emitted
    pub fn record_slide_change(
        &self,
        session_id: &str,
        new_slide_id: &str,
        time_on_previous_sec: f64,
    ) -> Result<Vec<ConfusionSignal>, EngineError> {
        let handle = self.registry.get(session_id)?;
        let signals = session::lock(&handle).apply_slide_change(
            new_slide_id,
            time_on_previous_sec,
            &self.detector,
            &self.config,
        );
        Ok(signals)
    }

    /// Record a quiz submission, returning any emitted failure signal
    pub fn record_quiz_result(
        &self,
        session_id: &str,
        score: f64,
        passed: bool,
    ) -> Result<Option<ConfusionSignal>, EngineError> {
        let handle = self.registry.get(session_id)?;
        let signal = session::lock(&handle).apply_quiz_result(score, passed, &self.detector);
        Ok(signal)
    }

    /// Assess understanding for the current slide visit.
    ///
    /// Uses the session's accumulated focus telemetry, decides whether the
    /// identity should be re-adjusted against the trailing understanding
    /// history, and records the new score into that history.
    pub fn assess_slide(
        &self,
        session_id: &str,
        time_spent_sec: u32,
        expected_time_sec: u32,
    ) -> Result<SlideOutcome, EngineError> {
        let handle = self.registry.get(session_id)?;
        let mut state = session::lock(&handle);

        let avg_focus = state.focus_aggregate().avg;
        let assessment =
            scoring::score_understanding(time_spent_sec, expected_time_sec, avg_focus, &self.config);

        let recent = state.recent_understanding_scores();
        let adjust_identity = scoring::should_adjust_identity(
            assessment.understanding_score,
            &recent,
            self.config.intervention_threshold,
        );

        state.push_understanding(assessment.understanding_score, &self.config);

        Ok(SlideOutcome {
            assessment,
            adjust_identity,
        })
    }
}
