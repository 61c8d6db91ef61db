//! Live session state and the session registry
//!
//! A session is one continuous learning interaction bounded by explicit start
//! and end. While active it accumulates focus telemetry, slide timing, and
//! confusion signals; ending it yields a final snapshot for the collaborator
//! to persist and removes it from live memory. The registry is owned by the
//! engine instance, never ambient global state, and serializes mutation per
//! session id so overlapping updates to one session never interleave while
//! unrelated sessions never block each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::confusion::{ConfusionDetector, ConfusionSignal, NavigationWindow};
use crate::error::EngineError;
use crate::scoring::{aggregate_focus, FocusAggregate};

/// Mutable per-session aggregate, exactly one live instance per active session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub user_id: String,
    pub current_slide_id: Option<String>,
    /// Seconds accumulated on the current slide
    pub time_on_current_slide: f64,
    pub is_focused: bool,
    /// Most recent focus reading (0-1)
    pub focus_percentage: f64,
    pub confusion_signals: Vec<ConfusionSignal>,
    /// Focus readings, oldest first; truncated to the most recent entries
    /// when the cap is reached
    pub focus_history: Vec<f64>,
    /// Recent understanding scores, oldest first, bounded window
    pub recent_understanding: VecDeque<f64>,
    navigation_window: NavigationWindow,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            current_slide_id: None,
            time_on_current_slide: 0.0,
            is_focused: true,
            focus_percentage: 1.0,
            confusion_signals: Vec::new(),
            focus_history: Vec::new(),
            recent_understanding: VecDeque::new(),
            navigation_window: NavigationWindow::default(),
            started_at: now,
            last_updated: now,
        }
    }

    /// Record a focus reading
    pub fn apply_focus(&mut self, focus_score: f64, is_focused: bool, config: &AnalysisConfig) {
        let focus_score = focus_score.clamp(0.0, 1.0);
        self.focus_percentage = focus_score;
        self.is_focused = is_focused;

        self.focus_history.push(focus_score);
        if self.focus_history.len() >= config.focus_history_cap {
            let drop = self.focus_history.len() - config.focus_history_keep;
            self.focus_history.drain(..drop);
        }

        self.last_updated = Utc::now();
    }

    /// Record a slide transition.
    ///
    /// Runs stuck-on-slide detection against the slide being left and
    /// rapid-navigation detection against the transition itself; any emitted
    /// signals are appended to this session and returned for forwarding to
    /// the identity adjuster.
    pub fn apply_slide_change(
        &mut self,
        new_slide_id: impl Into<String>,
        time_on_previous_sec: f64,
        detector: &ConfusionDetector,
        config: &AnalysisConfig,
    ) -> Vec<ConfusionSignal> {
        let now = Utc::now();
        let mut emitted = Vec::new();

        if self.current_slide_id.is_some() {
            if let Some(signal) = detector.detect_slide_stuck(time_on_previous_sec) {
                emitted.push(signal);
            }
        }
        if let Some(signal) = self.navigation_window.record(now, config) {
            emitted.push(signal);
        }

        self.confusion_signals.extend(emitted.iter().cloned());
        self.current_slide_id = Some(new_slide_id.into());
        self.time_on_current_slide = 0.0;
        self.last_updated = now;

        emitted
    }

    /// Record a quiz submission, returning any emitted failure signal
    pub fn apply_quiz_result(
        &mut self,
        score: f64,
        passed: bool,
        detector: &ConfusionDetector,
    ) -> Option<ConfusionSignal> {
        let signal = detector.detect_quiz_failure(score, passed);
        if let Some(ref s) = signal {
            self.confusion_signals.push(s.clone());
        }
        self.last_updated = Utc::now();
        signal
    }

    /// Push an understanding score into the bounded recent window
    pub fn push_understanding(&mut self, score: f64, config: &AnalysisConfig) {
        self.recent_understanding.push_back(score.clamp(0.0, 1.0));
        while self.recent_understanding.len() > config.understanding_window {
            self.recent_understanding.pop_front();
        }
        self.last_updated = Utc::now();
    }

    /// Recent understanding scores as a slice-friendly vector, oldest first
    pub fn recent_understanding_scores(&self) -> Vec<f64> {
        self.recent_understanding.iter().copied().collect()
    }

    /// Aggregate of the focus history accumulated so far
    pub fn focus_aggregate(&self) -> FocusAggregate {
        aggregate_focus(&self.focus_history)
    }
}

/// Final archived view of a session, produced exactly once at session end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub snapshot_id: Uuid,
    pub session_id: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub final_slide_id: Option<String>,
    pub focus: FocusAggregate,
    pub confusion_signals: Vec<ConfusionSignal>,
    pub recent_understanding: Vec<f64>,
}

impl SessionSnapshot {
    fn capture(state: &SessionState) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            session_id: state.session_id.clone(),
            user_id: state.user_id.clone(),
            started_at: state.started_at,
            ended_at: Utc::now(),
            final_slide_id: state.current_slide_id.clone(),
            focus: state.focus_aggregate(),
            confusion_signals: state.confusion_signals.clone(),
            recent_understanding: state.recent_understanding_scores(),
        }
    }
}

/// Shared handle to one session's state
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Instance-scoped registry of active sessions.
///
/// The registry lock guards only the map itself; each session's state sits
/// behind its own mutex so per-session updates serialize without a global
/// bottleneck.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session. Fails if the session id is already active.
    pub fn start(
        &self,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<SessionHandle, EngineError> {
        let session_id = session_id.into();
        let mut sessions = write_lock(&self.sessions);

        if sessions.contains_key(&session_id) {
            return Err(EngineError::Validation(format!(
                "session {session_id} is already active"
            )));
        }

        let handle = Arc::new(Mutex::new(SessionState::new(session_id.clone(), user_id)));
        sessions.insert(session_id, Arc::clone(&handle));
        Ok(handle)
    }

    /// Look up an active session
    pub fn get(&self, session_id: &str) -> Result<SessionHandle, EngineError> {
        read_lock(&self.sessions)
            .get(session_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("session {session_id}")))
    }

    /// End a session: capture its final snapshot and drop it from live memory
    pub fn end(&self, session_id: &str) -> Result<SessionSnapshot, EngineError> {
        let handle = write_lock(&self.sessions)
            .remove(session_id)
            .ok_or_else(|| EngineError::NotFound(format!("session {session_id}")))?;

        let state = lock(&handle);
        Ok(SessionSnapshot::capture(&state))
    }

    /// Number of currently active sessions
    pub fn active_count(&self) -> usize {
        read_lock(&self.sessions).len()
    }

    /// Active session ids, unordered
    pub fn active_ids(&self) -> Vec<String> {
        read_lock(&self.sessions).keys().cloned().collect()
    }
}

/// Lock a session handle, recovering state from a poisoned mutex
pub fn lock(handle: &SessionHandle) -> MutexGuard<'_, SessionState> {
    handle.lock().unwrap_or_else(|e| e.into_inner())
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
