//! End-to-end engine tests: a full learner session from raw events through
//! identity extraction, live confusion signals, understanding assessment, and
//! the final snapshot.

use mindpace::{
    AnalysisConfig, AnalysisEngine, ConfusionLevel, EngineError, LearningIdentity, Pace,
    ProcessingStyle, SignalType,
};
use pretty_assertions::assert_eq;

fn study_window_json() -> &'static str {
    r#"[
        {
            "event_type": "session_started",
            "event_data": {},
            "timestamp": "2024-03-10T09:00:00Z",
            "user_id": "user-1",
            "session_id": "sess-1"
        },
        {
            "event_type": "slide_viewed",
            "event_data": {
                "content_type": "diagram-heavy",
                "time_spent_seconds": 40,
                "zoomed_into_diagram": true
            },
            "timestamp": "2024-03-10T09:00:05Z",
            "user_id": "user-1",
            "session_id": "sess-1"
        },
        {
            "event_type": "slide_viewed",
            "event_data": {
                "content_type": "text-heavy",
                "time_spent_seconds": 25
            },
            "timestamp": "2024-03-10T09:00:50Z",
            "user_id": "user-1",
            "session_id": "sess-1"
        },
        {
            "event_type": "knowledge_check_completed",
            "event_data": {
                "slide_format_just_seen": "visual",
                "correct": true
            },
            "timestamp": "2024-03-10T09:01:20Z",
            "user_id": "user-1",
            "session_id": "sess-1"
        },
        {
            "event_type": "interaction_with_content",
            "event_data": {
                "interaction_type": "clicked_example"
            },
            "timestamp": "2024-03-10T09:01:30Z",
            "user_id": "user-1",
            "session_id": "sess-1"
        }
    ]"#
}

#[test]
fn batch_extraction_then_live_session() {
    let engine = AnalysisEngine::default();

    // Batch phase: fold the historical window into an identity
    let events = mindpace::event::parse_array(study_window_json()).unwrap();
    let identity = engine.extract_identity(&events, None);

    assert!(identity.visual_text_score > 0.5);
    assert_eq!(identity.pace, Pace::Moderate);
    assert_eq!(identity.processing_style, ProcessingStyle::TopDown);
    assert!((identity.confidence_score - 0.05).abs() < 1e-9);

    // Live phase: the learner gets stuck and fails a quiz
    engine.start_session("sess-1", "user-1").unwrap();
    engine.record_focus("sess-1", 0.9, true).unwrap();
    engine.record_focus("sess-1", 0.5, false).unwrap();

    engine.record_slide_change("sess-1", "slide-1", 0.0).unwrap();
    let stuck = engine
        .record_slide_change("sess-1", "slide-2", 650.0)
        .unwrap();
    assert_eq!(stuck.len(), 1);
    assert_eq!(stuck[0].signal_type, SignalType::StuckOnSlide);

    let quiz = engine.record_quiz_result("sess-1", 0.3, false).unwrap();
    let quiz = quiz.expect("failing quiz emits a signal");
    assert_eq!(quiz.signal_type, SignalType::QuizFailed);

    // The live signals push the visual preference back toward text
    let adjusted = engine.adjust_identity(&identity, &[stuck[0].clone(), quiz]);
    assert!(adjusted.visual_text_score < identity.visual_text_score);
    assert_eq!(adjusted.pace, identity.pace);

    // Tear-down produces a persistable snapshot
    let snapshot = engine.end_session("sess-1").unwrap();
    assert_eq!(snapshot.session_id, "sess-1");
    assert_eq!(snapshot.user_id, "user-1");
    assert_eq!(snapshot.confusion_signals.len(), 2);
    assert_eq!(snapshot.final_slide_id.as_deref(), Some("slide-2"));
    assert!((snapshot.focus.avg - 0.7).abs() < 1e-9);
    assert!(engine.end_session("sess-1").is_err());
}

#[test]
fn understanding_flow_drives_adaptation() {
    let engine = AnalysisEngine::default();
    engine.start_session("sess-2", "user-2").unwrap();
    engine.record_focus("sess-2", 1.0, true).unwrap();

    // Healthy visit: on time, fully focused
    let outcome = engine.assess_slide("sess-2", 60, 60).unwrap();
    assert!((outcome.assessment.understanding_score - 1.0).abs() < 1e-9);
    assert_eq!(outcome.assessment.confusion_level, ConfusionLevel::None);
    assert!(!outcome.assessment.requires_intervention);
    assert!(!outcome.adjust_identity);

    // Severe overtime: 10x expected caps the time penalty
    let outcome = engine.assess_slide("sess-2", 600, 60).unwrap();
    assert!((outcome.assessment.understanding_score - 0.4).abs() < 1e-9);
    assert_eq!(outcome.assessment.confusion_level, ConfusionLevel::Medium);
    assert!(outcome.assessment.requires_intervention);
    assert!(outcome.adjust_identity);

    let snapshot = engine.end_session("sess-2").unwrap();
    assert_eq!(snapshot.recent_understanding.len(), 2);
}

#[test]
fn one_shot_json_entry_point() {
    let identity_json = mindpace::events_to_identity(study_window_json(), None).unwrap();
    let identity: LearningIdentity = serde_json::from_str(&identity_json).unwrap();

    // Round-trip the identity as a prior for the next window
    let updated_json =
        mindpace::events_to_identity(study_window_json(), Some(&identity_json)).unwrap();
    let updated: LearningIdentity = serde_json::from_str(&updated_json).unwrap();

    assert!(identity.visual_text_score > 0.5);
    assert!(updated.visual_text_score > 0.5);
    assert_eq!(updated.pace, identity.pace);
}

#[test]
fn custom_configuration_threads_through() {
    let config = AnalysisConfig {
        stuck_threshold_sec: 60.0,
        ..AnalysisConfig::default()
    };
    let engine = AnalysisEngine::new(config);
    engine.start_session("sess-3", "user-3").unwrap();

    engine.record_slide_change("sess-3", "slide-1", 0.0).unwrap();
    // 90s would be fine under the defaults but trips the tightened threshold
    let signals = engine
        .record_slide_change("sess-3", "slide-2", 90.0)
        .unwrap();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].signal_type, SignalType::StuckOnSlide);
}

#[test]
fn session_lifecycle_errors() {
    let engine = AnalysisEngine::default();
    engine.start_session("sess-4", "user-4").unwrap();

    assert!(matches!(
        engine.start_session("sess-4", "user-4"),
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine.record_focus("missing", 0.5, true),
        Err(EngineError::NotFound(_))
    ));
    assert_eq!(engine.active_sessions(), 1);
}
