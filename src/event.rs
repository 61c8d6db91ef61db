//! Behavioral event model
//!
//! Defines the canonical representation of a learner interaction event and the
//! JSON ingestion helpers used at the telemetry boundary. Events are immutable
//! once recorded; the extractor and detector consume them read-only. Missing or
//! malformed payload fields degrade to neutral values instead of failing, so a
//! partially populated signal never aborts analysis for a whole session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::EngineError;

/// Behavioral event types captured during a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SlideViewed,
    KnowledgeCheckCompleted,
    FocusChange,
    ConfusionDetected,
    InteractionWithContent,
    SessionStarted,
    SessionEnded,
    /// For custom/unknown event types
    #[serde(untagged)]
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::SlideViewed => "slide_viewed",
            EventType::KnowledgeCheckCompleted => "knowledge_check_completed",
            EventType::FocusChange => "focus_change",
            EventType::ConfusionDetected => "confusion_detected",
            EventType::InteractionWithContent => "interaction_with_content",
            EventType::SessionStarted => "session_started",
            EventType::SessionEnded => "session_ended",
            EventType::Other(name) => name.as_str(),
        }
    }
}

/// A single learner interaction event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type
    pub event_type: EventType,
    /// Type-specific payload (flexible key-value pairs, snake_case keys)
    #[serde(default)]
    pub event_data: HashMap<String, Value>,
    /// When the event occurred (UTC)
    pub timestamp: DateTime<Utc>,
    /// Learner this event belongs to
    pub user_id: String,
    /// Session this event belongs to
    pub session_id: String,
}

impl Event {
    /// Numeric payload field, defaulting to 0.0 when absent or non-numeric
    pub fn num(&self, key: &str) -> f64 {
        self.event_data.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Numeric payload field with an explicit fallback
    pub fn num_or(&self, key: &str, default: f64) -> f64 {
        self.event_data
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }

    /// Boolean payload field, defaulting to false
    pub fn flag(&self, key: &str) -> bool {
        self.event_data
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// String payload field, defaulting to ""
    pub fn text(&self, key: &str) -> &str {
        self.event_data
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Validate boundary requirements: events must carry user and session ids
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.user_id.is_empty() {
            return Err(EngineError::Validation("event missing user_id".to_string()));
        }
        if self.session_id.is_empty() {
            return Err(EngineError::Validation(
                "event missing session_id".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a JSON array of events
pub fn parse_array(json: &str) -> Result<Vec<Event>, EngineError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse newline-delimited JSON, one event per line. Blank lines are skipped.
pub fn parse_ndjson(input: &str) -> Result<Vec<Event>, EngineError> {
    let mut events = Vec::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        events.push(serde_json::from_str(trimmed)?);
    }
    Ok(events)
}

/// Sort events by timestamp, oldest first. Ties keep their input order.
pub fn sort_by_timestamp(events: &mut [Event]) {
    events.sort_by_key(|e| e.timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn make_event(event_type: EventType, data: &[(&str, Value)]) -> Event {
        Event {
            event_type,
            event_data: data
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(),
            user_id: "user-1".to_string(),
            session_id: "sess-1".to_string(),
        }
    }

    #[test]
    fn test_event_type_serialization() {
        let json = serde_json::to_string(&EventType::SlideViewed).unwrap();
        assert_eq!(json, "\"slide_viewed\"");

        let parsed: EventType = serde_json::from_str("\"knowledge_check_completed\"").unwrap();
        assert_eq!(parsed, EventType::KnowledgeCheckCompleted);
    }

    #[test]
    fn test_unknown_event_type_round_trips() {
        let parsed: EventType = serde_json::from_str("\"tab_hidden\"").unwrap();
        assert_eq!(parsed, EventType::Other("tab_hidden".to_string()));
        assert_eq!(parsed.as_str(), "tab_hidden");
    }

    #[test]
    fn test_accessors_default_on_missing_or_malformed() {
        let event = make_event(
            EventType::SlideViewed,
            &[
                ("time_spent_seconds", Value::from(42.5)),
                ("content_type", Value::from("diagram-heavy")),
                ("zoomed_into_diagram", Value::from(true)),
                ("bad_number", Value::from("oops")),
            ],
        );

        assert_eq!(event.num("time_spent_seconds"), 42.5);
        assert_eq!(event.num("missing"), 0.0);
        assert_eq!(event.num("bad_number"), 0.0);
        assert_eq!(event.num_or("missing", 900.0), 900.0);
        assert!(event.flag("zoomed_into_diagram"));
        assert!(!event.flag("missing"));
        assert_eq!(event.text("content_type"), "diagram-heavy");
        assert_eq!(event.text("missing"), "");
    }

    #[test]
    fn test_event_deserialization_without_data() {
        let json = r#"{
            "event_type": "session_started",
            "timestamp": "2024-03-10T09:00:00Z",
            "user_id": "user-1",
            "session_id": "sess-1"
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, EventType::SessionStarted);
        assert!(event.event_data.is_empty());
    }

    #[test]
    fn test_validate_rejects_missing_ids() {
        let mut event = make_event(EventType::SlideViewed, &[]);
        event.user_id = String::new();
        assert!(matches!(
            event.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = concat!(
            r#"{"event_type":"slide_viewed","timestamp":"2024-03-10T09:00:00Z","user_id":"u","session_id":"s"}"#,
            "\n\n",
            r#"{"event_type":"focus_change","timestamp":"2024-03-10T09:01:00Z","user_id":"u","session_id":"s"}"#,
            "\n",
        );

        let events = parse_ndjson(input).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, EventType::FocusChange);
    }

    #[test]
    fn test_sort_by_timestamp() {
        let mut events = vec![
            Event {
                timestamp: Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap(),
                ..make_event(EventType::SlideViewed, &[])
            },
            Event {
                timestamp: Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(),
                ..make_event(EventType::FocusChange, &[])
            },
        ];

        sort_by_timestamp(&mut events);
        assert_eq!(events[0].event_type, EventType::FocusChange);
    }
}
