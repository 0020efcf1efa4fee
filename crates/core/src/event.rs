//! Caller-facing chat events.
//!
//! `ChatEvent` is the engine's sole output contract: exactly one `meta`
//! first, then zero or more `delta`s, then either one `done` or a propagated
//! error (in which case no `done` is emitted). The sequence is lazy,
//! forward-only, and single-consumption.

use serde::{Deserialize, Serialize};

use crate::provider::Usage;

/// An event emitted by the orchestrator during a chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Identifiers for the turn. Always the first event, so callers can
    /// correlate subsequent deltas even if the stream later fails.
    Meta {
        user_message_id: String,
        assistant_message_id: String,
        session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topic_id: Option<String>,
    },

    /// An incremental text fragment — just the new piece, not the
    /// cumulative buffer.
    Delta { text: String },

    /// Successful completion. Usage is unset unless the provider supplied it.
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
}

impl ChatEvent {
    /// Wire event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Meta { .. } => "meta",
            Self::Delta { .. } => "delta",
            Self::Done { .. } => "done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_serialization() {
        let event = ChatEvent::Meta {
            user_message_id: "u1".into(),
            assistant_message_id: "a1".into(),
            session_id: "s1".into(),
            topic_id: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"meta""#));
        assert!(json.contains(r#""user_message_id":"u1""#));
        assert!(!json.contains("topic_id"));
    }

    #[test]
    fn delta_serialization() {
        let event = ChatEvent::Delta { text: "Hi".into() };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"delta""#));
        assert!(json.contains(r#""text":"Hi""#));
    }

    #[test]
    fn done_serialization_without_usage() {
        let event = ChatEvent::Done { usage: None };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"done"}"#);
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            ChatEvent::Meta {
                user_message_id: "u".into(),
                assistant_message_id: "a".into(),
                session_id: "s".into(),
                topic_id: None,
            }
            .event_type(),
            "meta"
        );
        assert_eq!(ChatEvent::Delta { text: "x".into() }.event_type(), "delta");
        assert_eq!(ChatEvent::Done { usage: None }.event_type(), "done");
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"delta","text":"hi"}"#;
        let event: ChatEvent = serde_json::from_str(json).unwrap();
        match event {
            ChatEvent::Delta { text } => assert_eq!(text, "hi"),
            _ => panic!("Wrong variant"),
        }
    }
}
