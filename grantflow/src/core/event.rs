//! Stage events and session messages.
//!
//! Events are produced by the orchestrator and consumed by the status
//! broadcaster. They are never persisted beyond the broadcaster's
//! transient per-session buffer.

use crate::utils::{generate_uuid, iso_timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for one evaluation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a fresh random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(generate_uuid())
    }

    /// Wraps an existing id string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle status carried by a stage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage is waiting to run.
    Queued,
    /// Stage has begun executing.
    Started,
    /// Stage finished successfully.
    Completed,
    /// Stage failed; the run aborts here.
    Errored,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Started => write!(f, "started"),
            Self::Completed => write!(f, "completed"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// An event emitted each time a stage starts, completes, or errors.
///
/// Within one run, events arrive in stage order with non-decreasing
/// `progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The key of the stage this event belongs to.
    pub stage_key: String,
    /// The stage's 0-based position.
    pub ordinal: usize,
    /// The lifecycle status.
    pub status: StageStatus,
    /// Overall run progress, 0-100.
    pub progress: u8,
    /// Free-text description of the transition.
    pub message: String,
    /// When the event occurred (ISO 8601).
    pub timestamp: String,
}

impl StageEvent {
    /// Creates a new event with the current timestamp.
    #[must_use]
    pub fn new(
        stage_key: impl Into<String>,
        ordinal: usize,
        status: StageStatus,
        progress: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage_key: stage_key.into(),
            ordinal,
            status,
            progress: progress.min(100),
            message: message.into(),
            timestamp: iso_timestamp(),
        }
    }

    /// Creates a `started` event.
    #[must_use]
    pub fn started(stage_key: impl Into<String>, ordinal: usize, progress: u8) -> Self {
        Self::new(stage_key, ordinal, StageStatus::Started, progress, "")
    }

    /// Creates a `completed` event with a stage-specific summary message.
    #[must_use]
    pub fn completed(
        stage_key: impl Into<String>,
        ordinal: usize,
        progress: u8,
        message: impl Into<String>,
    ) -> Self {
        Self::new(stage_key, ordinal, StageStatus::Completed, progress, message)
    }

    /// Creates an `errored` event carrying the failure message.
    #[must_use]
    pub fn errored(
        stage_key: impl Into<String>,
        ordinal: usize,
        progress: u8,
        message: impl Into<String>,
    ) -> Self {
        Self::new(stage_key, ordinal, StageStatus::Errored, progress, message)
    }
}

/// A message delivered over a session's subscription channel.
///
/// Serialized as one JSON object per line (newline-delimited).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionMessage {
    /// A stage transition within the run.
    Stage(StageEvent),
    /// Terminal: the run finished with a decision payload.
    Complete {
        /// The assembled evaluation report.
        payload: serde_json::Value,
    },
    /// Terminal: the run failed.
    Error {
        /// A human-readable failure message.
        message: String,
    },
}

impl SessionMessage {
    /// Serializes the message as a single newline-terminated JSON line.
    #[must_use]
    pub fn to_json_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => format!("{json}\n"),
            // StageEvent and the terminal variants contain only
            // serializable fields; reaching here means a payload was
            // hand-built with a non-string map key.
            Err(_) => "{\"type\":\"error\",\"message\":\"serialization failed\"}\n".to_string(),
        }
    }

    /// Returns true if this message terminates the session.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_session_id_is_uuid_formatted() {
        let id = SessionId::new();
        assert_eq!(id.as_str().len(), 36);
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_stage_status_serialize() {
        let json = serde_json::to_string(&StageStatus::Errored).unwrap();
        assert_eq!(json, r#""errored""#);
    }

    #[test]
    fn test_event_progress_capped() {
        let event = StageEvent::started("ingest", 0, 250);
        assert_eq!(event.progress, 100);
    }

    #[test]
    fn test_event_roundtrip() {
        let event = StageEvent::completed("score", 3, 50, "Scored 6 sections");
        let json = serde_json::to_string(&event).unwrap();
        let back: StageEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_message_json_line() {
        let msg = SessionMessage::Stage(StageEvent::started("ingest", 0, 0));
        let line = msg.to_json_line();
        assert!(line.ends_with('\n'));
        assert!(line.contains(r#""type":"stage""#));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_terminal_messages() {
        assert!(SessionMessage::Error {
            message: "boom".to_string()
        }
        .is_terminal());
        assert!(SessionMessage::Complete {
            payload: serde_json::json!({})
        }
        .is_terminal());
        assert!(!SessionMessage::Stage(StageEvent::started("ingest", 0, 0)).is_terminal());
    }
}
