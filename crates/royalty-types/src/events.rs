//! Event types pushed from the daemon to subscribers.

use serde::{Deserialize, Serialize};

/// Envelope for all daemon events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub timestamp: u64,
    pub payload: serde_json::Value,
}

/// All event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub enum EventType {
    // Track events
    TrackCreated,
    RevenueAdded,
    PayoutExecuted,

    // Pipeline failures (payload carries the error kind, never plaintext)
    PipelineFailed,

    // System events
    DaemonStarted,
}

impl EventType {
    /// Category used by subscription filters.
    pub fn category(&self) -> &'static str {
        match self {
            EventType::TrackCreated | EventType::RevenueAdded | EventType::PayoutExecuted => {
                "track"
            }
            EventType::PipelineFailed => "failure",
            EventType::DaemonStarted => "system",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(EventType::RevenueAdded.category(), "track");
        assert_eq!(EventType::PipelineFailed.category(), "failure");
        assert_eq!(EventType::DaemonStarted.category(), "system");
    }

    #[test]
    fn test_event_type_serializes_as_name() {
        let json = serde_json::to_string(&EventType::PayoutExecuted).expect("serialize");
        assert_eq!(json, "\"PayoutExecuted\"");
    }
}
