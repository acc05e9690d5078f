//! Event emission.
//!
//! Pipeline outcomes are pushed to RPC subscribers as JSON-RPC
//! notifications. Each subscriber has an independent buffer; a subscriber
//! that falls behind skips the oldest events rather than stalling others.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use royalty_pipeline::PipelineError;
use royalty_types::events::{Event, EventType};
use royalty_types::{now_millis, TrackId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Category filter: "track", "failure", "system".
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    /// Restrict to events about these tracks.
    #[serde(default)]
    pub track_ids: Option<Vec<TrackId>>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given per-subscriber buffer.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event_type: EventType, payload: serde_json::Value) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // No subscribers is not an error.
        let _ = self.sender.send(Event {
            event_type,
            timestamp: now_millis(),
            payload,
        });
    }

    /// Emit `PipelineFailed` for a failed operation.
    ///
    /// Only the error kind and the plaintext-free context are published.
    pub fn emit_failure(&self, operation: &str, track_id: Option<TrackId>, err: &PipelineError) {
        self.emit(
            EventType::PipelineFailed,
            serde_json::json!({
                "operation": operation,
                "track_id": track_id,
                "kind": err.kind(),
                "retryable": err.is_retryable(),
            }),
        );
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref categories) = self.categories {
            let category = event.event_type.category();
            if !categories.iter().any(|c| c == category) {
                return false;
            }
        }

        // Events without a track id pass the track filter.
        if let Some(ref track_ids) = self.track_ids {
            if let Some(id) = event.payload.get("track_id").and_then(|v| v.as_u64()) {
                if !track_ids.contains(&TrackId(id)) {
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use royalty_pipeline::LedgerError;

    use super::*;

    fn event(event_type: EventType, payload: serde_json::Value) -> Event {
        Event {
            event_type,
            timestamp: 1000,
            payload,
        }
    }

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(EventType::DaemonStarted, serde_json::json!({"version": "0.1.0"}));

        let event = rx.try_recv().expect("receive event");
        assert_eq!(event.event_type, EventType::DaemonStarted);
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_failure_event_carries_kind_only() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        bus.emit_failure(
            "add_revenue",
            Some(TrackId(3)),
            &PipelineError::from(LedgerError::reverted("Track is not active")),
        );
        let event = rx.try_recv().expect("receive event");
        assert_eq!(event.event_type, EventType::PipelineFailed);
        assert_eq!(event.payload["kind"], "ledger_rejected");
        assert_eq!(event.payload["track_id"], 3);
        assert_eq!(event.payload["retryable"], false);
    }

    #[test]
    fn test_event_filter_categories() {
        let filter = EventFilter {
            categories: Some(vec!["track".to_string()]),
            track_ids: None,
        };
        assert!(filter.matches(&event(EventType::RevenueAdded, serde_json::json!({}))));
        assert!(!filter.matches(&event(EventType::DaemonStarted, serde_json::json!({}))));
    }

    #[test]
    fn test_event_filter_track_ids() {
        let filter = EventFilter {
            categories: None,
            track_ids: Some(vec![TrackId(1)]),
        };
        assert!(filter.matches(&event(EventType::PayoutExecuted, serde_json::json!({"track_id": 1}))));
        assert!(!filter.matches(&event(EventType::PayoutExecuted, serde_json::json!({"track_id": 2}))));
        assert!(filter.matches(&event(EventType::DaemonStarted, serde_json::json!({}))));
    }

    #[test]
    fn test_default_filter_matches_everything() {
        let filter: EventFilter = serde_json::from_value(serde_json::json!({})).expect("parse");
        assert!(filter.matches(&event(EventType::TrackCreated, serde_json::json!({"track_id": 9}))));
    }
}
