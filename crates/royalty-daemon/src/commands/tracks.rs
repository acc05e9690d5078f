//! Track pipeline command handlers.
//!
//! Thin adapters: parse params, call the orchestrator, publish the outcome
//! on the event bus. Event payloads never carry plaintext values.

use std::sync::Arc;

use royalty_pipeline::NewTrack;
use royalty_splits::splits::check_percentages;
use royalty_types::events::EventType;
use royalty_types::{Receipt, TrackId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

#[derive(Deserialize)]
struct SplitParams {
    artist: i64,
    producer: i64,
    label: i64,
}

#[derive(Deserialize)]
struct SubmitParams {
    track_id: TrackId,
    amount: u64,
}

#[derive(Deserialize)]
struct TrackParams {
    track_id: TrackId,
}

fn parse<T: DeserializeOwned>(params: &Value) -> std::result::Result<T, RpcError> {
    serde_json::from_value(params.clone()).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&e.to_string()))
}

fn receipt_json(receipt: &Receipt) -> Value {
    serde_json::json!({
        "track_id": receipt.track_id,
        "sequence": receipt.sequence,
        "tx_hash": hex::encode(receipt.tx_hash),
        "accepted_at": receipt.accepted_at,
    })
}

/// Check a percentage triple without encrypting anything.
pub async fn check_split(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: SplitParams = parse(params)?;
    match check_percentages(p.artist, p.producer, p.label) {
        Ok(_) => Ok(serde_json::json!({"valid": true})),
        Err(e) => Ok(serde_json::json!({"valid": false, "reason": e.to_string()})),
    }
}

/// Register a track with an encrypted split.
pub async fn create_track(state: &Arc<DaemonState>, params: &Value) -> Result {
    let track: NewTrack = parse(params)?;
    let title = track.title.clone();
    match state.orchestrator.create_track(track).await {
        Ok(track_id) => {
            state.event_bus.emit(
                EventType::TrackCreated,
                serde_json::json!({"track_id": track_id, "title": title}),
            );
            Ok(serde_json::json!({"track_id": track_id}))
        }
        Err(err) => {
            state.event_bus.emit_failure("create_track", None, &err);
            Err(RpcError::pipeline(&err))
        }
    }
}

/// Submit an encrypted revenue amount.
pub async fn add_revenue(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: SubmitParams = parse(params)?;
    match state.orchestrator.add_revenue(p.track_id, p.amount).await {
        Ok(receipt) => {
            let body = receipt_json(&receipt);
            state.event_bus.emit(EventType::RevenueAdded, body.clone());
            Ok(body)
        }
        Err(err) => {
            state.event_bus.emit_failure("add_revenue", Some(p.track_id), &err);
            Err(RpcError::pipeline(&err))
        }
    }
}

/// Settle a track against an encrypted total.
pub async fn execute_payout(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: SubmitParams = parse(params)?;
    match state.orchestrator.execute_payout(p.track_id, p.amount).await {
        Ok(receipt) => {
            let body = receipt_json(&receipt);
            state.event_bus.emit(EventType::PayoutExecuted, body.clone());
            Ok(body)
        }
        Err(err) => {
            state.event_bus.emit_failure("execute_payout", Some(p.track_id), &err);
            Err(RpcError::pipeline(&err))
        }
    }
}

/// Read a track. Encrypted fields are returned as opaque hex.
pub async fn get_track_info(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: TrackParams = parse(params)?;
    let info = state
        .orchestrator
        .track_info(p.track_id)
        .await
        .map_err(|e| RpcError::pipeline(&e))?;
    to_value(&info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;

    fn state() -> Arc<DaemonState> {
        Arc::new(DaemonState::new(DaemonConfig::default()).expect("state"))
    }

    fn track_params(artist: i64, producer: i64, label: i64) -> Value {
        serde_json::json!({
            "title": "Low Tide",
            "artist": "Ada",
            "producer": "Lin",
            "label": "Northside",
            "artist_pct": artist,
            "producer_pct": producer,
            "label_pct": label,
        })
    }

    #[tokio::test]
    async fn test_check_split() {
        let state = state();
        let ok = check_split(&state, &serde_json::json!({"artist": 60, "producer": 30, "label": 10}))
            .await
            .expect("check");
        assert_eq!(ok["valid"], true);

        let bad = check_split(&state, &serde_json::json!({"artist": 50, "producer": 50, "label": 50}))
            .await
            .expect("check");
        assert_eq!(bad["valid"], false);
    }

    #[tokio::test]
    async fn test_lifecycle_emits_events() {
        let state = state();
        let mut rx = state.event_bus.subscribe();

        let created = create_track(&state, &track_params(60, 30, 10)).await.expect("create");
        assert_eq!(created["track_id"], 1);

        let revenue = add_revenue(&state, &serde_json::json!({"track_id": 1, "amount": 900}))
            .await
            .expect("revenue");
        assert_eq!(revenue["sequence"], 1);

        execute_payout(&state, &serde_json::json!({"track_id": 1, "amount": 900}))
            .await
            .expect("payout");

        let kinds: Vec<EventType> = (0..3)
            .map(|_| rx.try_recv().expect("event").event_type)
            .collect();
        assert_eq!(
            kinds,
            vec![EventType::TrackCreated, EventType::RevenueAdded, EventType::PayoutExecuted]
        );

        let info = get_track_info(&state, &serde_json::json!({"track_id": 1}))
            .await
            .expect("info");
        assert_eq!(info["state"], "settled");
        assert_eq!(info["revenue_events"], 1);
    }

    #[tokio::test]
    async fn test_invalid_split_reported_and_published() {
        let state = state();
        let mut rx = state.event_bus.subscribe();
        let err = create_track(&state, &track_params(50, 50, 50))
            .await
            .expect_err("invalid split");
        assert_eq!(err.code, -32020);

        let event = rx.try_recv().expect("failure event");
        assert_eq!(event.event_type, EventType::PipelineFailed);
        assert_eq!(event.payload["kind"], "invalid_split");
        assert_eq!(state.ledger.track_count().await, 0);
    }

    #[tokio::test]
    async fn test_bad_params() {
        let state = state();
        let err = add_revenue(&state, &serde_json::json!({"track_id": 1, "amount": -5}))
            .await
            .expect_err("negative amount");
        assert_eq!(err.code, -32602);

        let err = get_track_info(&state, &serde_json::json!({}))
            .await
            .expect_err("missing id");
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let state = state();
        create_track(&state, &track_params(60, 30, 10)).await.expect("create");
        let err = add_revenue(&state, &serde_json::json!({"track_id": 1, "amount": 0}))
            .await
            .expect_err("zero");
        assert_eq!(err.code, -32024);
    }
}
