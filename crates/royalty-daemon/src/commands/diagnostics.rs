//! Diagnostics command handlers.

use std::sync::Arc;

use royalty_types::now_millis;
use serde_json::Value;

use crate::events::EventFilter;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Daemon and pipeline status.
pub async fn get_daemon_status(state: &Arc<DaemonState>) -> Result {
    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "ledger_address": state.orchestrator.ledger_address(),
        "receipt_key": hex::encode(state.ledger.verifying_key().to_bytes()),
        "track_count": state.ledger.track_count().await,
        "events_emitted": state.event_bus.sequence(),
        "event_buffer": state.config.daemon.event_buffer,
        "socket": state.config.socket_path(),
        "uptime_ms": now_millis().saturating_sub(state.started_at),
    }))
}

/// Ask the daemon to stop after answering.
pub async fn shutdown(state: &Arc<DaemonState>) -> Result {
    let _ = state.shutdown_tx.send(());
    Ok(serde_json::json!({"stopping": true}))
}

/// Parse the optional `filter` of `subscribe_events`.
pub fn parse_filter(params: &Value) -> std::result::Result<EventFilter, RpcError> {
    let filter = match params {
        Value::Null => return Ok(EventFilter::default()),
        Value::Object(map) => map.get("filter").unwrap_or(params),
        _ => return Err(RpcError::invalid_params("params must be an object")),
    };
    serde_json::from_value(filter.clone()).map_err(|e| RpcError::invalid_params(&e.to_string()))
}
