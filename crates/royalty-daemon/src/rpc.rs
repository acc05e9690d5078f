//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! line-delimited JSON-RPC 2.0 calls to the command handlers.
//! `subscribe_events` turns the connection into a notification stream in
//! addition to request/response traffic.

use std::path::PathBuf;
use std::sync::Arc;

use royalty_pipeline::{ErrorKind, PipelineError};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::events::EventFilter;
use crate::DaemonState;

/// Outgoing lines queued per connection.
const OUTBOUND_QUEUE: usize = 256;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Server-pushed notification (no id).
#[derive(Debug, Serialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcNotification {
    pub fn event(params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: "event".to_string(),
            params,
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Pipeline failure, one code per [`ErrorKind`].
    pub fn pipeline(err: &PipelineError) -> Self {
        let kind = err.kind();
        let (code, message) = match kind {
            ErrorKind::InvalidSplit => (-32020, "INVALID_SPLIT"),
            ErrorKind::EncryptionFailure => (-32021, "ENCRYPTION_FAILURE"),
            ErrorKind::ValidationFailure => (-32022, "VALIDATION_FAILURE"),
            ErrorKind::LedgerRejected => (-32023, "LEDGER_REJECTED"),
            ErrorKind::Rejected => (-32024, "REJECTED"),
        };
        Self {
            code,
            message: message.to_string(),
            data: Some(serde_json::json!({
                "kind": kind,
                "detail": err.to_string(),
                "retryable": err.is_retryable(),
            })),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {e}");
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    // Responses and notifications share one writer.
    let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);
    let writer_task: JoinHandle<std::io::Result<()>> = tokio::spawn(async move {
        while let Some(mut line) = out_rx.recv().await {
            line.push('\n');
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok(())
    });
    let mut subscription: Option<JoinHandle<()>> = None;

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) if request.method == "subscribe_events" => {
                match commands::diagnostics::parse_filter(&request.params) {
                    Ok(filter) => {
                        if let Some(previous) = subscription.take() {
                            previous.abort();
                        }
                        let (sub_id, task) = spawn_subscription(&state, filter, out_tx.clone());
                        subscription = Some(task);
                        RpcResponse::success(
                            request.id,
                            serde_json::json!({"subscription_id": sub_id}),
                        )
                    }
                    Err(err) => RpcResponse::error(request.id, err),
                }
            }
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        if out_tx.send(serde_json::to_string(&response)?).await.is_err() {
            break; // writer gone
        }
    }

    if let Some(task) = subscription {
        task.abort();
    }
    drop(out_tx);
    writer_task.await??;
    Ok(())
}

/// Forward matching bus events to one connection as notifications.
fn spawn_subscription(
    state: &Arc<DaemonState>,
    filter: EventFilter,
    out_tx: mpsc::Sender<String>,
) -> (String, JoinHandle<()>) {
    let mut sub_id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut sub_id);
    let sub_id = hex::encode(sub_id);

    let mut rx = state.event_bus.subscribe();
    let id = sub_id.clone();
    let task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(subscription = %id, skipped, "subscriber lagging, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if !filter.matches(&event) {
                continue;
            }
            let params = serde_json::json!({"subscription_id": id, "event": event});
            let Ok(line) = serde_json::to_string(&RpcNotification::event(params)) else {
                continue;
            };
            if out_tx.send(line).await.is_err() {
                break;
            }
        }
    });
    (sub_id, task)
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub(crate) async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }
    let method = request.method.as_str();

    debug!(method, "dispatching RPC method");

    let result = match method {
        // Track pipeline
        "check_split" => commands::tracks::check_split(&state, &request.params).await,
        "create_track" => commands::tracks::create_track(&state, &request.params).await,
        "add_revenue" => commands::tracks::add_revenue(&state, &request.params).await,
        "execute_payout" => commands::tracks::execute_payout(&state, &request.params).await,
        "get_track_info" => commands::tracks::get_track_info(&state, &request.params).await,

        // Diagnostics
        "get_daemon_status" => commands::diagnostics::get_daemon_status(&state).await,
        "shutdown" => commands::diagnostics::shutdown(&state).await,
        "subscribe_events" => Err(RpcError::invalid_request()),

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use royalty_pipeline::LedgerError;
    use royalty_splits::SplitError;

    use super::*;
    use crate::config::DaemonConfig;

    fn request(method: &str, params: serde_json::Value) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: serde_json::json!(1),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);

        let err = RpcError::pipeline(&PipelineError::from(SplitError::InvalidSplitTotal { total: 99 }));
        assert_eq!(err.code, -32020);
        assert_eq!(err.message, "INVALID_SPLIT");

        let err = RpcError::pipeline(&PipelineError::from(LedgerError::reverted("Track is not active")));
        assert_eq!(err.code, -32023);
        let data = err.data.expect("data");
        assert_eq!(data["kind"], "ledger_rejected");
        assert!(data["detail"].as_str().expect("detail").contains("Track is not active"));

        assert_eq!(RpcError::pipeline(&PipelineError::ZeroAmount).code, -32024);
    }

    #[test]
    fn test_rpc_response_shapes() {
        let resp = RpcResponse::success(serde_json::json!(1), serde_json::json!({"track_id": 1}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());

        let resp = RpcResponse::error(serde_json::json!(1), RpcError::internal_error("test"));
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], -32603);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_method() {
        let state = Arc::new(DaemonState::new(DaemonConfig::default()).expect("state"));
        let resp = dispatch_request(state, request("mint_tokens", serde_json::json!({}))).await;
        assert_eq!(resp.error.expect("error").code, -32601);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_wrong_version() {
        let state = Arc::new(DaemonState::new(DaemonConfig::default()).expect("state"));
        let mut req = request("get_daemon_status", serde_json::Value::Null);
        req.jsonrpc = "1.0".to_string();
        let resp = dispatch_request(state, req).await;
        assert_eq!(resp.error.expect("error").code, -32600);
    }

    #[tokio::test]
    async fn test_connection_round_trip_with_events() {
        let state = Arc::new(DaemonState::new(DaemonConfig::default()).expect("state"));
        let (client, server) = tokio::net::UnixStream::pair().expect("socket pair");
        let conn = tokio::spawn(handle_connection(state, server));

        let (reader, mut writer) = client.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"subscribe_events\",\"params\":{\"categories\":[\"track\"]}}\n")
            .await
            .expect("write");
        let resp: serde_json::Value =
            serde_json::from_str(&lines.next_line().await.expect("read").expect("line")).expect("json");
        assert!(resp["result"]["subscription_id"].is_string());

        let create = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "create_track",
            "params": {
                "title": "Low Tide",
                "artist": "Ada",
                "producer": "Lin",
                "label": "Northside",
                "artist_pct": 60,
                "producer_pct": 30,
                "label_pct": 10
            }
        });
        writer
            .write_all(format!("{create}\n").as_bytes())
            .await
            .expect("write");

        // The notification and the response may arrive in either order.
        let mut saw_response = false;
        let mut saw_event = false;
        for _ in 0..2 {
            let msg: serde_json::Value =
                serde_json::from_str(&lines.next_line().await.expect("read").expect("line")).expect("json");
            if msg["id"] == 2 {
                assert_eq!(msg["result"]["track_id"], 1);
                saw_response = true;
            } else {
                assert_eq!(msg["method"], "event");
                assert_eq!(msg["params"]["event"]["event_type"], "TrackCreated");
                saw_event = true;
            }
        }
        assert!(saw_response && saw_event);

        drop(writer);
        drop(lines);
        conn.await.expect("task").expect("connection closes cleanly");
    }
}
