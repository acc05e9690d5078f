//! royalty-daemon: confidential royalty submission service.
//!
//! Single OS process running a Tokio async runtime. Clients talk to it via
//! JSON-RPC over a Unix socket; every confidential value they submit goes
//! through the track orchestrator before reaching the ledger.

mod commands;
mod config;
mod events;
mod rpc;

use std::sync::Arc;

use royalty_crypto::ed25519::SigningKey;
use royalty_pipeline::memory_ledger::MemoryLedger;
use royalty_pipeline::sealed::SealedCipher;
use royalty_pipeline::{OrchestratorConfig, TrackOrchestrator};
use royalty_types::events::EventType;
use royalty_types::now_millis;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Pipeline every confidential submission goes through.
    pub orchestrator: TrackOrchestrator,
    /// Reference ledger backing the orchestrator.
    pub ledger: Arc<MemoryLedger>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Startup time, Unix millis.
    pub started_at: u64,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl DaemonState {
    /// Wire the cipher, ledger and orchestrator described by `config`.
    pub fn new(config: DaemonConfig) -> anyhow::Result<Self> {
        let ledger_address = config.ledger_address()?;
        let account = config.account()?;

        let cipher = match config.cipher_key()? {
            Some(key) => SealedCipher::from_key(key),
            None => {
                warn!("no [cipher] key_hex configured; using an ephemeral key, envelopes will not survive a restart");
                SealedCipher::generate()
            }
        };

        let ledger = Arc::new(MemoryLedger::new(
            ledger_address,
            account,
            Arc::new(cipher.verifier()),
            SigningKey::generate(),
        ));
        let orchestrator = TrackOrchestrator::new(
            OrchestratorConfig::sealed(ledger_address, cipher),
            ledger.clone(),
        );
        let event_bus = EventBus::new(config.daemon.event_buffer);
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            orchestrator,
            ledger,
            config,
            event_bus,
            started_at: now_millis(),
            shutdown_tx,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config; it supplies the fallback log level
    let config = DaemonConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("royalty={}", config.logging.log_level)))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Royalty daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let socket_path = config.socket_path();

    // 2. Build daemon state
    let state = Arc::new(DaemonState::new(config)?);
    info!(
        ledger = %state.orchestrator.ledger_address(),
        receipt_key = %hex::encode(state.ledger.verifying_key().to_bytes()),
        "pipeline ready"
    );

    // 3. Start IPC server
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    // 4. Emit DaemonStarted event
    state.event_bus.emit(
        EventType::DaemonStarted,
        serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    );

    // 5. Run the RPC server until shutdown
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {e}");
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
