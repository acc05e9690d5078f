//! Integration test crate for the confidential royalty pipeline.
//!
//! Holds the shared fixture; the tests themselves live under `tests/` and
//! exercise full track lifecycles across the workspace crates against the
//! sealed backend and the in-memory ledger.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p royalty-integration-tests
//! ```

use std::sync::Arc;

use royalty_crypto::ed25519::SigningKey;
use royalty_pipeline::memory_ledger::MemoryLedger;
use royalty_pipeline::sealed::SealedCipher;
use royalty_pipeline::testing::{CountingCipher, RecordingLedger};
use royalty_pipeline::{NewTrack, OrchestratorConfig, TrackOrchestrator, Verifier};
use royalty_types::LedgerAddress;

/// Contract address every fixture ledger is deployed at.
pub const CONTRACT: LedgerAddress = LedgerAddress([0xc0; 20]);

/// Account the fixture submits from.
pub const ACCOUNT: LedgerAddress = LedgerAddress([0xa1; 20]);

/// Key shared by the fixture cipher and ledger verifier.
pub const CIPHER_KEY: [u8; 32] = [0x42; 32];

/// An orchestrator wired to a recording in-memory ledger.
pub struct Fixture {
    pub orchestrator: Arc<TrackOrchestrator>,
    pub cipher: Arc<CountingCipher>,
    pub ledger: Arc<RecordingLedger>,
    /// Opens ciphertexts the fixture cipher produced.
    pub opener: SealedCipher,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(false, None)
    }

    /// Ledger calls park until `ledger.open_gate` is called.
    pub fn gated() -> Self {
        Self::build(true, None)
    }

    /// Orchestrator-side verifier replaced; the ledger keeps the real one.
    pub fn with_verifier(verifier: Arc<dyn Verifier>) -> Self {
        Self::build(false, Some(verifier))
    }

    fn build(gated: bool, verifier: Option<Arc<dyn Verifier>>) -> Self {
        let sealed = SealedCipher::from_key(CIPHER_KEY);
        let ledger_verifier: Arc<dyn Verifier> = Arc::new(sealed.verifier());
        let memory = MemoryLedger::new(
            CONTRACT,
            ACCOUNT,
            ledger_verifier.clone(),
            SigningKey::derive(b"integration-ledger"),
        );
        let ledger = Arc::new(if gated {
            RecordingLedger::gated(memory)
        } else {
            RecordingLedger::new(memory)
        });
        let cipher = Arc::new(CountingCipher::new(Arc::new(sealed)));
        let config = OrchestratorConfig::new(
            CONTRACT,
            cipher.clone(),
            verifier.unwrap_or(ledger_verifier),
        );
        Self {
            orchestrator: Arc::new(TrackOrchestrator::new(config, ledger.clone())),
            cipher,
            ledger,
            opener: SealedCipher::from_key(CIPHER_KEY),
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A track with the given split and fixed plaintext metadata.
pub fn new_track(title: &str, artist_pct: i64, producer_pct: i64, label_pct: i64) -> NewTrack {
    NewTrack {
        title: title.to_string(),
        artist: "Ada Vale".to_string(),
        producer: "Lin Okafor".to_string(),
        label: "Northside Records".to_string(),
        artist_pct,
        producer_pct,
        label_pct,
    }
}
