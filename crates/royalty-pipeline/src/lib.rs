//! # royalty-pipeline
//!
//! The confidential-value submission pipeline.
//!
//! Plaintext percentages and amounts flow through a fixed chain before any
//! ledger call is made:
//!
//! ```text
//! plaintext → check_percentages → EnvelopeBuilder → EnvelopeValidator
//!           → format → Ledger
//! ```
//!
//! Every stage fails closed. The only state-changing side effect is the
//! final ledger call issued by [`orchestrator::TrackOrchestrator`].
//!
//! ## Modules
//!
//! - [`capability`] — `Cipher` / `Verifier` traits a backend plugs in behind
//! - [`plaintext`] — CBOR encoding of confidential values
//! - [`envelope`] — Envelope builder (encrypt, then prove)
//! - [`validator`] — Envelope validator and the `ValidatedEnvelope` gate
//! - [`format`] — Envelope to `{data, proof}` ledger wire shape
//! - [`ledger`] — `Ledger` trait and call shapes
//! - [`memory_ledger`] — In-process reference ledger
//! - [`sealed`] — ChaCha20-Poly1305 + BLAKE3 reference backend
//! - [`sequencer`] — Per-track submission ordering
//! - [`config`] — Orchestrator configuration
//! - [`orchestrator`] — createTrack / addRevenue / executePayout

pub mod capability;
pub mod config;
pub mod envelope;
pub mod error;
pub mod format;
pub mod ledger;
pub mod memory_ledger;
pub mod orchestrator;
pub mod plaintext;
pub mod sealed;
pub mod sequencer;
pub mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use capability::{Cipher, Verifier};
pub use config::OrchestratorConfig;
pub use error::{CapabilityError, EncryptionStage, EnvelopePurpose, ErrorKind, LedgerError, PipelineError};
pub use ledger::Ledger;
pub use orchestrator::{NewTrack, TrackOrchestrator};

/// Convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
