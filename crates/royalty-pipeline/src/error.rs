//! Error taxonomy for the submission pipeline.
//!
//! Callers branch on [`PipelineError::kind`], never on message text.

use std::fmt;

use royalty_splits::SplitError;
use royalty_types::{Role, TrackId};
use serde::{Deserialize, Serialize};

/// Failure reported by a pluggable `Cipher` or `Verifier` backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// The backend could not complete the operation.
    #[error("backend failure: {0}")]
    Backend(String),

    /// The backend refused the input it was handed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Failure reported by the ledger, surfaced to callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The ledger executed the call and reverted it.
    #[error("reverted: {reason}")]
    Reverted {
        /// Reason string given by the ledger.
        reason: String,
    },

    /// The call could not be delivered or its outcome is unknown.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    pub fn reverted(reason: impl Into<String>) -> Self {
        Self::Reverted {
            reason: reason.into(),
        }
    }
}

/// Which builder step failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionStage {
    /// Plaintext encoding before the cipher is called.
    Encode,
    /// Ciphertext production.
    Encrypt,
    /// Proof production.
    Prove,
    /// The backend returned an empty ciphertext or proof.
    Assemble,
}

impl fmt::Display for EncryptionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EncryptionStage::Encode => "encode",
            EncryptionStage::Encrypt => "encrypt",
            EncryptionStage::Prove => "prove",
            EncryptionStage::Assemble => "assemble",
        })
    }
}

/// What an envelope is carrying, for errors and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopePurpose {
    Share(Role),
    Split,
    Revenue,
    Payout,
}

impl fmt::Display for EnvelopePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopePurpose::Share(role) => write!(f, "{role} share"),
            EnvelopePurpose::Split => f.write_str("split"),
            EnvelopePurpose::Revenue => f.write_str("revenue amount"),
            EnvelopePurpose::Payout => f.write_str("payout total"),
        }
    }
}

/// Coarse classification of a [`PipelineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Percentages failed the sum / non-negativity invariant.
    InvalidSplit,
    /// The cipher failed to produce a ciphertext or proof.
    EncryptionFailure,
    /// A proof did not verify against its ciphertext.
    ValidationFailure,
    /// The ledger call reverted or could not be delivered.
    LedgerRejected,
    /// A caller-level guard refused the request before the pipeline ran.
    Rejected,
}

/// Errors returned by orchestrator operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Percentages failed the invariant check.
    #[error("invalid split: {0}")]
    InvalidSplit(#[from] SplitError),

    /// The cipher backend failed.
    #[error("encryption failed during {stage} of {purpose}: {reason}")]
    EncryptionFailure {
        stage: EncryptionStage,
        purpose: EnvelopePurpose,
        reason: String,
    },

    /// A proof failed verification.
    #[error("{purpose} envelope failed proof verification")]
    ValidationFailure { purpose: EnvelopePurpose },

    /// The ledger reverted or errored.
    #[error("ledger rejected call: {0}")]
    LedgerRejected(#[from] LedgerError),

    /// A required plaintext field was blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// No track was selected.
    #[error("no track selected")]
    TrackNotSelected,

    /// Revenue and payout amounts must be positive.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// A payout for this track has been dispatched and not yet resolved.
    #[error("payout already in flight for track {track_id}")]
    PayoutInFlight { track_id: TrackId },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidSplit(_) => ErrorKind::InvalidSplit,
            PipelineError::EncryptionFailure { .. } => ErrorKind::EncryptionFailure,
            PipelineError::ValidationFailure { .. } => ErrorKind::ValidationFailure,
            PipelineError::LedgerRejected(_) => ErrorKind::LedgerRejected,
            PipelineError::MissingField(_)
            | PipelineError::TrackNotSelected
            | PipelineError::ZeroAmount
            | PipelineError::PayoutInFlight { .. } => ErrorKind::Rejected,
        }
    }

    /// Whether retrying with the same inputs may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::EncryptionFailure
    }
}
