//! The external ledger boundary.
//!
//! Three state-changing entry points and one read. Every confidential
//! argument crosses this boundary as a [`ContractData`] `{data, proof}`
//! pair; titles and party names travel in plaintext.

use async_trait::async_trait;
use royalty_crypto::ed25519::{Signature, VerifyingKey};
use royalty_types::{ContractData, LedgerAddress, Receipt, TrackId, TrackInfo};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Result type for ledger calls.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Arguments of the create-track entry point, in ledger order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTrackCall {
    pub contract: LedgerAddress,
    pub title: String,
    pub artist: String,
    pub producer: String,
    pub label: String,
    pub artist_share: ContractData,
    pub producer_share: ContractData,
    pub label_share: ContractData,
}

/// Arguments of the add-revenue and execute-payout entry points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitCall {
    pub contract: LedgerAddress,
    pub track_id: TrackId,
    pub payload: ContractData,
}

/// A ledger accepting encrypted inputs and doing confidential arithmetic
/// on its side.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Register a track; returns the ledger-assigned id.
    async fn create_track(&self, call: CreateTrackCall) -> LedgerResult<TrackId>;

    /// Accumulate an encrypted revenue amount.
    async fn add_revenue(&self, call: SubmitCall) -> LedgerResult<Receipt>;

    /// Settle a track. Not idempotent.
    async fn execute_payout(&self, call: SubmitCall) -> LedgerResult<Receipt>;

    /// Read a track with its encrypted fields left opaque.
    async fn get_track_info(&self, contract: LedgerAddress, track_id: TrackId)
        -> LedgerResult<TrackInfo>;
}

/// Check a receipt's signature against the ledger's public key.
pub fn verify_receipt(receipt: &Receipt, ledger_key: &VerifyingKey) -> bool {
    ledger_key
        .verify(&receipt.payload(), &Signature::from_bytes(&receipt.signature))
        .is_ok()
}
