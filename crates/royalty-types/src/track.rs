//! Ledger-side records: tracks, revenue events, payout requests, receipts.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{EncryptedEnvelope, LedgerAddress, Role, TrackId};

/// Observable lifecycle of a track on the ledger.
///
/// `Uninitialized → Active` on create, `Active → Active` on each revenue
/// submission, `Active → Settled` on payout. New revenue after a payout
/// opens the next accrual period (`Settled → Active`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TrackState {
    #[default]
    Uninitialized,
    Active,
    Settled,
}

/// The three per-role share envelopes of a track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitEnvelopes {
    pub artist: EncryptedEnvelope,
    pub producer: EncryptedEnvelope,
    pub label: EncryptedEnvelope,
}

impl SplitEnvelopes {
    pub fn get(&self, role: Role) -> &EncryptedEnvelope {
        match role {
            Role::Artist => &self.artist,
            Role::Producer => &self.producer,
            Role::Label => &self.label,
        }
    }
}

/// A track as returned by the ledger's read entry point.
///
/// Encrypted fields are opaque envelopes; nothing here reveals a share or
/// an amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub producer: String,
    pub label: String,
    pub encrypted_splits: SplitEnvelopes,
    /// Running confidential total; `None` until the first revenue event.
    pub total_revenue: Option<EncryptedEnvelope>,
    pub is_active: bool,
    pub is_verified: bool,
    pub owner: LedgerAddress,
    pub created_at: u64,
    /// Unix milliseconds of the last settled payout, `0` if none.
    pub last_payout: u64,
    pub state: TrackState,
    /// Number of accepted revenue events.
    pub revenue_events: u64,
}

/// Append-only record of one revenue submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueEvent {
    pub track_id: TrackId,
    pub encrypted_amount: EncryptedEnvelope,
    pub submitted_at: u64,
}

/// A one-shot settlement request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub track_id: TrackId,
    pub encrypted_total: EncryptedEnvelope,
    pub submitted_at: u64,
}

/// Which entry point produced a receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptKind {
    Revenue,
    Payout,
}

impl ReceiptKind {
    fn tag(&self) -> u8 {
        match self {
            ReceiptKind::Revenue => 0x01,
            ReceiptKind::Payout => 0x02,
        }
    }
}

/// Opaque acknowledgement returned by the revenue and payout entry points.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub track_id: TrackId,
    pub kind: ReceiptKind,
    /// Ledger-wide submission counter.
    pub sequence: u64,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub tx_hash: [u8; 32],
    pub accepted_at: u64,
    /// Ed25519 signature by the ledger over [`Receipt::signing_payload`].
    #[serde_as(as = "serde_with::hex::Hex")]
    pub signature: [u8; 64],
}

impl Receipt {
    /// Canonical bytes covered by the ledger signature.
    pub fn signing_payload(
        track_id: TrackId,
        kind: ReceiptKind,
        sequence: u64,
        tx_hash: &[u8; 32],
        accepted_at: u64,
    ) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 8 + 8 + 32 + 8);
        out.push(kind.tag());
        out.extend_from_slice(&track_id.0.to_le_bytes());
        out.extend_from_slice(&sequence.to_le_bytes());
        out.extend_from_slice(tx_hash);
        out.extend_from_slice(&accepted_at.to_le_bytes());
        out
    }

    /// Signing payload of this receipt.
    pub fn payload(&self) -> Vec<u8> {
        Self::signing_payload(
            self.track_id,
            self.kind,
            self.sequence,
            &self.tx_hash,
            self.accepted_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_payload_distinguishes_kind() {
        let a = Receipt::signing_payload(TrackId(1), ReceiptKind::Revenue, 3, &[0u8; 32], 9);
        let b = Receipt::signing_payload(TrackId(1), ReceiptKind::Payout, 3, &[0u8; 32], 9);
        assert_ne!(a, b);
        assert_eq!(a.len(), 57);
    }

    #[test]
    fn test_default_state() {
        assert_eq!(TrackState::default(), TrackState::Uninitialized);
    }
}
