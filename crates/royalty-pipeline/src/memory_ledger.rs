//! In-process reference ledger.
//!
//! Behaves like the deployed contract as far as the pipeline can observe:
//! it answers for one contract address, verifies every `(data, proof)`
//! pair with its own [`Verifier`], assigns track ids from 1, appends
//! revenue events and payout requests, and signs receipts. It cannot do
//! confidential arithmetic, so the opaque running total is the most recent
//! accepted revenue envelope.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use royalty_crypto::blake3;
use royalty_crypto::ed25519::{SigningKey, VerifyingKey};
use royalty_types::{
    now_millis, ContractData, EncryptedEnvelope, LedgerAddress, PayoutRequest, Receipt,
    ReceiptKind, RevenueEvent, SplitEnvelopes, TrackId, TrackInfo, TrackState,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::capability::Verifier;
use crate::error::LedgerError;
use crate::ledger::{CreateTrackCall, Ledger, LedgerResult, SubmitCall};

#[derive(Default)]
struct LedgerState {
    next_id: u64,
    sequence: u64,
    tracks: BTreeMap<TrackId, TrackInfo>,
    revenue: BTreeMap<TrackId, Vec<RevenueEvent>>,
    payouts: BTreeMap<TrackId, Vec<PayoutRequest>>,
}

/// Reference [`Ledger`] kept entirely in memory.
pub struct MemoryLedger {
    address: LedgerAddress,
    sender: LedgerAddress,
    verifier: Arc<dyn Verifier>,
    signing_key: SigningKey,
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    /// Create a ledger deployed at `address`, receiving calls from `sender`.
    pub fn new(
        address: LedgerAddress,
        sender: LedgerAddress,
        verifier: Arc<dyn Verifier>,
        signing_key: SigningKey,
    ) -> Self {
        Self {
            address,
            sender,
            verifier,
            signing_key,
            state: Mutex::new(LedgerState {
                next_id: 1,
                ..LedgerState::default()
            }),
        }
    }

    pub fn address(&self) -> LedgerAddress {
        self.address
    }

    /// Public key receipts are signed with.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Revenue events recorded for a track, oldest first.
    pub async fn revenue_events(&self, track_id: TrackId) -> Vec<RevenueEvent> {
        let state = self.state.lock().await;
        state.revenue.get(&track_id).cloned().unwrap_or_default()
    }

    /// Payout requests recorded for a track, oldest first.
    pub async fn payout_requests(&self, track_id: TrackId) -> Vec<PayoutRequest> {
        let state = self.state.lock().await;
        state.payouts.get(&track_id).cloned().unwrap_or_default()
    }

    /// Number of tracks ever created.
    pub async fn track_count(&self) -> usize {
        self.state.lock().await.tracks.len()
    }

    /// Deactivate a track. Tracks are never deleted.
    pub async fn deactivate_track(&self, track_id: TrackId) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        let track = state
            .tracks
            .get_mut(&track_id)
            .ok_or_else(|| LedgerError::reverted("Track does not exist"))?;
        if track.owner != self.sender {
            return Err(LedgerError::reverted("Only owner can deactivate track"));
        }
        track.is_active = false;
        info!(%track_id, "track deactivated");
        Ok(())
    }

    fn check_contract(&self, contract: LedgerAddress) -> LedgerResult<()> {
        if contract != self.address {
            return Err(LedgerError::Unavailable(format!("no contract at {contract}")));
        }
        Ok(())
    }

    async fn admit(&self, payload: &ContractData, accepted_at: u64) -> LedgerResult<EncryptedEnvelope> {
        let valid = self
            .verifier
            .verify(&payload.data, &payload.proof)
            .await
            .unwrap_or(false);
        if !valid {
            return Err(LedgerError::reverted("Invalid input proof"));
        }
        EncryptedEnvelope::new(payload.data.clone(), payload.proof.clone(), accepted_at)
            .map_err(|e| LedgerError::reverted(e.to_string()))
    }

    fn sign_receipt(
        &self,
        state: &mut LedgerState,
        track_id: TrackId,
        kind: ReceiptKind,
        payload: &ContractData,
        accepted_at: u64,
    ) -> Receipt {
        state.sequence += 1;
        let sequence = state.sequence;
        let material = blake3::encode_multi_field(&[
            &track_id.0.to_le_bytes(),
            &sequence.to_le_bytes(),
            &payload.data,
            &payload.proof,
        ]);
        let tx_hash = blake3::derive_key(blake3::contexts::RECEIPT_TX_HASH, &material);
        let signature = self
            .signing_key
            .sign(&Receipt::signing_payload(track_id, kind, sequence, &tx_hash, accepted_at))
            .to_bytes();
        Receipt {
            track_id,
            kind,
            sequence,
            tx_hash,
            accepted_at,
            signature,
        }
    }
}

fn active_track(state: &mut LedgerState, track_id: TrackId) -> LedgerResult<&mut TrackInfo> {
    let track = state
        .tracks
        .get_mut(&track_id)
        .ok_or_else(|| LedgerError::reverted("Track does not exist"))?;
    if !track.is_active {
        return Err(LedgerError::reverted("Track is not active"));
    }
    Ok(track)
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn create_track(&self, call: CreateTrackCall) -> LedgerResult<TrackId> {
        self.check_contract(call.contract)?;
        if call.title.trim().is_empty() {
            return Err(LedgerError::reverted("Title cannot be empty"));
        }

        let now = now_millis();
        let encrypted_splits = SplitEnvelopes {
            artist: self.admit(&call.artist_share, now).await?,
            producer: self.admit(&call.producer_share, now).await?,
            label: self.admit(&call.label_share, now).await?,
        };

        let mut state = self.state.lock().await;
        let id = TrackId(state.next_id);
        state.next_id += 1;
        state.tracks.insert(
            id,
            TrackInfo {
                id,
                title: call.title,
                artist: call.artist,
                producer: call.producer,
                label: call.label,
                encrypted_splits,
                total_revenue: None,
                is_active: true,
                is_verified: true,
                owner: self.sender,
                created_at: now,
                last_payout: 0,
                state: TrackState::Active,
                revenue_events: 0,
            },
        );
        info!(track_id = %id, "ledger: track created");
        Ok(id)
    }

    async fn add_revenue(&self, call: SubmitCall) -> LedgerResult<Receipt> {
        self.check_contract(call.contract)?;
        let now = now_millis();
        let envelope = self.admit(&call.payload, now).await?;

        let mut state = self.state.lock().await;
        let track = active_track(&mut state, call.track_id)?;
        track.total_revenue = Some(envelope.clone());
        track.revenue_events += 1;
        track.state = TrackState::Active;

        state.revenue.entry(call.track_id).or_default().push(RevenueEvent {
            track_id: call.track_id,
            encrypted_amount: envelope,
            submitted_at: now,
        });
        Ok(self.sign_receipt(&mut state, call.track_id, ReceiptKind::Revenue, &call.payload, now))
    }

    async fn execute_payout(&self, call: SubmitCall) -> LedgerResult<Receipt> {
        self.check_contract(call.contract)?;
        let now = now_millis();
        let envelope = self.admit(&call.payload, now).await?;

        let mut state = self.state.lock().await;
        let track = active_track(&mut state, call.track_id)?;
        if track.owner != self.sender {
            warn!(track_id = %call.track_id, "ledger: payout from non-owner");
            return Err(LedgerError::reverted("Only owner can execute payout"));
        }
        if track.state == TrackState::Settled {
            return Err(LedgerError::reverted("Track already settled"));
        }
        if track.revenue_events == 0 {
            return Err(LedgerError::reverted("No revenue to pay out"));
        }
        track.last_payout = now;
        track.state = TrackState::Settled;

        state.payouts.entry(call.track_id).or_default().push(PayoutRequest {
            track_id: call.track_id,
            encrypted_total: envelope,
            submitted_at: now,
        });
        info!(track_id = %call.track_id, "ledger: payout settled");
        Ok(self.sign_receipt(&mut state, call.track_id, ReceiptKind::Payout, &call.payload, now))
    }

    async fn get_track_info(&self, contract: LedgerAddress, track_id: TrackId) -> LedgerResult<TrackInfo> {
        self.check_contract(contract)?;
        let state = self.state.lock().await;
        state
            .tracks
            .get(&track_id)
            .cloned()
            .ok_or_else(|| LedgerError::reverted("Track does not exist"))
    }
}
