//! Test doubles for the capability and ledger seams.
//!
//! Compiled for this crate's tests and for other crates that enable the
//! `test-utils` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use royalty_types::{LedgerAddress, Receipt, TrackId, TrackInfo};
use tokio::sync::{watch, Semaphore};

use crate::capability::{CapabilityResult, Cipher, Verifier};
use crate::error::CapabilityError;
use crate::ledger::{CreateTrackCall, Ledger, LedgerResult, SubmitCall};
use crate::memory_ledger::MemoryLedger;

/// Wraps a cipher and records every call in order.
pub struct CountingCipher {
    inner: Arc<dyn Cipher>,
    calls: Mutex<Vec<&'static str>>,
}

impl CountingCipher {
    pub fn new(inner: Arc<dyn Cipher>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn encrypt_calls(&self) -> usize {
        self.count("encrypt")
    }

    pub fn prove_calls(&self) -> usize {
        self.count("prove")
    }

    /// Call names in the order they were made.
    pub fn order(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| **c == name)
            .count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(name);
    }
}

#[async_trait]
impl Cipher for CountingCipher {
    async fn encrypt(&self, plaintext: &[u8]) -> CapabilityResult<Vec<u8>> {
        self.record("encrypt");
        self.inner.encrypt(plaintext).await
    }

    async fn prove(&self, ciphertext: &[u8]) -> CapabilityResult<Vec<u8>> {
        self.record("prove");
        self.inner.prove(ciphertext).await
    }
}

/// Which step a [`FaultyCipher`] breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CipherFault {
    /// `encrypt` returns an error.
    Encrypt,
    /// `encrypt` succeeds, `prove` returns an error.
    Prove,
    /// `prove` succeeds with zero bytes.
    EmptyProof,
}

/// Cipher that fails at a chosen step.
pub struct FaultyCipher {
    fault: CipherFault,
}

impl FaultyCipher {
    pub fn new(fault: CipherFault) -> Self {
        Self { fault }
    }
}

#[async_trait]
impl Cipher for FaultyCipher {
    async fn encrypt(&self, plaintext: &[u8]) -> CapabilityResult<Vec<u8>> {
        match self.fault {
            CipherFault::Encrypt => Err(CapabilityError::Backend("encrypt unavailable".into())),
            _ => Ok(plaintext.iter().rev().copied().collect()),
        }
    }

    async fn prove(&self, _ciphertext: &[u8]) -> CapabilityResult<Vec<u8>> {
        match self.fault {
            CipherFault::Prove => Err(CapabilityError::Backend("prover timed out".into())),
            CipherFault::EmptyProof => Ok(Vec::new()),
            CipherFault::Encrypt => Ok(vec![0u8; 32]),
        }
    }
}

/// Cipher whose `prove` takes at least `delay` before answering.
pub struct SlowProver {
    inner: Arc<dyn Cipher>,
    delay: Duration,
}

impl SlowProver {
    pub fn new(inner: Arc<dyn Cipher>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl Cipher for SlowProver {
    async fn encrypt(&self, plaintext: &[u8]) -> CapabilityResult<Vec<u8>> {
        self.inner.encrypt(plaintext).await
    }

    async fn prove(&self, ciphertext: &[u8]) -> CapabilityResult<Vec<u8>> {
        tokio::time::sleep(self.delay).await;
        self.inner.prove(ciphertext).await
    }
}

/// Verifier that rejects every proof.
pub struct RejectingVerifier;

#[async_trait]
impl Verifier for RejectingVerifier {
    async fn verify(&self, _ciphertext: &[u8], _proof: &[u8]) -> CapabilityResult<bool> {
        Ok(false)
    }
}

/// Verifier whose backend always errors.
pub struct ErroringVerifier;

#[async_trait]
impl Verifier for ErroringVerifier {
    async fn verify(&self, _ciphertext: &[u8], _proof: &[u8]) -> CapabilityResult<bool> {
        Err(CapabilityError::Backend("verifier unreachable".into()))
    }
}

/// Delegating verifier that rejects only its `n`th call (1-based).
pub struct RejectNthVerifier {
    inner: Arc<dyn Verifier>,
    reject_at: usize,
    calls: AtomicUsize,
}

impl RejectNthVerifier {
    pub fn new(inner: Arc<dyn Verifier>, reject_at: usize) -> Self {
        Self {
            inner,
            reject_at,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Verifier for RejectNthVerifier {
    async fn verify(&self, ciphertext: &[u8], proof: &[u8]) -> CapabilityResult<bool> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.reject_at {
            return Ok(false);
        }
        self.inner.verify(ciphertext, proof).await
    }
}

/// [`MemoryLedger`] wrapper that counts calls and can hold them at a gate.
///
/// A gated ledger parks every state-changing call after it has been
/// counted until [`RecordingLedger::open_gate`] hands out a permit, which
/// lets tests observe a call that is in flight.
pub struct RecordingLedger {
    inner: MemoryLedger,
    gate: Option<Semaphore>,
    entered: watch::Sender<usize>,
    creates: AtomicUsize,
    revenues: AtomicUsize,
    payouts: AtomicUsize,
    last_create: Mutex<Option<CreateTrackCall>>,
}

impl RecordingLedger {
    pub fn new(inner: MemoryLedger) -> Self {
        Self::build(inner, None)
    }

    /// A ledger whose calls wait for [`RecordingLedger::open_gate`].
    pub fn gated(inner: MemoryLedger) -> Self {
        Self::build(inner, Some(Semaphore::new(0)))
    }

    fn build(inner: MemoryLedger, gate: Option<Semaphore>) -> Self {
        let (entered, _) = watch::channel(0);
        Self {
            inner,
            gate,
            entered,
            creates: AtomicUsize::new(0),
            revenues: AtomicUsize::new(0),
            payouts: AtomicUsize::new(0),
            last_create: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &MemoryLedger {
        &self.inner
    }

    /// State-changing calls that reached the ledger, gated or not.
    pub fn calls(&self) -> usize {
        *self.entered.borrow()
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn revenues(&self) -> usize {
        self.revenues.load(Ordering::SeqCst)
    }

    pub fn payouts(&self) -> usize {
        self.payouts.load(Ordering::SeqCst)
    }

    pub fn last_create(&self) -> Option<CreateTrackCall> {
        self.last_create
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Let `n` more gated calls through. No effect on an ungated ledger.
    pub fn open_gate(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Wait until at least `n` calls have reached the ledger.
    pub async fn wait_entered(&self, n: usize) {
        let mut rx = self.entered.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    async fn enter(&self, counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.entered.send_modify(|count| *count += 1);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl Ledger for RecordingLedger {
    async fn create_track(&self, call: CreateTrackCall) -> LedgerResult<TrackId> {
        *self.last_create.lock().unwrap_or_else(PoisonError::into_inner) = Some(call.clone());
        self.enter(&self.creates).await;
        self.inner.create_track(call).await
    }

    async fn add_revenue(&self, call: SubmitCall) -> LedgerResult<Receipt> {
        self.enter(&self.revenues).await;
        self.inner.add_revenue(call).await
    }

    async fn execute_payout(&self, call: SubmitCall) -> LedgerResult<Receipt> {
        self.enter(&self.payouts).await;
        self.inner.execute_payout(call).await
    }

    async fn get_track_info(
        &self,
        contract: LedgerAddress,
        track_id: TrackId,
    ) -> LedgerResult<TrackInfo> {
        self.inner.get_track_info(contract, track_id).await
    }
}
