//! Track orchestrator: createTrack, addRevenue, executePayout.
//!
//! Each operation is a fixed chain with no retries:
//!
//! 1. caller guards and the percentage check
//! 2. encrypt (builder)
//! 3. validate (validator)
//! 4. format and submit exactly one ledger call
//!
//! Nothing before step 4 touches the ledger, so any failure or cancellation
//! up to that point leaves on-chain state unchanged. Once the ledger call
//! has been dispatched its outcome is external; a dropped future at that
//! point must be treated as pending until the ledger is queried.

use std::sync::Arc;

use royalty_splits::splits::{check_percentages, PercentageSplit};
use royalty_types::{ConfidentialValue, LedgerAddress, Receipt, Role, TrackId, TrackInfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::envelope::EnvelopeBuilder;
use crate::error::{EnvelopePurpose, ErrorKind, PipelineError};
use crate::format::format;
use crate::ledger::{CreateTrackCall, Ledger, SubmitCall};
use crate::sequencer::TrackSequencer;
use crate::validator::{EnvelopeValidator, ValidatedEnvelope};
use crate::Result;

/// Plaintext input of createTrack.
///
/// Percentages are signed so that negative input from untyped callers is
/// reported as an invalid split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub label: String,
    pub artist_pct: i64,
    pub producer_pct: i64,
    pub label_pct: i64,
}

/// Which submission entry point an amount goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Submission {
    Revenue,
    Payout,
}

impl Submission {
    fn purpose(self) -> EnvelopePurpose {
        match self {
            Submission::Revenue => EnvelopePurpose::Revenue,
            Submission::Payout => EnvelopePurpose::Payout,
        }
    }
}

/// Runs the confidential submission pipeline against one ledger contract.
pub struct TrackOrchestrator {
    ledger_address: LedgerAddress,
    builder: EnvelopeBuilder,
    validator: EnvelopeValidator,
    ledger: Arc<dyn Ledger>,
    sequencer: TrackSequencer,
}

impl TrackOrchestrator {
    pub fn new(config: OrchestratorConfig, ledger: Arc<dyn Ledger>) -> Self {
        if config.ledger_address.is_zero() {
            warn!("ledger address is the zero address; calls will target an unconfigured contract");
        }
        Self {
            ledger_address: config.ledger_address,
            builder: EnvelopeBuilder::new(config.cipher),
            validator: EnvelopeValidator::new(config.verifier),
            ledger,
            sequencer: TrackSequencer::new(),
        }
    }

    pub fn ledger_address(&self) -> LedgerAddress {
        self.ledger_address
    }

    /// Whether a payout for the track is currently outstanding.
    pub fn payout_in_flight(&self, track_id: TrackId) -> bool {
        self.sequencer.payout_in_flight(track_id)
    }

    /// Register a track with an encrypted three-way split.
    ///
    /// Each share is encrypted and proven on its own; no ciphertext is
    /// reused across roles.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::MissingField`] if title or artist is blank
    /// - [`PipelineError::InvalidSplit`] if the percentages fail the check
    /// - [`PipelineError::EncryptionFailure`] / [`PipelineError::ValidationFailure`]
    ///   if any share cannot be sealed
    /// - [`PipelineError::LedgerRejected`] if the ledger reverts
    pub async fn create_track(&self, track: NewTrack) -> Result<TrackId> {
        if track.title.trim().is_empty() {
            return Err(PipelineError::MissingField("title"));
        }
        if track.artist.trim().is_empty() {
            return Err(PipelineError::MissingField("artist"));
        }

        let split = check_percentages(track.artist_pct, track.producer_pct, track.label_pct)
            .inspect_err(|_| warn!(kind = ?ErrorKind::InvalidSplit, "createTrack refused"))?;

        debug!(title = %track.title, "createTrack: sealing shares");
        let (artist_share, producer_share, label_share) = tokio::try_join!(
            self.seal_share(&split, Role::Artist),
            self.seal_share(&split, Role::Producer),
            self.seal_share(&split, Role::Label),
        )?;

        let call = CreateTrackCall {
            contract: self.ledger_address,
            title: track.title,
            artist: track.artist,
            producer: track.producer,
            label: track.label,
            artist_share: format(&artist_share),
            producer_share: format(&producer_share),
            label_share: format(&label_share),
        };

        let track_id = self
            .ledger
            .create_track(call)
            .await
            .inspect_err(|e| warn!(error = %e, "createTrack rejected by ledger"))?;
        info!(%track_id, "track created");
        Ok(track_id)
    }

    /// Submit an encrypted revenue amount for a track.
    ///
    /// Accumulation happens on the ledger; nothing is summed locally.
    pub async fn add_revenue(&self, track_id: TrackId, amount: u64) -> Result<Receipt> {
        check_submission(track_id, amount)?;
        let _turn = self.sequencer.enter(track_id).await;
        self.submit(Submission::Revenue, track_id, amount).await
    }

    /// Settle a track against an encrypted total.
    ///
    /// Not idempotent. A second payout for the same track is refused with
    /// [`PipelineError::PayoutInFlight`] until the first has resolved.
    pub async fn execute_payout(&self, track_id: TrackId, total_amount: u64) -> Result<Receipt> {
        check_submission(track_id, total_amount)?;
        let _slot = self.sequencer.begin_payout(track_id)?;
        let _turn = self.sequencer.enter(track_id).await;
        self.submit(Submission::Payout, track_id, total_amount).await
    }

    /// Read a track from the ledger. Encrypted fields stay opaque.
    pub async fn track_info(&self, track_id: TrackId) -> Result<TrackInfo> {
        if !track_id.is_selected() {
            return Err(PipelineError::TrackNotSelected);
        }
        Ok(self
            .ledger
            .get_track_info(self.ledger_address, track_id)
            .await?)
    }

    async fn seal_share(&self, split: &PercentageSplit, role: Role) -> Result<ValidatedEnvelope> {
        let value = ConfidentialValue::share(role, split.share(role));
        self.seal(value, EnvelopePurpose::Share(role)).await
    }

    async fn seal(&self, value: ConfidentialValue, purpose: EnvelopePurpose) -> Result<ValidatedEnvelope> {
        let envelope = self.builder.encrypt(&value, purpose).await?;
        self.validator.admit(envelope, purpose).await
    }

    async fn submit(&self, submission: Submission, track_id: TrackId, amount: u64) -> Result<Receipt> {
        let purpose = submission.purpose();
        let envelope = self.seal(ConfidentialValue::amount(amount), purpose).await?;
        let call = SubmitCall {
            contract: self.ledger_address,
            track_id,
            payload: format(&envelope),
        };

        debug!(%track_id, %purpose, "submitting to ledger");
        let result = match submission {
            Submission::Revenue => self.ledger.add_revenue(call).await,
            Submission::Payout => self.ledger.execute_payout(call).await,
        };
        let receipt = result.inspect_err(|e| warn!(%track_id, %purpose, error = %e, "ledger rejected submission"))?;
        info!(%track_id, %purpose, sequence = receipt.sequence, "submission accepted");
        Ok(receipt)
    }
}

/// Caller-level guard shared by addRevenue and executePayout.
fn check_submission(track_id: TrackId, amount: u64) -> Result<()> {
    if !track_id.is_selected() {
        return Err(PipelineError::TrackNotSelected);
    }
    if amount == 0 {
        return Err(PipelineError::ZeroAmount);
    }
    Ok(())
}
