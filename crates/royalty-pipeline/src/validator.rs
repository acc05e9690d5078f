//! Envelope validation.
//!
//! [`EnvelopeValidator::validate`] asks the [`Verifier`] whether a proof
//! matches its ciphertext and fails closed: a verifier error counts as
//! `false`. [`EnvelopeValidator::admit`] turns a passing envelope into a
//! [`ValidatedEnvelope`], the only type the call formatter accepts.

use std::sync::Arc;

use royalty_types::EncryptedEnvelope;
use tracing::{error, warn};

use crate::capability::Verifier;
use crate::error::{EnvelopePurpose, PipelineError};
use crate::Result;

/// An envelope whose proof has verified. Immutable from here on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedEnvelope(EncryptedEnvelope);

impl ValidatedEnvelope {
    #[cfg(test)]
    pub(crate) fn new_unchecked(envelope: EncryptedEnvelope) -> Self {
        Self(envelope)
    }

    pub fn envelope(&self) -> &EncryptedEnvelope {
        &self.0
    }
}

/// Validates envelopes through a pluggable [`Verifier`].
#[derive(Clone)]
pub struct EnvelopeValidator {
    verifier: Arc<dyn Verifier>,
}

impl EnvelopeValidator {
    pub fn new(verifier: Arc<dyn Verifier>) -> Self {
        Self { verifier }
    }

    /// Check an envelope's proof against its ciphertext.
    pub async fn validate(&self, envelope: &EncryptedEnvelope) -> bool {
        match self
            .verifier
            .verify(envelope.ciphertext(), envelope.proof())
            .await
        {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "verifier error, treating envelope as invalid");
                false
            }
        }
    }

    /// Validate an envelope and take ownership of it on success.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ValidationFailure`] if the proof does not verify.
    pub async fn admit(
        &self,
        envelope: EncryptedEnvelope,
        purpose: EnvelopePurpose,
    ) -> Result<ValidatedEnvelope> {
        if self.validate(&envelope).await {
            Ok(ValidatedEnvelope(envelope))
        } else {
            error!(%purpose, "envelope failed verification: cipher and verifier disagree");
            Err(PipelineError::ValidationFailure { purpose })
        }
    }
}
