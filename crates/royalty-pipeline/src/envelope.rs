//! Envelope builder.
//!
//! Turns a [`ConfidentialValue`] into an [`EncryptedEnvelope`] in two
//! awaited steps: encrypt, then prove. Either step failing fails the whole
//! build; no envelope is ever returned with only one half. `created_at` is
//! stamped after the proof completes.

use std::sync::Arc;

use royalty_types::{now_millis, ConfidentialValue, EncryptedEnvelope};
use tracing::debug;

use crate::capability::Cipher;
use crate::error::{EncryptionStage, EnvelopePurpose, PipelineError};
use crate::{plaintext, Result};

/// Builds envelopes through a pluggable [`Cipher`].
#[derive(Clone)]
pub struct EnvelopeBuilder {
    cipher: Arc<dyn Cipher>,
}

impl EnvelopeBuilder {
    pub fn new(cipher: Arc<dyn Cipher>) -> Self {
        Self { cipher }
    }

    /// Encrypt and prove a confidential value.
    ///
    /// A `PercentageTriple` is re-checked first; an invalid split is a
    /// caller error and is reported as [`PipelineError::InvalidSplit`],
    /// never as an encryption failure.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidSplit`] for a triple that does not sum to 100
    /// - [`PipelineError::EncryptionFailure`] if encoding, encryption or proving fails
    pub async fn encrypt(
        &self,
        value: &ConfidentialValue,
        purpose: EnvelopePurpose,
    ) -> Result<EncryptedEnvelope> {
        if let ConfidentialValue::PercentageTriple(triple) = value {
            royalty_splits::splits::check_triple(triple)?;
        }

        let fail = |stage: EncryptionStage, reason: String| PipelineError::EncryptionFailure {
            stage,
            purpose,
            reason,
        };

        let encoded = plaintext::encode(value).map_err(|e| fail(EncryptionStage::Encode, e.to_string()))?;

        let ciphertext = self
            .cipher
            .encrypt(&encoded)
            .await
            .map_err(|e| fail(EncryptionStage::Encrypt, e.to_string()))?;
        drop(encoded);

        let proof = self
            .cipher
            .prove(&ciphertext)
            .await
            .map_err(|e| fail(EncryptionStage::Prove, e.to_string()))?;

        let created_at = now_millis();
        let envelope = EncryptedEnvelope::new(ciphertext, proof, created_at)
            .map_err(|e| fail(EncryptionStage::Assemble, e.to_string()))?;

        debug!(
            %purpose,
            kind = ?value.kind(),
            ciphertext_len = envelope.ciphertext().len(),
            proof_len = envelope.proof().len(),
            "envelope built"
        );
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use royalty_types::{PercentageTriple, Role};

    use super::*;
    use crate::error::ErrorKind;
    use crate::sealed::SealedCipher;
    use crate::testing::{CipherFault, CountingCipher, FaultyCipher, SlowProver};

    fn sealed_builder() -> EnvelopeBuilder {
        EnvelopeBuilder::new(Arc::new(SealedCipher::from_key([9u8; 32])))
    }

    #[tokio::test]
    async fn test_build_amount_envelope() {
        let env = sealed_builder()
            .encrypt(&ConfidentialValue::amount(500), EnvelopePurpose::Revenue)
            .await
            .expect("build");
        assert!(!env.ciphertext().is_empty());
        assert!(!env.proof().is_empty());
    }

    #[tokio::test]
    async fn test_created_at_stamped_after_proof() {
        let delay = Duration::from_millis(50);
        let builder = EnvelopeBuilder::new(Arc::new(SlowProver::new(
            Arc::new(SealedCipher::from_key([9u8; 32])),
            delay,
        )));
        let before = now_millis();
        let env = builder
            .encrypt(&ConfidentialValue::amount(500), EnvelopePurpose::Revenue)
            .await
            .expect("build");
        assert!(env.created_at() >= before + 50, "stamped before the proof finished");
    }

    #[tokio::test]
    async fn test_encrypt_then_prove_order() {
        let counting = Arc::new(CountingCipher::new(Arc::new(SealedCipher::from_key([1u8; 32]))));
        let builder = EnvelopeBuilder::new(counting.clone());
        builder
            .encrypt(&ConfidentialValue::share(Role::Artist, 60), EnvelopePurpose::Share(Role::Artist))
            .await
            .expect("build");
        assert_eq!(counting.encrypt_calls(), 1);
        assert_eq!(counting.prove_calls(), 1);
        assert_eq!(counting.order(), vec!["encrypt", "prove"]);
    }

    #[tokio::test]
    async fn test_invalid_triple_is_split_error_not_encryption_error() {
        let counting = Arc::new(CountingCipher::new(Arc::new(SealedCipher::from_key([1u8; 32]))));
        let builder = EnvelopeBuilder::new(counting.clone());
        let bad = ConfidentialValue::PercentageTriple(PercentageTriple {
            artist: 50,
            producer: 50,
            label: 50,
        });
        let err = builder
            .encrypt(&bad, EnvelopePurpose::Split)
            .await
            .expect_err("invalid split");
        assert_eq!(err.kind(), ErrorKind::InvalidSplit);
        assert_eq!(counting.encrypt_calls(), 0);
    }

    #[tokio::test]
    async fn test_encrypt_failure_skips_prove() {
        let builder = EnvelopeBuilder::new(Arc::new(FaultyCipher::new(CipherFault::Encrypt)));
        let err = builder
            .encrypt(&ConfidentialValue::amount(1), EnvelopePurpose::Payout)
            .await
            .expect_err("encrypt fails");
        assert!(matches!(
            err,
            PipelineError::EncryptionFailure {
                stage: EncryptionStage::Encrypt,
                purpose: EnvelopePurpose::Payout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_prove_failure_returns_no_envelope() {
        let builder = EnvelopeBuilder::new(Arc::new(FaultyCipher::new(CipherFault::Prove)));
        let err = builder
            .encrypt(&ConfidentialValue::amount(1), EnvelopePurpose::Revenue)
            .await
            .expect_err("prove fails");
        assert!(matches!(
            err,
            PipelineError::EncryptionFailure {
                stage: EncryptionStage::Prove,
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_proof_rejected() {
        let builder = EnvelopeBuilder::new(Arc::new(FaultyCipher::new(CipherFault::EmptyProof)));
        let err = builder
            .encrypt(&ConfidentialValue::amount(1), EnvelopePurpose::Revenue)
            .await
            .expect_err("empty proof");
        assert!(matches!(
            err,
            PipelineError::EncryptionFailure {
                stage: EncryptionStage::Assemble,
                ..
            }
        ));
    }
}
