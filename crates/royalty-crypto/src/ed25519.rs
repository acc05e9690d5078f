//! Ed25519 receipt signatures (RFC 8032).
//!
//! Ledger receipts are signed so that a caller can confirm the terminal
//! status of a submission (in particular a payout) before issuing another
//! one for the same track. Secret key bytes are wiped on drop by
//! `ed25519-dalek` itself.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{CryptoError, Result};

/// Private half of a receipt-signing key pair.
#[derive(Clone)]
pub struct SigningKey(ed25519_dalek::SigningKey);

/// Public key a receipt is checked against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(ed25519_dalek::Signature);

impl SigningKey {
    /// Fresh key from the OS RNG.
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng))
    }

    /// Deterministic key for a seed, e.g. a fixed ledger identity in tests.
    pub fn derive(seed_material: &[u8]) -> Self {
        let mut seed =
            crate::blake3::derive_key(crate::blake3::contexts::LEDGER_SIGNING_KEY, seed_material);
        let key = Self(ed25519_dalek::SigningKey::from_bytes(&seed));
        seed.zeroize();
        key
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SigningKey").field(&self.verifying_key()).finish()
    }
}

impl VerifyingKey {
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Check `signature` over `message`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::SignatureVerification`] on any mismatch.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        self.0
            .verify(message, &signature.0)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

impl Signature {
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(ed25519_dalek::Signature::from_bytes(bytes))
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_signature_checks_message_and_key() {
        let key = SigningKey::generate();
        let sig = key.sign(b"payout 1");
        assert!(key.verifying_key().verify(b"payout 1", &sig).is_ok());
        assert!(key.verifying_key().verify(b"payout 2", &sig).is_err());
        assert!(SigningKey::generate()
            .verifying_key()
            .verify(b"payout 1", &sig)
            .is_err());
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = SigningKey::derive(b"ledger-0xabc");
        let b = SigningKey::derive(b"ledger-0xabc");
        let c = SigningKey::derive(b"ledger-0xdef");
        assert_eq!(a.verifying_key(), b.verifying_key());
        assert_ne!(a.verifying_key(), c.verifying_key());
    }

    #[test]
    fn test_signature_survives_byte_form() {
        let key = SigningKey::derive(b"bytes");
        let sig = key.sign(b"receipt");
        let restored = Signature::from_bytes(&sig.to_bytes());
        assert!(key.verifying_key().verify(b"receipt", &restored).is_ok());
    }

    #[test]
    fn test_debug_hides_secret() {
        let key = SigningKey::derive(b"debug");
        let shown = format!("{key:?}");
        assert!(shown.starts_with("SigningKey("));
        assert!(!shown.contains(&format!("{:?}", key.0.to_bytes())));
    }
}
