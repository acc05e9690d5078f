//! Sealed reference backend.
//!
//! Stands in for an FHE / ZK backend behind the [`Cipher`] and [`Verifier`]
//! traits:
//!
//! - ciphertext = `nonce || ChaCha20-Poly1305(plaintext)` under the cipher key
//! - proof = `BLAKE3::keyed_hash(K_proof, ciphertext)` where
//!   `K_proof = BLAKE3::derive_key("Royalty v1 envelope-proof-key", key)`
//!
//! The verifier holds only `K_proof`, so it can check proofs without being
//! able to open ciphertexts. Nothing here is homomorphic.

use async_trait::async_trait;
use rand::RngCore;
use royalty_crypto::{blake3, chacha20};
use zeroize::Zeroizing;

use crate::capability::{CapabilityResult, Cipher, Verifier};
use crate::error::CapabilityError;

/// Associated data bound into every sealed ciphertext.
const SEAL_AAD: &[u8] = b"Royalty v1 sealed-envelope";

/// Cipher holding a 32-byte symmetric key.
pub struct SealedCipher {
    key: Zeroizing<[u8; chacha20::KEY_SIZE]>,
    proof_key: Zeroizing<[u8; 32]>,
}

/// Verifier holding only the proof key.
#[derive(Clone)]
pub struct SealedVerifier {
    proof_key: Zeroizing<[u8; 32]>,
}

impl SealedCipher {
    /// Build a cipher from an existing key.
    pub fn from_key(key: [u8; chacha20::KEY_SIZE]) -> Self {
        let proof_key = blake3::derive_key(blake3::contexts::ENVELOPE_PROOF_KEY, &key);
        Self {
            key: Zeroizing::new(key),
            proof_key: Zeroizing::new(proof_key),
        }
    }

    /// Build a cipher around a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; chacha20::KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self::from_key(key)
    }

    /// The verifier matching this cipher's proofs.
    pub fn verifier(&self) -> SealedVerifier {
        SealedVerifier {
            proof_key: self.proof_key.clone(),
        }
    }

    /// Recover the encoded plaintext of a ciphertext this cipher produced.
    pub fn open(&self, ciphertext: &[u8]) -> CapabilityResult<Zeroizing<Vec<u8>>> {
        chacha20::open(&self.key, ciphertext, SEAL_AAD)
            .map(Zeroizing::new)
            .map_err(|e| CapabilityError::InvalidInput(e.to_string()))
    }
}

#[async_trait]
impl Cipher for SealedCipher {
    async fn encrypt(&self, plaintext: &[u8]) -> CapabilityResult<Vec<u8>> {
        chacha20::seal(&self.key, plaintext, SEAL_AAD)
            .map_err(|e| CapabilityError::Backend(e.to_string()))
    }

    async fn prove(&self, ciphertext: &[u8]) -> CapabilityResult<Vec<u8>> {
        if ciphertext.is_empty() {
            return Err(CapabilityError::InvalidInput("empty ciphertext".into()));
        }
        Ok(blake3::keyed_hash(&self.proof_key, ciphertext).to_vec())
    }
}

#[async_trait]
impl Verifier for SealedVerifier {
    async fn verify(&self, ciphertext: &[u8], proof: &[u8]) -> CapabilityResult<bool> {
        if ciphertext.is_empty() || proof.is_empty() {
            return Ok(false);
        }
        Ok(blake3::keyed_hash_matches(&self.proof_key, ciphertext, proof))
    }
}

#[cfg(test)]
mod tests {
    use royalty_types::{ConfidentialValue, Role};

    use super::*;
    use crate::plaintext;

    #[tokio::test]
    async fn test_open_recovers_plaintext() {
        let cipher = SealedCipher::generate();
        let value = ConfidentialValue::share(Role::Producer, 30);
        let encoded = plaintext::encode(&value).expect("encode");
        let ct = cipher.encrypt(&encoded).await.expect("encrypt");
        let opened = cipher.open(&ct).expect("open");
        assert_eq!(plaintext::decode(&opened).expect("decode"), value);
    }

    #[tokio::test]
    async fn test_same_plaintext_distinct_ciphertexts() {
        let cipher = SealedCipher::from_key([5u8; 32]);
        let a = cipher.encrypt(b"50").await.expect("encrypt");
        let b = cipher.encrypt(b"50").await.expect("encrypt");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_tampered_ciphertext_fails_verification() {
        let cipher = SealedCipher::from_key([5u8; 32]);
        let verifier = cipher.verifier();
        let mut ct = cipher.encrypt(b"1000").await.expect("encrypt");
        let proof = cipher.prove(&ct).await.expect("prove");
        assert!(verifier.verify(&ct, &proof).await.expect("verify"));

        if let Some(byte) = ct.first_mut() {
            *byte ^= 0x01;
        }
        assert!(!verifier.verify(&ct, &proof).await.expect("verify"));
    }

    #[tokio::test]
    async fn test_empty_inputs_do_not_verify() {
        let verifier = SealedCipher::from_key([5u8; 32]).verifier();
        assert!(!verifier.verify(&[], &[1]).await.expect("verify"));
        assert!(!verifier.verify(&[1], &[]).await.expect("verify"));
    }
}
