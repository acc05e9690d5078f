//! Pluggable encryption and verification capabilities.
//!
//! A homomorphic-encryption / zero-knowledge backend plugs in by
//! implementing [`Cipher`] and [`Verifier`]. The orchestrator only ever sees
//! these traits, so swapping the backend never touches pipeline code.
//!
//! Implementations need not be deterministic across calls, but every
//! `(ciphertext, proof)` pair a [`Cipher`] produces must be accepted by the
//! matching [`Verifier`].

use async_trait::async_trait;

use crate::error::CapabilityError;

/// Result type for capability calls.
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;

/// Produces ciphertexts and proofs binding them to a correctness claim.
#[async_trait]
pub trait Cipher: Send + Sync {
    /// Encrypt an encoded plaintext.
    async fn encrypt(&self, plaintext: &[u8]) -> CapabilityResult<Vec<u8>>;

    /// Produce a proof over a ciphertext this cipher produced.
    async fn prove(&self, ciphertext: &[u8]) -> CapabilityResult<Vec<u8>>;
}

/// Checks a proof against its ciphertext without recovering the plaintext.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, ciphertext: &[u8], proof: &[u8]) -> CapabilityResult<bool>;
}
