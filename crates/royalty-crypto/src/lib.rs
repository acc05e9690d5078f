//! # royalty-crypto
//!
//! Cryptographic primitives shared by the royalty workspace.
//!
//! The confidential-value pipeline never talks to these directly. They back
//! the sealed reference `Cipher`/`Verifier` pair and the receipts signed by
//! the in-memory ledger.
//!
//! ## Modules
//!
//! - [`blake3`] — Domain-separated BLAKE3 hashing and keyed proofs
//! - [`chacha20`] — ChaCha20-Poly1305 AEAD encryption (RFC 8439)
//! - [`ed25519`] — Ed25519 receipt signing and verification (RFC 8032)

pub mod blake3;
pub mod chacha20;
pub mod ed25519;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// AEAD encryption failed.
    #[error("AEAD encryption failed")]
    AeadEncryption,

    /// AEAD decryption failed (authentication tag mismatch).
    #[error("AEAD decryption failed")]
    AeadDecryption,

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
