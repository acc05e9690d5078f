//! ChaCha20-Poly1305 AEAD encryption (RFC 8439).
//!
//! Used by the sealed envelope backend. Sealed output is
//! `nonce || ciphertext || tag` so a single byte string carries everything
//! needed to open it again.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;

use crate::{CryptoError, Result};

/// Nonce size for ChaCha20-Poly1305 (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size for ChaCha20-Poly1305 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Authentication tag size (128 bits = 16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt data with ChaCha20-Poly1305.
///
/// # Arguments
///
/// * `key` - 32-byte encryption key
/// * `nonce` - 12-byte nonce (must never be reused with the same key)
/// * `plaintext` - Data to encrypt
/// * `aad` - Additional authenticated data
///
/// # Returns
///
/// Ciphertext with appended 16-byte authentication tag.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadEncryption)
}

/// Decrypt data with ChaCha20-Poly1305.
///
/// Returns the plaintext, or [`CryptoError::AeadDecryption`] if
/// authentication fails.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadDecryption)
}

/// Encrypt under a fresh random nonce and prepend the nonce to the output.
pub fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let body = encrypt(key, &nonce, plaintext, aad)?;
    let mut sealed = Vec::with_capacity(NONCE_SIZE + body.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&body);
    Ok(sealed)
}

/// Open output produced by [`seal`].
pub fn open(key: &[u8; KEY_SIZE], sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidInput(format!(
            "sealed payload too short: {} bytes",
            sealed.len()
        )));
    }
    let (nonce, body) = sealed.split_at(NONCE_SIZE);
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(nonce);
    decrypt(key, &nonce_bytes, body, aad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [0x42u8; KEY_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];
        let ciphertext = encrypt(&key, &nonce, b"60/30/10", b"aad").expect("encrypt");
        let decrypted = decrypt(&key, &nonce, &ciphertext, b"aad").expect("decrypt");
        assert_eq!(decrypted, b"60/30/10");
    }

    #[test]
    fn test_ciphertext_has_tag() {
        let key = [0x42u8; KEY_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];
        let ciphertext = encrypt(&key, &nonce, b"test", &[]).expect("encrypt");
        assert_eq!(ciphertext.len(), 4 + TAG_SIZE);
    }

    #[test]
    fn test_seal_uses_fresh_nonce() {
        let key = [0x07u8; KEY_SIZE];
        let a = seal(&key, b"same", &[]).expect("seal");
        let b = seal(&key, b"same", &[]).expect("seal");
        assert_ne!(a, b);
        assert_eq!(a.len(), NONCE_SIZE + 4 + TAG_SIZE);
        assert_eq!(open(&key, &a, &[]).expect("open"), b"same");
        assert_eq!(open(&key, &b, &[]).expect("open"), b"same");
    }

    #[test]
    fn test_open_wrong_aad_fails() {
        let key = [0x07u8; KEY_SIZE];
        let sealed = seal(&key, b"amount", b"role:artist").expect("seal");
        assert!(open(&key, &sealed, b"role:label").is_err());
    }

    #[test]
    fn test_open_short_input_rejected() {
        let key = [0x07u8; KEY_SIZE];
        assert!(matches!(
            open(&key, &[0u8; 8], &[]),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = [0x01u8; KEY_SIZE];
        let mut sealed = seal(&key, b"test", &[]).expect("seal");
        if let Some(byte) = sealed.last_mut() {
            *byte ^= 0xFF;
        }
        assert!(open(&key, &sealed, &[]).is_err());
    }
}
