//! Domain-separated BLAKE3 hashing.
//!
//! Every derived key in the workspace goes through a registered context
//! string, so a proof key never collides with a receipt hash.
//!
//! ## Modes
//!
//! - [`derive_key`] — Key derivation: proof keys, receipt hashes, ledger keys
//! - [`keyed_hash`] — Keyed MAC: envelope proofs

/// Registered BLAKE3 context strings.
/// Using an unregistered context string is a programming error.
pub mod contexts {
    pub const ENVELOPE_PROOF_KEY: &str = "Royalty v1 envelope-proof-key";
    pub const RECEIPT_TX_HASH: &str = "Royalty v1 receipt-tx-hash";
    pub const LEDGER_SIGNING_KEY: &str = "Royalty v1 ledger-signing-key";

    /// All registered context strings. Used for validation.
    pub const ALL_CONTEXTS: &[&str] = &[
        ENVELOPE_PROOF_KEY,
        RECEIPT_TX_HASH,
        LEDGER_SIGNING_KEY,
    ];
}

/// Derive a key using BLAKE3's built-in key derivation mode.
///
/// # Arguments
///
/// * `context` - A registered context string (must start with "Royalty v1 ")
/// * `key_material` - The input key material
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    debug_assert!(
        is_registered_context(context),
        "unregistered BLAKE3 context: {context}"
    );
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}

/// Compute a keyed BLAKE3 hash (MAC).
///
/// The key must be exactly 32 bytes, typically derived via [`derive_key`].
pub fn keyed_hash(key: &[u8; 32], message: &[u8]) -> [u8; 32] {
    *::blake3::keyed_hash(key, message).as_bytes()
}

/// Constant-time comparison of a keyed hash against an expected tag.
pub fn keyed_hash_matches(key: &[u8; 32], message: &[u8], tag: &[u8]) -> bool {
    let Ok(tag): Result<[u8; 32], _> = tag.try_into() else {
        return false;
    };
    ::blake3::Hash::from(keyed_hash(key, message)) == ::blake3::Hash::from(tag)
}

/// Verify that a context string is registered.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}

/// Encode multiple dynamic fields using length-prefixed encoding.
///
/// `LE32(len(field1)) || field1 || LE32(len(field2)) || field2 || ...`
pub fn encode_multi_field(fields: &[&[u8]]) -> Vec<u8> {
    let total_len: usize = fields.iter().map(|f| 4 + f.len()).sum();
    let mut output = Vec::with_capacity(total_len);
    for field in fields {
        output.extend_from_slice(&(field.len() as u32).to_le_bytes());
        output.extend_from_slice(field);
    }
    output
}
