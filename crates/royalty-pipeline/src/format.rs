//! Contract call formatting.
//!
//! Maps a [`ValidatedEnvelope`] onto the `{data, proof}` pair the ledger
//! accepts. Total and pure: only validated envelopes reach this point, and
//! the mapping copies both byte strings unchanged, so distinct envelopes
//! never format to the same pair.

use royalty_types::ContractData;

use crate::validator::ValidatedEnvelope;

/// Format a validated envelope for a ledger call.
pub fn format(envelope: &ValidatedEnvelope) -> ContractData {
    let inner = envelope.envelope();
    ContractData {
        data: inner.ciphertext().to_vec(),
        proof: inner.proof().to_vec(),
    }
}
