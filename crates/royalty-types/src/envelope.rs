//! Encrypted envelopes and their ledger wire shape.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::TypesError;

/// Paired ciphertext and correctness proof, treated as one unit.
///
/// Both byte strings are non-empty; [`EncryptedEnvelope::new`] and
/// deserialization enforce it.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct EncryptedEnvelope {
    #[serde_as(as = "serde_with::hex::Hex")]
    ciphertext: Vec<u8>,
    #[serde_as(as = "serde_with::hex::Hex")]
    proof: Vec<u8>,
    /// Unix milliseconds at which the proof was completed.
    created_at: u64,
}

#[serde_as]
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde_as(as = "serde_with::hex::Hex")]
    ciphertext: Vec<u8>,
    #[serde_as(as = "serde_with::hex::Hex")]
    proof: Vec<u8>,
    created_at: u64,
}

impl TryFrom<RawEnvelope> for EncryptedEnvelope {
    type Error = TypesError;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        Self::new(raw.ciphertext, raw.proof, raw.created_at)
    }
}

impl EncryptedEnvelope {
    /// Assemble an envelope, rejecting empty ciphertext or proof.
    pub fn new(ciphertext: Vec<u8>, proof: Vec<u8>, created_at: u64) -> Result<Self, TypesError> {
        if ciphertext.is_empty() {
            return Err(TypesError::EmptyEnvelopeField { field: "ciphertext" });
        }
        if proof.is_empty() {
            return Err(TypesError::EmptyEnvelopeField { field: "proof" });
        }
        Ok(Self {
            ciphertext,
            proof,
            created_at,
        })
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn proof(&self) -> &[u8] {
        &self.proof
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

/// The exact `{data, proof}` pair the ledger boundary accepts.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ContractData {
    #[serde_as(as = "serde_with::hex::Hex")]
    #[ts(type = "string")]
    pub data: Vec<u8>,
    #[serde_as(as = "serde_with::hex::Hex")]
    #[ts(type = "string")]
    pub proof: Vec<u8>,
}
