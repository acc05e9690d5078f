//! # royalty-types
//!
//! Shared domain types for the confidential royalty workspace: track
//! identifiers, ledger addresses, plaintext confidential values, encrypted
//! envelopes, ledger records, receipts and events.

pub mod envelope;
pub mod events;
pub mod track;
pub mod value;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use envelope::{ContractData, EncryptedEnvelope};
pub use track::{PayoutRequest, Receipt, ReceiptKind, RevenueEvent, SplitEnvelopes, TrackInfo, TrackState};
pub use value::{ConfidentialValue, PercentageTriple, Role, ValueKind};

/// Length of a ledger account/contract address in bytes.
pub const LEDGER_ADDRESS_LEN: usize = 20;

/// Errors raised while constructing shared types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// The ledger address string is malformed.
    #[error("invalid ledger address: {0}")]
    InvalidAddress(String),

    /// An envelope field that must carry bytes is empty.
    #[error("envelope {field} is empty")]
    EmptyEnvelopeField {
        /// `"ciphertext"` or `"proof"`.
        field: &'static str,
    },
}

/// Ledger-assigned track identifier.
///
/// `TrackId(0)` is never assigned by a ledger and stands for "no track
/// selected".
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ts_rs::TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct TrackId(pub u64);

impl TrackId {
    /// The placeholder for an absent selection.
    pub const UNSELECTED: TrackId = TrackId(0);

    /// Whether this id refers to an actual track.
    pub fn is_selected(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 20-byte ledger address, written as `0x` followed by 40 hex digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LedgerAddress(pub [u8; LEDGER_ADDRESS_LEN]);

impl LedgerAddress {
    /// The all-zero placeholder used by unconfigured deployments.
    pub const ZERO: LedgerAddress = LedgerAddress([0u8; LEDGER_ADDRESS_LEN]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; LEDGER_ADDRESS_LEN]
    }
}

impl FromStr for LedgerAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidAddress(format!("missing 0x prefix: {s}")))?;
        if digits.len() != LEDGER_ADDRESS_LEN * 2 {
            return Err(TypesError::InvalidAddress(format!(
                "expected {} hex digits, got {}",
                LEDGER_ADDRESS_LEN * 2,
                digits.len()
            )));
        }
        let mut out = [0u8; LEDGER_ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut out)
            .map_err(|e| TypesError::InvalidAddress(e.to_string()))?;
        Ok(Self(out))
    }
}

impl fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for LedgerAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LedgerAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Current Unix time in milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
