//! Plaintext confidential values.
//!
//! A [`ConfidentialValue`] only lives for the duration of a local
//! encryption call. Its `Debug` output never shows the plaintext.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A party to a royalty split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Artist,
    Producer,
    Label,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Artist => "artist",
            Role::Producer => "producer",
            Role::Label => "label",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three plaintext percentages, one per [`Role`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PercentageTriple {
    pub artist: u8,
    pub producer: u8,
    pub label: u8,
}

/// Plaintext kinds the pipeline may encrypt.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfidentialValue {
    /// A whole split.
    PercentageTriple(PercentageTriple),
    /// One party's share, bound to its role.
    Share { role: Role, percentage: u8 },
    /// A revenue or payout amount.
    Amount { value: u64 },
}

/// The discriminant of a [`ConfidentialValue`], safe to log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    PercentageTriple,
    Share,
    Amount,
}

impl ConfidentialValue {
    pub fn amount(value: u64) -> Self {
        Self::Amount { value }
    }

    pub fn share(role: Role, percentage: u8) -> Self {
        Self::Share { role, percentage }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::PercentageTriple(_) => ValueKind::PercentageTriple,
            Self::Share { .. } => ValueKind::Share,
            Self::Amount { .. } => ValueKind::Amount,
        }
    }
}

impl fmt::Debug for ConfidentialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PercentageTriple(_) => f.write_str("PercentageTriple(<redacted>)"),
            Self::Share { role, .. } => write!(f, "Share {{ role: {role}, percentage: <redacted> }}"),
            Self::Amount { .. } => f.write_str("Amount(<redacted>)"),
        }
    }
}
