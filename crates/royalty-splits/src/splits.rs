//! Royalty split validation.
//!
//! Revenue for a track is shared between three parties:
//!
//! - **Artist**
//! - **Producer**
//! - **Label**
//!
//! The three percentages must each be non-negative and sum to exactly
//! [`TOTAL_PERCENT`]. [`check_percentages`] is the only way to obtain a
//! [`PercentageSplit`], so holding one proves the invariant was checked.

use royalty_types::{PercentageTriple, Role};
use serde::Serialize;
use tracing::debug;

use crate::{Result, SplitError};

/// The sum every valid split must reach.
pub const TOTAL_PERCENT: u8 = 100;

/// A split that has passed [`check_percentages`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PercentageSplit {
    triple: PercentageTriple,
}

impl PercentageSplit {
    /// The validated triple.
    pub fn triple(&self) -> PercentageTriple {
        self.triple
    }

    /// The percentage held by one party.
    pub fn share(&self, role: Role) -> u8 {
        match role {
            Role::Artist => self.triple.artist,
            Role::Producer => self.triple.producer,
            Role::Label => self.triple.label,
        }
    }
}

/// Validate a plaintext percentage triple.
///
/// Inputs are accepted as signed integers so that negative values coming
/// from an untyped caller are reported rather than wrapped.
///
/// # Errors
///
/// - [`SplitError::NegativeShare`] if any value is below zero
/// - [`SplitError::InvalidSplitTotal`] if the values do not sum to 100
pub fn check_percentages(artist: i64, producer: i64, label: i64) -> Result<PercentageSplit> {
    for (role, value) in [
        (Role::Artist, artist),
        (Role::Producer, producer),
        (Role::Label, label),
    ] {
        if value < 0 {
            return Err(SplitError::NegativeShare { role, value });
        }
    }

    let total = i128::from(artist) + i128::from(producer) + i128::from(label);
    if total != i128::from(TOTAL_PERCENT) {
        debug!("split rejected: shares do not sum to 100");
        return Err(SplitError::InvalidSplitTotal { total });
    }

    // Non-negative values summing to 100 each fit in a u8.
    let narrow = |v: i64| u8::try_from(v).map_err(|_| SplitError::InvalidSplitTotal { total });
    Ok(PercentageSplit {
        triple: PercentageTriple {
            artist: narrow(artist)?,
            producer: narrow(producer)?,
            label: narrow(label)?,
        },
    })
}

/// Re-check a triple that arrived already narrowed to `u8`.
pub fn check_triple(triple: &PercentageTriple) -> Result<PercentageSplit> {
    check_percentages(
        i64::from(triple.artist),
        i64::from(triple.producer),
        i64::from(triple.label),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_split() {
        let split = check_percentages(60, 30, 10).expect("60/30/10 is valid");
        assert_eq!(split.share(Role::Artist), 60);
        assert_eq!(split.share(Role::Producer), 30);
        assert_eq!(split.share(Role::Label), 10);
    }

    #[test]
    fn test_sum_short_by_one() {
        assert_eq!(
            check_percentages(60, 30, 9),
            Err(SplitError::InvalidSplitTotal { total: 99 })
        );
    }

    #[test]
    fn test_sum_over() {
        assert_eq!(
            check_percentages(50, 50, 50),
            Err(SplitError::InvalidSplitTotal { total: 150 })
        );
    }

    #[test]
    fn test_negative_share_rejected() {
        assert_eq!(
            check_percentages(120, -10, -10),
            Err(SplitError::NegativeShare {
                role: Role::Producer,
                value: -10
            })
        );
    }

    #[test]
    fn test_single_party_takes_all() {
        let split = check_percentages(0, 0, 100).expect("valid");
        assert_eq!(split.share(Role::Label), 100);
        assert_eq!(split.share(Role::Artist), 0);
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        assert!(matches!(
            check_percentages(i64::MAX, i64::MAX, i64::MAX),
            Err(SplitError::InvalidSplitTotal { .. })
        ));
    }

    #[test]
    fn test_every_valid_triple_accepted_and_every_other_sum_rejected() {
        for a in 0..=100i64 {
            for p in 0..=(100 - a) {
                let l = 100 - a - p;
                assert!(check_percentages(a, p, l).is_ok(), "({a},{p},{l})");
                assert!(check_percentages(a, p, l + 1).is_err(), "({a},{p},{})", l + 1);
            }
        }
    }

    #[test]
    fn test_check_triple() {
        let ok = PercentageTriple {
            artist: 34,
            producer: 33,
            label: 33,
        };
        assert_eq!(check_triple(&ok).expect("valid").triple(), ok);

        let bad = PercentageTriple {
            artist: 100,
            producer: 100,
            label: 0,
        };
        assert!(check_triple(&bad).is_err());
    }
}
