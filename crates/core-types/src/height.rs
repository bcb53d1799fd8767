use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// A block height of the host chain
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Height(u64);

impl Height {
    pub const ZERO: Self = Self(0);

    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the height `n` blocks before this one, or `None` if it would be below zero.
    pub fn decrement_by(&self, n: u64) -> Option<Self> {
        self.0.checked_sub(n).map(Self)
    }

    /// Big-endian encoding, so that byte order matches numeric order in key-value stores.
    pub const fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for Height {
    fn from(height: u64) -> Self {
        Self(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_stops_at_zero() {
        assert_eq!(Height::new(5).decrement_by(2), Some(Height::new(3)));
        assert_eq!(Height::new(2).decrement_by(2), Some(Height::ZERO));
        assert_eq!(Height::new(1).decrement_by(2), None);
    }

    #[test]
    fn byte_order_matches_numeric_order() {
        let low = Height::new(255).to_be_bytes();
        let high = Height::new(256).to_be_bytes();
        assert!(low < high);
    }
}
