use core::fmt;
use core::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::PubKey;

/// A 20-byte account or validator signer address.
///
/// Ordering is byte-lexicographic, which is the canonical order of a validator set.
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
pub struct Address(#[serde(with = "hex::serde")] [u8; Self::LENGTH]);

impl Address {
    pub const LENGTH: usize = 20;

    #[cfg_attr(coverage_nightly, coverage(off))]
    pub const fn new(value: [u8; Self::LENGTH]) -> Self {
        Self(value)
    }

    /// Derives the address from the last 20 bytes of the Keccak-256 digest
    /// of the public key body (the key without its `0x04` tag).
    pub fn from_public_key(public_key: &PubKey) -> Self {
        let hash = Keccak256::digest(public_key.body());
        let mut address = [0; Self::LENGTH];
        address.copy_from_slice(&hash[hash.len() - Self::LENGTH..]);
        Self(address)
    }

    pub const fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; Self::LENGTH]
    }
}

impl fmt::Display for Address {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut address = [0; Self::LENGTH];
        hex::decode_to_slice(s, &mut address)?;
        Ok(Self(address))
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = String;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != Self::LENGTH {
            return Err(format!(
                "Invalid address length: expected {}, got {}",
                Self::LENGTH,
                bytes.len()
            ));
        }

        let mut address = [0; Self::LENGTH];
        address.copy_from_slice(bytes);
        Ok(Self(address))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
