use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PubKeyError {
    #[error("Invalid public key length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Public key is not uncompressed, tag byte is {0:#04x}")]
    NotUncompressed(u8),
}

/// A 65-byte uncompressed secp256k1 public key (`0x04 || X || Y`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct PubKey([u8; Self::LENGTH]);

impl PubKey {
    pub const LENGTH: usize = 65;
    const UNCOMPRESSED_TAG: u8 = 0x04;

    pub fn new(bytes: [u8; Self::LENGTH]) -> Result<Self, PubKeyError> {
        if bytes[0] != Self::UNCOMPRESSED_TAG {
            return Err(PubKeyError::NotUncompressed(bytes[0]));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }

    /// The key without its tag byte.
    pub fn body(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl Default for PubKey {
    fn default() -> Self {
        let mut bytes = [0; Self::LENGTH];
        bytes[0] = Self::UNCOMPRESSED_TAG;
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for PubKey {
    type Error = PubKeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; Self::LENGTH] =
            bytes.try_into().map_err(|_| PubKeyError::InvalidLength {
                expected: Self::LENGTH,
                actual: bytes.len(),
            })?;

        Self::new(array)
    }
}

impl Serialize for PubKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let s = <String as Deserialize>::deserialize(deserializer)?;
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(D::Error::custom)?;
        Self::try_from(bytes.as_slice()).map_err(D::Error::custom)
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey(0x{})", hex::encode(self.0))
    }
}
