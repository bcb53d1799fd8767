use core::marker::PhantomData;

use borsh::{BorshDeserialize, BorshSerialize};
use derive_where::derive_where;

use anchor_core_types::TxError;
use anchor_sidechannel::{Codec, SideMsg};
use anchor_topup::{AsTopup, MsgTopup};

/// Every message the application routes through the side channel.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum AppMsg {
    Topup(MsgTopup),
}

impl SideMsg for AppMsg {
    fn route(&self) -> &str {
        match self {
            Self::Topup(msg) => msg.route(),
        }
    }

    fn side_sign_bytes(&self) -> Vec<u8> {
        match self {
            Self::Topup(msg) => msg.side_sign_bytes(),
        }
    }

    fn validate_basic(&self) -> Result<(), TxError> {
        match self {
            Self::Topup(msg) => msg.validate_basic(),
        }
    }
}

impl AsTopup for AppMsg {
    fn as_topup(&self) -> Option<&MsgTopup> {
        match self {
            Self::Topup(msg) => Some(msg),
        }
    }
}

impl From<MsgTopup> for AppMsg {
    fn from(msg: MsgTopup) -> Self {
        Self::Topup(msg)
    }
}

/// Encodes transactions with `borsh`.
#[derive_where(Copy, Clone, Debug, Default)]
pub struct BorshCodec<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> BorshCodec<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> Codec<T> for BorshCodec<T>
where
    T: BorshSerialize + BorshDeserialize + 'static,
{
    type Error = std::io::Error;

    fn decode(&self, bytes: &[u8]) -> Result<T, Self::Error> {
        borsh::from_slice(bytes)
    }

    fn encode(&self, msg: &T) -> Result<Vec<u8>, Self::Error> {
        borsh::to_vec(msg)
    }
}
