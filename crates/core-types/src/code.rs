use core::fmt;

use serde::{Deserialize, Serialize};

/// Result code of a transaction or message, in the host chain's ABCI numbering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CodeType(u32);

impl CodeType {
    pub const OK: Self = Self(0);
    pub const INTERNAL: Self = Self(1);
    pub const TX_DECODE: Self = Self(2);
    pub const UNKNOWN_REQUEST: Self = Self(6);
    pub const INSUFFICIENT_FUNDS: Self = Self(10);
    pub const UNAUTHORIZED: Self = Self(4);

    pub const INVALID_MSG: Self = Self(1400);

    pub const OLD_TX: Self = Self(2508);
    pub const WAIT_FOR_CONFIRMATION: Self = Self(2510);
    pub const ERR_DECODE_EVENT: Self = Self(2512);

    pub const SIDE_TX_VALIDATION_FAILED: Self = Self(5502);

    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    pub const fn is_ok(&self) -> bool {
        self.0 == Self::OK.0
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub const DEFAULT_CODESPACE: &str = "anchor";

/// A failed transaction or message, reported through a result code rather than a panic.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} (codespace: {codespace}, code: {code})")]
pub struct TxError {
    pub codespace: String,
    pub code: CodeType,
    pub message: String,
}

impl TxError {
    pub fn new(codespace: impl Into<String>, code: CodeType, message: impl Into<String>) -> Self {
        Self {
            codespace: codespace.into(),
            code,
            message: message.into(),
        }
    }

    pub fn invalid_msg(message: impl Into<String>) -> Self {
        Self::new(DEFAULT_CODESPACE, CodeType::INVALID_MSG, message)
    }

    pub fn unknown_request(message: impl Into<String>) -> Self {
        Self::new(DEFAULT_CODESPACE, CodeType::UNKNOWN_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(DEFAULT_CODESPACE, CodeType::INTERNAL, message)
    }

    pub fn old_tx(codespace: impl Into<String>) -> Self {
        Self::new(codespace, CodeType::OLD_TX, "Old txhash not allowed")
    }

    pub fn side_tx_validation(codespace: impl Into<String>) -> Self {
        Self::new(
            codespace,
            CodeType::SIDE_TX_VALIDATION_FAILED,
            "External call majority validation failed",
        )
    }
}
