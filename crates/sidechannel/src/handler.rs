use derive_where::derive_where;

use anchor_core_types::{CodeType, SideTxResult, TxError, DEFAULT_CODESPACE};

use crate::Context;

/// What a validator reports for a side transaction, and what it signs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SideTxResponse {
    pub codespace: String,
    pub code: CodeType,
    pub data: Vec<u8>,
    pub result: SideTxResult,
}

impl SideTxResponse {
    pub fn new(result: SideTxResult) -> Self {
        Self {
            codespace: DEFAULT_CODESPACE.to_string(),
            code: CodeType::OK,
            data: Vec::new(),
            result,
        }
    }

    pub fn yes() -> Self {
        Self::new(SideTxResult::Yes)
    }

    pub fn no() -> Self {
        Self::new(SideTxResult::No)
    }

    pub fn skip() -> Self {
        Self::new(SideTxResult::Skip)
    }

    /// A failed evaluation: no data, `Skip` vote, and the error's code.
    pub fn from_error(error: TxError) -> Self {
        Self {
            codespace: error.codespace,
            code: error.code,
            data: Vec::new(),
            result: SideTxResult::Skip,
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

/// Evaluates the external fact behind a side message.
///
/// Runs on every validator for every cached transaction. It must not mutate state: the
/// store it sees is a scope that is always discarded.
pub trait SideTxHandler<M>: Send + Sync {
    fn handle_side_tx(&self, ctx: &mut Context<'_>, msg: &M) -> SideTxResponse;
}

/// Applies a side message once its vote outcome is known.
///
/// The only place a side message may change ledger state. Returning an error discards
/// every write and event of the call.
pub trait PostTxHandler<M>: Send + Sync {
    fn handle_post_tx(
        &self,
        ctx: &mut Context<'_>,
        msg: &M,
        result: SideTxResult,
    ) -> Result<(), TxError>;
}

/// The side and post handlers registered for one route.
#[derive_where(Debug)]
pub struct SideHandlers<M> {
    #[derive_where(skip)]
    side: Box<dyn SideTxHandler<M>>,
    #[derive_where(skip)]
    post: Box<dyn PostTxHandler<M>>,
}

impl<M> SideHandlers<M> {
    pub fn new(
        side: impl SideTxHandler<M> + 'static,
        post: impl PostTxHandler<M> + 'static,
    ) -> Self {
        Self {
            side: Box::new(side),
            post: Box::new(post),
        }
    }

    pub fn side(&self) -> &dyn SideTxHandler<M> {
        self.side.as_ref()
    }

    pub fn post(&self) -> &dyn PostTxHandler<M> {
        self.post.as_ref()
    }
}
