use tracing::{debug, info, warn};

use anchor_core_types::{Address, CodeType, Event, SideTxResult, TxError, ValidatorId};
use anchor_sidechannel::{Context, PostTxHandler, SideHandlers, SideTxHandler, SideTxResponse};
use anchor_store::{KvStore, StoreError};

use crate::sequence::{has_topup_sequence, set_topup_sequence};
use crate::{store_error, AsTopup, Bank, ChainClient, TOPUP_ROUTE};

/// Codespace of the errors reported by the top-up handlers.
pub const TOPUP_CODESPACE: &str = "topup";

/// Kind of the event emitted when a deposit is credited.
pub const EVENT_TYPE_TOPUP: &str = "topup";

pub const DEFAULT_TX_CONFIRMATIONS: u64 = 6;
pub const DEFAULT_FEE_PER_TX: u128 = 1_000_000_000_000_000;
pub const DEFAULT_LOG_INDEX_UNIT: u64 = 100_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TopupParams {
    /// Depth a deposit transaction must reach on the external chain before it is voted on
    pub tx_confirmations: u64,
    /// Amount moved from the credited signer to the relayer of the deposit
    pub fee_per_tx: u128,
    /// Multiplier of the block number in a deposit's sequence
    pub log_index_unit: u64,
}

impl Default for TopupParams {
    fn default() -> Self {
        Self {
            tx_confirmations: DEFAULT_TX_CONFIRMATIONS,
            fee_per_tx: DEFAULT_FEE_PER_TX,
            log_index_unit: DEFAULT_LOG_INDEX_UNIT,
        }
    }
}

/// Resolves the signer a validator is currently registered with in local state.
pub trait ValidatorLookup: Send + Sync {
    fn signer_of(&self, store: &dyn KvStore, id: ValidatorId)
        -> Result<Option<Address>, StoreError>;
}

/// Builds the handlers to register on the [`TOPUP_ROUTE`].
pub fn topup_handlers<M, C, B, V>(
    chain: C,
    bank: B,
    validators: V,
    params: TopupParams,
) -> SideHandlers<M>
where
    M: AsTopup,
    C: ChainClient + 'static,
    B: Bank + 'static,
    V: ValidatorLookup + 'static,
{
    SideHandlers::new(
        TopupSideHandler::new(chain, params),
        TopupPostHandler::new(bank, validators, params),
    )
}

/// Checks a deposit against the external chain.
pub struct TopupSideHandler<C> {
    chain: C,
    params: TopupParams,
}

impl<C> TopupSideHandler<C> {
    pub fn new(chain: C, params: TopupParams) -> Self {
        Self { chain, params }
    }
}

impl<M, C> SideTxHandler<M> for TopupSideHandler<C>
where
    M: AsTopup,
    C: ChainClient,
{
    fn handle_side_tx(&self, ctx: &mut Context<'_>, msg: &M) -> SideTxResponse {
        let Some(msg) = msg.as_topup() else {
            return SideTxResponse::from_error(TxError::unknown_request(format!(
                "Unrecognized {TOPUP_ROUTE} message"
            )));
        };

        debug!(
            height = %ctx.height(),
            tx_hash = %msg.tx_hash,
            log_index = msg.log_index,
            block_number = msg.block_number,
            "Validating external call for top-up"
        );

        let receipt = match self
            .chain
            .confirmed_receipt(&msg.tx_hash, self.params.tx_confirmations)
        {
            Ok(Some(receipt)) => receipt,
            Ok(None) => {
                debug!(tx_hash = %msg.tx_hash, "Top-up deposit not confirmed yet");
                return wait_for_confirmation(self.params.tx_confirmations);
            }
            Err(e) => {
                warn!(tx_hash = %msg.tx_hash, "Failed to fetch top-up receipt: {e}");
                return wait_for_confirmation(self.params.tx_confirmations);
            }
        };

        let event = match self.chain.decode_topup_event(&receipt, msg.log_index) {
            Ok(event) => event,
            Err(e) => {
                warn!(tx_hash = %msg.tx_hash, log_index = msg.log_index, "{e}");

                return SideTxResponse::from_error(TxError::new(
                    TOPUP_CODESPACE,
                    CodeType::ERR_DECODE_EVENT,
                    e.to_string(),
                ));
            }
        };

        if receipt.block_number != msg.block_number {
            warn!(
                msg = msg.block_number,
                receipt = receipt.block_number,
                "Block number in message does not match the receipt"
            );
            return SideTxResponse::no();
        }

        if event.validator_id != msg.validator_id {
            warn!(
                msg = %msg.validator_id,
                event = %event.validator_id,
                "Validator id in message does not match the event"
            );
            return SideTxResponse::no();
        }

        if event.signer != msg.signer {
            warn!(
                msg = %msg.signer,
                event = %event.signer,
                "Signer in message does not match the event"
            );
            return SideTxResponse::no();
        }

        if event.fee != msg.fee {
            warn!(msg = msg.fee, event = event.fee, "Fee in message does not match the event");
            return SideTxResponse::no();
        }

        debug!(tx_hash = %msg.tx_hash, "Validated external call for top-up");
        SideTxResponse::yes()
    }
}

fn wait_for_confirmation(confirmations: u64) -> SideTxResponse {
    SideTxResponse::from_error(TxError::new(
        TOPUP_CODESPACE,
        CodeType::WAIT_FOR_CONFIRMATION,
        format!("Wait for confirmation: {confirmations} blocks"),
    ))
}

/// Credits an approved deposit to the validator's signer.
pub struct TopupPostHandler<B, V> {
    bank: B,
    validators: V,
    params: TopupParams,
}

impl<B, V> TopupPostHandler<B, V> {
    pub fn new(bank: B, validators: V, params: TopupParams) -> Self {
        Self {
            bank,
            validators,
            params,
        }
    }
}

impl<M, B, V> PostTxHandler<M> for TopupPostHandler<B, V>
where
    M: AsTopup,
    B: Bank,
    V: ValidatorLookup,
{
    fn handle_post_tx(
        &self,
        ctx: &mut Context<'_>,
        msg: &M,
        result: SideTxResult,
    ) -> Result<(), TxError> {
        let Some(msg) = msg.as_topup() else {
            return Err(TxError::unknown_request(format!(
                "Unrecognized {TOPUP_ROUTE} message"
            )));
        };

        if result != SideTxResult::Yes {
            debug!(%result, "Skipping top-up without a yes supermajority");
            return Err(TxError::side_tx_validation(TOPUP_CODESPACE));
        }

        let sequence = msg.sequence(self.params.log_index_unit);

        if has_topup_sequence(ctx.store(), sequence).map_err(store_error)? {
            warn!(sequence, tx_hash = %msg.tx_hash, "Top-up already credited");
            return Err(TxError::old_tx(TOPUP_CODESPACE));
        }

        let signer = self
            .validators
            .signer_of(ctx.store(), msg.validator_id)
            .map_err(store_error)?
            .unwrap_or(msg.signer);

        self.bank.add_funds(ctx.store_mut(), &signer, msg.fee)?;

        self.bank.transfer_funds(
            ctx.store_mut(),
            &signer,
            &msg.from_address,
            self.params.fee_per_tx,
        )?;

        set_topup_sequence(ctx.store_mut(), sequence).map_err(store_error)?;

        let tx_hash = ctx.tx_hash();

        ctx.emit_event(
            Event::new(EVENT_TYPE_TOPUP)
                .with_attribute("action", TOPUP_ROUTE)
                .with_attribute("module", TOPUP_ROUTE)
                .with_attribute("txhash", tx_hash)
                .with_attribute("side-tx-result", result)
                .with_attribute("validator-id", msg.validator_id)
                .with_attribute("validator-signer", signer)
                .with_attribute("topup-amount", msg.fee),
        );

        info!(
            validator_id = %msg.validator_id,
            %signer,
            amount = msg.fee,
            sequence,
            "Credited top-up"
        );

        Ok(())
    }
}
