use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use anchor_core_types::{Address, TxHash};
use anchor_topup::{ChainClient, ChainError, Log, MsgTopup, Receipt, TopupEvent};

/// Address of the staking contract emitting the scripted top-up events.
pub const STAKING_INFO: Address = Address::new([0x51; 20]);

#[derive(Clone, Debug)]
struct Deposit {
    receipt: Receipt,
    depth: u64,
    events: BTreeMap<u64, TopupEvent>,
}

/// A scripted external chain.
///
/// Clones share their state, so a test can keep a handle and keep scripting the chain after
/// handing it to the app.
#[derive(Clone, Debug, Default)]
pub struct MockChainClient {
    deposits: Arc<RwLock<BTreeMap<TxHash, Deposit>>>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the deposit `msg` describes, `depth` blocks deep.
    pub fn add_topup(&self, msg: &MsgTopup, depth: u64) {
        let event = TopupEvent {
            validator_id: msg.validator_id,
            signer: msg.signer,
            fee: msg.fee,
        };

        self.write(|deposits| {
            let deposit = deposits.entry(msg.tx_hash).or_insert_with(|| Deposit {
                receipt: Receipt {
                    tx_hash: msg.tx_hash,
                    block_number: msg.block_number,
                    logs: Vec::new(),
                },
                depth,
                events: BTreeMap::new(),
            });

            deposit.depth = depth;
            deposit.receipt.logs.push(Log {
                index: msg.log_index,
                emitter: STAKING_INFO,
                data: Vec::new(),
            });
            deposit.events.insert(msg.log_index, event);
        });
    }

    /// Moves the deposit of `tx_hash` to the given depth.
    pub fn set_depth(&self, tx_hash: &TxHash, depth: u64) {
        self.write(|deposits| {
            if let Some(deposit) = deposits.get_mut(tx_hash) {
                deposit.depth = depth;
            }
        });
    }

    fn read<A>(&self, f: impl FnOnce(&BTreeMap<TxHash, Deposit>) -> A) -> A {
        f(&self.deposits.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<A>(&self, f: impl FnOnce(&mut BTreeMap<TxHash, Deposit>) -> A) -> A {
        f(&mut self.deposits.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ChainClient for MockChainClient {
    fn confirmed_receipt(
        &self,
        tx_hash: &TxHash,
        confirmations: u64,
    ) -> Result<Option<Receipt>, ChainError> {
        Ok(self.read(|deposits| {
            deposits
                .get(tx_hash)
                .filter(|deposit| deposit.depth >= confirmations)
                .map(|deposit| deposit.receipt.clone())
        }))
    }

    fn decode_topup_event(
        &self,
        receipt: &Receipt,
        log_index: u64,
    ) -> Result<TopupEvent, ChainError> {
        let log = receipt
            .log(log_index)
            .ok_or(ChainError::MissingLog(log_index))?;

        if log.emitter != STAKING_INFO {
            return Err(ChainError::Decode(format!(
                "log {log_index} not emitted by the staking contract"
            )));
        }

        self.read(|deposits| {
            deposits
                .get(&receipt.tx_hash)
                .and_then(|deposit| deposit.events.get(&log_index).copied())
                .ok_or_else(|| ChainError::Decode(format!("no top-up event at log {log_index}")))
        })
    }
}
