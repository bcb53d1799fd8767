use anchor_app::{AppMsg, EndBlockResponse, SideChannelApp};
use anchor_config::{Config, MetricsConfig};
use anchor_core_types::{Address, Event, Height, SideTxResult, TxHash, VotingPower};
use anchor_sidechannel::{Codec, SideTxResponse, SideTxStore, SideVotes};
use anchor_store::MemStore;
use anchor_topup::{Bank, KvBank};
use anchor_validator_set::{Validator, ValidatorSet};

use crate::{make_validators, votes, MockChainClient};

/// A single node driven through the host callbacks, over an in-memory state.
pub struct TestNode {
    pub app: SideChannelApp,
    pub state: MemStore,
    pub chain: MockChainClient,
    pub genesis: Vec<Validator>,
}

impl TestNode {
    pub fn new(powers: &[VotingPower]) -> eyre::Result<Self> {
        let config = Config {
            moniker: "test-node".to_string(),
            metrics: MetricsConfig {
                enabled: false,
                ..MetricsConfig::default()
            },
            ..Config::default()
        };

        Self::with_config(config, powers)
    }

    pub fn with_config(config: Config, powers: &[VotingPower]) -> eyre::Result<Self> {
        let genesis = make_validators(powers);
        let chain = MockChainClient::new();

        let app = SideChannelApp::new(
            config,
            ValidatorSet::new(genesis.clone())?,
            chain.clone(),
        )?;

        let mut state = MemStore::new();
        app.init_chain(&mut state)?;

        Ok(Self {
            app,
            state,
            chain,
            genesis,
        })
    }

    pub fn encode(&self, msg: impl Into<AppMsg>) -> eyre::Result<Vec<u8>> {
        Ok(self.app.codec().encode(&msg.into())?)
    }

    /// Commits `tx` at `height`, returning its hash if it was cached for side-channel voting.
    pub fn deliver_tx(&mut self, height: u64, tx: &[u8]) -> eyre::Result<Option<TxHash>> {
        Ok(self
            .app
            .on_deliver_tx(&mut self.state, Height::new(height), tx, true)?)
    }

    pub fn deliver_side_tx(&mut self, height: u64, tx: &[u8]) -> SideTxResponse {
        self.app
            .on_deliver_side_tx(&mut self.state, Height::new(height), tx)
    }

    pub fn begin_side_block(
        &mut self,
        height: u64,
        votes: &SideVotes,
    ) -> eyre::Result<Vec<Event>> {
        Ok(self
            .app
            .on_begin_side_block(&mut self.state, Height::new(height), votes)?)
    }

    pub fn end_block(
        &mut self,
        height: u64,
        ack_count: u64,
        roster: &[Validator],
    ) -> eyre::Result<EndBlockResponse> {
        Ok(self
            .app
            .on_end_block(&mut self.state, Height::new(height), ack_count, roster)?)
    }

    /// Every genesis validator casting `result` on `tx_hash`.
    pub fn unanimous(&self, tx_hash: TxHash, result: SideTxResult) -> SideVotes {
        self.split(tx_hash, &vec![result; self.genesis.len()])
    }

    /// Genesis validator `i` casting `results[i]` on `tx_hash`.
    pub fn split(&self, tx_hash: TxHash, results: &[SideTxResult]) -> SideVotes {
        let ballots = self.genesis.iter().zip(results.iter().copied());
        SideVotes::from([(tx_hash, votes(tx_hash, ballots))])
    }

    pub fn pending_side_txs(&self, height: u64) -> eyre::Result<usize> {
        Ok(self.state.get_side_txs(Height::new(height))?.len())
    }

    pub fn balance(&self, address: &Address) -> eyre::Result<u128> {
        Ok(KvBank::new().balance(&self.state, address)?)
    }
}
