use eyre::eyre;
use tracing::{debug, error, info};

use anchor_config::{Config, TopupConfig};
use anchor_core_types::{Address, Event, Height, TxHash};
use anchor_metrics::SharedRegistry;
use anchor_sidechannel::{
    SideChannelMetrics, SideRouter, SideTxCoordinator, SideTxResponse, SideTxStore, SideVotes,
    ValidatorPower, ValidatorSnapshot,
};
use anchor_store::{KvStore, StoreError};
use anchor_topup::{topup_handlers, ChainClient, KvBank, TopupParams, TOPUP_ROUTE};
use anchor_validator_set::{compute_change_set, ChangeSet, Validator, ValidatorSet};

use crate::state::{load_validator_set, save_validator_set, PersistedValidators};
use crate::{AppMsg, BorshCodec};

/// What the host engine needs to enforce for the next height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndBlockResponse {
    /// Changes folded into the active set at this height
    pub updates: ChangeSet,
    /// Proposer of the next height
    pub proposer: Option<Address>,
}

/// Wiring root of the side-channel and validator-set engines.
///
/// Owns the sealed router, the codec, the active validator set and the metrics. The host engine
/// drives it through the `on_*` callbacks, strictly one at a time, handing it the block's working
/// state on every call.
pub struct SideChannelApp {
    config: Config,
    router: SideRouter<AppMsg>,
    codec: BorshCodec<AppMsg>,
    validators: ValidatorSet,
    metrics: SideChannelMetrics,
}

impl SideChannelApp {
    pub fn new<C>(config: Config, validators: ValidatorSet, chain: C) -> eyre::Result<Self>
    where
        C: ChainClient + 'static,
    {
        if validators.is_empty() {
            return Err(eyre!("Cannot start with an empty validator set"));
        }
        config.validate()?;

        let mut router = SideRouter::new();
        router.try_add_route(
            TOPUP_ROUTE,
            topup_handlers(
                chain,
                KvBank::new(),
                PersistedValidators,
                topup_params(&config.topup),
            ),
        )?;
        router.try_seal()?;

        let metrics = if config.metrics.enabled {
            SideChannelMetrics::register_with_prefix(
                SharedRegistry::global(),
                format!("{}_sidechannel", config.metrics.prefix),
            )
        } else {
            SideChannelMetrics::new()
        };

        let app = Self {
            config,
            router,
            codec: BorshCodec::new(),
            validators,
            metrics,
        };

        app.record_validator_metrics();

        info!(
            moniker = %app.config.moniker,
            validators = app.validators.len(),
            routes = app.router.routes().count(),
            "Started side-channel app"
        );

        Ok(app)
    }

    /// Restarts from the validator set persisted in `state`.
    pub fn load<C>(config: Config, state: &dyn KvStore, chain: C) -> eyre::Result<Self>
    where
        C: ChainClient + 'static,
    {
        let validators = load_validator_set(state)?
            .ok_or_else(|| eyre!("No validator set found in state"))?;

        Self::new(config, validators, chain)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &SideRouter<AppMsg> {
        &self.router
    }

    pub fn codec(&self) -> &BorshCodec<AppMsg> {
        &self.codec
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub fn metrics(&self) -> &SideChannelMetrics {
        &self.metrics
    }

    /// Persists the genesis validator set.
    pub fn init_chain(&self, state: &mut dyn KvStore) -> Result<(), StoreError> {
        save_validator_set(state, &self.validators)
    }

    /// Records the validators that signed the previous block as the voters of `height`.
    pub fn on_begin_block(
        &self,
        state: &mut dyn KvStore,
        height: Height,
        last_commit: &[ValidatorPower],
    ) -> Result<(), StoreError> {
        if last_commit.is_empty() {
            return Ok(());
        }

        state.set_validator_snapshot(height, &ValidatorSnapshot::new(last_commit.to_vec()))
    }

    /// Caches a transaction that committed at `height` if it carries a side message.
    pub fn on_deliver_tx(
        &self,
        state: &mut dyn KvStore,
        height: Height,
        tx_bytes: &[u8],
        committed: bool,
    ) -> Result<Option<TxHash>, StoreError> {
        if !committed {
            return Ok(None);
        }

        self.coordinator()
            .cache_tx(state, height, tx_bytes, &self.validators)
    }

    /// Evaluates a cached transaction; the response is what this validator signs and gossips.
    pub fn on_deliver_side_tx(
        &self,
        state: &mut dyn KvStore,
        height: Height,
        tx_bytes: &[u8],
    ) -> SideTxResponse {
        self.coordinator().deliver_side_tx(state, height, tx_bytes)
    }

    /// Replays the side transactions whose votes are complete at `height`.
    pub fn on_begin_side_block(
        &self,
        state: &mut dyn KvStore,
        height: Height,
        votes: &SideVotes,
    ) -> Result<Vec<Event>, StoreError> {
        self.coordinator().begin_side_block(state, height, votes)
    }

    /// Reconciles the active set with the roster at `ack_count`, advances proposer rotation by
    /// one round, and persists the result.
    ///
    /// A change-set that cannot be applied leaves the active set as it was.
    pub fn on_end_block(
        &mut self,
        state: &mut dyn KvStore,
        height: Height,
        ack_count: u64,
        roster: &[Validator],
    ) -> Result<EndBlockResponse, StoreError> {
        let mut changes = compute_change_set(&self.validators, roster, ack_count);
        let mut next = self.validators.clone();

        if let Err(e) = next.apply_change_set(&changes) {
            error!(%height, ack_count, "Rejected validator change-set: {e}");
            changes = ChangeSet::new();
        }

        next.increment_accum(1);
        save_validator_set(state, &next)?;

        self.validators = next;
        self.record_validator_metrics();

        let proposer = self.validators.get_proposer().map(|v| v.address);

        if changes.is_empty() {
            debug!(%height, ?proposer, "Validator set unchanged");
        } else {
            info!(
                %height,
                ack_count,
                changes = changes.len(),
                validators = self.validators.len(),
                total_voting_power = self.validators.total_voting_power(),
                "Updated validator set"
            );
        }

        Ok(EndBlockResponse {
            updates: changes,
            proposer,
        })
    }

    fn coordinator(&self) -> SideTxCoordinator<'_, AppMsg, BorshCodec<AppMsg>> {
        SideTxCoordinator::new(&self.router, &self.codec, &self.metrics)
            .with_tx_delay(self.config.side_channel.tx_delay)
            .with_snapshot_pruning(self.config.side_channel.prune_validator_snapshots)
    }

    fn record_validator_metrics(&self) {
        let size = i64::try_from(self.validators.len()).unwrap_or(i64::MAX);

        self.metrics.validator_set_size.set(size);
        self.metrics
            .total_voting_power
            .set(self.validators.total_voting_power());
    }
}

fn topup_params(config: &TopupConfig) -> TopupParams {
    TopupParams {
        tx_confirmations: config.tx_confirmations,
        fee_per_tx: u128::from(config.fee_per_tx),
        log_index_unit: config.log_index_unit,
    }
}
