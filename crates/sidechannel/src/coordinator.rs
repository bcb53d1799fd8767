use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, error, info, warn};

use anchor_core_types::{
    CodeType, Event, Height, SideTxResult, SideVote, TxError, TxHash, DEFAULT_CODESPACE,
};
use anchor_store::{CacheStore, KvStore, StoreError};
use anchor_validator_set::ValidatorSet;

use crate::{
    CachedSideTx, Codec, Context, SideChannelMetrics, SideMsg, SideRouter, SideTxResponse,
    SideTxStore, ValidatorSnapshot, VoteTally,
};

/// Number of blocks between a transaction's commit and the replay of its side message.
///
/// Votes on transactions committed at `H` are collected by the host engine during `H + 1`,
/// so they are complete when `H + 2` begins.
pub const DEFAULT_SIDE_TX_DELAY: u64 = 2;

/// Votes collected by the host engine, per transaction hash.
pub type SideVotes = BTreeMap<TxHash, Vec<SideVote>>;

/// Drives the side-channel lifecycle of transactions: caching on commit, evaluation by the side
/// handlers, and the delayed replay of their post handlers.
pub struct SideTxCoordinator<'a, M, C> {
    router: &'a SideRouter<M>,
    codec: &'a C,
    metrics: &'a SideChannelMetrics,
    tx_delay: u64,
    prune_snapshots: bool,
}

impl<'a, M, C> SideTxCoordinator<'a, M, C>
where
    M: SideMsg,
    C: Codec<M>,
{
    pub fn new(router: &'a SideRouter<M>, codec: &'a C, metrics: &'a SideChannelMetrics) -> Self {
        Self {
            router,
            codec,
            metrics,
            tx_delay: DEFAULT_SIDE_TX_DELAY,
            prune_snapshots: true,
        }
    }

    pub fn with_tx_delay(mut self, tx_delay: u64) -> Self {
        self.tx_delay = tx_delay;
        self
    }

    pub fn with_snapshot_pruning(mut self, prune_snapshots: bool) -> Self {
        self.prune_snapshots = prune_snapshots;
        self
    }

    pub fn tx_delay(&self) -> u64 {
        self.tx_delay
    }

    /// Caches a transaction that committed successfully at `height`, if it carries a message
    /// with a registered side route.
    ///
    /// The first transaction cached at a height also snapshots the active validator set, unless
    /// a snapshot was already recorded for that height.
    pub fn cache_tx(
        &self,
        state: &mut dyn KvStore,
        height: Height,
        tx_bytes: &[u8],
        validators: &ValidatorSet,
    ) -> Result<Option<TxHash>, StoreError> {
        let Ok(msg) = self.codec.decode(tx_bytes) else {
            return Ok(None);
        };

        if !self.router.has_route(msg.route()) {
            return Ok(None);
        }

        let tx_hash = state.store_side_tx(height, tx_bytes)?;

        if !state.has_validator_snapshot(height)? {
            state.set_validator_snapshot(height, &ValidatorSnapshot::from_set(validators))?;
        }

        self.metrics.side_txs_cached.inc();
        debug!(%height, %tx_hash, route = msg.route(), "Cached side tx");

        Ok(Some(tx_hash))
    }

    /// Evaluates a cached transaction with the side handler of its route.
    ///
    /// The handler sees a scope over `state` that is always discarded. When it succeeds without
    /// data of its own, the response carries the message's side-sign bytes.
    pub fn deliver_side_tx(
        &self,
        state: &mut dyn KvStore,
        height: Height,
        tx_bytes: &[u8],
    ) -> SideTxResponse {
        let msg = match self.codec.decode(tx_bytes) {
            Ok(msg) => msg,
            Err(e) => {
                return SideTxResponse::from_error(TxError::new(
                    DEFAULT_CODESPACE,
                    CodeType::TX_DECODE,
                    e.to_string(),
                ))
            }
        };

        if let Err(e) = msg.validate_basic() {
            return SideTxResponse::from_error(e);
        }

        let Some(handlers) = self.router.get_route(msg.route()) else {
            return SideTxResponse::from_error(TxError::unknown_request(format!(
                "Unrecognized side message route: {}",
                msg.route()
            )));
        };

        let mut scope = CacheStore::new(state);
        let mut ctx = Context::new(&mut scope, height, tx_bytes);

        let result = catch_unwind(AssertUnwindSafe(|| {
            handlers.side().handle_side_tx(&mut ctx, &msg)
        }));

        drop(ctx);
        scope.discard();

        match result {
            Ok(response) if !response.is_ok() => SideTxResponse {
                data: Vec::new(),
                result: SideTxResult::Skip,
                ..response
            },
            Ok(response) if response.data.is_empty() => {
                response.with_data(msg.side_sign_bytes())
            }
            Ok(response) => response,
            Err(panic) => {
                error!(
                    %height,
                    route = msg.route(),
                    reason = panic_message(panic.as_ref()),
                    "Side handler panicked"
                );

                SideTxResponse::from_error(TxError::internal("Side handler panicked"))
            }
        }
    }

    /// Replays the side messages of the transactions committed `tx_delay` blocks before `height`.
    ///
    /// Every cached transaction of the target height is evicted exactly once, whatever its
    /// outcome. Post handlers run in a child scope of `state` that is merged only if they succeed,
    /// in which case their events are returned. Handler errors and panics are contained to the
    /// transaction that caused them; only storage failures are returned as errors.
    pub fn begin_side_block(
        &self,
        state: &mut dyn KvStore,
        height: Height,
        votes: &SideVotes,
    ) -> Result<Vec<Event>, StoreError> {
        if height.as_u64() <= self.tx_delay {
            return Ok(Vec::new());
        }

        let Some(target) = height.decrement_by(self.tx_delay) else {
            return Ok(Vec::new());
        };

        let txs = state.get_side_txs(target)?;
        let mut events = Vec::new();

        if txs.is_empty() {
            self.prune_snapshot(state, target)?;
            return Ok(events);
        }

        let snapshot = state
            .get_validator_snapshot(target)?
            .filter(|snapshot| !snapshot.is_empty());

        let Some(snapshot) = snapshot else {
            warn!(
                %height, %target, txs = txs.len(),
                "No validator snapshot for cached side txs, evicting without replay"
            );

            for tx in &txs {
                self.evict(state, tx)?;
            }

            self.prune_snapshot(state, target)?;
            return Ok(events);
        };

        debug!(
            %height, %target, txs = txs.len(), validators = snapshot.len(),
            "Replaying side txs"
        );

        for tx in &txs {
            self.evict(state, tx)?;

            let emitted = self.replay(state, height, tx, votes, &snapshot)?;
            events.extend(emitted);
        }

        // A post handler may have written a cached entry back into its scope.
        for tx in state.get_side_txs(target)? {
            warn!(%target, tx_hash = %tx.tx_hash, "Side tx reappeared after replay, evicting");
            self.evict(state, &tx)?;
        }

        self.prune_snapshot(state, target)?;

        Ok(events)
    }

    fn replay(
        &self,
        state: &mut dyn KvStore,
        height: Height,
        tx: &CachedSideTx,
        votes: &SideVotes,
        snapshot: &ValidatorSnapshot,
    ) -> Result<Vec<Event>, StoreError> {
        let msg = match self.codec.decode(&tx.raw) {
            Ok(msg) => msg,
            Err(e) => {
                error!(%height, tx_hash = %tx.tx_hash, "Failed to decode cached side tx: {e}");
                self.metrics.post_tx_failures.inc();
                return Ok(Vec::new());
            }
        };

        let route = msg.route();

        let Some(handlers) = self.router.get_route(route) else {
            warn!(%height, tx_hash = %tx.tx_hash, %route, "No side handlers for cached side tx");
            self.metrics.side_txs_skipped.inc();
            return Ok(Vec::new());
        };

        let tally = VoteTally::count(votes.get(&tx.tx_hash).into_iter().flatten(), snapshot);
        let outcome = tally.outcome();

        match outcome {
            SideTxResult::Yes => self.metrics.side_txs_approved.inc(),
            SideTxResult::No => self.metrics.side_txs_rejected.inc(),
            SideTxResult::Skip => self.metrics.side_txs_skipped.inc(),
        };

        info!(
            %height,
            tx_hash = %tx.tx_hash,
            %route,
            yes = tally.yes,
            no = tally.no,
            skip = tally.skip,
            total = tally.total,
            %outcome,
            "Tallied side tx votes"
        );

        let mut scope = CacheStore::new(state);
        let mut ctx = Context::new(&mut scope, height, &tx.raw);

        let result = catch_unwind(AssertUnwindSafe(|| {
            handlers.post().handle_post_tx(&mut ctx, &msg, outcome)
        }));

        let emitted = ctx.into_events();

        match result {
            Ok(Ok(())) => {
                scope.write()?;
                debug!(%height, tx_hash = %tx.tx_hash, events = emitted.len(), "Applied side tx");
                Ok(emitted)
            }
            Ok(Err(e)) => {
                scope.discard();
                self.metrics.post_tx_failures.inc();
                info!(
                    %height, tx_hash = %tx.tx_hash, code = %e.code,
                    "Post handler failed, discarding its writes: {}", e.message
                );
                Ok(Vec::new())
            }
            Err(panic) => {
                scope.discard();
                self.metrics.post_tx_panics.inc();
                error!(
                    %height,
                    tx_hash = %tx.tx_hash,
                    reason = panic_message(panic.as_ref()),
                    "Post handler panicked, discarding its writes"
                );
                Ok(Vec::new())
            }
        }
    }

    fn evict(&self, state: &mut dyn KvStore, tx: &CachedSideTx) -> Result<(), StoreError> {
        state.remove_side_tx(tx.height, &tx.tx_hash)?;
        self.metrics.side_txs_evicted.inc();
        Ok(())
    }

    fn prune_snapshot(&self, state: &mut dyn KvStore, height: Height) -> Result<(), StoreError> {
        if self.prune_snapshots {
            state.remove_validator_snapshot(height)?;
        }

        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
