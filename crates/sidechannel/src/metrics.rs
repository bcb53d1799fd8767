use anchor_metrics::{Counter, Gauge, SharedRegistry};

#[derive(Clone, Debug, Default)]
pub struct SideChannelMetrics {
    /// Number of committed transactions cached for side-channel voting
    pub side_txs_cached: Counter,

    /// Number of side transactions replayed with a `Yes` outcome
    pub side_txs_approved: Counter,

    /// Number of side transactions replayed with a `No` outcome
    pub side_txs_rejected: Counter,

    /// Number of side transactions replayed with a `Skip` outcome
    pub side_txs_skipped: Counter,

    /// Number of post handlers that returned an error
    pub post_tx_failures: Counter,

    /// Number of post handlers that panicked
    pub post_tx_panics: Counter,

    /// Number of cached side transactions evicted after their replay window
    pub side_txs_evicted: Counter,

    /// Number of validators in the active set
    pub validator_set_size: Gauge,

    /// Total voting power of the active set
    pub total_voting_power: Gauge,
}

impl SideChannelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(registry: &SharedRegistry) -> Self {
        Self::register_with_prefix(registry, "anchor_sidechannel")
    }

    pub fn register_with_prefix(registry: &SharedRegistry, prefix: impl AsRef<str>) -> Self {
        let metrics = Self::new();

        registry.with_prefix(prefix, |registry| {
            registry.register(
                "side_txs_cached",
                "Number of committed transactions cached for side-channel voting",
                metrics.side_txs_cached.clone(),
            );

            registry.register(
                "side_txs_approved",
                "Number of side transactions replayed with a Yes outcome",
                metrics.side_txs_approved.clone(),
            );

            registry.register(
                "side_txs_rejected",
                "Number of side transactions replayed with a No outcome",
                metrics.side_txs_rejected.clone(),
            );

            registry.register(
                "side_txs_skipped",
                "Number of side transactions replayed with a Skip outcome",
                metrics.side_txs_skipped.clone(),
            );

            registry.register(
                "post_tx_failures",
                "Number of post handlers that returned an error",
                metrics.post_tx_failures.clone(),
            );

            registry.register(
                "post_tx_panics",
                "Number of post handlers that panicked",
                metrics.post_tx_panics.clone(),
            );

            registry.register(
                "side_txs_evicted",
                "Number of cached side transactions evicted after their replay window",
                metrics.side_txs_evicted.clone(),
            );

            registry.register(
                "validator_set_size",
                "Number of validators in the active set",
                metrics.validator_set_size.clone(),
            );

            registry.register(
                "total_voting_power",
                "Total voting power of the active set",
                metrics.total_voting_power.clone(),
            );
        });

        metrics
    }
}
