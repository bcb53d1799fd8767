use anchor_core_types::{Event, Height, TxHash};
use anchor_store::KvStore;

/// Execution context handed to side and post handlers.
///
/// The store is a child scope created by the coordinator: writes only reach the block state if
/// the handler succeeds. Events are collected here and appended to the block's event log under
/// the same condition.
pub struct Context<'a> {
    store: &'a mut dyn KvStore,
    height: Height,
    tx_bytes: &'a [u8],
    events: Vec<Event>,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a mut dyn KvStore, height: Height, tx_bytes: &'a [u8]) -> Self {
        Self {
            store,
            height,
            tx_bytes,
            events: Vec::new(),
        }
    }

    /// Height of the block being executed.
    pub fn height(&self) -> Height {
        self.height
    }

    pub fn tx_bytes(&self) -> &[u8] {
        self.tx_bytes
    }

    pub fn tx_hash(&self) -> TxHash {
        TxHash::digest(self.tx_bytes)
    }

    pub fn store(&self) -> &dyn KvStore {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn KvStore {
        &mut *self.store
    }

    pub fn emit_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}
