use anchor_core_types::TxError;

/// Encodes and decodes the transactions the engine caches and replays.
pub trait Codec<T>: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn decode(&self, bytes: &[u8]) -> Result<T, Self::Error>;
    fn encode(&self, msg: &T) -> Result<Vec<u8>, Self::Error>;
}

/// A message that may carry a fact about the external chain.
pub trait SideMsg {
    /// Name of the route the message is dispatched on.
    fn route(&self) -> &str;

    /// Bytes validators sign when the side handler returns no data of its own.
    fn side_sign_bytes(&self) -> Vec<u8>;

    /// Stateless structural checks, run before any handler.
    fn validate_basic(&self) -> Result<(), TxError> {
        Ok(())
    }
}
