//! Fixtures for exercising the side-channel engine end to end: validator factories, a scripted
//! external chain, and a single-node harness driving [`anchor_app::SideChannelApp`].

mod chain;
mod node;
mod validators;

pub use chain::MockChainClient;
pub use node::TestNode;
pub use validators::{make_pub_key, make_validator, make_validators, snapshot_of, votes};
