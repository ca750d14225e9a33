//! Replication boundary: wire types, authority policy and the relay

pub mod authority;
pub mod protocol;
pub mod relay;

pub use authority::{Authority, DeadReckoning, RecordingReplicator, Replicator};
pub use protocol::{Envelope, ProjectileRpc, RpcTarget};
pub use relay::{Relay, RelayHandle};
