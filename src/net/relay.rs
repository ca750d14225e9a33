//! In-process relay routing invocations between peers

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::authority::Replicator;
use super::protocol::{Envelope, ProjectileRpc, RpcTarget};

/// Per-peer inbox capacity
const INBOX_CAPACITY: usize = 1024;

/// Fans envelopes out to connected peers by target
pub struct Relay {
    peers: DashMap<Uuid, mpsc::Sender<Envelope>>,
    buffered: Mutex<Vec<Envelope>>,
}

impl Relay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            peers: DashMap::new(),
            buffered: Mutex::new(Vec::new()),
        })
    }

    /// Connect a peer. Buffered invocations are replayed into its inbox first.
    pub fn join(self: &Arc<Self>, peer_id: Uuid) -> (RelayHandle, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);

        let replay: Vec<Envelope> = self
            .buffered
            .lock()
            .iter()
            .filter(|e| e.is_for(peer_id))
            .cloned()
            .collect();
        for envelope in replay {
            if tx.try_send(envelope).is_err() {
                warn!(peer_id = %peer_id, "Inbox full during buffered replay");
                break;
            }
        }

        self.peers.insert(peer_id, tx);
        info!(peer_id = %peer_id, peers = self.peers.len(), "Peer joined relay");

        (
            RelayHandle {
                peer_id,
                relay: self.clone(),
            },
            rx,
        )
    }

    /// Disconnect a peer, drop anything it buffered and tell the rest
    pub fn leave(&self, peer_id: &Uuid) {
        if self.peers.remove(peer_id).is_none() {
            return;
        }
        self.buffered.lock().retain(|e| e.sender != *peer_id);
        info!(peer_id = %peer_id, peers = self.peers.len(), "Peer left relay");

        self.route(Envelope::new(
            *peer_id,
            RpcTarget::Others,
            ProjectileRpc::PeerLeft { peer_id: *peer_id },
        ));
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn buffered_count(&self) -> usize {
        self.buffered.lock().len()
    }

    /// Deliver an envelope to every recipient its target names
    pub fn route(&self, envelope: Envelope) {
        if envelope.target.is_buffered() {
            self.buffered.lock().push(envelope.clone());
        }

        for peer in self.peers.iter() {
            if !envelope.is_for(*peer.key()) {
                continue;
            }
            match peer.value().try_send(envelope.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        peer_id = %peer.key(),
                        rpc = envelope.rpc.kind(),
                        "Peer inbox full, dropping invocation"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(peer_id = %peer.key(), "Peer inbox closed");
                }
            }
        }
    }
}

/// A peer's connection to the relay
#[derive(Clone)]
pub struct RelayHandle {
    peer_id: Uuid,
    relay: Arc<Relay>,
}

impl RelayHandle {
    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }
}

impl Replicator for RelayHandle {
    fn local_peer(&self) -> Uuid {
        self.peer_id
    }

    fn invoke_remote(&self, target: RpcTarget, rpc: ProjectileRpc) {
        self.relay.route(Envelope::new(self.peer_id, target, rpc));
    }
}
