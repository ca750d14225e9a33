//! Authority roles, the replication boundary, and observer dead-reckoning

use glam::{Quat, Vec3};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::game::kinematics::Kinematics;
use crate::game::math::look_rotation;

use super::protocol::{Envelope, ProjectileRpc, RpcTarget};

/// Who drives a projectile's motion on this peer. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// This peer fired it: runs physics and replicates results
    Owner,
    /// Another peer owns it: follows snapshots, never runs physics
    Mirror,
    /// Purely local: runs physics, never touches the network
    LocalOnly,
}

impl Authority {
    pub fn resolve(owner: Uuid, local_peer: Uuid, local_only: bool) -> Self {
        if local_only {
            Self::LocalOnly
        } else if owner == local_peer {
            Self::Owner
        } else {
            Self::Mirror
        }
    }

    pub fn simulates_physics(&self) -> bool {
        !matches!(self, Self::Mirror)
    }

    pub fn replicates(&self) -> bool {
        matches!(self, Self::Owner)
    }
}

/// The transport boundary as seen by the simulation
pub trait Replicator {
    /// Identity of this peer
    fn local_peer(&self) -> Uuid;

    /// Send an invocation; delivery failures are the transport's to log
    fn invoke_remote(&self, target: RpcTarget, rpc: ProjectileRpc);

    fn is_authoritative(&self, owner: Uuid) -> bool {
        owner == self.local_peer()
    }
}

/// Replicator that only records what it was asked to send
#[derive(Debug, Default)]
pub struct RecordingReplicator {
    peer: Uuid,
    sent: Mutex<Vec<Envelope>>,
}

impl RecordingReplicator {
    pub fn new(peer: Uuid) -> Self {
        Self {
            peer,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Take everything recorded so far
    pub fn drain(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn count(&self, kind: &str) -> usize {
        self.sent.lock().iter().filter(|e| e.rpc.kind() == kind).count()
    }
}

impl Replicator for RecordingReplicator {
    fn local_peer(&self) -> Uuid {
        self.peer
    }

    fn invoke_remote(&self, target: RpcTarget, rpc: ProjectileRpc) {
        self.sent.lock().push(Envelope::new(self.peer, target, rpc));
    }
}

/// Extrapolates a mirrored projectile between owner snapshots
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadReckoning {
    last_snapshot: Option<(Vec3, f64)>,
    velocity: Vec3,
}

impl DeadReckoning {
    /// Start from the launch velocity implied by the fire command
    pub fn new(initial_velocity: Vec3) -> Self {
        Self {
            last_snapshot: None,
            velocity: initial_velocity,
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Snap to an owner pose and re-derive velocity from the previous one.
    /// Stale or out-of-order snapshots are ignored.
    pub fn apply_snapshot(
        &mut self,
        kinematics: &mut Kinematics,
        position: Vec3,
        rotation: Quat,
        sim_time: f64,
    ) -> bool {
        if let Some((previous, previous_time)) = self.last_snapshot {
            if sim_time <= previous_time {
                return false;
            }
            let elapsed = (sim_time - previous_time) as f32;
            self.velocity = (position - previous) / elapsed;
        }
        self.last_snapshot = Some((position, sim_time));

        kinematics.position = position;
        kinematics.rotation = rotation;
        kinematics.velocity = self.velocity;
        true
    }

    /// Advance along the last known velocity
    pub fn extrapolate(&self, kinematics: &mut Kinematics, dt: f32) {
        kinematics.position += self.velocity * dt;
        kinematics.velocity = self.velocity;
        if self.velocity.length_squared() > 1e-12 {
            kinematics.rotation = look_rotation(self.velocity);
        }
    }
}
