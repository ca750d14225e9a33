//! Remote invocation message definitions
//! These are the wire types exchanged between peers through the relay

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::hook::{HookState, ReleaseCause};

/// Which peers receive an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcTarget {
    /// Only the sending peer
    Mine,
    /// Every peer except the sender
    Others,
    /// Every peer including the sender
    All,
    /// Others, and replayed to peers joining later
    OthersBuffered,
    /// All, and replayed to peers joining later
    AllBuffered,
}

impl RpcTarget {
    pub fn includes_sender(&self) -> bool {
        matches!(self, Self::Mine | Self::All | Self::AllBuffered)
    }

    pub fn includes_others(&self) -> bool {
        !matches!(self, Self::Mine)
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::OthersBuffered | Self::AllBuffered)
    }
}

/// Projectile and hook invocations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectileRpc {
    /// A projectile was fired; receivers spawn a mirror at the muzzle pose
    Fire {
        projectile_id: Uuid,
        owner_id: Uuid,
        /// Catalog key of the settings, resolved by the receiver
        settings_key: String,
        position: Vec3,
        rotation: Quat,
    },

    /// Corrective pose from the owner
    Snapshot {
        projectile_id: Uuid,
        position: Vec3,
        rotation: Quat,
        /// Owner's simulation time when the pose was taken
        sim_time: f64,
    },

    /// Damage to apply exactly once on every peer
    ApplyDamage {
        hit_id: Uuid,
        projectile_id: Uuid,
        shooter_id: Uuid,
        target_id: Uuid,
        damage: f32,
        knockback: Vec3,
        point: Vec3,
    },

    /// The owner disposed of the projectile (hit or burnout)
    Destroy {
        projectile_id: Uuid,
    },

    /// A hook left its launcher
    HookFired {
        hook_id: Uuid,
        owner_id: Uuid,
        settings_key: String,
        position: Vec3,
        rotation: Quat,
    },

    /// A hook attached to geometry or a player
    HookAttached {
        hook_id: Uuid,
        state: HookState,
        point: Vec3,
        player: Option<Uuid>,
    },

    /// A hook started retracting
    HookReleased {
        hook_id: Uuid,
        cause: ReleaseCause,
        position: Vec3,
    },

    /// A hook is back on its launcher
    HookStowed {
        hook_id: Uuid,
    },

    /// A peer disconnected; receivers drop everything it owned
    PeerLeft {
        peer_id: Uuid,
    },
}

impl ProjectileRpc {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fire { .. } => "fire",
            Self::Snapshot { .. } => "snapshot",
            Self::ApplyDamage { .. } => "apply_damage",
            Self::Destroy { .. } => "destroy",
            Self::HookFired { .. } => "hook_fired",
            Self::HookAttached { .. } => "hook_attached",
            Self::HookReleased { .. } => "hook_released",
            Self::HookStowed { .. } => "hook_stowed",
            Self::PeerLeft { .. } => "peer_left",
        }
    }
}

/// An invocation in transit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: Uuid,
    pub target: RpcTarget,
    pub rpc: ProjectileRpc,
}

impl Envelope {
    pub fn new(sender: Uuid, target: RpcTarget, rpc: ProjectileRpc) -> Self {
        Self {
            sender,
            target,
            rpc,
        }
    }

    /// Whether `peer` is a recipient of this envelope
    pub fn is_for(&self, peer: Uuid) -> bool {
        if peer == self.sender {
            self.target.includes_sender()
        } else {
            self.target.includes_others()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_is_tagged_snake_case() {
        let rpc = ProjectileRpc::Fire {
            projectile_id: Uuid::nil(),
            owner_id: Uuid::nil(),
            settings_key: "rifle".to_string(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        };
        let json = serde_json::to_value(Envelope::new(Uuid::nil(), RpcTarget::Others, rpc.clone()))
            .unwrap();
        assert_eq!(json["target"], "others");
        assert_eq!(json["rpc"]["type"], "fire");
        assert_eq!(json["rpc"]["settings_key"], "rifle");

        let back: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(back.rpc, rpc);
    }

    #[test]
    fn recipients_follow_target() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let rpc = ProjectileRpc::Destroy {
            projectile_id: Uuid::nil(),
        };

        let mine = Envelope::new(me, RpcTarget::Mine, rpc.clone());
        assert!(mine.is_for(me) && !mine.is_for(other));

        let others = Envelope::new(me, RpcTarget::OthersBuffered, rpc.clone());
        assert!(!others.is_for(me) && others.is_for(other));

        let all = Envelope::new(me, RpcTarget::All, rpc);
        assert!(all.is_for(me) && all.is_for(other));
    }
}
