//! Projectile simulation modules

pub mod acquisition;
pub mod combat;
pub mod hook;
pub mod kinematics;
pub mod math;
pub mod physics;
pub mod projectile;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod targetable;

pub use hook::{HookProjectile, HookState, Launcher, ReleaseCause};
pub use math::Pose;
pub use physics::{CapabilityLookup, CollisionWorld, PhysicsQuery, SceneWorld};
pub use projectile::Projectile;
pub use session::{PeerSession, PeerSimulation, SessionCommand, SessionHandle};
pub use settings::{HookshotSettings, ProjectileSettings, SettingsCatalog};
pub use targetable::{Targetable, TargetableRegistry};

/// Read-only view of the world a tick runs against
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub physics: &'a dyn PhysicsQuery,
    pub capabilities: &'a dyn CapabilityLookup,
    pub targets: &'a TargetableRegistry,
}

impl<'a> WorldView<'a> {
    pub fn new<W: CollisionWorld>(world: &'a W, targets: &'a TargetableRegistry) -> Self {
        Self {
            physics: world,
            capabilities: world,
            targets,
        }
    }
}
