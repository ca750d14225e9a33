//! Grappling hook: a reusable projectile with a five-state lifecycle
//!
//! One hook belongs to one launcher and is fired, attached, released and
//! stowed indefinitely. Flight reuses the projectile kinematics; everything
//! after the flight is driven by the state machine here.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::kinematics::{Homing, Kinematics, StepOutcome};
use super::math::{look_rotation, Pose};
use super::physics::{HitInfo, QueryFilter};
use super::projectile::{Impact, Muzzle};
use super::settings::{HookshotSettings, LineCheckPolicy, ProjectileSettings};
use super::WorldView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookState {
    Stowed,
    Deployed,
    Retracting,
    /// Holding a fixed point on static geometry
    Hooked,
    /// Following another player's aim point
    PlayerTethered,
}

/// Why a hook started retracting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseCause {
    /// The player let go
    Requested,
    /// Range ran out mid-flight
    Burnout,
    /// Something crossed the tether line
    LineObstructed,
    /// Struck a bounce surface
    Bounced,
    /// The tethered player is gone
    TargetLost,
    /// The hook resolved onto its own owner
    SelfHit,
}

/// The equipment a hook is fired from. Feedback hooks default to no-ops.
pub trait Launcher: Muzzle {
    /// Point the hook retracts to and faces back toward
    fn anchor_position(&self) -> Vec3;

    fn on_hit_obstacle(&mut self) {}
    fn on_hit_player(&mut self, _player: Uuid) {}
    fn on_released(&mut self) {}
    fn on_force_released(&mut self) {}
    fn on_bounced(&mut self) {}
}

/// Where the hook is attached in the scene hierarchy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HookParent {
    StowAnchor,
    World,
    Player(Uuid),
}

/// Rendered line between launcher and hook
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TetherLine {
    pub enabled: bool,
    pub start: Vec3,
    pub end: Vec3,
}

/// Something observers should know about, produced by a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HookEvent {
    Fired(Pose),
    Attached {
        state: HookState,
        point: Vec3,
        player: Option<Uuid>,
    },
    Released(ReleaseCause),
    Stowed,
    /// Damage to deliver for a hit on a damageable
    Impact(Impact),
}

#[derive(Debug, Clone)]
pub struct HookProjectile {
    id: Uuid,
    owner: Uuid,
    settings: Arc<HookshotSettings>,
    /// Flight tuning shared with the homing task
    flight: Arc<ProjectileSettings>,
    state: HookState,
    time_in_state: f32,
    retract_speed: f32,
    kinematics: Kinematics,
    homing: Option<Homing>,
    parent: HookParent,
    hooked_point: Option<Vec3>,
    tethered_player: Option<Uuid>,
    tether: Option<TetherLine>,
    visible: bool,
    /// Observer copies follow replicated transitions instead of simulating
    mirrored: bool,
}

impl HookProjectile {
    /// A stowed hook. Without a tether line the hook works but draws no line.
    pub fn new(
        id: Uuid,
        owner: Uuid,
        settings: Arc<HookshotSettings>,
        tether: Option<TetherLine>,
    ) -> Self {
        if tether.is_none() {
            warn!(hook_id = %id, "Hook has no tether line, line rendering disabled");
        }
        Self {
            id,
            owner,
            flight: Arc::new(settings.projectile.clone()),
            settings,
            state: HookState::Stowed,
            time_in_state: 0.0,
            retract_speed: 0.0,
            kinematics: Kinematics::default(),
            homing: None,
            parent: HookParent::StowAnchor,
            hooked_point: None,
            tethered_player: None,
            tether,
            visible: false,
            mirrored: false,
        }
    }

    /// Observer copy of another peer's hook
    pub fn mirror(id: Uuid, owner: Uuid, settings: Arc<HookshotSettings>) -> Self {
        let mut hook = Self::new(id, owner, settings, Some(TetherLine::default()));
        hook.mirrored = true;
        hook
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn state(&self) -> HookState {
        self.state
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn retract_speed(&self) -> f32 {
        self.retract_speed
    }

    pub fn position(&self) -> Vec3 {
        self.kinematics.position
    }

    pub fn rotation(&self) -> Quat {
        self.kinematics.rotation
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn parent(&self) -> HookParent {
        self.parent
    }

    pub fn hooked_point(&self) -> Option<Vec3> {
        self.hooked_point
    }

    pub fn tethered_player(&self) -> Option<Uuid> {
        self.tethered_player
    }

    pub fn tether(&self) -> Option<&TetherLine> {
        self.tether.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn target(&self) -> Option<Uuid> {
        self.homing.as_ref().and_then(|h| h.target())
    }

    fn filter(&self) -> QueryFilter {
        QueryFilter::new(self.settings.projectile.ignore_layers, Some(self.owner))
    }

    fn transition(&mut self, next: HookState) {
        debug!(hook_id = %self.id, from = ?self.state, to = ?next, "Hook transition");
        self.state = next;
        self.time_in_state = 0.0;
    }

    fn set_tether(&mut self, enabled: bool) {
        if let Some(tether) = self.tether.as_mut() {
            tether.enabled = enabled;
        }
    }

    /// Stowed -> Deployed. Ignored in any other state.
    pub fn fire(&mut self, launcher: &mut dyn Launcher, world: &WorldView<'_>) -> Vec<HookEvent> {
        if self.state != HookState::Stowed {
            debug!(hook_id = %self.id, state = ?self.state, "Hook fire ignored, not stowed");
            return Vec::new();
        }

        let pose = launcher.muzzle_pose();
        let projectile = self.flight.clone();
        self.parent = HookParent::World;
        self.kinematics.launch(pose, projectile.initial_velocity);
        self.visible = true;
        self.set_tether(true);
        self.transition(HookState::Deployed);

        let mut events = vec![HookEvent::Fired(pose)];
        if self.mirrored {
            return events;
        }

        self.homing = Homing::start(&self.flight, world);

        if projectile.barrel_gap > 0.0 {
            let filter = self.filter();
            let outcome = self.kinematics.barrel_step(
                projectile.barrel_gap,
                projectile.range,
                world.physics,
                &filter,
            );
            self.settle_flight(outcome, launcher, world, &mut events);
        }
        events
    }

    /// Start retracting. No-op while stowed or already retracting.
    pub fn release(&mut self, launcher: &mut dyn Launcher) -> Vec<HookEvent> {
        self.release_with(ReleaseCause::Requested, launcher)
    }

    pub fn release_with(&mut self, cause: ReleaseCause, launcher: &mut dyn Launcher) -> Vec<HookEvent> {
        if matches!(self.state, HookState::Stowed | HookState::Retracting) {
            return Vec::new();
        }

        match cause {
            ReleaseCause::Requested | ReleaseCause::Burnout => launcher.on_released(),
            ReleaseCause::Bounced => launcher.on_bounced(),
            ReleaseCause::LineObstructed | ReleaseCause::TargetLost | ReleaseCause::SelfHit => {
                launcher.on_force_released()
            }
        }

        if let Some(homing) = self.homing.as_mut() {
            homing.cancel();
        }
        self.homing = None;
        self.hooked_point = None;
        self.tethered_player = None;
        self.parent = HookParent::World;
        self.retract_speed = self.settings.retract_speed;
        self.transition(HookState::Retracting);

        vec![HookEvent::Released(cause)]
    }

    /// Fixed-timestep update
    pub fn tick(
        &mut self,
        dt: f32,
        launcher: &mut dyn Launcher,
        world: &WorldView<'_>,
    ) -> Vec<HookEvent> {
        let mut events = Vec::new();
        self.time_in_state += dt;

        match self.state {
            HookState::Stowed => {
                self.kinematics.position = launcher.anchor_position();
            }
            HookState::Deployed => {
                if !self.mirrored {
                    self.tick_deployed(dt, launcher, world, &mut events);
                } else {
                    self.kinematics.position += self.kinematics.velocity * dt;
                }
            }
            HookState::Hooked => {
                if let Some(point) = self.hooked_point {
                    self.kinematics.position = point;
                }
            }
            HookState::PlayerTethered => match self.tethered_player {
                Some(player) => match world.targets.get(&player) {
                    Some(target) => self.kinematics.position = target.aim_point(),
                    None if !self.mirrored => {
                        debug!(hook_id = %self.id, player_id = %player, "Tethered player gone");
                        events.extend(self.release_with(ReleaseCause::TargetLost, launcher));
                    }
                    None => {}
                },
                None => {
                    events.extend(self.release_with(ReleaseCause::TargetLost, launcher));
                }
            },
            HookState::Retracting => {
                self.retract_speed += self.settings.retract_acceleration * dt;
                let anchor = launcher.anchor_position();
                let to_anchor = anchor - self.kinematics.position;
                let step = self.retract_speed * dt;
                let remaining = to_anchor.length();

                if remaining <= self.settings.stow_distance.max(step) {
                    self.stow(launcher);
                    events.push(HookEvent::Stowed);
                } else {
                    self.kinematics.position += to_anchor / remaining * step;
                }
            }
        }

        events
    }

    /// Variable-timestep update: orientation and tether endpoints
    pub fn late_update(&mut self, launcher: &dyn Launcher) {
        let anchor = launcher.anchor_position();
        match self.state {
            HookState::Hooked | HookState::PlayerTethered | HookState::Retracting => {
                let back = anchor - self.kinematics.position;
                if back.length_squared() > 1e-8 {
                    self.kinematics.rotation = look_rotation(back);
                }
            }
            HookState::Deployed | HookState::Stowed => {}
        }

        let position = self.kinematics.position;
        if let Some(tether) = self.tether.as_mut() {
            tether.start = anchor;
            tether.end = position;
        }
    }

    fn tick_deployed(
        &mut self,
        dt: f32,
        launcher: &mut dyn Launcher,
        world: &WorldView<'_>,
        events: &mut Vec<HookEvent>,
    ) {
        if self.settings.line_check != LineCheckPolicy::Ignore {
            let filter = self.filter();
            let anchor = launcher.anchor_position();
            if let Some(hit) = world.physics.linecast(anchor, self.kinematics.position, &filter) {
                match self.settings.line_check {
                    LineCheckPolicy::Release => {
                        debug!(hook_id = %self.id, "Tether line obstructed, releasing");
                        events.extend(self.release_with(ReleaseCause::LineObstructed, launcher));
                    }
                    LineCheckPolicy::Grab => self.resolve_hit(&hit, launcher, world, events),
                    LineCheckPolicy::Ignore => {}
                }
                return;
            }
        }

        let projectile = self.flight.clone();
        let filter = self.filter();

        self.kinematics.apply_drop(projectile.drop, dt);
        if let Some(homing) = self.homing.as_mut() {
            homing.update(dt, &mut self.kinematics, &projectile, filter, world);
        }

        let outcome = self
            .kinematics
            .integrate(dt, projectile.range, world.physics, &filter);
        self.settle_flight(outcome, launcher, world, events);
    }

    fn settle_flight(
        &mut self,
        outcome: StepOutcome,
        launcher: &mut dyn Launcher,
        world: &WorldView<'_>,
        events: &mut Vec<HookEvent>,
    ) {
        match outcome {
            StepOutcome::Moved => {}
            StepOutcome::Hit(hit) => self.resolve_hit(&hit, launcher, world, events),
            StepOutcome::BurnedOut => {
                events.extend(self.release_with(ReleaseCause::Burnout, launcher));
            }
        }
    }

    fn resolve_hit(
        &mut self,
        hit: &HitInfo,
        launcher: &mut dyn Launcher,
        world: &WorldView<'_>,
        events: &mut Vec<HookEvent>,
    ) {
        if self.settings.bounce_layers.contains(hit.layer) {
            events.extend(self.release_with(ReleaseCause::Bounced, launcher));
            return;
        }

        let struck_player = world.capabilities.player(hit.collider);
        if struck_player == Some(self.owner) {
            error!(hook_id = %self.id, owner_id = %self.owner, "Hook resolved onto its own owner, refusing hit");
            events.extend(self.release_with(ReleaseCause::SelfHit, launcher));
            return;
        }

        if let Some(homing) = self.homing.as_mut() {
            homing.cancel();
        }
        self.homing = None;

        let damage = self.settings.projectile.damage;
        if damage > 0.0 {
            if let Some(damageable) = world.capabilities.damageable(hit.collider) {
                events.push(HookEvent::Impact(Impact {
                    point: hit.point,
                    collider: hit.collider,
                    damageable: Some(damageable),
                    damage,
                    knockback: self.kinematics.velocity.normalize_or_zero()
                        * self.settings.projectile.knockback,
                }));
            }
        }

        match struck_player {
            Some(player) => {
                self.attach_to_player(player, hit.point, world);
                launcher.on_hit_player(player);
                events.push(HookEvent::Attached {
                    state: HookState::PlayerTethered,
                    point: self.kinematics.position,
                    player: Some(player),
                });
            }
            None => {
                self.attach_to_point(hit.point);
                launcher.on_hit_obstacle();
                events.push(HookEvent::Attached {
                    state: HookState::Hooked,
                    point: hit.point,
                    player: None,
                });
            }
        }
    }

    fn attach_to_player(&mut self, player: Uuid, fallback: Vec3, world: &WorldView<'_>) {
        self.tethered_player = Some(player);
        self.hooked_point = None;
        self.parent = HookParent::Player(player);
        self.kinematics.position = world
            .targets
            .get(&player)
            .map(|t| t.aim_point())
            .unwrap_or(fallback);
        self.kinematics.velocity = Vec3::ZERO;
        self.transition(HookState::PlayerTethered);
    }

    fn attach_to_point(&mut self, point: Vec3) {
        self.hooked_point = Some(point);
        self.tethered_player = None;
        self.parent = HookParent::World;
        self.kinematics.position = point;
        self.kinematics.velocity = Vec3::ZERO;
        self.transition(HookState::Hooked);
    }

    fn stow(&mut self, launcher: &dyn Launcher) {
        self.parent = HookParent::StowAnchor;
        self.kinematics = Kinematics {
            position: launcher.anchor_position(),
            ..Kinematics::default()
        };
        self.visible = false;
        self.set_tether(false);
        self.retract_speed = 0.0;
        self.hooked_point = None;
        self.tethered_player = None;
        self.transition(HookState::Stowed);
    }

    /// Snap a mirrored hook to the owner's reported position
    pub fn correct_position(&mut self, position: Vec3) {
        if self.mirrored {
            self.kinematics.position = position;
        }
    }

    /// Apply a transition replicated from the hook's owner
    pub fn apply_remote(&mut self, event: &HookEvent, launcher: &mut dyn Launcher, world: &WorldView<'_>) {
        match *event {
            HookEvent::Fired(pose) => {
                if self.state != HookState::Stowed {
                    self.stow(launcher);
                }
                self.parent = HookParent::World;
                self.kinematics.launch(pose, self.settings.projectile.initial_velocity);
                self.visible = true;
                self.set_tether(true);
                self.transition(HookState::Deployed);
            }
            HookEvent::Attached {
                state: HookState::PlayerTethered,
                point,
                player: Some(player),
            } => self.attach_to_player(player, point, world),
            HookEvent::Attached { point, .. } => self.attach_to_point(point),
            HookEvent::Released(_) => {
                if !matches!(self.state, HookState::Stowed | HookState::Retracting) {
                    self.hooked_point = None;
                    self.tethered_player = None;
                    self.parent = HookParent::World;
                    self.retract_speed = self.settings.retract_speed;
                    self.transition(HookState::Retracting);
                }
            }
            HookEvent::Stowed => self.stow(launcher),
            HookEvent::Impact(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::{Collider, SceneWorld};
    use crate::game::settings::LayerMask;
    use crate::game::targetable::{Targetable, TargetableRegistry};

    #[derive(Default)]
    struct Gun {
        owner: Uuid,
        obstacles: u32,
        players: Vec<Uuid>,
        released: u32,
        forced: u32,
        bounced: u32,
    }

    impl Muzzle for Gun {
        fn owner(&self) -> Uuid {
            self.owner
        }

        fn muzzle_pose(&self) -> Pose {
            Pose::default()
        }
    }

    impl Launcher for Gun {
        fn anchor_position(&self) -> Vec3 {
            Vec3::ZERO
        }

        fn on_hit_obstacle(&mut self) {
            self.obstacles += 1;
        }

        fn on_hit_player(&mut self, player: Uuid) {
            self.players.push(player);
        }

        fn on_released(&mut self) {
            self.released += 1;
        }

        fn on_force_released(&mut self) {
            self.forced += 1;
        }

        fn on_bounced(&mut self) {
            self.bounced += 1;
        }
    }

    fn hook(settings: HookshotSettings, owner: Uuid) -> HookProjectile {
        HookProjectile::new(Uuid::new_v4(), owner, Arc::new(settings), Some(TetherLine::default()))
    }

    fn run(hook: &mut HookProjectile, gun: &mut Gun, view: &WorldView<'_>, ticks: usize) {
        for _ in 0..ticks {
            hook.tick(0.02, gun, view);
            hook.late_update(&*gun);
        }
    }

    #[test]
    fn burnout_retracts_instead_of_destroying() {
        let world = SceneWorld::new();
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut gun = Gun::default();
        let mut h = hook(HookshotSettings::default(), gun.owner);

        h.fire(&mut gun, &view);
        assert_eq!(h.state(), HookState::Deployed);
        assert!(h.is_visible());

        // 30 units at 40 u/s: burnout well within 50 ticks
        run(&mut h, &mut gun, &view, 50);
        assert_ne!(h.state(), HookState::Deployed);
        assert_eq!(gun.released, 1);
        assert!(h.kinematics().distance_traveled <= 30.0);
    }

    #[test]
    fn retraction_accelerates_and_stows() {
        let world = SceneWorld::new();
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut gun = Gun::default();
        let mut h = hook(HookshotSettings::default(), gun.owner);

        h.fire(&mut gun, &view);
        run(&mut h, &mut gun, &view, 10);
        h.release(&mut gun);
        assert_eq!(h.state(), HookState::Retracting);
        assert_eq!(h.time_in_state(), 0.0);
        assert_eq!(h.retract_speed(), HookshotSettings::default().retract_speed);

        let mut last_speed = h.retract_speed();
        let mut stowed = false;
        for _ in 0..200 {
            let events = h.tick(0.02, &mut gun, &view);
            if events.contains(&HookEvent::Stowed) {
                stowed = true;
                break;
            }
            assert!(h.retract_speed() >= last_speed);
            last_speed = h.retract_speed();
        }
        assert!(stowed);
        assert_eq!(h.state(), HookState::Stowed);
        assert_eq!(h.retract_speed(), 0.0);
        assert!(!h.is_visible());
        assert_eq!(h.tether().map(|t| t.enabled), Some(false));
        assert_eq!(h.parent(), HookParent::StowAnchor);
    }

    #[test]
    fn static_hit_hooks_and_faces_launcher() {
        let mut world = SceneWorld::new();
        world.insert(Collider::cuboid(Vec3::new(-2.0, -2.0, 10.0), Vec3::new(2.0, 2.0, 11.0)));
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut gun = Gun::default();
        let mut h = hook(HookshotSettings::default(), gun.owner);

        h.fire(&mut gun, &view);
        run(&mut h, &mut gun, &view, 30);
        assert_eq!(h.state(), HookState::Hooked);
        assert_eq!(gun.obstacles, 1);
        let point = h.hooked_point().unwrap();
        assert!((point.z - 10.0).abs() < 1e-3);

        run(&mut h, &mut gun, &view, 30);
        assert_eq!(h.position(), point);
        let facing = h.rotation() * crate::game::math::FORWARD;
        assert!(facing.z < -0.99);
    }

    #[test]
    fn bounce_layer_retracts_with_bounce_feedback() {
        let mut world = SceneWorld::new();
        world.insert(
            Collider::cuboid(Vec3::new(-2.0, -2.0, 5.0), Vec3::new(2.0, 2.0, 6.0)).on_layer(7),
        );
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut gun = Gun::default();
        let mut h = hook(
            HookshotSettings {
                bounce_layers: LayerMask::of(&[7]),
                ..HookshotSettings::default()
            },
            gun.owner,
        );

        h.fire(&mut gun, &view);
        run(&mut h, &mut gun, &view, 20);
        assert_eq!(gun.bounced, 1);
        assert_eq!(gun.obstacles, 0);
        assert_ne!(h.state(), HookState::Hooked);
    }

    #[test]
    fn player_hit_tethers_and_tracks() {
        let victim = Uuid::new_v4();
        let mut world = SceneWorld::new();
        world.insert(
            Collider::sphere(Vec3::new(0.0, 0.0, 8.0), 1.0)
                .player(victim)
                .targetable(victim),
        );
        let registry = TargetableRegistry::new();
        registry.register(Targetable::new(victim, Vec3::new(0.0, 0.0, 8.0)).with_aim_point(Vec3::new(0.0, 0.5, 8.0)));
        let view = WorldView::new(&world, &registry);
        let mut gun = Gun {
            owner: Uuid::new_v4(),
            ..Gun::default()
        };
        let mut h = hook(HookshotSettings::default(), gun.owner);

        h.fire(&mut gun, &view);
        run(&mut h, &mut gun, &view, 20);
        assert_eq!(h.state(), HookState::PlayerTethered);
        assert_eq!(h.tethered_player(), Some(victim));
        assert_eq!(gun.players, vec![victim]);
        assert_eq!(h.position(), Vec3::new(0.0, 0.5, 8.0));

        registry.update(&victim, Vec3::new(3.0, 0.0, 8.0), Some(Vec3::new(3.0, 0.5, 8.0)));
        run(&mut h, &mut gun, &view, 1);
        assert_eq!(h.position(), Vec3::new(3.0, 0.5, 8.0));

        registry.unregister(&victim);
        run(&mut h, &mut gun, &view, 1);
        assert_ne!(h.state(), HookState::PlayerTethered);
        assert_eq!(gun.forced, 1);
    }

    #[test]
    fn never_tethers_to_own_owner() {
        let owner = Uuid::new_v4();
        let mut world = SceneWorld::new();
        // Owner's own body sits in the flight path
        world.insert(Collider::sphere(Vec3::new(0.0, 0.0, 5.0), 1.0).player(owner));
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut gun = Gun {
            owner,
            ..Gun::default()
        };
        let mut h = hook(HookshotSettings::default(), owner);

        h.fire(&mut gun, &view);
        for _ in 0..60 {
            h.tick(0.02, &mut gun, &view);
            assert_ne!(h.tethered_player(), Some(owner));
            assert_ne!(h.state(), HookState::PlayerTethered);
        }
    }

    #[test]
    fn line_obstruction_policies() {
        let mut world = SceneWorld::new();
        let registry = TargetableRegistry::new();
        let mut gun = Gun::default();

        let mut release = hook(
            HookshotSettings {
                line_check: LineCheckPolicy::Release,
                ..HookshotSettings::default()
            },
            gun.owner,
        );
        let mut grab = hook(
            HookshotSettings {
                line_check: LineCheckPolicy::Grab,
                ..HookshotSettings::default()
            },
            gun.owner,
        );
        {
            let view = WorldView::new(&world, &registry);
            release.fire(&mut gun, &view);
            grab.fire(&mut gun, &view);
            run(&mut release, &mut gun, &view, 10);
            run(&mut grab, &mut gun, &view, 10);
        }

        // A pillar appears between launcher and hook, off the flight path
        world.insert(Collider::cuboid(Vec3::new(-0.5, -0.5, 3.0), Vec3::new(0.5, 0.5, 3.5)));
        let view = WorldView::new(&world, &registry);
        release.tick(0.02, &mut gun, &view);
        grab.tick(0.02, &mut gun, &view);

        assert_eq!(release.state(), HookState::Retracting);
        assert_eq!(gun.forced, 1);
        assert_eq!(grab.state(), HookState::Hooked);
        assert!((grab.hooked_point().unwrap().z - 3.0).abs() < 1e-3);
    }

    #[test]
    fn release_is_total() {
        let world = SceneWorld::new();
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut gun = Gun::default();
        let mut h = hook(HookshotSettings::default(), gun.owner);

        assert!(h.release(&mut gun).is_empty());
        assert_eq!(h.state(), HookState::Stowed);

        h.fire(&mut gun, &view);
        assert_eq!(h.release(&mut gun), vec![HookEvent::Released(ReleaseCause::Requested)]);
        assert_eq!(h.state(), HookState::Retracting);
        assert!(h.release(&mut gun).is_empty());

        // Firing while retracting is refused
        assert!(h.fire(&mut gun, &view).is_empty());
    }

    #[test]
    fn missing_tether_is_tolerated() {
        let world = SceneWorld::new();
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut gun = Gun::default();
        let mut h = HookProjectile::new(Uuid::new_v4(), gun.owner, Arc::new(HookshotSettings::default()), None);

        h.fire(&mut gun, &view);
        run(&mut h, &mut gun, &view, 5);
        assert!(h.tether().is_none());
        assert_eq!(h.state(), HookState::Deployed);
    }
}
