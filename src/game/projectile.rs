//! Fire-and-forget projectiles: one instance per shot, disposed on hit or burnout

use glam::{Quat, Vec3};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::net::authority::{Authority, DeadReckoning};

use super::kinematics::{Homing, Kinematics, StepOutcome};
use super::math::Pose;
use super::physics::{ColliderId, HitInfo, QueryFilter};
use super::settings::{resolve_settings, ProjectileSettings};
use super::WorldView;

/// Something projectiles leave from: a barrel, a launcher
pub trait Muzzle {
    fn owner(&self) -> Uuid;
    fn muzzle_pose(&self) -> Pose;
}

/// A resolved hit, ready to be turned into a damage notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub point: Vec3,
    pub collider: ColliderId,
    /// Damageable entity found on the collider or its parents
    pub damageable: Option<Uuid>,
    pub damage: f32,
    pub knockback: Vec3,
}

/// What happened to a projectile this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileEvent {
    Flying,
    Impact(Impact),
    BurnedOut,
}

/// One projectile as seen by one peer
#[derive(Debug, Clone)]
pub struct Projectile {
    id: Uuid,
    owner: Uuid,
    settings_key: String,
    settings: Arc<ProjectileSettings>,
    authority: Authority,
    kinematics: Kinematics,
    /// Launch position, for the mirror range cap
    origin: Vec3,
    homing: Option<Homing>,
    mirror: Option<DeadReckoning>,
    alive: bool,
}

impl Projectile {
    /// Create an unfired projectile. Missing settings fall back to defaults.
    pub fn new(
        id: Uuid,
        owner: Uuid,
        settings_key: impl Into<String>,
        settings: Option<Arc<ProjectileSettings>>,
        authority: Authority,
    ) -> Self {
        Self {
            id,
            owner,
            settings_key: settings_key.into(),
            settings: resolve_settings(settings),
            authority,
            kinematics: Kinematics::default(),
            origin: Vec3::ZERO,
            homing: None,
            mirror: None,
            alive: true,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn settings_key(&self) -> &str {
        &self.settings_key
    }

    pub fn settings(&self) -> &Arc<ProjectileSettings> {
        &self.settings
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn position(&self) -> Vec3 {
        self.kinematics.position
    }

    pub fn rotation(&self) -> Quat {
        self.kinematics.rotation
    }

    pub fn distance_traveled(&self) -> f32 {
        self.kinematics.distance_traveled
    }

    pub fn target(&self) -> Option<Uuid> {
        self.homing.as_ref().and_then(|h| h.target())
    }

    pub fn homing(&self) -> Option<&Homing> {
        self.homing.as_ref()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn filter(&self) -> QueryFilter {
        QueryFilter::new(self.settings.ignore_layers, Some(self.owner))
    }

    /// Launch from a barrel or launcher
    pub fn fire_from(&mut self, muzzle: &dyn Muzzle, world: &WorldView<'_>) -> ProjectileEvent {
        self.fire(muzzle.muzzle_pose(), world)
    }

    /// Launch from a raw pose, as reconstructed from a remote fire command.
    ///
    /// With a barrel gap the projectile covers the gap immediately, with its
    /// own collision check, and burns out on the spot if the range does not
    /// exceed the gap.
    pub fn fire(&mut self, pose: Pose, world: &WorldView<'_>) -> ProjectileEvent {
        let settings = self.settings.clone();
        self.kinematics.launch(pose, settings.initial_velocity);
        self.origin = pose.position;
        self.alive = true;

        if !self.authority.simulates_physics() {
            // Mirrors only place the projectile where the owner will have it
            if settings.barrel_gap > 0.0 {
                self.kinematics.position += pose.forward() * settings.barrel_gap;
            }
            self.mirror = Some(DeadReckoning::new(self.kinematics.velocity));
            return ProjectileEvent::Flying;
        }

        self.homing = Homing::start(&settings, world);

        if settings.barrel_gap > 0.0 {
            let filter = self.filter();
            let outcome = self.kinematics.barrel_step(
                settings.barrel_gap,
                settings.range,
                world.physics,
                &filter,
            );
            return self.settle(outcome, world);
        }

        ProjectileEvent::Flying
    }

    /// Advance one fixed tick
    pub fn tick(&mut self, dt: f32, world: &WorldView<'_>) -> ProjectileEvent {
        if !self.alive {
            return ProjectileEvent::Flying;
        }

        if let Some(mirror) = &self.mirror {
            mirror.extrapolate(&mut self.kinematics, dt);
            // Cap for mirrors whose destroy never arrived
            let outran = self.settings.has_range_limit()
                && self.origin.distance(self.kinematics.position) >= self.settings.range;
            if !outran {
                return ProjectileEvent::Flying;
            }
            debug!(projectile_id = %self.id, "Mirror outran its range without a destroy");
            self.dispose();
            return ProjectileEvent::BurnedOut;
        }

        let settings = self.settings.clone();
        let filter = self.filter();

        self.kinematics.apply_drop(settings.drop, dt);
        if let Some(homing) = self.homing.as_mut() {
            homing.update(dt, &mut self.kinematics, &settings, filter, world);
        }

        let outcome = self
            .kinematics
            .integrate(dt, settings.range, world.physics, &filter);
        self.settle(outcome, world)
    }

    /// Apply an owner snapshot to a mirror; ignored on the authoritative side
    pub fn apply_snapshot(&mut self, position: Vec3, rotation: Quat, sim_time: f64) -> bool {
        match self.mirror.as_mut() {
            Some(mirror) => mirror.apply_snapshot(&mut self.kinematics, position, rotation, sim_time),
            None => {
                debug!(projectile_id = %self.id, "Snapshot for locally simulated projectile ignored");
                false
            }
        }
    }

    /// Stop simulating; the owner of the collection drops it afterwards
    pub fn dispose(&mut self) {
        self.alive = false;
        if let Some(homing) = self.homing.as_mut() {
            homing.cancel();
        }
    }

    fn settle(&mut self, outcome: StepOutcome, world: &WorldView<'_>) -> ProjectileEvent {
        match outcome {
            StepOutcome::Moved => ProjectileEvent::Flying,
            StepOutcome::Hit(hit) => {
                let impact = self.resolve_hit(&hit, world);
                debug!(
                    projectile_id = %self.id,
                    damageable = ?impact.damageable,
                    distance = self.kinematics.distance_traveled,
                    "Projectile hit"
                );
                self.dispose();
                ProjectileEvent::Impact(impact)
            }
            StepOutcome::BurnedOut => {
                debug!(
                    projectile_id = %self.id,
                    distance = self.kinematics.distance_traveled,
                    "Projectile burned out"
                );
                self.dispose();
                ProjectileEvent::BurnedOut
            }
        }
    }

    fn resolve_hit(&self, hit: &HitInfo, world: &WorldView<'_>) -> Impact {
        Impact {
            point: hit.point,
            collider: hit.collider,
            damageable: world.capabilities.damageable(hit.collider),
            damage: self.settings.damage,
            knockback: self.kinematics.velocity.normalize_or_zero() * self.settings.knockback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::{Collider, SceneWorld};
    use crate::game::targetable::TargetableRegistry;

    fn owned(settings: ProjectileSettings) -> Projectile {
        Projectile::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "test",
            Some(Arc::new(settings)),
            Authority::Owner,
        )
    }

    #[test]
    fn missing_settings_use_defaults() {
        let p = Projectile::new(Uuid::new_v4(), Uuid::new_v4(), "none", None, Authority::Owner);
        assert_eq!(**p.settings(), ProjectileSettings::default());
    }

    #[test]
    fn barrel_gap_places_first_position() {
        let world = SceneWorld::new();
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut p = owned(ProjectileSettings {
            barrel_gap: 0.5,
            range: 20.0,
            ..ProjectileSettings::default()
        });

        let pose = Pose::looking(Vec3::new(1.0, 1.0, 1.0), Vec3::X);
        assert_eq!(p.fire(pose, &view), ProjectileEvent::Flying);
        assert!((p.position() - (pose.position + pose.forward() * 0.5)).length() < 1e-5);
        assert!((p.distance_traveled() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn barrel_gap_hits_wall_at_muzzle() {
        let mut world = SceneWorld::new();
        let wall = Uuid::new_v4();
        world.insert(
            Collider::cuboid(Vec3::new(-1.0, -1.0, 0.2), Vec3::new(1.0, 1.0, 0.3)).damageable(wall),
        );
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut p = owned(ProjectileSettings {
            barrel_gap: 0.5,
            ..ProjectileSettings::default()
        });

        match p.fire(Pose::default(), &view) {
            ProjectileEvent::Impact(impact) => assert_eq!(impact.damageable, Some(wall)),
            other => panic!("expected impact, got {other:?}"),
        }
        assert!(!p.is_alive());
    }

    #[test]
    fn short_range_burns_out_on_fire() {
        let world = SceneWorld::new();
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut p = owned(ProjectileSettings {
            barrel_gap: 1.0,
            range: 1.0,
            ..ProjectileSettings::default()
        });

        assert_eq!(p.fire(Pose::default(), &view), ProjectileEvent::BurnedOut);
        assert!(!p.is_alive());
        assert_eq!(p.position(), Vec3::ZERO);
        assert_eq!(p.tick(0.02, &view), ProjectileEvent::Flying);
        assert_eq!(p.position(), Vec3::ZERO);
    }

    #[test]
    fn mirror_burns_out_once_past_range() {
        let world = SceneWorld::new();
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let settings = ProjectileSettings {
            initial_velocity: 50.0,
            range: 10.0,
            ..ProjectileSettings::default()
        };
        let mut p = Projectile::new(Uuid::new_v4(), Uuid::new_v4(), "test", Some(Arc::new(settings)), Authority::Mirror);

        p.fire(Pose::looking(Vec3::new(3.0, 0.0, 0.0), Vec3::Z), &view);
        let mut ticks = 0;
        while p.tick(0.02, &view) == ProjectileEvent::Flying {
            ticks += 1;
            assert!(ticks < 20, "mirror never burned out");
        }
        assert!(!p.is_alive());
        assert!(p.position().z >= 10.0 && p.position().z < 11.5);
    }

    #[test]
    fn mirror_never_runs_physics() {
        let mut world = SceneWorld::new();
        world.insert(Collider::cuboid(Vec3::new(-1.0, -1.0, 1.0), Vec3::new(1.0, 1.0, 2.0)));
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut p = Projectile::new(Uuid::new_v4(), Uuid::new_v4(), "test", None, Authority::Mirror);

        p.fire(Pose::default(), &view);
        for _ in 0..10 {
            assert_eq!(p.tick(0.02, &view), ProjectileEvent::Flying);
        }
        // Dead-reckoned straight through the wall it would have hit
        assert!(p.position().z > 2.0);
        assert!(p.is_alive());
    }

    #[test]
    fn knockback_follows_flight_direction() {
        let mut world = SceneWorld::new();
        world.insert(Collider::sphere(Vec3::new(0.0, 0.0, 3.0), 1.0));
        let registry = TargetableRegistry::new();
        let view = WorldView::new(&world, &registry);
        let mut p = owned(ProjectileSettings {
            knockback: 4.0,
            ..ProjectileSettings::default()
        });

        p.fire(Pose::default(), &view);
        let impact = loop {
            if let ProjectileEvent::Impact(impact) = p.tick(0.02, &view) {
                break impact;
            }
        };
        assert!((impact.knockback - Vec3::new(0.0, 0.0, 4.0)).length() < 1e-4);
        assert_eq!(impact.damageable, None);
    }
}
