//! Projectile flight primitives: launch, drop, homing, range clipping and sweeps

use glam::{Quat, Vec3};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::acquisition::{ScanOrigin, TargetAcquisition};
use super::math::{look_rotation, rotate_towards, Pose, FORWARD};
use super::physics::{HitInfo, PhysicsQuery, QueryFilter};
use super::settings::ProjectileSettings;
use super::WorldView;

/// Result of advancing a projectile by one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Position committed, range left
    Moved,
    /// Swept into something; position was not committed
    Hit(HitInfo),
    /// Range exhausted without hitting anything
    BurnedOut,
}

/// Pose, velocity and travel budget of one projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    /// Cumulative distance since the last launch; never exceeds the range
    pub distance_traveled: f32,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            distance_traveled: 0.0,
        }
    }
}

impl Kinematics {
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * FORWARD
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Reset travel and aim along the pose's forward axis
    pub fn launch(&mut self, pose: Pose, speed: f32) {
        self.position = pose.position;
        self.rotation = pose.rotation;
        self.velocity = pose.forward() * speed;
        self.distance_traveled = 0.0;
    }

    /// Distance left before burnout
    pub fn remaining_range(&self, range: f32) -> f32 {
        if range > 0.0 {
            (range - self.distance_traveled).max(0.0)
        } else {
            f32::INFINITY
        }
    }

    /// Constant downward acceleration
    pub fn apply_drop(&mut self, drop: f32, dt: f32) {
        if drop > 0.0 {
            self.velocity.y -= drop * dt;
        }
    }

    /// Turn toward `aim` at the homing rate, optionally leading a moving
    /// target. Speed is preserved.
    pub fn steer_towards(
        &mut self,
        aim: Vec3,
        target_velocity: Vec3,
        settings: &ProjectileSettings,
        dt: f32,
    ) {
        let speed = self.speed();
        if speed < 1e-6 {
            return;
        }

        let mut predicted = aim;
        for _ in 0..settings.prediction_iterations {
            let time_to_intercept = (predicted - self.position).length() / speed;
            predicted = aim + target_velocity * time_to_intercept;
        }

        self.velocity = rotate_towards(
            self.velocity,
            predicted - self.position,
            settings.homing_strength * dt,
        );
    }

    /// Instant advance of `gap` along forward, used to spawn clear of the muzzle.
    /// Burns out without moving when the range does not exceed the gap.
    pub fn barrel_step(
        &mut self,
        gap: f32,
        range: f32,
        physics: &dyn PhysicsQuery,
        filter: &QueryFilter,
    ) -> StepOutcome {
        if range > 0.0 && range <= gap {
            return StepOutcome::BurnedOut;
        }
        let to = self.position + self.forward() * gap;
        self.sweep_to(to, range, physics, filter)
    }

    /// Integrate velocity over `dt`, clip to range and sweep for hits
    pub fn integrate(
        &mut self,
        dt: f32,
        range: f32,
        physics: &dyn PhysicsQuery,
        filter: &QueryFilter,
    ) -> StepOutcome {
        let to = self.position + self.velocity * dt;
        self.sweep_to(to, range, physics, filter)
    }

    fn sweep_to(
        &mut self,
        mut to: Vec3,
        range: f32,
        physics: &dyn PhysicsQuery,
        filter: &QueryFilter,
    ) -> StepOutcome {
        let from = self.position;
        self.distance_traveled += from.distance(to);

        if range > 0.0 && self.distance_traveled > range {
            let overshoot = self.distance_traveled - range;
            to -= (to - from).normalize_or_zero() * overshoot;
            self.distance_traveled = range;
        }

        if let Some(hit) = physics.linecast(from, to, filter) {
            // Only count travel up to the contact point
            self.distance_traveled -= from.distance(to) - hit.distance;
            return StepOutcome::Hit(hit);
        }

        self.position = to;
        if self.velocity.length_squared() > 1e-12 {
            self.rotation = look_rotation(self.velocity);
        }

        if range > 0.0 && self.distance_traveled >= range {
            StepOutcome::BurnedOut
        } else {
            StepOutcome::Moved
        }
    }
}

/// Acquisition task plus the target-position cache used for leading
#[derive(Debug, Clone)]
pub struct Homing {
    acquisition: TargetAcquisition,
    last_aim: Option<(Uuid, Vec3)>,
}

impl Homing {
    /// Homing state for settings that ask for it
    pub fn start(settings: &Arc<ProjectileSettings>, world: &WorldView<'_>) -> Option<Self> {
        settings.is_homing().then(|| Self {
            acquisition: TargetAcquisition::start(settings.clone(), world),
            last_aim: None,
        })
    }

    pub fn acquisition(&self) -> &TargetAcquisition {
        &self.acquisition
    }

    pub fn target(&self) -> Option<Uuid> {
        self.acquisition.target()
    }

    pub fn cancel(&mut self) {
        self.acquisition.cancel();
        self.last_aim = None;
    }

    /// Run a due acquisition pass, then bend velocity toward the lock
    pub fn update(
        &mut self,
        dt: f32,
        kinematics: &mut Kinematics,
        settings: &ProjectileSettings,
        filter: QueryFilter,
        world: &WorldView<'_>,
    ) {
        let origin = ScanOrigin {
            position: kinematics.position,
            forward: kinematics.forward(),
            remaining_range: kinematics.remaining_range(settings.range),
            filter,
        };
        self.acquisition.update(dt, &origin, world);

        let Some(target_id) = self.acquisition.target() else {
            self.last_aim = None;
            return;
        };

        let Some(target) = world.targets.get(&target_id) else {
            debug!(target_id = %target_id, "Locked target destroyed, flying straight");
            self.acquisition.clear_lock();
            self.last_aim = None;
            return;
        };

        let aim = target.aim_point();
        let target_velocity = match self.last_aim {
            Some((id, previous)) if id == target_id && dt > 0.0 => (aim - previous) / dt,
            _ => Vec3::ZERO,
        };
        kinematics.steer_towards(aim, target_velocity, settings, dt);
        self.last_aim = Some((target_id, aim));
    }
}
