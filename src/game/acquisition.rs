//! Periodic target acquisition for homing projectiles

use glam::Vec3;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::math::{angle_degrees, inverse_lerp};
use super::physics::QueryFilter;
use super::settings::ProjectileSettings;
use super::WorldView;

/// The candidate currently steered toward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetLock {
    pub target: Uuid,
    pub heuristic: f32,
}

/// Projectile state an acquisition pass looks from
#[derive(Debug, Clone, Copy)]
pub struct ScanOrigin {
    pub position: Vec3,
    pub forward: Vec3,
    /// Distance left before burnout; infinite when the range is unlimited
    pub remaining_range: f32,
    pub filter: QueryFilter,
}

/// Tick-driven acquisition task.
///
/// Scans run every `1 / targeting_tick_rate` seconds of simulated time. The
/// candidate set is copied from the registry once, at `start`; entities
/// registered later are never considered for this flight, only removals are
/// observed. The lock found by the latest scan is carried between scans. The task stops
/// for good once it commits to a lock (unless `always_look_for_target`) or
/// once every candidate has been discarded.
#[derive(Debug, Clone)]
pub struct TargetAcquisition {
    settings: Arc<ProjectileSettings>,
    candidates: Vec<Uuid>,
    lock: Option<TargetLock>,
    until_next_scan: f32,
    running: bool,
    passes: u32,
}

impl TargetAcquisition {
    /// Start a task over everything registered right now
    pub fn start(settings: Arc<ProjectileSettings>, world: &WorldView<'_>) -> Self {
        Self {
            settings,
            candidates: world.targets.ids(),
            lock: None,
            until_next_scan: 0.0,
            running: true,
            passes: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn lock(&self) -> Option<TargetLock> {
        self.lock
    }

    pub fn target(&self) -> Option<Uuid> {
        self.lock.map(|l| l.target)
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Drop the current lock, reverting to straight flight
    pub fn clear_lock(&mut self) {
        self.lock = None;
    }

    /// Stop scanning; the current lock is released too
    pub fn cancel(&mut self) {
        self.running = false;
        self.candidates.clear();
        self.lock = None;
    }

    /// Advance the scan timer, running a pass when one is due.
    /// Returns true if a pass ran.
    pub fn update(&mut self, dt: f32, origin: &ScanOrigin, world: &WorldView<'_>) -> bool {
        if !self.running {
            return false;
        }

        self.until_next_scan -= dt;
        if self.until_next_scan > 0.0 {
            return false;
        }
        self.until_next_scan = (self.until_next_scan + self.settings.targeting_interval()).max(0.0);

        self.scan(origin, world);
        true
    }

    /// One acquisition pass over the working candidate set
    pub fn scan(&mut self, origin: &ScanOrigin, world: &WorldView<'_>) {
        let angles = self.settings.designation_angles;
        let mut kept = Vec::with_capacity(self.candidates.len());

        for id in std::mem::take(&mut self.candidates) {
            if origin.filter.exclude_owner == Some(id) {
                continue;
            }

            let Some(target) = world.targets.get(&id) else {
                self.release_if_locked(id);
                continue;
            };

            let aim = target.aim_point();
            let offset = aim - origin.position;
            let distance = offset.length();
            let angle = angle_degrees(origin.forward, offset);

            if distance > origin.remaining_range || angle > angles.outer {
                self.release_if_locked(id);
                continue;
            }
            kept.push(id);

            if angle > angles.inner || distance > self.settings.targeting_distance {
                continue;
            }

            if self.settings.line_of_sight
                && !world.physics.line_of_sight(
                    origin.position,
                    aim,
                    &origin.filter,
                    id,
                    world.capabilities,
                )
            {
                self.release_if_locked(id);
                continue;
            }

            let heuristic = self.heuristic(angle, distance);
            match self.lock.as_mut() {
                Some(lock) if lock.target == id => lock.heuristic = heuristic,
                Some(lock) if heuristic <= lock.heuristic => {}
                _ => {
                    debug!(target_id = %id, heuristic, angle, distance, "Target locked");
                    self.lock = Some(TargetLock {
                        target: id,
                        heuristic,
                    });
                }
            }
        }

        self.candidates = kept;
        self.passes += 1;

        if self.lock.is_some() && !self.settings.always_look_for_target {
            debug!(target_id = ?self.target(), passes = self.passes, "Lock committed, acquisition stopped");
            self.running = false;
            self.candidates.clear();
        } else if self.candidates.is_empty() {
            debug!(passes = self.passes, "No candidates left, acquisition stopped");
            self.running = false;
        }
    }

    /// Weighted blend of angular alignment and proximity, in `[0, 1]`
    pub fn heuristic(&self, angle: f32, distance: f32) -> f32 {
        let w = self.settings.angle_distance_preference.clamp(0.0, 1.0);
        let angle_score = inverse_lerp(self.settings.designation_angles.inner, 0.0, angle);
        let distance_score = inverse_lerp(self.settings.targeting_distance, 0.0, distance);
        (1.0 - w) * angle_score + w * distance_score
    }

    fn release_if_locked(&mut self, id: Uuid) {
        if self.target() == Some(id) {
            debug!(target_id = %id, "Lock lost");
            self.lock = None;
        }
    }
}
