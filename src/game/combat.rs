//! Damage bookkeeping: exactly-once application of replicated hits

use glam::Vec3;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;
use uuid::Uuid;

/// Hit ids remembered for de-duplication
const APPLIED_HIT_HISTORY: usize = 4096;

/// Health of one damageable entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

/// Result of applying one hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub target: Uuid,
    pub damage: f32,
    pub remaining: f32,
    pub killed: bool,
    /// Impulse handed to the locomotion layer
    pub knockback: Vec3,
}

/// Apply damage to health, returns (new_health, is_dead)
pub fn apply_damage(current_health: f32, damage: f32) -> (f32, bool) {
    let new_health = (current_health - damage).max(0.0);
    (new_health, new_health <= 0.0)
}

/// Health of every damageable entity on this peer.
///
/// Every peer applies the same broadcast hit notifications; hit ids make
/// a redelivered notification a no-op.
#[derive(Debug, Default)]
pub struct HealthLedger {
    health: HashMap<Uuid, Health>,
    applied: HashSet<Uuid>,
    applied_order: VecDeque<Uuid>,
}

impl HealthLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: Uuid, max_health: f32) {
        self.health.insert(entity, Health::new(max_health));
    }

    pub fn health(&self, entity: &Uuid) -> Option<Health> {
        self.health.get(entity).copied()
    }

    /// Apply a hit once. Unknown entities and repeated hit ids are ignored.
    pub fn apply(
        &mut self,
        hit_id: Uuid,
        target: Uuid,
        damage: f32,
        knockback: Vec3,
    ) -> Option<DamageOutcome> {
        if self.applied.contains(&hit_id) {
            debug!(hit_id = %hit_id, "Duplicate hit ignored");
            return None;
        }

        let Some(health) = self.health.get_mut(&target) else {
            debug!(hit_id = %hit_id, target_id = %target, "Hit for unknown damageable ignored");
            return None;
        };

        self.applied.insert(hit_id);
        self.applied_order.push_back(hit_id);
        if self.applied_order.len() > APPLIED_HIT_HISTORY {
            if let Some(oldest) = self.applied_order.pop_front() {
                self.applied.remove(&oldest);
            }
        }

        let (remaining, killed) = apply_damage(health.current, damage);
        health.current = remaining;

        Some(DamageOutcome {
            target,
            damage,
            remaining,
            killed,
            knockback,
        })
    }
}
