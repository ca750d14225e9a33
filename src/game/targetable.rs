//! Registry of entities projectiles can lock onto

use dashmap::DashMap;
use glam::Vec3;
use uuid::Uuid;

/// Anything a homing projectile or hook may lock onto
#[derive(Debug, Clone, PartialEq)]
pub struct Targetable {
    pub id: Uuid,
    pub position: Vec3,
    /// Explicit aim point; the entity's own position when unset
    pub aim_point: Option<Vec3>,
}

impl Targetable {
    pub fn new(id: Uuid, position: Vec3) -> Self {
        Self {
            id,
            position,
            aim_point: None,
        }
    }

    pub fn with_aim_point(mut self, aim_point: Vec3) -> Self {
        self.aim_point = Some(aim_point);
        self
    }

    /// World-space point to steer toward
    pub fn aim_point(&self) -> Vec3 {
        self.aim_point.unwrap_or(self.position)
    }
}

/// Live targetables for one simulated peer.
///
/// Entities insert themselves on spawn and remove themselves on teardown.
/// Readers never hold references into the map across a scan; they copy
/// entries out, so a removal is seen by the next scan, not the current one.
pub struct TargetableRegistry {
    entries: DashMap<Uuid, Targetable>,
}

impl TargetableRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn register(&self, targetable: Targetable) {
        self.entries.insert(targetable.id, targetable);
    }

    pub fn unregister(&self, id: &Uuid) -> Option<Targetable> {
        self.entries.remove(id).map(|(_, t)| t)
    }

    /// Move a registered entity; returns false if it is no longer registered
    pub fn update(&self, id: &Uuid, position: Vec3, aim_point: Option<Vec3>) -> bool {
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                entry.position = position;
                entry.aim_point = aim_point;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<Targetable> {
        self.entries.get(id).map(|t| t.value().clone())
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.entries.contains_key(id)
    }

    /// Ids of every registered entity, copied out
    pub fn ids(&self) -> Vec<Uuid> {
        self.entries.iter().map(|e| *e.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TargetableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
