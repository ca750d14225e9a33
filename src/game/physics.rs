//! Collision queries consumed by the simulation, plus an in-memory scene

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::settings::LayerMask;

/// Handle to a collider in the physics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

/// Result of a swept line test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitInfo {
    pub point: Vec3,
    /// Distance from the sweep origin to `point`
    pub distance: f32,
    pub collider: ColliderId,
    pub layer: u8,
}

/// What a sweep is allowed to hit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryFilter {
    pub ignore_layers: LayerMask,
    /// Geometry belonging to this player is never reported
    pub exclude_owner: Option<Uuid>,
}

impl QueryFilter {
    pub fn new(ignore_layers: LayerMask, exclude_owner: Option<Uuid>) -> Self {
        Self {
            ignore_layers,
            exclude_owner,
        }
    }
}

/// Ray and line intersection queries
pub trait PhysicsQuery {
    /// Closest hit on the segment `from -> to`, if any
    fn linecast(&self, from: Vec3, to: Vec3, filter: &QueryFilter) -> Option<HitInfo>;

    /// True when nothing but `target`'s own geometry lies between the points
    fn line_of_sight(
        &self,
        from: Vec3,
        to: Vec3,
        filter: &QueryFilter,
        target: Uuid,
        capabilities: &dyn CapabilityLookup,
    ) -> bool {
        match self.linecast(from, to, filter) {
            None => true,
            Some(hit) => capabilities.targetable(hit.collider) == Some(target),
        }
    }
}

/// Capability resolution for struck colliders, walking up the parent chain
pub trait CapabilityLookup {
    /// Entity that takes damage when this collider is hit
    fn damageable(&self, collider: ColliderId) -> Option<Uuid>;
    /// Targetable entity this collider belongs to
    fn targetable(&self, collider: ColliderId) -> Option<Uuid>;
    /// Player whose body this collider is part of
    fn player(&self, collider: ColliderId) -> Option<Uuid>;
}

/// Both collaborator surfaces, as provided by one backend
pub trait CollisionWorld: PhysicsQuery + CapabilityLookup {}

impl<T: PhysicsQuery + CapabilityLookup> CollisionWorld for T {}

/// Collider geometry supported by the in-memory scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { center: Vec3, radius: f32 },
    Box { min: Vec3, max: Vec3 },
}

/// A collider in the in-memory scene
#[derive(Debug, Clone)]
pub struct Collider {
    pub id: ColliderId,
    pub shape: Shape,
    pub layer: u8,
    pub parent: Option<ColliderId>,
    pub damageable: Option<Uuid>,
    pub targetable: Option<Uuid>,
    pub player: Option<Uuid>,
}

impl Collider {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::with_shape(Shape::Sphere { center, radius })
    }

    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        Self::with_shape(Shape::Box {
            min: min.min(max),
            max: min.max(max),
        })
    }

    fn with_shape(shape: Shape) -> Self {
        Self {
            id: ColliderId(0),
            shape,
            layer: 0,
            parent: None,
            damageable: None,
            targetable: None,
            player: None,
        }
    }

    pub fn on_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn child_of(mut self, parent: ColliderId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn damageable(mut self, entity: Uuid) -> Self {
        self.damageable = Some(entity);
        self
    }

    pub fn targetable(mut self, entity: Uuid) -> Self {
        self.targetable = Some(entity);
        self
    }

    pub fn player(mut self, player: Uuid) -> Self {
        self.player = Some(player);
        self
    }

    /// Distance along `dir` (unit) from `origin` to the first contact within `max`
    fn intersect(&self, origin: Vec3, dir: Vec3, max: f32) -> Option<f32> {
        match self.shape {
            Shape::Sphere { center, radius } => segment_sphere(origin, dir, max, center, radius),
            Shape::Box { min, max: upper } => segment_box(origin, dir, max, min, upper),
        }
    }
}

fn segment_sphere(origin: Vec3, dir: Vec3, max: f32, center: Vec3, radius: f32) -> Option<f32> {
    let m = origin - center;
    let b = m.dot(dir);
    let c = m.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()).max(0.0);
    (t <= max).then_some(t)
}

fn segment_box(origin: Vec3, dir: Vec3, max: f32, min: Vec3, upper: Vec3) -> Option<f32> {
    let mut t_min = 0.0f32;
    let mut t_max = max;
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-8 {
            if o < min[axis] || o > upper[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t1 = (min[axis] - o) * inv;
        let mut t2 = (upper[axis] - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

/// Parent chains deeper than this are treated as broken
const MAX_PARENT_DEPTH: usize = 16;

/// Simple scene of spheres and boxes, used by the harness and tests
#[derive(Debug, Clone, Default)]
pub struct SceneWorld {
    colliders: Vec<Collider>,
    next_id: u32,
}

impl SceneWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut collider: Collider) -> ColliderId {
        self.next_id += 1;
        collider.id = ColliderId(self.next_id);
        let id = collider.id;
        self.colliders.push(collider);
        id
    }

    pub fn remove(&mut self, id: ColliderId) -> bool {
        let before = self.colliders.len();
        self.colliders.retain(|c| c.id != id);
        self.colliders.len() != before
    }

    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.iter().find(|c| c.id == id)
    }

    /// Move a collider so its center (or box center) sits at `center`
    pub fn move_to(&mut self, id: ColliderId, center: Vec3) -> bool {
        let Some(collider) = self.colliders.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        collider.shape = match collider.shape {
            Shape::Sphere { radius, .. } => Shape::Sphere { center, radius },
            Shape::Box { min, max } => {
                let half = (max - min) * 0.5;
                Shape::Box {
                    min: center - half,
                    max: center + half,
                }
            }
        };
        true
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    fn walk<T>(&self, id: ColliderId, pick: impl Fn(&Collider) -> Option<T>) -> Option<T> {
        let mut current = self.get(id);
        for _ in 0..MAX_PARENT_DEPTH {
            let collider = current?;
            if let Some(found) = pick(collider) {
                return Some(found);
            }
            current = collider.parent.and_then(|p| self.get(p));
        }
        None
    }
}

impl PhysicsQuery for SceneWorld {
    fn linecast(&self, from: Vec3, to: Vec3, filter: &QueryFilter) -> Option<HitInfo> {
        let delta = to - from;
        let length = delta.length();
        if length < 1e-6 {
            return None;
        }
        let dir = delta / length;

        self.colliders
            .iter()
            .filter(|c| !filter.ignore_layers.contains(c.layer))
            .filter(|c| match filter.exclude_owner {
                Some(owner) => self.player(c.id) != Some(owner),
                None => true,
            })
            .filter_map(|c| {
                c.intersect(from, dir, length).map(|distance| HitInfo {
                    point: from + dir * distance,
                    distance,
                    collider: c.id,
                    layer: c.layer,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl CapabilityLookup for SceneWorld {
    fn damageable(&self, collider: ColliderId) -> Option<Uuid> {
        self.walk(collider, |c| c.damageable)
    }

    fn targetable(&self, collider: ColliderId) -> Option<Uuid> {
        self.walk(collider, |c| c.targetable)
    }

    fn player(&self, collider: ColliderId) -> Option<Uuid> {
        self.walk(collider, |c| c.player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linecast_reports_closest_contact() {
        let mut world = SceneWorld::new();
        let far = world.insert(Collider::sphere(Vec3::new(0.0, 0.0, 20.0), 1.0));
        let near = world.insert(Collider::cuboid(Vec3::new(-1.0, -1.0, 9.0), Vec3::new(1.0, 1.0, 11.0)));

        let hit = world
            .linecast(Vec3::ZERO, Vec3::new(0.0, 0.0, 30.0), &QueryFilter::default())
            .unwrap();
        assert_eq!(hit.collider, near);
        assert!((hit.distance - 9.0).abs() < 1e-4);

        world.remove(near);
        let hit = world
            .linecast(Vec3::ZERO, Vec3::new(0.0, 0.0, 30.0), &QueryFilter::default())
            .unwrap();
        assert_eq!(hit.collider, far);
        assert!((hit.point.z - 19.0).abs() < 1e-4);
    }

    #[test]
    fn linecast_stops_at_segment_end() {
        let mut world = SceneWorld::new();
        world.insert(Collider::sphere(Vec3::new(0.0, 0.0, 20.0), 1.0));
        assert!(world
            .linecast(Vec3::ZERO, Vec3::new(0.0, 0.0, 18.9), &QueryFilter::default())
            .is_none());
    }

    #[test]
    fn filter_skips_ignored_layers_and_owner() {
        let owner = Uuid::new_v4();
        let mut world = SceneWorld::new();
        let body = world.insert(Collider::sphere(Vec3::new(0.0, 0.0, 5.0), 1.0).player(owner));
        world.insert(Collider::sphere(Vec3::new(0.0, 0.0, 3.0), 0.5).child_of(body));
        world.insert(Collider::sphere(Vec3::new(0.0, 0.0, 8.0), 1.0).on_layer(4));

        let filter = QueryFilter::new(LayerMask::of(&[4]), Some(owner));
        assert!(world.linecast(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), &filter).is_none());
        assert!(world
            .linecast(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), &QueryFilter::default())
            .is_some());
    }

    #[test]
    fn capabilities_walk_parent_chain() {
        let entity = Uuid::new_v4();
        let mut world = SceneWorld::new();
        let root = world.insert(
            Collider::sphere(Vec3::ZERO, 1.0)
                .damageable(entity)
                .targetable(entity),
        );
        let limb = world.insert(Collider::sphere(Vec3::X, 0.2).child_of(root));

        assert_eq!(world.damageable(limb), Some(entity));
        assert_eq!(world.targetable(limb), Some(entity));
        assert_eq!(world.player(limb), None);
    }

    #[test]
    fn own_geometry_does_not_block_line_of_sight() {
        let target = Uuid::new_v4();
        let mut world = SceneWorld::new();
        world.insert(Collider::sphere(Vec3::new(0.0, 0.0, 10.0), 1.0).targetable(target));
        let filter = QueryFilter::default();

        assert!(world.line_of_sight(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), &filter, target, &world));

        world.insert(Collider::cuboid(Vec3::new(-2.0, -2.0, 4.0), Vec3::new(2.0, 2.0, 5.0)));
        assert!(!world.line_of_sight(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), &filter, target, &world));
    }
}
