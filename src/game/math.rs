//! Vector helpers shared by kinematics, acquisition and the hook

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local forward axis of every projectile and launcher
pub const FORWARD: Vec3 = Vec3::Z;

/// A world-space position and orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` facing along `direction`
    pub fn looking(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            rotation: look_rotation(direction),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * FORWARD
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Rotation whose forward axis points along `direction`, keeping world up
pub fn look_rotation(direction: Vec3) -> Quat {
    let forward = direction.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }

    let right = Vec3::Y.cross(forward);
    if right.length_squared() < 1e-8 {
        // Straight up or down: world up is degenerate
        return Quat::from_rotation_arc(FORWARD, forward);
    }
    let right = right.normalize();
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

/// Angle between two vectors in degrees; zero if either is degenerate
pub fn angle_degrees(a: Vec3, b: Vec3) -> f32 {
    if a.length_squared() < 1e-12 || b.length_squared() < 1e-12 {
        return 0.0;
    }
    a.angle_between(b).to_degrees()
}

/// Rotate `current` toward `target` by at most `max_radians`, keeping the
/// magnitude of `current`.
pub fn rotate_towards(current: Vec3, target: Vec3, max_radians: f32) -> Vec3 {
    let speed = current.length();
    let from = current.normalize_or_zero();
    let to = target.normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO || max_radians <= 0.0 {
        return current;
    }

    let angle = from.angle_between(to);
    if angle <= max_radians {
        return to * speed;
    }

    let (axis, _) = Quat::from_rotation_arc(from, to).to_axis_angle();
    (Quat::from_axis_angle(axis, max_radians) * from).normalize() * speed
}

/// Linearly map `value` from `[from, to]` onto `[0, 1]`, clamped.
/// A degenerate range maps everything to zero.
pub fn inverse_lerp(from: f32, to: f32, value: f32) -> f32 {
    if (to - from).abs() < f32::EPSILON {
        return 0.0;
    }
    ((value - from) / (to - from)).clamp(0.0, 1.0)
}
