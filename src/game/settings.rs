//! Projectile and hookshot tuning records

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Bit set of collision layers (layer `n` is bit `n`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);

    pub fn of(layers: &[u8]) -> Self {
        Self(layers.iter().fold(0, |mask, layer| mask | (1u32 << (*layer as u32 & 31))))
    }

    pub fn contains(&self, layer: u8) -> bool {
        self.0 & (1u32 << (layer as u32 & 31)) != 0
    }

    pub fn union(self, other: LayerMask) -> Self {
        Self(self.0 | other.0)
    }
}

/// Inner and outer designation cone half-angles, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignationAngles {
    /// A candidate may become the lock only inside this angle
    pub inner: f32,
    /// Candidates beyond this angle are discarded for the rest of the flight
    pub outer: f32,
}

impl Default for DesignationAngles {
    fn default() -> Self {
        Self {
            inner: 15.0,
            outer: 60.0,
        }
    }
}

/// Immutable projectile tuning, shared by every instance fired with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSettings {
    /// Damage applied to a damageable on hit
    pub damage: f32,
    /// Impulse magnitude along the flight direction on hit
    pub knockback: f32,
    /// Muzzle speed in units per second
    pub initial_velocity: f32,
    /// Maximum travel distance; zero or less means unlimited
    pub range: f32,
    /// Distance covered instantly on fire so the projectile spawns clear of the barrel
    pub barrel_gap: f32,
    /// Downward acceleration in units per second squared
    pub drop: f32,
    /// Homing turn rate in radians per second; zero disables target acquisition
    pub homing_strength: f32,
    /// Intercept refinement passes; zero aims at the target's current position
    pub prediction_iterations: u32,
    /// Acquisition scans per second
    pub targeting_tick_rate: f32,
    /// Candidates farther than this can never become the lock
    pub targeting_distance: f32,
    pub designation_angles: DesignationAngles,
    /// 0 = prefer alignment, 1 = prefer proximity
    pub angle_distance_preference: f32,
    /// Require an unobstructed line to a candidate before locking it
    pub line_of_sight: bool,
    /// Layers ignored by flight sweeps and line-of-sight checks
    pub ignore_layers: LayerMask,
    /// Keep re-evaluating after the first lock instead of committing to it
    pub always_look_for_target: bool,
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            damage: 10.0,
            knockback: 0.0,
            initial_velocity: 50.0,
            range: 100.0,
            barrel_gap: 0.0,
            drop: 0.0,
            homing_strength: 0.0,
            prediction_iterations: 0,
            targeting_tick_rate: 10.0,
            targeting_distance: 50.0,
            designation_angles: DesignationAngles::default(),
            angle_distance_preference: 0.5,
            line_of_sight: true,
            ignore_layers: LayerMask::NONE,
            always_look_for_target: false,
        }
    }
}

impl ProjectileSettings {
    /// Whether this projectile runs target acquisition at all
    pub fn is_homing(&self) -> bool {
        self.homing_strength > 0.0
    }

    /// Seconds between acquisition scans; zero scans every tick
    pub fn targeting_interval(&self) -> f32 {
        if self.targeting_tick_rate > 0.0 {
            1.0 / self.targeting_tick_rate
        } else {
            0.0
        }
    }

    pub fn has_range_limit(&self) -> bool {
        self.range > 0.0
    }
}

/// How a deployed hook reacts when geometry crosses its tether line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCheckPolicy {
    #[default]
    Ignore,
    /// Let go and retract
    Release,
    /// Attach to whatever crossed the line
    Grab,
}

/// Hookshot tuning: flight uses the embedded projectile settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookshotSettings {
    pub projectile: ProjectileSettings,
    /// Retraction speed on entering Retracting
    pub retract_speed: f32,
    /// Added to retraction speed every second while retracting
    pub retract_acceleration: f32,
    /// Distance to the launcher at which the hook counts as stowed
    pub stow_distance: f32,
    pub line_check: LineCheckPolicy,
    /// Surfaces the hook bounces off instead of attaching to
    pub bounce_layers: LayerMask,
}

impl Default for HookshotSettings {
    fn default() -> Self {
        Self {
            projectile: ProjectileSettings {
                damage: 0.0,
                initial_velocity: 40.0,
                range: 30.0,
                ..ProjectileSettings::default()
            },
            retract_speed: 10.0,
            retract_acceleration: 30.0,
            stow_distance: 0.25,
            line_check: LineCheckPolicy::Ignore,
            bounce_layers: LayerMask::NONE,
        }
    }
}

static MISSING_SETTINGS_WARNED: AtomicBool = AtomicBool::new(false);

/// Resolve optional settings, substituting defaults.
///
/// Missing configuration is never fatal; it is logged once per process.
pub fn resolve_settings(settings: Option<Arc<ProjectileSettings>>) -> Arc<ProjectileSettings> {
    match settings {
        Some(settings) => settings,
        None => {
            if !MISSING_SETTINGS_WARNED.swap(true, Ordering::Relaxed) {
                warn!("Projectile settings missing, substituting defaults");
            }
            Arc::new(ProjectileSettings::default())
        }
    }
}

/// Settings records addressable by key, so RPCs never carry tuning data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsCatalog {
    #[serde(default)]
    projectiles: HashMap<String, Arc<ProjectileSettings>>,
    #[serde(default)]
    hookshots: HashMap<String, Arc<HookshotSettings>>,
}

impl SettingsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_projectile(&mut self, key: impl Into<String>, settings: ProjectileSettings) {
        self.projectiles.insert(key.into(), Arc::new(settings));
    }

    pub fn insert_hookshot(&mut self, key: impl Into<String>, settings: HookshotSettings) {
        self.hookshots.insert(key.into(), Arc::new(settings));
    }

    /// Settings for `key`, or the defaults if the key is unknown
    pub fn projectile(&self, key: &str) -> Arc<ProjectileSettings> {
        resolve_settings(self.projectiles.get(key).cloned())
    }

    pub fn hookshot(&self, key: &str) -> Arc<HookshotSettings> {
        match self.hookshots.get(key) {
            Some(settings) => settings.clone(),
            None => {
                if !MISSING_SETTINGS_WARNED.swap(true, Ordering::Relaxed) {
                    warn!(key, "Hookshot settings missing, substituting defaults");
                }
                Arc::new(HookshotSettings::default())
            }
        }
    }

    pub fn contains_projectile(&self, key: &str) -> bool {
        self.projectiles.contains_key(key)
    }

    pub fn contains_hookshot(&self, key: &str) -> bool {
        self.hookshots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.projectiles.len() + self.hookshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_mask_membership() {
        let mask = LayerMask::of(&[0, 3]);
        assert!(mask.contains(0));
        assert!(mask.contains(3));
        assert!(!mask.contains(2));
        assert!(mask.union(LayerMask::of(&[2])).contains(2));
    }

    #[test]
    fn unknown_key_resolves_to_defaults() {
        let catalog = SettingsCatalog::new();
        assert_eq!(*catalog.projectile("missing"), ProjectileSettings::default());
        assert_eq!(*catalog.hookshot("missing"), HookshotSettings::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "projectiles": { "rocket": { "damage": 40.0, "homing_strength": 2.0 } } }"#;
        let catalog: SettingsCatalog = serde_json::from_str(json).unwrap();
        let rocket = catalog.projectile("rocket");
        assert_eq!(rocket.damage, 40.0);
        assert!(rocket.is_homing());
        assert_eq!(rocket.range, ProjectileSettings::default().range);
    }
}
