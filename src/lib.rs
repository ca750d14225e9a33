//! Arena projectile simulation
//!
//! Peer-side simulation of projectiles and grappling hooks for a networked
//! arena. Each peer runs its own fixed-tick loop; the peer that fired a
//! projectile is authoritative for it and replicates fire, hit and pose
//! corrections to the others through a relay.

pub mod config;
pub mod game;
pub mod net;
pub mod util;
