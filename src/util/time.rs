//! Tick-rate configuration and simulation clock helpers

use std::time::{Duration, Instant};

/// Default physics tick rate
pub const SIMULATION_TPS: u32 = 50; // 50 ticks per second
/// Default corrective snapshot rate
pub const SNAPSHOT_TPS: u32 = 10; // 10 snapshots per second

/// Delta time for an arbitrary tick rate; zero rates fall back to the default
pub fn tick_delta_for(tps: u32) -> f32 {
    if tps == 0 {
        return 1.0 / SIMULATION_TPS as f32;
    }
    1.0 / tps as f32
}

/// Wall-clock duration of one tick, used by the session interval
pub fn tick_duration(tps: u32) -> Duration {
    Duration::from_micros(1_000_000 / tps.max(1) as u64)
}

/// Number of simulation ticks between two snapshots (never less than one)
pub fn snapshot_interval_ticks(simulation_tps: u32, snapshot_tps: u32) -> u32 {
    if snapshot_tps == 0 {
        return simulation_tps.max(1);
    }
    (simulation_tps / snapshot_tps).max(1)
}

/// Measures how long a tick took, for slow-tick warnings
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_interval_never_zero() {
        assert_eq!(snapshot_interval_ticks(50, 10), 5);
        assert_eq!(snapshot_interval_ticks(10, 50), 1);
        assert_eq!(snapshot_interval_ticks(30, 0), 30);
    }

    #[test]
    fn zero_tick_rate_uses_default() {
        assert!((tick_delta_for(0) - 1.0 / SIMULATION_TPS as f32).abs() < f32::EPSILON);
        assert_eq!(tick_duration(0), Duration::from_secs(1));
    }
}
