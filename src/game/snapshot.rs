//! Corrective snapshot building for owned projectiles

use crate::net::protocol::ProjectileRpc;

use super::projectile::Projectile;

/// Decides when to send corrective poses and builds them
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    stats: SnapshotStats,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            stats: SnapshotStats::default(),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used after a homing lock change)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// One snapshot per live projectile this peer is authoritative and replicating for
    pub fn build<'a>(
        &mut self,
        sim_time: f64,
        projectiles: impl IntoIterator<Item = &'a Projectile>,
    ) -> Vec<ProjectileRpc> {
        let snapshots: Vec<ProjectileRpc> = projectiles
            .into_iter()
            .filter(|p| p.is_alive() && p.authority().replicates())
            .map(|p| ProjectileRpc::Snapshot {
                projectile_id: p.id(),
                position: p.position(),
                rotation: p.rotation(),
                sim_time,
            })
            .collect();

        self.stats.record(snapshots.len());
        snapshots
    }

    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }
}

/// Snapshot counters for debugging
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SnapshotStats {
    pub total_rounds: u64,
    pub total_snapshots: u64,
    pub avg_projectiles_per_round: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, projectile_count: usize) {
        self.total_rounds += 1;
        self.total_snapshots += projectile_count as u64;

        // Running average
        let n = self.total_rounds as f32;
        self.avg_projectiles_per_round =
            self.avg_projectiles_per_round * ((n - 1.0) / n) + (projectile_count as f32 / n);
    }
}
