//! Per-peer simulation and its fixed-rate tick loop

use glam::Vec3;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::net::authority::{Authority, Replicator};
use crate::net::protocol::{Envelope, ProjectileRpc, RpcTarget};
use crate::net::relay::{Relay, RelayHandle};
use crate::util::rate_limit::{FireRateLimiter, FIRE_RATE_LIMIT};
use crate::util::time::{
    snapshot_interval_ticks, tick_delta_for, tick_duration, Timer, SIMULATION_TPS, SNAPSHOT_TPS,
};

use super::combat::{DamageOutcome, Health, HealthLedger};
use super::hook::{HookEvent, HookProjectile, Launcher, TetherLine};
use super::math::Pose;
use super::physics::SceneWorld;
use super::projectile::{Impact, Muzzle, Projectile, ProjectileEvent};
use super::settings::SettingsCatalog;
use super::snapshot::SnapshotBuilder;
use super::targetable::TargetableRegistry;
use super::WorldView;

/// Tick and replication rates for one peer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub tick_rate: u32,
    pub snapshot_rate: u32,
    /// Remote fire commands accepted per sender per second
    pub fire_rate_limit: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: SIMULATION_TPS,
            snapshot_rate: SNAPSHOT_TPS,
            fire_rate_limit: FIRE_RATE_LIMIT,
        }
    }
}

/// Feedback a launcher received from its hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherFeedback {
    HitObstacle,
    HitPlayer(Uuid),
    Released,
    ForceReleased,
    Bounced,
}

/// A player's hand holding a hookshot
#[derive(Debug, Clone, Default)]
pub struct HandLauncher {
    owner: Uuid,
    muzzle: Pose,
    anchor: Vec3,
    feedback: Vec<LauncherFeedback>,
}

impl HandLauncher {
    pub fn new(owner: Uuid, muzzle: Pose, anchor: Vec3) -> Self {
        Self {
            owner,
            muzzle,
            anchor,
            feedback: Vec::new(),
        }
    }

    pub fn aim(&mut self, muzzle: Pose, anchor: Vec3) {
        self.muzzle = muzzle;
        self.anchor = anchor;
    }

    pub fn feedback(&self) -> &[LauncherFeedback] {
        &self.feedback
    }
}

impl Muzzle for HandLauncher {
    fn owner(&self) -> Uuid {
        self.owner
    }

    fn muzzle_pose(&self) -> Pose {
        self.muzzle
    }
}

impl Launcher for HandLauncher {
    fn anchor_position(&self) -> Vec3 {
        self.anchor
    }

    fn on_hit_obstacle(&mut self) {
        self.feedback.push(LauncherFeedback::HitObstacle);
    }

    fn on_hit_player(&mut self, player: Uuid) {
        self.feedback.push(LauncherFeedback::HitPlayer(player));
    }

    fn on_released(&mut self) {
        self.feedback.push(LauncherFeedback::Released);
    }

    fn on_force_released(&mut self) {
        self.feedback.push(LauncherFeedback::ForceReleased);
    }

    fn on_bounced(&mut self) {
        self.feedback.push(LauncherFeedback::Bounced);
    }
}

#[derive(Debug, Clone)]
struct HookSlot {
    settings_key: String,
    hook: HookProjectile,
    launcher: HandLauncher,
}

/// Observable outcome of a tick or an inbound invocation
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Fired {
        projectile_id: Uuid,
        owner: Uuid,
        authority: Authority,
    },
    Damaged {
        hit_id: Uuid,
        outcome: DamageOutcome,
    },
    Destroyed {
        projectile_id: Uuid,
        burned_out: bool,
    },
    Hook {
        hook_id: Uuid,
        event: HookEvent,
    },
}

/// Everything one peer simulates, independent of how it is driven
pub struct PeerSimulation<R: Replicator> {
    replicator: R,
    config: SimulationConfig,
    tick: u64,
    sim_time: f64,
    projectiles: HashMap<Uuid, Projectile>,
    hooks: HashMap<Uuid, HookSlot>,
    ledger: HealthLedger,
    catalog: SettingsCatalog,
    snapshots: SnapshotBuilder,
    fire_limiter: FireRateLimiter,
    events: Vec<SimEvent>,
}

impl<R: Replicator> PeerSimulation<R> {
    pub fn new(replicator: R, catalog: SettingsCatalog, config: SimulationConfig) -> Self {
        Self {
            replicator,
            tick: 0,
            sim_time: 0.0,
            projectiles: HashMap::new(),
            hooks: HashMap::new(),
            ledger: HealthLedger::new(),
            catalog,
            snapshots: SnapshotBuilder::new(snapshot_interval_ticks(
                config.tick_rate,
                config.snapshot_rate,
            )),
            fire_limiter: FireRateLimiter::new(config.fire_rate_limit),
            events: Vec::new(),
            config,
        }
    }

    pub fn peer_id(&self) -> Uuid {
        self.replicator.local_peer()
    }

    pub fn replicator(&self) -> &R {
        &self.replicator
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn dt(&self) -> f32 {
        tick_delta_for(self.config.tick_rate)
    }

    pub fn projectile(&self, id: &Uuid) -> Option<&Projectile> {
        self.projectiles.get(id)
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn hook(&self, id: &Uuid) -> Option<&HookProjectile> {
        self.hooks.get(id).map(|slot| &slot.hook)
    }

    pub fn launcher(&self, hook_id: &Uuid) -> Option<&HandLauncher> {
        self.hooks.get(hook_id).map(|slot| &slot.launcher)
    }

    pub fn register_damageable(&mut self, entity: Uuid, max_health: f32) {
        self.ledger.register(entity, max_health);
    }

    pub fn health(&self, entity: &Uuid) -> Option<Health> {
        self.ledger.health(entity)
    }

    /// Take every event recorded since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Fire an owned projectile and announce it to the other peers.
    /// Re-using a live id is ignored.
    pub fn fire(&mut self, projectile_id: Uuid, settings_key: &str, pose: Pose, world: &WorldView<'_>) -> bool {
        self.spawn_local(projectile_id, settings_key, pose, false, world)
    }

    /// Fire a cosmetic projectile that never leaves this peer
    pub fn fire_local(&mut self, projectile_id: Uuid, settings_key: &str, pose: Pose, world: &WorldView<'_>) -> bool {
        self.spawn_local(projectile_id, settings_key, pose, true, world)
    }

    fn spawn_local(
        &mut self,
        projectile_id: Uuid,
        settings_key: &str,
        pose: Pose,
        local_only: bool,
        world: &WorldView<'_>,
    ) -> bool {
        if self.projectiles.contains_key(&projectile_id) {
            debug!(projectile_id = %projectile_id, "Projectile already fired");
            return false;
        }

        let owner = self.peer_id();
        let authority = Authority::resolve(owner, owner, local_only);
        let settings = self.catalog.projectile(settings_key);
        let mut projectile = Projectile::new(projectile_id, owner, settings_key, Some(settings), authority);

        let event = projectile.fire(pose, world);
        if authority.replicates() {
            self.replicator.invoke_remote(
                RpcTarget::Others,
                ProjectileRpc::Fire {
                    projectile_id,
                    owner_id: owner,
                    settings_key: settings_key.to_string(),
                    position: pose.position,
                    rotation: pose.rotation,
                },
            );
        }
        debug!(projectile_id = %projectile_id, settings_key, ?authority, "Projectile fired");
        self.events.push(SimEvent::Fired {
            projectile_id,
            owner,
            authority,
        });

        self.settle(&projectile, event);
        if projectile.is_alive() {
            self.projectiles.insert(projectile_id, projectile);
        }
        true
    }

    /// Give this peer a stowed hookshot
    pub fn equip_hook(&mut self, hook_id: Uuid, settings_key: &str, muzzle: Pose, anchor: Vec3) {
        let owner = self.peer_id();
        let settings = self.catalog.hookshot(settings_key);
        self.hooks.insert(
            hook_id,
            HookSlot {
                settings_key: settings_key.to_string(),
                hook: HookProjectile::new(hook_id, owner, settings, Some(TetherLine::default())),
                launcher: HandLauncher::new(owner, muzzle, anchor),
            },
        );
    }

    /// Move a hookshot's muzzle and anchor with the player's hand
    pub fn aim_launcher(&mut self, hook_id: &Uuid, muzzle: Pose, anchor: Vec3) -> bool {
        match self.hooks.get_mut(hook_id) {
            Some(slot) => {
                slot.launcher.aim(muzzle, anchor);
                true
            }
            None => false,
        }
    }

    pub fn fire_hook(&mut self, hook_id: &Uuid, world: &WorldView<'_>) -> bool {
        let Some(slot) = self.hooks.get_mut(hook_id) else {
            debug!(hook_id = %hook_id, "Fire for unknown hook ignored");
            return false;
        };
        if slot.hook.is_mirrored() {
            return false;
        }
        let events = slot.hook.fire(&mut slot.launcher, world);
        let fired = !events.is_empty();
        self.publish_hook_events(*hook_id, events);
        fired
    }

    pub fn release_hook(&mut self, hook_id: &Uuid) -> bool {
        let Some(slot) = self.hooks.get_mut(hook_id) else {
            debug!(hook_id = %hook_id, "Release for unknown hook ignored");
            return false;
        };
        if slot.hook.is_mirrored() {
            return false;
        }
        let events = slot.hook.release(&mut slot.launcher);
        let released = !events.is_empty();
        self.publish_hook_events(*hook_id, events);
        released
    }

    /// Apply one inbound invocation. Unknown ids are ignored.
    pub fn handle_envelope(&mut self, envelope: Envelope, world: &WorldView<'_>) {
        let sender = envelope.sender;
        match envelope.rpc {
            ProjectileRpc::Fire {
                projectile_id,
                owner_id,
                settings_key,
                position,
                rotation,
            } => {
                if self.replicator.is_authoritative(owner_id) || self.projectiles.contains_key(&projectile_id) {
                    debug!(projectile_id = %projectile_id, "Duplicate fire ignored");
                    return;
                }
                if !self.fire_limiter.check(sender) {
                    warn!(peer_id = %sender, projectile_id = %projectile_id, "Fire rate limit exceeded, dropping");
                    return;
                }

                let authority = Authority::resolve(owner_id, self.peer_id(), false);
                let settings = self.catalog.projectile(&settings_key);
                let mut projectile =
                    Projectile::new(projectile_id, owner_id, settings_key, Some(settings), authority);
                projectile.fire(Pose::new(position, rotation), world);
                self.projectiles.insert(projectile_id, projectile);
                self.events.push(SimEvent::Fired {
                    projectile_id,
                    owner: owner_id,
                    authority,
                });
            }
            ProjectileRpc::Snapshot {
                projectile_id,
                position,
                rotation,
                sim_time,
            } => match self.projectiles.get_mut(&projectile_id) {
                Some(projectile) => {
                    projectile.apply_snapshot(position, rotation, sim_time);
                }
                None => debug!(projectile_id = %projectile_id, "Snapshot for unknown projectile ignored"),
            },
            ProjectileRpc::ApplyDamage {
                hit_id,
                target_id,
                damage,
                knockback,
                ..
            } => self.apply_damage(hit_id, target_id, damage, knockback),
            ProjectileRpc::Destroy { projectile_id } => match self.projectiles.remove(&projectile_id) {
                Some(mut projectile) => {
                    projectile.dispose();
                    self.events.push(SimEvent::Destroyed {
                        projectile_id,
                        burned_out: false,
                    });
                }
                None => debug!(projectile_id = %projectile_id, "Destroy for unknown projectile ignored"),
            },
            ProjectileRpc::HookFired {
                hook_id,
                owner_id,
                settings_key,
                position,
                rotation,
            } => {
                if self.replicator.is_authoritative(owner_id) {
                    return;
                }
                if !self.fire_limiter.check(sender) {
                    warn!(peer_id = %sender, hook_id = %hook_id, "Fire rate limit exceeded, dropping");
                    return;
                }

                let pose = Pose::new(position, rotation);
                let settings = self.catalog.hookshot(&settings_key);
                let slot = self.hooks.entry(hook_id).or_insert_with(|| HookSlot {
                    settings_key: settings_key.clone(),
                    hook: HookProjectile::mirror(hook_id, owner_id, settings),
                    launcher: HandLauncher::new(owner_id, pose, position),
                });
                if !slot.hook.is_mirrored() {
                    return;
                }
                slot.launcher.aim(pose, position);
                let event = HookEvent::Fired(pose);
                slot.hook.apply_remote(&event, &mut slot.launcher, world);
                self.events.push(SimEvent::Hook { hook_id, event });
            }
            ProjectileRpc::HookAttached {
                hook_id,
                state,
                point,
                player,
            } => self.apply_remote_hook(hook_id, HookEvent::Attached { state, point, player }, None, world),
            ProjectileRpc::HookReleased {
                hook_id,
                cause,
                position,
            } => self.apply_remote_hook(hook_id, HookEvent::Released(cause), Some(position), world),
            ProjectileRpc::HookStowed { hook_id } => {
                self.apply_remote_hook(hook_id, HookEvent::Stowed, None, world)
            }
            ProjectileRpc::PeerLeft { peer_id } => {
                if peer_id != sender || peer_id == self.peer_id() {
                    warn!(peer_id = %peer_id, sender = %sender, "Departure notice not from the departing peer");
                    return;
                }
                self.forget_peer(&peer_id);
            }
        }
    }

    fn apply_remote_hook(
        &mut self,
        hook_id: Uuid,
        event: HookEvent,
        position: Option<Vec3>,
        world: &WorldView<'_>,
    ) {
        let Some(slot) = self.hooks.get_mut(&hook_id) else {
            debug!(hook_id = %hook_id, "Invocation for unknown hook ignored");
            return;
        };
        if !slot.hook.is_mirrored() {
            return;
        }
        if let Some(position) = position {
            slot.hook.correct_position(position);
        }
        slot.hook.apply_remote(&event, &mut slot.launcher, world);
        self.events.push(SimEvent::Hook { hook_id, event });
    }

    /// Advance every projectile and hook by one fixed tick
    pub fn run_tick(&mut self, world: &WorldView<'_>) {
        let dt = self.dt();
        self.tick += 1;
        self.sim_time += f64::from(dt);

        let mut settled = Vec::new();
        let mut retargeted = false;
        for projectile in self.projectiles.values_mut() {
            let locked = projectile.target();
            let event = projectile.tick(dt, world);
            if projectile.authority().replicates() && projectile.target() != locked {
                retargeted = true;
            }
            if event != ProjectileEvent::Flying {
                settled.push((projectile.clone(), event));
            }
        }
        for (projectile, event) in settled {
            self.settle(&projectile, event);
        }
        self.projectiles.retain(|_, p| p.is_alive());

        let mut outgoing = Vec::new();
        for (hook_id, slot) in self.hooks.iter_mut() {
            let events = slot.hook.tick(dt, &mut slot.launcher, world);
            if !events.is_empty() {
                outgoing.push((*hook_id, events));
            }
        }
        for (hook_id, events) in outgoing {
            self.publish_hook_events(hook_id, events);
        }

        // Observers only see a steering change through the next correction
        if retargeted {
            self.snapshots.force_next();
        }
        if self.snapshots.should_send() {
            let sim_time = self.sim_time;
            for rpc in self.snapshots.build(sim_time, self.projectiles.values()) {
                self.replicator.invoke_remote(RpcTarget::Others, rpc);
            }
        }
    }

    /// Per-frame presentation pass for hooks
    pub fn late_update(&mut self) {
        for slot in self.hooks.values_mut() {
            slot.hook.late_update(&slot.launcher);
        }
    }

    /// Drop everything a departed peer owned
    pub fn forget_peer(&mut self, peer: &Uuid) {
        self.fire_limiter.forget(peer);
        self.projectiles.retain(|_, p| p.owner() != *peer);
        self.hooks.retain(|_, slot| slot.hook.owner() != *peer);
        info!(peer_id = %peer, "Forgot departed peer");
    }

    fn settle(&mut self, projectile: &Projectile, event: ProjectileEvent) {
        let burned_out = match event {
            ProjectileEvent::Flying => return,
            ProjectileEvent::Impact(impact) => {
                if projectile.authority().replicates() {
                    self.dispatch_damage(projectile.id(), projectile.owner(), &impact);
                }
                false
            }
            ProjectileEvent::BurnedOut => true,
        };

        if projectile.authority().replicates() {
            self.replicator.invoke_remote(
                RpcTarget::Others,
                ProjectileRpc::Destroy {
                    projectile_id: projectile.id(),
                },
            );
        }
        self.events.push(SimEvent::Destroyed {
            projectile_id: projectile.id(),
            burned_out,
        });
    }

    /// Broadcast damage under a fresh hit id and apply it here at once;
    /// the echo from the relay is then a duplicate.
    fn dispatch_damage(&mut self, source_id: Uuid, shooter_id: Uuid, impact: &Impact) {
        let Some(target_id) = impact.damageable else {
            return;
        };
        if impact.damage <= 0.0 {
            return;
        }

        let hit_id = Uuid::new_v4();
        self.apply_damage(hit_id, target_id, impact.damage, impact.knockback);
        self.replicator.invoke_remote(
            RpcTarget::All,
            ProjectileRpc::ApplyDamage {
                hit_id,
                projectile_id: source_id,
                shooter_id,
                target_id,
                damage: impact.damage,
                knockback: impact.knockback,
                point: impact.point,
            },
        );
    }

    fn apply_damage(&mut self, hit_id: Uuid, target: Uuid, damage: f32, knockback: Vec3) {
        if let Some(outcome) = self.ledger.apply(hit_id, target, damage, knockback) {
            if outcome.killed {
                info!(target_id = %target, "Damageable destroyed");
            }
            self.events.push(SimEvent::Damaged { hit_id, outcome });
        }
    }

    fn publish_hook_events(&mut self, hook_id: Uuid, events: Vec<HookEvent>) {
        let Some(slot) = self.hooks.get(&hook_id) else {
            return;
        };
        let mirrored = slot.hook.is_mirrored();
        let owner = slot.hook.owner();
        let position = slot.hook.position();
        let settings_key = slot.settings_key.clone();

        for event in events {
            if !mirrored {
                match event {
                    HookEvent::Fired(pose) => self.replicator.invoke_remote(
                        RpcTarget::Others,
                        ProjectileRpc::HookFired {
                            hook_id,
                            owner_id: owner,
                            settings_key: settings_key.clone(),
                            position: pose.position,
                            rotation: pose.rotation,
                        },
                    ),
                    HookEvent::Attached { state, point, player } => self.replicator.invoke_remote(
                        RpcTarget::Others,
                        ProjectileRpc::HookAttached {
                            hook_id,
                            state,
                            point,
                            player,
                        },
                    ),
                    HookEvent::Released(cause) => self.replicator.invoke_remote(
                        RpcTarget::Others,
                        ProjectileRpc::HookReleased {
                            hook_id,
                            cause,
                            position,
                        },
                    ),
                    HookEvent::Stowed => self
                        .replicator
                        .invoke_remote(RpcTarget::Others, ProjectileRpc::HookStowed { hook_id }),
                    HookEvent::Impact(impact) => self.dispatch_damage(hook_id, owner, &impact),
                }
            }
            self.events.push(SimEvent::Hook { hook_id, event });
        }
    }
}

/// Commands a peer's local player issues to its session
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Fire {
        projectile_id: Uuid,
        settings_key: String,
        pose: Pose,
    },
    FireLocal {
        projectile_id: Uuid,
        settings_key: String,
        pose: Pose,
    },
    EquipHook {
        hook_id: Uuid,
        settings_key: String,
        muzzle: Pose,
        anchor: Vec3,
    },
    AimLauncher {
        hook_id: Uuid,
        muzzle: Pose,
        anchor: Vec3,
    },
    FireHook {
        hook_id: Uuid,
    },
    ReleaseHook {
        hook_id: Uuid,
    },
    RegisterDamageable {
        entity: Uuid,
        max_health: f32,
    },
    Shutdown,
}

/// Handle to a running peer session
#[derive(Clone)]
pub struct SessionHandle {
    pub peer_id: Uuid,
    pub command_tx: mpsc::Sender<SessionCommand>,
    pub ticks: Arc<AtomicU64>,
}

impl SessionHandle {
    /// Queue a command for the next tick; false once the session has stopped
    pub async fn send(&self, command: SessionCommand) -> bool {
        self.command_tx.send(command).await.is_ok()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

/// A peer driven by a fixed-rate tokio interval
pub struct PeerSession {
    sim: PeerSimulation<RelayHandle>,
    world: Arc<RwLock<SceneWorld>>,
    targets: Arc<TargetableRegistry>,
    inbox: mpsc::Receiver<Envelope>,
    command_rx: mpsc::Receiver<SessionCommand>,
    shutdown: watch::Receiver<bool>,
    ticks: Arc<AtomicU64>,
}

impl PeerSession {
    /// Join `relay` as `peer_id`
    pub fn new(
        peer_id: Uuid,
        relay: &Arc<Relay>,
        world: Arc<RwLock<SceneWorld>>,
        targets: Arc<TargetableRegistry>,
        catalog: SettingsCatalog,
        config: SimulationConfig,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, SessionHandle) {
        let (relay_handle, inbox) = relay.join(peer_id);
        let (command_tx, command_rx) = mpsc::channel(256);
        let ticks = Arc::new(AtomicU64::new(0));

        let handle = SessionHandle {
            peer_id,
            command_tx,
            ticks: ticks.clone(),
        };

        let session = Self {
            sim: PeerSimulation::new(relay_handle, catalog, config),
            world,
            targets,
            inbox,
            command_rx,
            shutdown,
            ticks,
        };

        (session, handle)
    }

    /// Run the tick loop until shutdown; returns the final simulation state
    pub async fn run(mut self) -> PeerSimulation<RelayHandle> {
        let peer_id = self.sim.peer_id();
        info!(peer_id = %peer_id, tick_rate = self.sim.config.tick_rate, "Peer session started");

        let tick_budget = tick_duration(self.sim.config.tick_rate);
        let mut tick_interval = interval(tick_budget);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let timer = Timer::new();

            // Drain command queue
            if !self.process_commands() {
                break;
            }

            // Drain relay inbox
            self.process_inbox();

            let world = self.world.read();
            let view = WorldView::new(&*world, &self.targets);
            self.sim.run_tick(&view);
            drop(world);
            self.sim.late_update();
            self.ticks.store(self.sim.tick(), Ordering::Relaxed);

            let elapsed = timer.elapsed_micros();
            if elapsed > tick_budget.as_micros() as u64 {
                warn!(peer_id = %peer_id, elapsed_us = elapsed, "Slow tick");
            }
        }

        self.sim.replicator().relay().leave(&peer_id);
        info!(peer_id = %peer_id, ticks = self.sim.tick(), "Peer session stopped");
        self.sim
    }

    /// Returns false when a shutdown command was received
    fn process_commands(&mut self) -> bool {
        while let Ok(command) = self.command_rx.try_recv() {
            let world = self.world.read();
            let view = WorldView::new(&*world, &self.targets);
            match command {
                SessionCommand::Fire {
                    projectile_id,
                    settings_key,
                    pose,
                } => {
                    self.sim.fire(projectile_id, &settings_key, pose, &view);
                }
                SessionCommand::FireLocal {
                    projectile_id,
                    settings_key,
                    pose,
                } => {
                    self.sim.fire_local(projectile_id, &settings_key, pose, &view);
                }
                SessionCommand::EquipHook {
                    hook_id,
                    settings_key,
                    muzzle,
                    anchor,
                } => self.sim.equip_hook(hook_id, &settings_key, muzzle, anchor),
                SessionCommand::AimLauncher {
                    hook_id,
                    muzzle,
                    anchor,
                } => {
                    self.sim.aim_launcher(&hook_id, muzzle, anchor);
                }
                SessionCommand::FireHook { hook_id } => {
                    self.sim.fire_hook(&hook_id, &view);
                }
                SessionCommand::ReleaseHook { hook_id } => {
                    self.sim.release_hook(&hook_id);
                }
                SessionCommand::RegisterDamageable { entity, max_health } => {
                    self.sim.register_damageable(entity, max_health)
                }
                SessionCommand::Shutdown => return false,
            }
        }
        true
    }

    fn process_inbox(&mut self) {
        while let Ok(envelope) = self.inbox.try_recv() {
            let world = self.world.read();
            let view = WorldView::new(&*world, &self.targets);
            self.sim.handle_envelope(envelope, &view);
        }
    }
}
