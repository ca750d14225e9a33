//! Arena harness - two headless peers exchanging projectiles over the relay
//!
//! Runs a seeded scene with drifting drones. One peer fires homing and
//! straight shots at them, the other swings a grappling hook around. Both
//! apply the same replicated damage, and their ledgers are compared on exit.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use arena_projectile_sim::config::Config;
use arena_projectile_sim::game::physics::{Collider, ColliderId, SceneWorld};
use arena_projectile_sim::game::session::{PeerSession, SessionCommand, SessionHandle};
use arena_projectile_sim::game::settings::{HookshotSettings, ProjectileSettings, SettingsCatalog};
use arena_projectile_sim::game::{Pose, Targetable, TargetableRegistry};
use arena_projectile_sim::net::Relay;

const DRONE_COUNT: usize = 6;
const DRONE_HEALTH: f32 = 100.0;
const DRONE_RADIUS: f32 = 0.75;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting arena harness");
    info!(
        tick_rate = config.sim_tick_rate,
        snapshot_rate = config.snapshot_rate,
        seed = config.harness_seed,
        "Simulation configured"
    );

    let mut catalog = config.load_catalog()?;
    with_harness_defaults(&mut catalog);

    // Build the shared scene
    let mut rng = ChaCha8Rng::seed_from_u64(config.harness_seed);
    let targets = Arc::new(TargetableRegistry::new());
    let mut scene = SceneWorld::new();
    let drones = spawn_drones(&mut rng, &mut scene, &targets);
    scene.insert(Collider::cuboid(Vec3::new(-30.0, -1.0, -30.0), Vec3::new(30.0, 0.0, 80.0)));
    let world = Arc::new(RwLock::new(scene));

    // Connect two peers through the relay
    let relay = Relay::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (alice, alice_handle) = PeerSession::new(
        Uuid::new_v4(),
        &relay,
        world.clone(),
        targets.clone(),
        catalog.clone(),
        config.simulation(),
        shutdown_rx.clone(),
    );
    let (bob, bob_handle) = PeerSession::new(
        Uuid::new_v4(),
        &relay,
        world.clone(),
        targets.clone(),
        catalog,
        config.simulation(),
        shutdown_rx.clone(),
    );

    for handle in [&alice_handle, &bob_handle] {
        for drone in &drones {
            handle
                .send(SessionCommand::RegisterDamageable {
                    entity: drone.id,
                    max_health: DRONE_HEALTH,
                })
                .await;
        }
    }

    let alice_task = tokio::spawn(alice.run());
    let bob_task = tokio::spawn(bob.run());

    // Drift drones around their spawn points
    let mover = tokio::spawn(move_drones(
        drones.clone(),
        world.clone(),
        targets.clone(),
        shutdown_rx.clone(),
    ));

    // Scripted players
    let shooter = tokio::spawn(run_shooter(alice_handle.clone(), rng.gen(), shutdown_rx.clone()));
    let grappler = tokio::spawn(run_grappler(bob_handle.clone(), shutdown_rx));

    tokio::select! {
        _ = shutdown_signal() => {}
        _ = tokio::time::sleep(Duration::from_secs(config.harness_seconds)) => {
            info!(seconds = config.harness_seconds, "Harness time elapsed, shutting down");
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(mover, shooter, grappler);

    let alice = alice_task.await?;
    let bob = bob_task.await?;

    info!(ticks = alice.tick(), live = alice.projectile_count(), "Shooter peer finished");
    info!(ticks = bob.tick(), live = bob.projectile_count(), "Grappler peer finished");

    for drone in &drones {
        let seen_by_alice = alice.health(&drone.id).map(|h| h.current);
        let seen_by_bob = bob.health(&drone.id).map(|h| h.current);
        if seen_by_alice == seen_by_bob {
            info!(drone_id = %drone.id, health = ?seen_by_alice, "Drone health agrees");
        } else {
            warn!(
                drone_id = %drone.id,
                shooter = ?seen_by_alice,
                grappler = ?seen_by_bob,
                "Drone health diverged"
            );
        }
    }

    info!("Harness shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}

fn with_harness_defaults(catalog: &mut SettingsCatalog) {
    if !catalog.contains_projectile("bolt") {
        catalog.insert_projectile(
            "bolt",
            ProjectileSettings {
                damage: 10.0,
                knockback: 2.0,
                initial_velocity: 60.0,
                barrel_gap: 0.3,
                ..ProjectileSettings::default()
            },
        );
    }
    if !catalog.contains_projectile("seeker") {
        catalog.insert_projectile(
            "seeker",
            ProjectileSettings {
                damage: 25.0,
                initial_velocity: 25.0,
                homing_strength: 3.0,
                prediction_iterations: 2,
                ..ProjectileSettings::default()
            },
        );
    }
    if !catalog.contains_hookshot("grapple") {
        catalog.insert_hookshot("grapple", HookshotSettings::default());
    }
}

#[derive(Debug, Clone, Copy)]
struct Drone {
    id: Uuid,
    home: Vec3,
    collider: ColliderId,
    phase: f32,
}

fn spawn_drones(
    rng: &mut ChaCha8Rng,
    scene: &mut SceneWorld,
    targets: &TargetableRegistry,
) -> Vec<Drone> {
    (0..DRONE_COUNT)
        .map(|_| {
            let id = Uuid::new_v4();
            let home = Vec3::new(
                rng.gen_range(-15.0..15.0),
                rng.gen_range(1.0..4.0),
                rng.gen_range(20.0..60.0),
            );
            let collider = scene.insert(
                Collider::sphere(home, DRONE_RADIUS)
                    .damageable(id)
                    .targetable(id),
            );
            targets.register(Targetable::new(id, home));
            Drone {
                id,
                home,
                collider,
                phase: rng.gen_range(0.0..std::f32::consts::TAU),
            }
        })
        .collect()
}

async fn move_drones(
    drones: Vec<Drone>,
    world: Arc<RwLock<SceneWorld>>,
    targets: Arc<TargetableRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(20));
    let started = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        let t = started.elapsed().as_secs_f32();
        let mut scene = world.write();
        for drone in &drones {
            let angle = drone.phase + t * 0.8;
            let position = drone.home + Vec3::new(angle.cos() * 2.0, (angle * 2.0).sin() * 0.5, angle.sin() * 2.0);
            scene.move_to(drone.collider, position);
            targets.update(&drone.id, position, None);
        }
    }
}

async fn run_shooter(handle: SessionHandle, seed: u64, mut shutdown: watch::Receiver<bool>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ticker = tokio::time::interval(Duration::from_millis(400));
    let muzzle = Vec3::new(0.0, 1.5, 0.0);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        let direction = Vec3::new(rng.gen_range(-0.3..0.3), rng.gen_range(-0.02..0.1), 1.0);
        let settings_key = if rng.gen_bool(0.5) { "seeker" } else { "bolt" };
        let sent = handle
            .send(SessionCommand::Fire {
                projectile_id: Uuid::new_v4(),
                settings_key: settings_key.to_string(),
                pose: Pose::looking(muzzle, direction),
            })
            .await;
        if !sent {
            break;
        }
    }
}

async fn run_grappler(handle: SessionHandle, mut shutdown: watch::Receiver<bool>) {
    let hook_id = Uuid::new_v4();
    let hand = Vec3::new(2.0, 1.5, 0.0);
    let mut ticker = tokio::time::interval(Duration::from_millis(750));
    let mut deployed = false;

    handle
        .send(SessionCommand::EquipHook {
            hook_id,
            settings_key: "grapple".to_string(),
            muzzle: Pose::looking(hand, Vec3::new(0.0, 0.05, 1.0)),
            anchor: hand,
        })
        .await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        let command = if deployed {
            SessionCommand::ReleaseHook { hook_id }
        } else {
            SessionCommand::FireHook { hook_id }
        };
        deployed = !deployed;
        if !handle.send(command).await {
            break;
        }
    }
}
