use std::sync::Arc;
use std::time::Duration;

use glam::{Quat, Vec3};
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use arena_projectile_sim::game::physics::{Collider, SceneWorld};
use arena_projectile_sim::game::session::{
    PeerSession, PeerSimulation, SessionCommand, SimEvent, SimulationConfig,
};
use arena_projectile_sim::game::settings::{ProjectileSettings, SettingsCatalog};
use arena_projectile_sim::game::{HookState, Pose, TargetableRegistry, WorldView};
use arena_projectile_sim::net::{
    Authority, Envelope, ProjectileRpc, RecordingReplicator, Relay, RelayHandle, RpcTarget,
};

struct Peer {
    sim: PeerSimulation<RelayHandle>,
    inbox: mpsc::Receiver<Envelope>,
}

impl Peer {
    fn join(relay: &Arc<Relay>, catalog: &SettingsCatalog) -> Self {
        let (handle, inbox) = relay.join(Uuid::new_v4());
        Self {
            sim: PeerSimulation::new(handle, catalog.clone(), SimulationConfig::default()),
            inbox,
        }
    }

    fn pump(&mut self, view: &WorldView<'_>) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.inbox.try_recv() {
            self.sim.handle_envelope(envelope, view);
            handled += 1;
        }
        handled
    }

    fn step(&mut self, view: &WorldView<'_>) {
        self.pump(view);
        self.sim.run_tick(view);
        self.sim.late_update();
    }
}

fn catalog() -> SettingsCatalog {
    let mut catalog = SettingsCatalog::new();
    catalog.insert_projectile(
        "rifle",
        ProjectileSettings {
            damage: 15.0,
            knockback: 3.0,
            ..ProjectileSettings::default()
        },
    );
    catalog
}

fn wall_scene(wall: Uuid) -> SceneWorld {
    let mut world = SceneWorld::new();
    world.insert(Collider::cuboid(Vec3::new(-5.0, -5.0, 30.0), Vec3::new(5.0, 5.0, 31.0)).damageable(wall));
    world
}

#[test]
fn damage_is_applied_once_on_every_peer() {
    let wall = Uuid::new_v4();
    let world = wall_scene(wall);
    let registry = TargetableRegistry::new();
    let view = WorldView::new(&world, &registry);
    let relay = Relay::new();
    let catalog = catalog();

    let mut alice = Peer::join(&relay, &catalog);
    let mut bob = Peer::join(&relay, &catalog);
    for peer in [&mut alice, &mut bob] {
        peer.sim.register_damageable(wall, 100.0);
    }

    let shot = Uuid::new_v4();
    alice.sim.fire(shot, "rifle", Pose::default(), &view);
    for _ in 0..60 {
        alice.step(&view);
        bob.step(&view);
    }
    alice.pump(&view);
    bob.pump(&view);

    assert_eq!(alice.sim.health(&wall).map(|h| h.current), Some(85.0));
    assert_eq!(bob.sim.health(&wall).map(|h| h.current), Some(85.0));

    // Mirror was torn down by the owner's destroy, never by its own physics
    assert_eq!(bob.sim.projectile_count(), 0);
    let bob_events = bob.sim.drain_events();
    assert!(bob_events.contains(&SimEvent::Destroyed {
        projectile_id: shot,
        burned_out: false,
    }));
    let knockbacks: Vec<Vec3> = bob_events
        .iter()
        .filter_map(|e| match e {
            SimEvent::Damaged { outcome, .. } => Some(outcome.knockback),
            _ => None,
        })
        .collect();
    assert_eq!(knockbacks.len(), 1);
    assert!((knockbacks[0] - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-4);
}

#[test]
fn mirror_tracks_owner_between_snapshots() {
    let world = SceneWorld::new();
    let registry = TargetableRegistry::new();
    let view = WorldView::new(&world, &registry);
    let relay = Relay::new();
    let catalog = catalog();

    let mut alice = Peer::join(&relay, &catalog);
    let mut bob = Peer::join(&relay, &catalog);

    let shot = Uuid::new_v4();
    alice.sim.fire(shot, "rifle", Pose::looking(Vec3::new(0.0, 1.0, 0.0), Vec3::X), &view);

    for _ in 0..40 {
        alice.step(&view);
        bob.step(&view);

        let owned = alice.sim.projectile(&shot).map(|p| p.position());
        let mirrored = bob.sim.projectile(&shot).map(|p| p.position());
        if let (Some(owned), Some(mirrored)) = (owned, mirrored) {
            assert!(owned.distance(mirrored) < 1.5, "mirror drifted: {owned} vs {mirrored}");
        }
    }

    let mirror = bob.sim.projectile(&shot).unwrap();
    assert_eq!(mirror.authority(), Authority::Mirror);
    assert!(mirror.position().x > 30.0);
}

#[test]
fn echoed_fire_does_not_duplicate_projectiles() {
    let world = SceneWorld::new();
    let registry = TargetableRegistry::new();
    let view = WorldView::new(&world, &registry);
    let relay = Relay::new();
    let catalog = catalog();

    let mut alice = Peer::join(&relay, &catalog);
    let mut bob = Peer::join(&relay, &catalog);

    let shot = Uuid::new_v4();
    alice.sim.fire(shot, "rifle", Pose::default(), &view);
    // Owner fires the same id again, e.g. a retried input
    alice.sim.fire(shot, "rifle", Pose::default(), &view);

    assert_eq!(bob.pump(&view), 1);
    assert_eq!(bob.sim.projectile_count(), 1);
    assert_eq!(alice.sim.projectile_count(), 1);
}

#[test]
fn observers_mirror_the_hook_lifecycle() {
    let mut world = SceneWorld::new();
    world.insert(Collider::cuboid(Vec3::new(-3.0, -3.0, 10.0), Vec3::new(3.0, 3.0, 11.0)));
    let registry = TargetableRegistry::new();
    let view = WorldView::new(&world, &registry);
    let relay = Relay::new();
    let catalog = catalog();

    let mut alice = Peer::join(&relay, &catalog);
    let mut bob = Peer::join(&relay, &catalog);
    let hook_id = Uuid::new_v4();

    bob.sim.equip_hook(hook_id, "grapple", Pose::default(), Vec3::ZERO);
    assert!(bob.sim.fire_hook(&hook_id, &view));

    let mut seen = Vec::new();
    for _ in 0..40 {
        bob.step(&view);
        alice.step(&view);
        if let Some(state) = alice.sim.hook(&hook_id).map(|h| h.state()) {
            if seen.last() != Some(&state) {
                seen.push(state);
            }
        }
    }
    assert_eq!(seen, vec![HookState::Deployed, HookState::Hooked]);
    let mirror = alice.sim.hook(&hook_id).unwrap();
    assert!(mirror.is_mirrored());
    assert_eq!(mirror.hooked_point(), bob.sim.hook(&hook_id).unwrap().hooked_point());

    assert!(bob.sim.release_hook(&hook_id));
    for _ in 0..300 {
        bob.step(&view);
        alice.step(&view);
    }
    assert_eq!(bob.sim.hook(&hook_id).map(|h| h.state()), Some(HookState::Stowed));
    assert_eq!(alice.sim.hook(&hook_id).map(|h| h.state()), Some(HookState::Stowed));

    // Observers never drive a hook they do not own
    assert!(!alice.sim.fire_hook(&hook_id, &view));
}

#[test]
fn departed_owner_leaves_no_mirrors_behind() {
    let world = SceneWorld::new();
    let registry = TargetableRegistry::new();
    let view = WorldView::new(&world, &registry);
    let relay = Relay::new();
    let catalog = catalog();

    let mut alice = Peer::join(&relay, &catalog);
    let mut bob = Peer::join(&relay, &catalog);

    alice.sim.fire(Uuid::new_v4(), "rifle", Pose::default(), &view);
    bob.step(&view);
    assert_eq!(bob.sim.projectile_count(), 1);

    relay.leave(&alice.sim.peer_id());
    bob.step(&view);
    assert_eq!(bob.sim.projectile_count(), 0);
    assert_eq!(relay.peer_count(), 1);
}

#[test]
fn mirror_with_lost_destroy_burns_out_at_range() {
    let world = SceneWorld::new();
    let registry = TargetableRegistry::new();
    let view = WorldView::new(&world, &registry);
    let mut catalog = catalog();
    catalog.insert_projectile(
        "short",
        ProjectileSettings {
            range: 10.0,
            ..ProjectileSettings::default()
        },
    );
    let mut observer = PeerSimulation::new(RecordingReplicator::new(Uuid::new_v4()), catalog, SimulationConfig::default());

    let owner = Uuid::new_v4();
    let shot = Uuid::new_v4();
    observer.handle_envelope(
        Envelope::new(
            owner,
            RpcTarget::Others,
            ProjectileRpc::Fire {
                projectile_id: shot,
                owner_id: owner,
                settings_key: "short".to_string(),
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            },
        ),
        &view,
    );
    assert_eq!(observer.projectile_count(), 1);

    // The owner's destroy never arrives
    for _ in 0..5000 {
        observer.run_tick(&view);
    }
    assert_eq!(observer.projectile_count(), 0);
    assert!(observer.drain_events().contains(&SimEvent::Destroyed {
        projectile_id: shot,
        burned_out: true,
    }));
    assert!(observer.replicator().drain().is_empty());
}

#[tokio::test]
async fn sessions_agree_on_damage() {
    let wall = Uuid::new_v4();
    let world = Arc::new(RwLock::new(wall_scene(wall)));
    let targets = Arc::new(TargetableRegistry::new());
    let relay = Relay::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (alice, alice_handle) = PeerSession::new(
        Uuid::new_v4(),
        &relay,
        world.clone(),
        targets.clone(),
        catalog(),
        SimulationConfig::default(),
        shutdown_rx.clone(),
    );
    let (bob, bob_handle) = PeerSession::new(
        Uuid::new_v4(),
        &relay,
        world.clone(),
        targets.clone(),
        catalog(),
        SimulationConfig::default(),
        shutdown_rx,
    );

    for handle in [&alice_handle, &bob_handle] {
        assert!(
            handle
                .send(SessionCommand::RegisterDamageable {
                    entity: wall,
                    max_health: 100.0,
                })
                .await
        );
    }
    for _ in 0..2 {
        assert!(
            alice_handle
                .send(SessionCommand::Fire {
                    projectile_id: Uuid::new_v4(),
                    settings_key: "rifle".to_string(),
                    pose: Pose::default(),
                })
                .await
        );
    }

    let alice_task = tokio::spawn(alice.run());
    let bob_task = tokio::spawn(bob.run());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    shutdown_tx.send(true).unwrap();

    let alice = alice_task.await.unwrap();
    let bob = bob_task.await.unwrap();

    assert!(alice_handle.ticks() > 0);
    assert_eq!(alice.health(&wall).map(|h| h.current), Some(70.0));
    assert_eq!(bob.health(&wall).map(|h| h.current), Some(70.0));
    assert_eq!(relay.peer_count(), 0);
}
