use std::time::Duration;

use glam::Vec2;
use wavebreak_core::{
    Archetype, Command, EffectiveStats, EnemyConfig, EnemyId, Event, Faction, HitEvent, HitId,
    HitShape, Owner, PlayerClass, ProjectileMotion, ProjectileSpec, Rank,
};
use wavebreak_system_combat::{Combat, CombatTuning};
use wavebreak_world::{self as world, query, World};

fn started_world() -> World {
    let mut world = World::default();
    world::apply(
        &mut world,
        Command::StartRun {
            class: PlayerClass::Lancer,
            stats: EffectiveStats {
                crit_chance: 0.0,
                ..EffectiveStats::default()
            },
        },
        &mut Vec::new(),
    );
    world
}

fn spawn(world: &mut World, position: Vec2) -> EnemyId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnEnemy {
            config: EnemyConfig::new(Archetype::Chaser, Faction::Vermin, Rank::Normal, 1.0),
            position,
        },
        &mut events,
    );
    match events.as_slice() {
        [Event::EnemySpawned { enemy, .. }] => *enemy,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

fn step(world: &mut World, combat: &mut Combat) -> Vec<Command> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(16),
        },
        &mut events,
    );
    let mut commands = Vec::new();
    combat.handle(
        &events,
        &query::enemy_view(world),
        &query::projectiles(world),
        &query::player(world),
        &mut commands,
    );
    commands
}

fn line_hit(id: u64) -> HitEvent {
    HitEvent {
        id: HitId::new(id),
        owner: Owner::Player,
        damage: 50.0,
        origin: Vec2::ZERO,
        shape: HitShape::Line {
            from: Vec2::ZERO,
            to: Vec2::new(400.0, 0.0),
        },
        can_crit: false,
        knockback: true,
    }
}

fn damage_commands(commands: &[Command]) -> usize {
    commands
        .iter()
        .filter(|command| matches!(command, Command::ApplyDamage { .. }))
        .count()
}

#[test]
fn hit_scan_pierces_every_enemy_on_the_line_once() {
    let mut world = started_world();
    for x in [100.0, 200.0, 300.0] {
        let _ = spawn(&mut world, Vec2::new(x, 0.0));
    }
    let bystander = spawn(&mut world, Vec2::new(0.0, 200.0));
    let mut combat = Combat::new(CombatTuning::default(), 3);

    combat.queue(line_hit(77));
    let commands = step(&mut world, &mut combat);
    assert_eq!(damage_commands(&commands), 3);

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    let kills = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyKilled { .. }))
        .count();
    assert_eq!(kills, 3);
    assert_eq!(query::live_enemy_count(&world), 1);
    assert!(query::enemy(&world, bystander).is_some());

    combat.queue(line_hit(77));
    let mut repeated = Vec::new();
    for _ in 0..6 {
        repeated.extend(step(&mut world, &mut combat));
    }
    assert_eq!(combat.pending(), 0);
    assert_eq!(damage_commands(&repeated), 0, "consumed hit was resolved again");
}

#[test]
fn projectile_damages_a_single_enemy_once() {
    let mut world = started_world();
    let near = spawn(&mut world, Vec2::new(100.0, 0.0));
    let _far = spawn(&mut world, Vec2::new(130.0, 0.0));
    world::apply(
        &mut world,
        Command::FireProjectile {
            spec: ProjectileSpec {
                owner: Owner::Player,
                origin: Vec2::ZERO,
                velocity: Vec2::new(600.0, 0.0),
                damage: 10.0,
                radius: 5.0,
                lifetime: Duration::from_secs(1),
                motion: ProjectileMotion::Straight,
                can_crit: false,
            },
        },
        &mut Vec::new(),
    );
    let mut combat = Combat::default();

    let mut hit = None;
    for _ in 0..30 {
        let commands = step(&mut world, &mut combat);
        if let Some(command) = commands
            .into_iter()
            .find(|command| matches!(command, Command::ApplyDamage { .. }))
        {
            hit = Some(command);
            break;
        }
    }
    let hit = hit.expect("projectile never connected");
    assert!(matches!(hit, Command::ApplyDamage { enemy, .. } if enemy == near));

    let mut events = Vec::new();
    world::apply(&mut world, hit.clone(), &mut events);
    world::apply(&mut world, hit, &mut events);
    let applied = events
        .iter()
        .filter(|event| matches!(event, Event::DamageApplied { .. }))
        .count();
    assert_eq!(applied, 1);
    assert!(query::projectiles(&world).is_empty());

    let later = step(&mut world, &mut combat);
    assert_eq!(damage_commands(&later), 0);
}

#[test]
fn enemy_projectiles_hurt_the_player_and_expire() {
    let mut world = started_world();
    let shooter = spawn(&mut world, Vec2::new(300.0, 300.0));
    world::apply(
        &mut world,
        Command::FireProjectile {
            spec: ProjectileSpec {
                owner: Owner::Enemy(shooter),
                origin: Vec2::new(40.0, 0.0),
                velocity: Vec2::new(-600.0, 0.0),
                damage: 8.0,
                radius: 6.0,
                lifetime: Duration::from_secs(1),
                motion: ProjectileMotion::Straight,
                can_crit: false,
            },
        },
        &mut Vec::new(),
    );
    let mut combat = Combat::default();

    let mut events = Vec::new();
    for _ in 0..5 {
        for command in step(&mut world, &mut combat) {
            world::apply(&mut world, command, &mut events);
        }
    }

    let damaged: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::PlayerDamaged { .. }))
        .collect();
    assert_eq!(damaged.len(), 1);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileExpired { .. })));
    assert!(query::projectiles(&world).is_empty());
}

#[test]
fn contact_damage_respects_invulnerability() {
    let mut world = started_world();
    let _ = spawn(&mut world, Vec2::new(10.0, 0.0));
    let mut combat = Combat::default();

    let mut events = Vec::new();
    for _ in 0..10 {
        for command in step(&mut world, &mut combat) {
            world::apply(&mut world, command, &mut events);
        }
    }

    let damaged = events
        .iter()
        .filter(|event| matches!(event, Event::PlayerDamaged { .. }))
        .count();
    assert_eq!(damaged, 1, "invulnerability window should absorb repeat contact");
}
