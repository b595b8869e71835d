//! An autonomous agent plans with the decision engine: it walks into range
//! across rounds, attacks, and the whole hunt rewinds cleanly.

use gridfall::ai::activity::{Activity, ActivityFlags, Effect};
use gridfall::ai::disposition::Disposition;
use gridfall::bus::events::{EntityPushed, PositionQuery, StatQuery};
use gridfall::core::config::{GridConfig, SimConfig};
use gridfall::core::types::{Coord, EntityId, Vec2};
use gridfall::entity::alignment::AlignmentFlags;
use gridfall::entity::stats::{Damage, DamageKind, StatBlock, StatKind};
use gridfall::entity::taker::Conduct;
use gridfall::pathfinding::distance;
use gridfall::{EntityBlueprint, Environment};

fn arena() -> SimConfig {
    SimConfig {
        grid: GridConfig {
            cell_size: 1.0,
            origin: Vec2::new(0.0, 0.0),
            lower: Coord::new(0, 0),
            upper: Coord::new(7, 7),
        },
        ..SimConfig::default()
    }
}

fn hunter() -> EntityBlueprint {
    EntityBlueprint {
        name: "hunter".into(),
        stats: StatBlock::default(),
        alignment: AlignmentFlags::FERAL,
        is_obstruction: true,
        conduct: Some(Conduct::Autonomous(Disposition {
            aggression: 1.0,
            mischief: 0.0,
            support: 0.0,
            leadership: 0.0,
        })),
        activities: vec![
            Activity {
                name: "stride".into(),
                base_cost: 1,
                base_range: 1,
                flags: ActivityFlags::MOVEMENT,
                effect: Effect::Step,
            },
            Activity {
                name: "claw".into(),
                base_cost: 2,
                base_range: 2,
                flags: ActivityFlags::DAMAGE,
                effect: Effect::Strike { damage: Damage::new(3, DamageKind::Slashing) },
            },
        ],
    }
}

fn quarry() -> EntityBlueprint {
    EntityBlueprint {
        name: "quarry".into(),
        stats: StatBlock::default(),
        alignment: AlignmentFlags::KINDRED,
        is_obstruction: true,
        conduct: None,
        activities: Vec::new(),
    }
}

fn position_of(env: &Environment, entity: EntityId) -> Coord {
    let mut query = PositionQuery::new(&[entity]);
    env.bus().raise(&mut query);
    query.single()
}

fn stat_of(env: &Environment, entity: EntityId, kind: StatKind) -> i32 {
    let mut query = StatQuery::new(kind, &[entity]);
    env.bus().raise(&mut query);
    query.single()
}

#[test]
fn hunter_closes_distance_then_attacks() {
    let env = Environment::new(&arena()).unwrap();
    let hunter = env.spawn(&hunter(), Coord::new(0, 0)).unwrap();
    let quarry = env.spawn(&quarry(), Coord::new(4, 0)).unwrap();

    // round one: three strides into claw range (straight steps cost 2 each,
    // claw reach is 2), then one claw with the last action points
    env.pump();
    assert_eq!(position_of(&env, hunter), Coord::new(3, 0));
    assert_eq!(stat_of(&env, quarry, StatKind::Hp), 13);

    // round two: already in range, enough AP for two claws
    env.pump();
    assert_eq!(position_of(&env, hunter), Coord::new(3, 0));
    assert_eq!(stat_of(&env, quarry, StatKind::Hp), 7);
}

#[test]
fn hunt_rewinds_to_the_beginning() {
    let env = Environment::new(&arena()).unwrap();
    let hunter = env.spawn(&hunter(), Coord::new(0, 0)).unwrap();
    let quarry = env.spawn(&quarry(), Coord::new(4, 0)).unwrap();

    env.pump();
    env.pump();
    env.pump();
    assert!(stat_of(&env, quarry, StatKind::Hp) < 16);

    env.request_rewind(99);
    assert_eq!(position_of(&env, hunter), Coord::new(0, 0));
    assert_eq!(stat_of(&env, quarry, StatKind::Hp), 16);
    assert_eq!(stat_of(&env, hunter, StatKind::Ap), 4);
}

#[test]
fn interrupted_hunter_replans_when_the_quarry_flees() {
    let env = Environment::new(&arena()).unwrap();
    let mut poor_stamina = hunter();
    poor_stamina.stats.ap = 2;
    let hunter = env.spawn(&poor_stamina, Coord::new(0, 0)).unwrap();
    let quarry = env.spawn(&quarry(), Coord::new(4, 0)).unwrap();

    // round one: two strides exhaust the turn short of claw range, leaving
    // the rest of the plan queued
    env.pump();
    assert_eq!(position_of(&env, hunter), Coord::new(2, 0));
    assert_eq!(stat_of(&env, quarry, StatKind::Hp), 16);

    // the quarry flees across the arena before the plan resumes
    env.bus().raise(&mut EntityPushed::self_push(quarry, Coord::new(3, 7)));

    // the retained plan is re-derived from live positions: the hunter gives
    // chase instead of clawing far out of range
    env.pump();
    assert_eq!(stat_of(&env, quarry, StatKind::Hp), 16);
    let fled_to = Coord::new(7, 7);
    assert!(distance(position_of(&env, hunter), fled_to) < distance(Coord::new(2, 0), fled_to));
}

#[test]
fn hunter_with_no_enemies_ends_its_turn() {
    let env = Environment::new(&arena()).unwrap();
    let hunter = env.spawn(&hunter(), Coord::new(2, 2)).unwrap();

    // nothing to hunt: rounds pass without stalling or moving
    env.pump();
    env.pump();
    assert_eq!(env.current_round(), 2);
    assert_eq!(position_of(&env, hunter), Coord::new(2, 2));
    assert_eq!(stat_of(&env, hunter, StatKind::Ap), 4);
}

#[test]
fn blocked_hunter_cancels_its_plan_and_passes() {
    // the quarry is walled off; no path into claw range exists
    let env = Environment::new(&arena()).unwrap();
    let hunter = env.spawn(&hunter(), Coord::new(0, 4)).unwrap();
    let quarry = env.spawn(&quarry(), Coord::new(7, 0)).unwrap();
    let wall = wall();
    for y in 0..=7 {
        env.spawn(&wall, Coord::new(4, y)).unwrap();
    }

    env.pump();
    assert_eq!(env.current_round(), 1);
    assert_eq!(position_of(&env, hunter), Coord::new(0, 4));
    assert_eq!(stat_of(&env, quarry, StatKind::Hp), 16);
}

fn wall() -> EntityBlueprint {
    EntityBlueprint {
        name: "wall".into(),
        stats: StatBlock::default(),
        alignment: AlignmentFlags::NONE,
        is_obstruction: true,
        conduct: None,
        activities: Vec::new(),
    }
}
