//! A directed agent holds the round open, consumes directional input,
//! spends AP, and releases its hold when spent.

use gridfall::bus::events::{DirectionPressed, PositionQuery, StatQuery};
use gridfall::core::config::SimConfig;
use gridfall::core::types::{Coord, EntityId};
use gridfall::entity::alignment::AlignmentFlags;
use gridfall::entity::stats::{StatBlock, StatKind};
use gridfall::entity::taker::Conduct;
use gridfall::{EntityBlueprint, Environment};

fn ranger() -> EntityBlueprint {
    EntityBlueprint {
        name: "ranger".into(),
        stats: StatBlock::default(),
        alignment: AlignmentFlags::KINDRED,
        is_obstruction: true,
        conduct: Some(Conduct::Directed),
        activities: Vec::new(),
    }
}

fn boulder() -> EntityBlueprint {
    EntityBlueprint {
        name: "boulder".into(),
        stats: StatBlock::default(),
        alignment: AlignmentFlags::NONE,
        is_obstruction: true,
        conduct: None,
        activities: Vec::new(),
    }
}

fn press(env: &Environment, direction: Coord) {
    env.bus().raise(&mut DirectionPressed { direction });
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
fn press_into_free_cell_moves() {
    let env = Environment::new(&SimConfig::default()).unwrap();
    let ranger = env.spawn(&ranger(), Coord::new(2, 2)).unwrap();

    env.pump();
    press(&env, Coord::new(1, 0));
    assert_eq!(position_of(&env, ranger), Coord::new(3, 2));
    assert_eq!(stat_of(&env, ranger, StatKind::Ap), 0);
}

#[test]
fn press_into_obstructed_cell_attacks() {
    let env = Environment::new(&SimConfig::default()).unwrap();
    let ranger = env.spawn(&ranger(), Coord::new(2, 2)).unwrap();
    let boulder = env.spawn(&boulder(), Coord::new(3, 2)).unwrap();

    env.pump();
    press(&env, Coord::new(1, 0));
    assert_eq!(position_of(&env, ranger), Coord::new(2, 2));
    assert_eq!(stat_of(&env, boulder, StatKind::Hp), 15);
}

#[test]
fn press_off_the_grid_attacks_the_edge() {
    // out-of-bounds cells count as obstructed, so the press becomes a swing
    let env = Environment::new(&SimConfig::default()).unwrap();
    let ranger = env.spawn(&ranger(), Coord::new(0, 0)).unwrap();

    env.pump();
    press(&env, Coord::new(-1, 0));
    assert_eq!(position_of(&env, ranger), Coord::new(0, 0));
    assert_eq!(stat_of(&env, ranger, StatKind::Ap), 0);
}

#[test]
fn spent_ranger_releases_the_round() {
    let env = Environment::new(&SimConfig::default()).unwrap();
    let ranger = env.spawn(&ranger(), Coord::new(2, 2)).unwrap();

    env.pump();
    assert_eq!(env.current_round(), 1);

    // the round stalls while the ranger still has AP
    env.pump();
    assert_eq!(env.current_round(), 1);

    press(&env, Coord::new(0, 1));
    env.pump();
    assert_eq!(env.current_round(), 2);
    // the boundary restored the spent AP
    assert_eq!(stat_of(&env, ranger, StatKind::Ap), 4);
    assert_eq!(position_of(&env, ranger), Coord::new(2, 3));
}

#[test]
fn input_before_the_first_round_is_ignored() {
    let env = Environment::new(&SimConfig::default()).unwrap();
    let ranger = env.spawn(&ranger(), Coord::new(2, 2)).unwrap();

    press(&env, Coord::new(1, 0));
    assert_eq!(position_of(&env, ranger), Coord::new(2, 2));
    assert_eq!(stat_of(&env, ranger, StatKind::Ap), 4);
}

#[test]
fn directed_acts_after_autonomous_settle() {
    use gridfall::ai::activity::{Activity, ActivityFlags, Effect};
    use gridfall::ai::disposition::Disposition;
    use gridfall::entity::stats::{Damage, DamageKind};

    let env = Environment::new(&SimConfig::default()).unwrap();
    let ranger = env.spawn(&ranger(), Coord::new(0, 0)).unwrap();
    let ghoul = env
        .spawn(
            &EntityBlueprint {
                name: "ghoul".into(),
                stats: StatBlock::default(),
                alignment: AlignmentFlags::FERAL,
                is_obstruction: true,
                conduct: Some(Conduct::Autonomous(Disposition {
                    aggression: 1.0,
                    mischief: 0.0,
                    support: 0.0,
                    leadership: 0.0,
                })),
                activities: vec![Activity {
                    name: "claw".into(),
                    base_cost: 2,
                    base_range: 2,
                    flags: ActivityFlags::DAMAGE,
                    effect: Effect::Strike { damage: Damage::new(1, DamageKind::Slashing) },
                }],
            },
            Coord::new(1, 0),
        )
        .unwrap();

    // the ghoul's whole turn runs inside the round start; the ranger's hold
    // then keeps the round open for input
    env.pump();
    assert_eq!(stat_of(&env, ranger, StatKind::Hp), 14);
    assert_eq!(stat_of(&env, ghoul, StatKind::Ap), 0);
    assert_eq!(env.current_round(), 1);

    env.pump();
    assert_eq!(env.current_round(), 1);

    press(&env, Coord::new(1, 0));
    env.pump();
    assert_eq!(env.current_round(), 2);
    assert_eq!(stat_of(&env, ghoul, StatKind::Hp), 15);
}
