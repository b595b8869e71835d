//! Demo skirmish: an autonomous ghoul hunts a directed ranger
//!
//! Runs a handful of rounds (the ranger's input is scripted to press
//! toward the ghoul), then rewinds two rounds to show the undo engine.

use gridfall::ai::activity::{Activity, ActivityFlags, Effect};
use gridfall::ai::disposition::Disposition;
use gridfall::bus::events::{
    CellClicked, DirectionPressed, MouseButton, OccupancyQuery, PositionQuery, StatQuery,
};
use gridfall::core::config::SimConfig;
use gridfall::core::error::Result;
use gridfall::core::types::{Coord, EntityId};
use gridfall::entity::alignment::AlignmentFlags;
use gridfall::entity::stats::{Damage, DamageKind, StatBlock, StatKind};
use gridfall::entity::taker::Conduct;
use gridfall::{EntityBlueprint, Environment};

use tracing::info;
use tracing_subscriber::EnvFilter;

fn ghoul_blueprint() -> EntityBlueprint {
    EntityBlueprint {
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
        activities: vec![
            Activity {
                name: "shamble".into(),
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
                effect: Effect::Strike { damage: Damage::new(2, DamageKind::Slashing) },
            },
        ],
    }
}

fn ranger_blueprint() -> EntityBlueprint {
    EntityBlueprint {
        name: "ranger".into(),
        stats: StatBlock::default(),
        alignment: AlignmentFlags::KINDRED,
        is_obstruction: true,
        conduct: Some(Conduct::Directed),
        activities: Vec::new(),
    }
}

fn report(env: &Environment, ranger: EntityId, ghoul: EntityId) {
    let mut positions = PositionQuery::new(&[ranger, ghoul]);
    env.bus().raise(&mut positions);
    let mut hp = StatQuery::new(StatKind::Hp, &[ranger, ghoul]);
    env.bus().raise(&mut hp);
    info!(
        round = env.current_round(),
        ranger_at = ?positions.get(ranger),
        ranger_hp = hp.values[&ranger],
        ghoul_at = ?positions.get(ghoul),
        ghoul_hp = hp.values[&ghoul],
        "skirmish state"
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SimConfig::default();
    let env = Environment::new(&config)?;

    let ghoul = env.spawn(&ghoul_blueprint(), Coord::new(9, 9))?;
    let ranger = env.spawn(&ranger_blueprint(), Coord::new(2, 2))?;

    // clicking a cell inspects its occupants
    let bus = env.bus().clone();
    env.bus().respond::<CellClicked, _>(move |click, _| {
        let mut occupants = OccupancyQuery::new([click.cell]);
        bus.raise(&mut occupants);
        info!(cell = ?click.cell, occupants = occupants.entities.len(), "cell inspected");
    });

    info!("skirmish begins");
    report(&env, ranger, ghoul);
    env.bus().raise(&mut CellClicked { button: MouseButton::Left, cell: Coord::new(9, 9) });

    for _ in 0..6 {
        env.pump();

        // scripted input: the ranger presses toward the ghoul
        let mut positions = PositionQuery::new(&[ranger, ghoul]);
        env.bus().raise(&mut positions);
        let direction = positions.get(ranger).step_toward(&positions.get(ghoul));
        env.bus().raise(&mut DirectionPressed { direction });

        report(&env, ranger, ghoul);
    }

    info!("rewinding two rounds");
    env.request_rewind(2);
    report(&env, ranger, ghoul);

    Ok(())
}
