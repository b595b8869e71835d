//! Kernel assembly
//!
//! Owns the bus, grid, pathfinder, round history, and tracker, and spawns
//! entities from blueprints by wiring their components onto the bus.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ai::activity::Activity;
use crate::bus::events::{OccupancyQuery, RoundPassed};
use crate::bus::EventBus;
use crate::core::config::SimConfig;
use crate::core::error::{KernelError, Result};
use crate::core::types::{Coord, EntityId, Round};
use crate::entity::alignment::{AlignmentBadge, AlignmentChart, AlignmentFlags};
use crate::entity::mover::Mover;
use crate::entity::stats::{StatBlock, StatSheet};
use crate::entity::taker::{Conduct, TurnTaker};
use crate::entity::SharedPosition;
use crate::grid::CellGrid;
use crate::pathfinding::PathFinder;
use crate::turn::tracker::TurnTracker;
use crate::undo::RoundHistory;

/// Recipe for an entity: which components it gets and how they start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityBlueprint {
    pub name: String,
    #[serde(default)]
    pub stats: StatBlock,
    #[serde(default)]
    pub alignment: AlignmentFlags,
    #[serde(default)]
    pub is_obstruction: bool,
    #[serde(default)]
    pub conduct: Option<Conduct>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

pub struct Environment {
    bus: Rc<EventBus>,
    grid: Rc<CellGrid>,
    pathfinder: Rc<PathFinder>,
    history: Rc<RefCell<RoundHistory>>,
    tracker: TurnTracker,
    chart: Rc<AlignmentChart>,
}

impl Environment {
    pub fn new(config: &SimConfig) -> Result<Self> {
        config.validate()?;
        let bus = Rc::new(EventBus::new());
        let history = bus.history();
        let grid = Rc::new(CellGrid::new(&config.grid));
        let pathfinder = Rc::new(PathFinder::new(&grid, Rc::clone(&bus)));
        let tracker = TurnTracker::new(Rc::clone(&bus));

        // the passed round's material is archived only after every other
        // reaction to the boundary has produced its commands
        let h = Rc::clone(&history);
        bus.subscribe_at::<RoundPassed, _>(f32::INFINITY, move |_, _| {
            h.borrow_mut().advance_round();
        });

        Ok(Self {
            bus,
            grid,
            pathfinder,
            history,
            tracker,
            chart: Rc::new(config.chart.clone()),
        })
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn grid(&self) -> &Rc<CellGrid> {
        &self.grid
    }

    pub fn pathfinder(&self) -> &Rc<PathFinder> {
        &self.pathfinder
    }

    /// Advances the round state machine once; a no-op while any turn hold
    /// is outstanding.
    pub fn pump(&self) {
        self.tracker.pump();
    }

    pub fn current_round(&self) -> Round {
        self.tracker.current_round()
    }

    pub fn completed_rounds(&self) -> usize {
        self.history.borrow().completed_rounds()
    }

    /// Undoes the last `rounds` rounds, current round included.
    pub fn request_rewind(&self, rounds: usize) {
        tracing::info!(rounds, "rewind requested");
        self.history.borrow_mut().rewind(rounds);
    }

    /// Spawns an entity from `blueprint` at `cell`, wiring its components
    /// onto the bus. Obstructing blueprints refuse obstructed cells.
    pub fn spawn(&self, blueprint: &EntityBlueprint, cell: Coord) -> Result<EntityId> {
        if !self.grid.contains(cell) {
            return Err(KernelError::CellOutOfBounds(cell));
        }
        if blueprint.is_obstruction {
            let mut query = OccupancyQuery::new([cell]);
            self.bus.raise(&mut query);
            if query.includes_obstruction {
                return Err(KernelError::CellObstructed(cell));
            }
        }

        let entity = EntityId::new();
        let position: SharedPosition = Rc::new(std::cell::Cell::new(cell));
        Mover::attach(&self.bus, entity, Rc::clone(&position), blueprint.is_obstruction);
        StatSheet::attach(&self.bus, entity, Rc::clone(&position), &blueprint.stats);
        AlignmentBadge::attach(&self.bus, entity, blueprint.alignment, Rc::clone(&self.chart));
        if let Some(conduct) = &blueprint.conduct {
            TurnTaker::attach(
                &self.bus,
                &self.pathfinder,
                entity,
                conduct.clone(),
                blueprint.activities.clone(),
            );
        }
        tracing::debug!(?entity, ?cell, name = %blueprint.name, "entity spawned");
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_spawn_rejects_occupied_cell() {
        let env = Environment::new(&SimConfig::default()).unwrap();
        let cell = Coord::new(3, 3);
        env.spawn(&wall(), cell).unwrap();
        assert!(matches!(env.spawn(&wall(), cell), Err(KernelError::CellObstructed(_))));
    }

    #[test]
    fn test_spawn_rejects_out_of_bounds() {
        let env = Environment::new(&SimConfig::default()).unwrap();
        assert!(matches!(
            env.spawn(&wall(), Coord::new(-1, 0)),
            Err(KernelError::CellOutOfBounds(_))
        ));
    }

    #[test]
    fn test_rounds_pass_without_takers() {
        let env = Environment::new(&SimConfig::default()).unwrap();
        env.pump();
        env.pump();
        env.pump();
        assert_eq!(env.current_round(), 3);
    }
}
