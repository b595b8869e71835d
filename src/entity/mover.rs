//! Position component
//!
//! Owns one entity's shared position cell, answers occupancy and position
//! queries, and turns pushes into invertible move commands.

use std::rc::Rc;

use crate::bus::events::{EntityPushed, OccupancyQuery, PositionQuery};
use crate::bus::EventBus;
use crate::core::types::{Coord, EntityId};
use crate::entity::SharedPosition;
use crate::undo::Invertible;

pub struct Mover {
    entity: EntityId,
    position: SharedPosition,
    is_obstruction: bool,
}

impl Mover {
    pub fn attach(bus: &Rc<EventBus>, entity: EntityId, position: SharedPosition, is_obstruction: bool) {
        let mover = Rc::new(Self { entity, position, is_obstruction });

        // the push lands only after every other reaction has adjusted it
        let m = Rc::clone(&mover);
        bus.subscribe_at::<EntityPushed, _>(f32::INFINITY, move |event, commands| {
            if event.pushee != m.entity {
                return;
            }
            commands.record(MoveCommand {
                position: Rc::clone(&m.position),
                displacement: event.displacement,
            });
        });

        let m = Rc::clone(&mover);
        bus.respond::<OccupancyQuery, _>(move |query, _| {
            if !query.cells.contains(&m.position.get()) {
                return;
            }
            query.entities.push(m.entity);
            if m.is_obstruction {
                query.includes_obstruction = true;
            }
        });

        let m = mover;
        bus.respond::<PositionQuery, _>(move |query, _| {
            if let Some(slot) = query.positions.get_mut(&m.entity) {
                *slot = m.position.get();
            }
        });
    }
}

struct MoveCommand {
    position: SharedPosition,
    displacement: Coord,
}

impl Invertible for MoveCommand {
    fn apply(&mut self) {
        self.position.set(self.position.get() + self.displacement);
    }

    fn undo(&mut self) {
        self.position.set(self.position.get() - self.displacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn mover_at(bus: &Rc<EventBus>, cell: Coord, is_obstruction: bool) -> (EntityId, SharedPosition) {
        let entity = EntityId::new();
        let position: SharedPosition = Rc::new(Cell::new(cell));
        Mover::attach(bus, entity, Rc::clone(&position), is_obstruction);
        (entity, position)
    }

    #[test]
    fn test_push_displaces() {
        let bus = Rc::new(EventBus::new());
        let (entity, position) = mover_at(&bus, Coord::new(1, 1), false);

        bus.raise(&mut EntityPushed::self_push(entity, Coord::new(1, 0)));
        assert_eq!(position.get(), Coord::new(2, 1));
    }

    #[test]
    fn test_push_of_other_entity_ignored() {
        let bus = Rc::new(EventBus::new());
        let (_, position) = mover_at(&bus, Coord::new(1, 1), false);

        bus.raise(&mut EntityPushed::self_push(EntityId::new(), Coord::new(1, 0)));
        assert_eq!(position.get(), Coord::new(1, 1));
    }

    #[test]
    fn test_push_rewinds() {
        let bus = Rc::new(EventBus::new());
        let (entity, position) = mover_at(&bus, Coord::new(0, 0), false);

        bus.raise(&mut EntityPushed::self_push(entity, Coord::new(1, 1)));
        bus.raise(&mut EntityPushed::self_push(entity, Coord::new(1, 0)));
        assert_eq!(position.get(), Coord::new(2, 1));

        bus.history().borrow_mut().rewind(1);
        assert_eq!(position.get(), Coord::new(0, 0));
    }

    #[test]
    fn test_occupancy_query() {
        let bus = Rc::new(EventBus::new());
        let (wall, _) = mover_at(&bus, Coord::new(3, 3), true);
        let (walker, _) = mover_at(&bus, Coord::new(4, 3), false);

        let mut query = OccupancyQuery::new(vec![Coord::new(3, 3), Coord::new(4, 3)]);
        bus.raise(&mut query);
        assert!(query.entities.contains(&wall));
        assert!(query.entities.contains(&walker));
        assert!(query.includes_obstruction);

        let mut query = OccupancyQuery::new([Coord::new(4, 3)]);
        bus.raise(&mut query);
        assert_eq!(query.entities, vec![walker]);
        assert!(!query.includes_obstruction);
    }

    #[test]
    fn test_position_query_answers_only_requested() {
        let bus = Rc::new(EventBus::new());
        let (entity, _) = mover_at(&bus, Coord::new(5, 2), false);
        mover_at(&bus, Coord::new(1, 1), false);

        let mut query = PositionQuery::new(&[entity]);
        bus.raise(&mut query);
        assert_eq!(query.single(), Coord::new(5, 2));
    }
}
