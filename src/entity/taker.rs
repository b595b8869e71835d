//! Turn-taking component
//!
//! Directed takers hold the round lock and act on external stimuli;
//! autonomous takers run their whole turn synchronously inside the
//! round-started dispatch, driven by a utility disposition.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ai::activity::{Activity, ActivityFlags, Act};
use crate::ai::disposition::Disposition;
use crate::ai::state::ActivityState;
use crate::ai::TurnContext;
use crate::bus::events::{
    ActivityQuery, DirectionPressed, EntityActed, EntityAttacked, EntityPushed, PositionQuery,
    RangeQuery, RoundStarted, StatQuery,
};
use crate::bus::EventBus;
use crate::core::types::{Coord, EntityId};
use crate::entity::stats::{Damage, DamageKind, StatKind};
use crate::pathfinding::PathFinder;
use crate::turn::lock::TurnHold;

/// AP cost of one directed stimulus (a push or a melee strike).
pub const DIRECTED_ACT_COST: i32 = 4;

/// Upper bound on acts an autonomous taker performs in one turn; tripping
/// it logs a warning and ends the turn.
const MAX_ACTS_PER_TURN: usize = 32;

/// How an agent takes its turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Conduct {
    /// Waits for external stimuli; spends AP per directed action.
    Directed,
    /// Loops utility-chosen acts until AP or options run out.
    Autonomous(Disposition),
}

struct Core {
    entity: EntityId,
    activities: Vec<Rc<Activity>>,
    context: TurnContext,
}

#[derive(Default)]
struct Mind {
    hold: Option<TurnHold>,
    plan: Vec<ActivityState>,
}

pub struct TurnTaker;

impl TurnTaker {
    pub fn attach(
        bus: &Rc<EventBus>,
        pathfinder: &Rc<PathFinder>,
        entity: EntityId,
        conduct: Conduct,
        activities: Vec<Activity>,
    ) {
        let activities: Vec<Rc<Activity>> = activities.into_iter().map(Rc::new).collect();
        let core = Rc::new(Core {
            entity,
            activities,
            context: TurnContext {
                taker: entity,
                bus: Rc::clone(bus),
                pathfinder: Rc::clone(pathfinder),
            },
        });
        let mind = Rc::new(RefCell::new(Mind::default()));

        let c = Rc::clone(&core);
        bus.respond::<ActivityQuery, _>(move |query, _| {
            if query.entity != c.entity {
                return;
            }
            for activity in &c.activities {
                if activity.flags.intersects(query.filter) {
                    query.offer(Rc::clone(activity));
                }
            }
        });

        let c = Rc::clone(&core);
        bus.respond::<RangeQuery, _>(move |query, _| {
            if let Some(slot) = query.ranges.get_mut(&c.entity) {
                *slot = c
                    .activities
                    .iter()
                    .filter(|activity| !activity.flags.intersects(ActivityFlags::MOVEMENT))
                    .map(|activity| activity.base_range)
                    .max()
                    .unwrap_or(0);
            }
        });

        match conduct {
            Conduct::Autonomous(disposition) => {
                let c = Rc::clone(&core);
                let m = Rc::clone(&mind);
                bus.subscribe_at::<RoundStarted, _>(0.0, move |event, _| {
                    let hold = event.turn_lock.hold();
                    Self::take_autonomous_turn(&c, &m, &disposition);
                    hold.release();
                });
            }
            Conduct::Directed => {
                // directed agents settle in after every autonomous turn ends
                let m = Rc::clone(&mind);
                bus.subscribe_at::<RoundStarted, _>(1.0, move |event, _| {
                    m.borrow_mut().hold = Some(event.turn_lock.hold());
                });

                let c = Rc::clone(&core);
                let m = Rc::clone(&mind);
                bus.subscribe_at::<DirectionPressed, _>(0.0, move |event, _| {
                    Self::on_direction(&c, &m, event.direction);
                });
            }
        }
    }

    fn take_autonomous_turn(core: &Rc<Core>, mind: &Rc<RefCell<Mind>>, disposition: &Disposition) {
        // a plan retained from an earlier round is stale until re-validated
        // against live positions
        mind.borrow_mut().plan.iter_mut().for_each(ActivityState::mark_dirty);
        for _ in 0..MAX_ACTS_PER_TURN {
            if !Self::has_ap(core) {
                return;
            }
            let Some(act) = Self::next_act(core, mind, disposition) else {
                return;
            };
            act.perform(&core.context.bus);
        }
        tracing::warn!(taker = ?core.entity, "autonomous turn hit the act cap");
    }

    /// The next act of the best current plan, re-choosing plans at most
    /// once per call so an unplannable world ends the turn.
    fn next_act(core: &Rc<Core>, mind: &Rc<RefCell<Mind>>, disposition: &Disposition) -> Option<Act> {
        let mut mind = mind.borrow_mut();
        let mut rechosen = false;
        loop {
            while let Some(state) = mind.plan.first_mut() {
                if let Some(act) = state.next_act() {
                    return Some(act);
                }
                mind.plan.remove(0);
            }
            if rechosen {
                return None;
            }
            mind.plan = disposition.choose_states(&core.context);
            rechosen = true;
        }
    }

    fn on_direction(core: &Rc<Core>, mind: &Rc<RefCell<Mind>>, direction: Coord) {
        let mut mind = mind.borrow_mut();
        if mind.hold.is_none() {
            return;
        }
        if !Self::has_ap(core) {
            if let Some(hold) = mind.hold.take() {
                hold.release();
            }
            return;
        }

        let bus = &core.context.bus;
        let mut positions = PositionQuery::new(&[core.entity]);
        bus.raise(&mut positions);
        let target = positions.get(core.entity) + direction;

        if core.context.pathfinder.is_obstructed(target) {
            bus.raise(&mut EntityAttacked::new(
                core.entity,
                Damage::new(1, DamageKind::Bludgeoning),
                vec![target],
            ));
        } else {
            bus.raise(&mut EntityPushed::self_push(core.entity, direction));
        }
        bus.raise(&mut EntityActed { entity: core.entity, ap_cost: DIRECTED_ACT_COST });

        if !Self::has_ap(core) {
            if let Some(hold) = mind.hold.take() {
                hold.release();
            }
        }
    }

    fn has_ap(core: &Rc<Core>) -> bool {
        let mut query = StatQuery::new(StatKind::Ap, &[core.entity]);
        core.context.bus.raise(&mut query);
        query.single() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::activity::Effect;
    use crate::core::config::GridConfig;
    use crate::grid::CellGrid;

    fn movement(name: &str, range: u32) -> Activity {
        Activity {
            name: name.into(),
            base_cost: 1,
            base_range: range,
            flags: ActivityFlags::MOVEMENT,
            effect: Effect::Step,
        }
    }

    fn strike(name: &str, range: u32) -> Activity {
        Activity {
            name: name.into(),
            base_cost: 2,
            base_range: range,
            flags: ActivityFlags::DAMAGE,
            effect: Effect::Strike { damage: Damage::new(1, DamageKind::Piercing) },
        }
    }

    fn attach_with(activities: Vec<Activity>) -> (Rc<EventBus>, EntityId) {
        let bus = Rc::new(EventBus::new());
        let grid = CellGrid::new(&GridConfig::default());
        let pathfinder = Rc::new(PathFinder::new(&grid, Rc::clone(&bus)));
        let entity = EntityId::new();
        TurnTaker::attach(&bus, &pathfinder, entity, Conduct::Directed, activities);
        (bus, entity)
    }

    #[test]
    fn test_range_query_ignores_movement_activities() {
        let (bus, entity) = attach_with(vec![
            movement("sprint", 6),
            strike("bow", 4),
            strike("knife", 1),
        ]);

        let mut query = RangeQuery::new(&[entity]);
        bus.raise(&mut query);
        assert_eq!(query.single(), 4);
    }

    #[test]
    fn test_range_query_with_only_movement_is_zero() {
        let (bus, entity) = attach_with(vec![movement("sprint", 6)]);

        let mut query = RangeQuery::new(&[entity]);
        bus.raise(&mut query);
        assert_eq!(query.single(), 0);
    }

    #[test]
    fn test_activity_query_filters_by_flags() {
        let (bus, entity) = attach_with(vec![movement("sprint", 6), strike("bow", 4)]);

        let mut query = ActivityQuery::new(entity, ActivityFlags::MOVEMENT);
        bus.raise(&mut query);
        assert_eq!(query.activities().len(), 1);
        assert_eq!(query.activities()[0].name, "sprint");
    }
}
