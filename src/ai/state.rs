//! Lazily-validated activity plans
//!
//! An `ActivityState` is a queued plan of acts: movement into range, then a
//! terminal act against the target. States are created dirty and re-derive
//! their plan on first access and after `mark_dirty`; a plan that can no
//! longer be derived cancels the state, fires its cancellation callback
//! once, and yields nothing further.

use std::collections::VecDeque;
use std::rc::Rc;

use ordered_float::OrderedFloat;

use crate::ai::activity::{Act, Activity, ActivityFlags, Context};
use crate::ai::TurnContext;
use crate::bus::events::{ActivityQuery, PositionQuery};
use crate::core::types::{Coord, EntityId};
use crate::pathfinding::distance;

/// Scoring summary of a candidate plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Profile {
    pub cost: i32,
    pub damage: i32,
    pub mending: i32,
    pub debuff: i32,
    pub buff: i32,
}

pub struct ActivityState {
    context: TurnContext,
    goal_activity: Rc<Activity>,
    target: EntityId,
    acts: VecDeque<Act>,
    dirty: bool,
    cancelled: bool,
    on_cancel: Option<Box<dyn FnOnce(EntityId)>>,
}

impl ActivityState {
    /// Builds a target-bound state and cleans it immediately; `None` if the
    /// plan is impossible (the cancellation callback fires first).
    pub fn try_bind(
        context: TurnContext,
        goal_activity: Rc<Activity>,
        target: EntityId,
        on_cancel: Option<Box<dyn FnOnce(EntityId)>>,
    ) -> Option<Self> {
        let mut state = Self {
            context,
            goal_activity,
            target,
            acts: VecDeque::new(),
            dirty: true,
            cancelled: false,
            on_cancel,
        };
        state.check_clean();
        if state.cancelled {
            None
        } else {
            Some(state)
        }
    }

    /// The plan's scoring profile: remaining cost plus the expected effect
    /// of the terminal act.
    pub fn profile(&mut self) -> Profile {
        self.check_clean();
        let goal_context = Context::Target(self.target);
        let taker = self.context.taker;
        let bus = &*self.context.bus;
        Profile {
            cost: self.acts.iter().map(Act::cost).sum(),
            damage: self.goal_activity.expected_damage(taker, &goal_context, bus),
            mending: self.goal_activity.expected_mending(taker, &goal_context, bus),
            debuff: self.goal_activity.expected_debuff(taker, &goal_context, bus),
            buff: self.goal_activity.expected_buff(taker, &goal_context, bus),
        }
    }

    /// Pops the next act, or `None` when the plan is spent or cancelled.
    pub fn next_act(&mut self) -> Option<Act> {
        self.check_clean();
        if self.cancelled {
            return None;
        }
        self.acts.pop_front()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    fn check_clean(&mut self) {
        if !self.dirty || self.cancelled {
            return;
        }
        self.dirty = false;
        if !self.try_clean() {
            self.cancel();
        }
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.acts.clear();
        tracing::debug!(
            taker = ?self.context.taker,
            activity = %self.goal_activity.name,
            "activity state cancelled"
        );
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel(self.context.taker);
        }
    }

    /// Re-derives the act queue from live positions. False when no plan
    /// reaches the target.
    fn try_clean(&mut self) -> bool {
        let mut positions = PositionQuery::new(&[self.context.taker, self.target]);
        self.context.bus.raise(&mut positions);
        let taker_at = positions.get(self.context.taker);
        let target_at = positions.get(self.target);
        let range = self.goal_activity.range(&Context::Target(self.target));

        self.acts.clear();
        if distance(taker_at, target_at) > range {
            let goal_cells = self.context.pathfinder.circle(target_at, range);
            if !self.queue_path_acts(taker_at, &goal_cells) {
                return false;
            }
        }
        self.acts.push_back(Act {
            activity: Rc::clone(&self.goal_activity),
            taker: self.context.taker,
            context: Context::Target(self.target),
        });
        true
    }

    /// Queues one act per path cell into range, using the movement activity
    /// with the best range-per-cost ratio. False when the taker has no
    /// usable movement or no path exists.
    fn queue_path_acts(&mut self, start: Coord, goal_cells: &[Coord]) -> bool {
        let mut query = ActivityQuery::new(self.context.taker, ActivityFlags::MOVEMENT);
        self.context.bus.raise(&mut query);
        let probe = Context::Cell(start);
        let movement = query
            .activities()
            .iter()
            .filter(|activity| activity.range(&probe) > 0)
            .max_by_key(|activity| {
                OrderedFloat(activity.range(&probe) as f32 / activity.cost(&probe).max(1) as f32)
            })
            .cloned();
        let Some(movement) = movement else {
            return false;
        };
        let Some(path) = self.context.pathfinder.find_path(start, goal_cells) else {
            return false;
        };
        for cell in path {
            self.acts.push_back(Act {
                activity: Rc::clone(&movement),
                taker: self.context.taker,
                context: Context::Cell(cell),
            });
        }
        true
    }
}
