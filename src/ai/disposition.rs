//! Utility weights and candidate-plan generation
//!
//! A disposition holds an agent's four weights and turns the world into a
//! best-first list of candidate activity states: every target-shaped
//! activity the agent owns, bound against enemies (damage, debuff) or
//! allies (mending, buff), scored by weighted expected effect per cost.

use std::rc::Rc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::ai::activity::{Activity, ActivityFlags};
use crate::ai::state::{ActivityState, Profile};
use crate::ai::TurnContext;
use crate::bus::events::{ActivityQuery, AlignmentQuery, FactionQuery};
use crate::core::types::EntityId;
use crate::entity::alignment::Relation;

/// Per-agent utility weights, each in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disposition {
    /// Preference for damaging enemies.
    pub aggression: f32,
    /// Preference for debuffing enemies.
    pub mischief: f32,
    /// Preference for mending allies.
    pub support: f32,
    /// Preference for buffing allies.
    pub leadership: f32,
}

impl Default for Disposition {
    fn default() -> Self {
        Self { aggression: 0.5, mischief: 0.25, support: 0.5, leadership: 0.25 }
    }
}

impl Disposition {
    /// Priority of a candidate plan: weighted expected effect per AP.
    pub fn score(&self, profile: &Profile) -> f32 {
        let value = self.aggression * profile.damage as f32
            + self.mischief * profile.debuff as f32
            + self.support * profile.mending as f32
            + self.leadership * profile.buff as f32;
        value / profile.cost.max(1) as f32
    }

    /// Generates candidate states for the taker, best first. Only
    /// positively scored, currently-plannable states are returned; a plan
    /// with no expected value (an overheal, a fully resisted strike) is not
    /// worth its action points.
    pub fn choose_states(&self, context: &TurnContext) -> Vec<ActivityState> {
        let mut alignment = AlignmentQuery::of(context.taker);
        context.bus.raise(&mut alignment);
        let mut factions = FactionQuery::new(alignment.flags);
        context.bus.raise(&mut factions);

        let offensive = ActivityFlags::DAMAGE | ActivityFlags::DEBUFF;
        let supportive = ActivityFlags::MENDING | ActivityFlags::BUFF;
        let mut query = ActivityQuery::new(context.taker, offensive | supportive);
        context.bus.raise(&mut query);

        let mut scored: Vec<(f32, ActivityState)> = Vec::new();
        for activity in query.activities() {
            if activity.flags.intersects(offensive) {
                for &enemy in factions.bucket(Relation::Enemy) {
                    if enemy == context.taker {
                        continue;
                    }
                    self.consider(context, activity, enemy, &mut scored);
                }
            }
            if activity.flags.intersects(supportive) {
                for &ally in factions.bucket(Relation::Ally) {
                    self.consider(context, activity, ally, &mut scored);
                }
            }
        }

        scored.sort_by_key(|(score, _)| std::cmp::Reverse(OrderedFloat(*score)));
        scored.into_iter().map(|(_, state)| state).collect()
    }

    fn consider(
        &self,
        context: &TurnContext,
        activity: &Rc<Activity>,
        target: EntityId,
        scored: &mut Vec<(f32, ActivityState)>,
    ) {
        let Some(mut state) =
            ActivityState::try_bind(context.clone(), Rc::clone(activity), target, None)
        else {
            return;
        };
        let score = self.score(&state.profile());
        if score > 0.0 {
            scored.push((score, state));
        }
    }
}
