//! Activity templates, contexts, and consumable acts
//!
//! An `Activity` is an immutable template. Binding it to a `Context`
//! produces an `Act`, a single intended action consumed by `perform`.
//! Expected damage and mending are derived by raising probe occurrences,
//! so protections answer without anything actually happening.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::bus::events::{EntityActed, EntityAttacked, EntityMended, EntityPushed, PositionQuery};
use crate::bus::EventBus;
use crate::core::types::{Coord, EntityId};
use crate::entity::stats::Damage;

/// Capability flags describing what an activity is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFlags(pub u8);

impl ActivityFlags {
    pub const NONE: Self = Self(0);
    pub const DAMAGE: Self = Self(1);
    pub const MENDING: Self = Self(1 << 1);
    pub const DEBUFF: Self = Self(1 << 2);
    pub const BUFF: Self = Self(1 << 3);
    pub const MOVEMENT: Self = Self(1 << 4);

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for ActivityFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What performing the activity actually does. A closed set selected at
/// construction; each variant expects a compatible context shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Effect {
    /// Move to the context cell (one path step at a time).
    Step,
    /// Attack the context cells.
    Strike { damage: Damage },
    /// Mend the context cells.
    Mend { amount: i32 },
}

/// The binding a context-shaped activity runs against.
#[derive(Debug, Clone)]
pub enum Context {
    Cell(Coord),
    MultiCell(Vec<Coord>),
    Target(EntityId),
    MultiTarget(Vec<EntityId>),
}

/// An immutable action template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub base_cost: i32,
    pub base_range: u32,
    pub flags: ActivityFlags,
    pub effect: Effect,
}

impl Activity {
    pub fn cost(&self, _context: &Context) -> i32 {
        self.base_cost
    }

    pub fn range(&self, _context: &Context) -> u32 {
        self.base_range
    }

    /// Damage this activity would deal in `context`, via a probe attack.
    pub fn expected_damage(&self, taker: EntityId, context: &Context, bus: &EventBus) -> i32 {
        match &self.effect {
            Effect::Strike { damage } => {
                let cells = self.context_cells(context, bus);
                let mut probe = EntityAttacked::probe(taker, damage.clone(), cells);
                bus.raise(&mut probe);
                probe.damage_dealt.values().sum()
            }
            _ => 0,
        }
    }

    /// Mending this activity would do in `context`, via a probe.
    pub fn expected_mending(&self, taker: EntityId, context: &Context, bus: &EventBus) -> i32 {
        match &self.effect {
            Effect::Mend { amount } => {
                let cells = self.context_cells(context, bus);
                let mut probe = EntityMended::probe(taker, *amount, cells);
                bus.raise(&mut probe);
                probe.mending_done.values().sum()
            }
            _ => 0,
        }
    }

    pub fn expected_debuff(&self, _taker: EntityId, _context: &Context, _bus: &EventBus) -> i32 {
        0
    }

    pub fn expected_buff(&self, _taker: EntityId, _context: &Context, _bus: &EventBus) -> i32 {
        0
    }

    /// Performs the effect for `taker`, then reports the AP spend.
    /// Panics on an effect/context shape mismatch.
    pub fn activate(&self, taker: EntityId, context: &Context, bus: &EventBus) {
        match (&self.effect, context) {
            (Effect::Step, Context::Cell(goal)) => {
                // displacement resolves against the live position at perform
                // time, so stale plans step rather than teleport
                let mut query = PositionQuery::new(&[taker]);
                bus.raise(&mut query);
                let displacement = *goal - query.get(taker);
                bus.raise(&mut EntityPushed::self_push(taker, displacement));
            }
            (Effect::Step, _) => panic!("step activity requires a cell context"),
            (Effect::Strike { damage }, _) => {
                let cells = self.context_cells(context, bus);
                bus.raise(&mut EntityAttacked::new(taker, damage.clone(), cells));
            }
            (Effect::Mend { amount }, _) => {
                let cells = self.context_cells(context, bus);
                bus.raise(&mut EntityMended::new(taker, *amount, cells));
            }
        }
        bus.raise(&mut EntityActed { entity: taker, ap_cost: self.base_cost });
    }

    /// Resolves a context to concrete cells, querying live positions for
    /// target-shaped contexts.
    fn context_cells(&self, context: &Context, bus: &EventBus) -> Vec<Coord> {
        match context {
            Context::Cell(cell) => vec![*cell],
            Context::MultiCell(cells) => cells.clone(),
            Context::Target(target) => {
                let mut query = PositionQuery::new(&[*target]);
                bus.raise(&mut query);
                vec![query.get(*target)]
            }
            Context::MultiTarget(targets) => {
                let mut query = PositionQuery::new(targets);
                bus.raise(&mut query);
                targets.iter().map(|&target| query.get(target)).collect()
            }
        }
    }
}

/// A single, not-yet-executed intended action. Performing consumes it, so a
/// spent act cannot run twice.
pub struct Act {
    pub activity: Rc<Activity>,
    pub taker: EntityId,
    pub context: Context,
}

impl Act {
    pub fn cost(&self) -> i32 {
        self.activity.cost(&self.context)
    }

    pub fn perform(self, bus: &EventBus) {
        self.activity.activate(self.taker, &self.context, bus);
    }
}
