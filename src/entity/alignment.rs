//! Alignment flags, the relation chart, and the badge component

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::bus::events::{AlignmentQuery, EntityRealigned, FactionQuery};
use crate::bus::EventBus;
use crate::core::types::EntityId;
use crate::undo::Invertible;

/// Bit flags naming the factions an entity belongs to. An entity may carry
/// several at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlignmentFlags(pub u8);

impl AlignmentFlags {
    pub const NONE: Self = Self(0);
    pub const NEUTRAL: Self = Self(1);
    /// The player-aligned faction.
    pub const KINDRED: Self = Self(1 << 1);
    /// Hostile wildlife and monsters.
    pub const FERAL: Self = Self(1 << 2);

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for AlignmentFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// How two flag sets relate, from the asker's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Ally,
    Neutral,
    Enemy,
}

/// Pairwise affinity between the eight flag bits. Explicit immutable data
/// passed at construction; affinities are summed over every carried flag
/// pair, positive sums read as allies and negative as enemies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentChart {
    affinities: [[i8; 8]; 8],
}

impl Default for AlignmentChart {
    fn default() -> Self {
        let mut affinities = [[0i8; 8]; 8];
        let kindred = 1;
        let feral = 2;
        affinities[kindred][kindred] = 1;
        affinities[feral][feral] = 1;
        affinities[kindred][feral] = -1;
        affinities[feral][kindred] = -1;
        Self { affinities }
    }
}

impl AlignmentChart {
    pub fn new(affinities: [[i8; 8]; 8]) -> Self {
        Self { affinities }
    }

    /// Relation of `other` as seen by an asker carrying `own`.
    pub fn relation(&self, own: AlignmentFlags, other: AlignmentFlags) -> Relation {
        let mut sum = 0i32;
        for i in 0..8 {
            if own.0 & (1 << i) == 0 {
                continue;
            }
            for j in 0..8 {
                if other.0 & (1 << j) == 0 {
                    continue;
                }
                sum += i32::from(self.affinities[i][j]);
            }
        }
        match sum {
            s if s > 0 => Relation::Ally,
            s if s < 0 => Relation::Enemy,
            _ => Relation::Neutral,
        }
    }
}

/// Component answering alignment and faction queries for one entity.
/// Realignments land as invertible commands, so they rewind with the round.
pub struct AlignmentBadge {
    entity: EntityId,
    flags: Rc<Cell<AlignmentFlags>>,
    chart: Rc<AlignmentChart>,
}

impl AlignmentBadge {
    pub fn attach(bus: &Rc<EventBus>, entity: EntityId, flags: AlignmentFlags, chart: Rc<AlignmentChart>) {
        let badge = Rc::new(Self { entity, flags: Rc::new(Cell::new(flags)), chart });

        let b = Rc::clone(&badge);
        bus.respond::<FactionQuery, _>(move |query, _| {
            let relation = b.chart.relation(query.filter, b.flags.get());
            query.add(relation, b.entity);
        });

        let b = Rc::clone(&badge);
        bus.respond::<AlignmentQuery, _>(move |query, _| {
            if query.entity == b.entity {
                query.flags = query.flags | b.flags.get();
            }
        });

        // the realignment lands only after every other reaction has seen it
        let b = badge;
        bus.subscribe_at::<EntityRealigned, _>(f32::INFINITY, move |event, commands| {
            if event.entity != b.entity {
                return;
            }
            commands.record(RealignCommand {
                flags: Rc::clone(&b.flags),
                lost: event.lost,
                gained: event.gained,
            });
        });
    }
}

/// Swaps flag bits in and out. Callers keep `lost` within the current flags
/// and `gained` outside them, which makes the swap exactly invertible.
struct RealignCommand {
    flags: Rc<Cell<AlignmentFlags>>,
    lost: AlignmentFlags,
    gained: AlignmentFlags,
}

impl Invertible for RealignCommand {
    fn apply(&mut self) {
        self.flags.set(self.flags.get().without(self.lost) | self.gained);
    }

    fn undo(&mut self) {
        self.flags.set(self.flags.get().without(self.gained) | self.lost);
    }
}
