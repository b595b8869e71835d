//! Occurrence payloads: notifications and collective queries
//!
//! Notification occurrences describe something that happened; query
//! occurrences carry accumulator fields that subscribers fill in. Singular
//! accessors on queries assert that exactly one entity was asked about.

use std::rc::Rc;

use ahash::AHashMap;

use crate::ai::activity::{Activity, ActivityFlags};
use crate::core::types::{Coord, EntityId};
use crate::entity::alignment::{AlignmentFlags, Relation};
use crate::entity::stats::{Damage, StatKind};
use crate::turn::lock::TurnLock;

use super::Occurrence;

/// An entity spent action points performing an act.
pub struct EntityActed {
    pub entity: EntityId,
    pub ap_cost: i32,
}

/// An attack against a set of cells.
///
/// `damage_dealt` accumulates per-victim damage after protection but before
/// HP bounding. A `probe` attack records expected damage without producing
/// commands; the decision engine uses probes for scoring.
pub struct EntityAttacked {
    pub attacker: EntityId,
    pub damage: Damage,
    pub target_cells: Vec<Coord>,
    pub probe: bool,
    pub damage_dealt: AHashMap<EntityId, i32>,
}

impl EntityAttacked {
    pub fn new(attacker: EntityId, damage: Damage, target_cells: Vec<Coord>) -> Self {
        Self { attacker, damage, target_cells, probe: false, damage_dealt: AHashMap::new() }
    }

    pub fn probe(attacker: EntityId, damage: Damage, target_cells: Vec<Coord>) -> Self {
        Self { probe: true, ..Self::new(attacker, damage, target_cells) }
    }
}

/// A mending effect against a set of cells. Mirrors [`EntityAttacked`];
/// `mending_done` accumulates the HP each target can actually recover.
pub struct EntityMended {
    pub mender: EntityId,
    pub amount: i32,
    pub target_cells: Vec<Coord>,
    pub probe: bool,
    pub mending_done: AHashMap<EntityId, i32>,
}

impl EntityMended {
    pub fn new(mender: EntityId, amount: i32, target_cells: Vec<Coord>) -> Self {
        Self { mender, amount, target_cells, probe: false, mending_done: AHashMap::new() }
    }

    pub fn probe(mender: EntityId, amount: i32, target_cells: Vec<Coord>) -> Self {
        Self { probe: true, ..Self::new(mender, amount, target_cells) }
    }
}

/// An entity is displaced by `displacement` cells.
pub struct EntityPushed {
    pub pusher: EntityId,
    pub pushee: EntityId,
    pub displacement: Coord,
}

impl EntityPushed {
    pub fn new(pusher: EntityId, pushee: EntityId, displacement: Coord) -> Self {
        Self { pusher, pushee, displacement }
    }

    /// An entity moving under its own power.
    pub fn self_push(entity: EntityId, displacement: Coord) -> Self {
        Self::new(entity, entity, displacement)
    }
}

/// An entity's alignment flags changed.
pub struct EntityRealigned {
    pub entity: EntityId,
    pub lost: AlignmentFlags,
    pub gained: AlignmentFlags,
}

/// A new round began. Turn takers acquire holds on the shared lock during
/// this dispatch; the round lasts until every hold is released.
pub struct RoundStarted {
    pub turn_lock: Rc<TurnLock>,
}

/// The previous round concluded.
pub struct RoundPassed;

/// Pointer input translated to a cell.
pub struct CellClicked {
    pub button: MouseButton,
    pub cell: Coord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Directional input translated to a unit displacement.
pub struct DirectionPressed {
    pub direction: Coord,
}

// ---- queries ----

/// Who stands on these cells, and does anyone there block movement?
pub struct OccupancyQuery {
    pub cells: Vec<Coord>,
    pub entities: Vec<EntityId>,
    pub includes_obstruction: bool,
}

impl OccupancyQuery {
    pub fn new(cells: impl Into<Vec<Coord>>) -> Self {
        Self { cells: cells.into(), entities: Vec::new(), includes_obstruction: false }
    }
}

/// Every entity, partitioned by its relation to the asker's flags.
pub struct FactionQuery {
    pub filter: AlignmentFlags,
    buckets: AHashMap<Relation, Vec<EntityId>>,
}

impl FactionQuery {
    pub fn new(filter: AlignmentFlags) -> Self {
        Self { filter, buckets: AHashMap::new() }
    }

    pub fn add(&mut self, relation: Relation, entity: EntityId) {
        self.buckets.entry(relation).or_default().push(entity);
    }

    pub fn bucket(&self, relation: Relation) -> &[EntityId] {
        self.buckets.get(&relation).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// What alignment flags does `entity` carry?
pub struct AlignmentQuery {
    pub requester: Option<EntityId>,
    pub entity: EntityId,
    pub flags: AlignmentFlags,
}

impl AlignmentQuery {
    pub fn of(entity: EntityId) -> Self {
        Self { requester: None, entity, flags: AlignmentFlags::NONE }
    }

    pub fn by(requester: EntityId, entity: EntityId) -> Self {
        Self { requester: Some(requester), entity, flags: AlignmentFlags::NONE }
    }
}

/// One stat value per requested entity.
pub struct StatQuery {
    pub kind: StatKind,
    pub values: AHashMap<EntityId, i32>,
}

impl StatQuery {
    pub fn new(kind: StatKind, entities: &[EntityId]) -> Self {
        let values = entities.iter().map(|&entity| (entity, 0)).collect();
        Self { kind, values }
    }

    /// The answered value. Panics unless exactly one entity was queried.
    pub fn single(&self) -> i32 {
        assert_eq!(self.values.len(), 1, "singular stat query asked about {} entities", self.values.len());
        *self.values.values().next().unwrap()
    }
}

/// Grid position per requested entity.
pub struct PositionQuery {
    pub positions: AHashMap<EntityId, Coord>,
}

impl PositionQuery {
    pub fn new(entities: &[EntityId]) -> Self {
        let positions = entities.iter().map(|&entity| (entity, Coord::ZERO)).collect();
        Self { positions }
    }

    pub fn get(&self, entity: EntityId) -> Coord {
        self.positions[&entity]
    }

    /// The answered position. Panics unless exactly one entity was queried.
    pub fn single(&self) -> Coord {
        assert_eq!(self.positions.len(), 1, "singular position query asked about {} entities", self.positions.len());
        *self.positions.values().next().unwrap()
    }
}

/// Reach in metric units per requested entity.
pub struct RangeQuery {
    pub ranges: AHashMap<EntityId, u32>,
}

impl RangeQuery {
    pub fn new(entities: &[EntityId]) -> Self {
        let ranges = entities.iter().map(|&entity| (entity, 0)).collect();
        Self { ranges }
    }

    /// The answered range. Panics unless exactly one entity was queried.
    pub fn single(&self) -> u32 {
        assert_eq!(self.ranges.len(), 1, "singular range query asked about {} entities", self.ranges.len());
        *self.ranges.values().next().unwrap()
    }
}

/// The activities of `entity` whose flags intersect `filter`.
pub struct ActivityQuery {
    pub entity: EntityId,
    pub filter: ActivityFlags,
    activities: Vec<Rc<Activity>>,
}

impl ActivityQuery {
    pub fn new(entity: EntityId, filter: ActivityFlags) -> Self {
        Self { entity, filter, activities: Vec::new() }
    }

    pub fn offer(&mut self, activity: Rc<Activity>) {
        self.activities.push(activity);
    }

    pub fn activities(&self) -> &[Rc<Activity>] {
        &self.activities
    }
}

impl Occurrence for EntityActed {}
impl Occurrence for EntityAttacked {}
impl Occurrence for EntityMended {}
impl Occurrence for EntityPushed {}
impl Occurrence for EntityRealigned {}
impl Occurrence for RoundStarted {}
impl Occurrence for RoundPassed {}
impl Occurrence for CellClicked {}
impl Occurrence for DirectionPressed {}
impl Occurrence for OccupancyQuery {}
impl Occurrence for FactionQuery {}
impl Occurrence for AlignmentQuery {}
impl Occurrence for StatQuery {}
impl Occurrence for PositionQuery {}
impl Occurrence for RangeQuery {}
impl Occurrence for ActivityQuery {}
