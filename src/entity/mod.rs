//! Entity components: position, stats, alignment, turn-taking
//!
//! Components own their state and wire themselves to the bus at attach
//! time; the kernel holds no entity state of its own.

pub mod alignment;
pub mod mover;
pub mod stats;
pub mod taker;

use std::rc::Rc;

use crate::core::types::Coord;

/// Shared, mutable grid position of one entity. Archived move commands hold
/// clones, so a round stays rewindable after the component graph changes.
pub type SharedPosition = Rc<std::cell::Cell<Coord>>;

pub use alignment::{AlignmentBadge, AlignmentChart, AlignmentFlags, Relation};
pub use mover::Mover;
pub use stats::{Damage, DamageKind, DamageProtection, Exhaustible, Stat, StatBlock, StatKind, StatSheet};
pub use taker::{Conduct, TurnTaker};
