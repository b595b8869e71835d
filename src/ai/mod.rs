//! Utility-based decision engine: activities, plans, and dispositions

pub mod activity;
pub mod disposition;
pub mod state;

use std::rc::Rc;

use crate::bus::EventBus;
use crate::core::types::EntityId;
use crate::pathfinding::PathFinder;

/// Handles a decision-engine participant needs: the bus for queries and the
/// pathfinder for movement planning.
#[derive(Clone)]
pub struct TurnContext {
    pub taker: EntityId,
    pub bus: Rc<EventBus>,
    pub pathfinder: Rc<PathFinder>,
}

pub use activity::{Act, Activity, ActivityFlags, Context, Effect};
pub use disposition::Disposition;
pub use state::{ActivityState, Profile};
