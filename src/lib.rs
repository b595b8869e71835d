//! Gridfall - a turn-based tactical simulation kernel
//!
//! Four cooperating pieces, glued by an `Environment`:
//! - a typed broadcast/query bus with deferred, priority-ordered reactions
//!   (`bus`), feeding every state change through invertible commands
//! - a per-round undo history (`undo`)
//! - a grid pathfinder with a diagonal-aware integer metric (`pathfinding`)
//! - a turn scheduler (`turn`) and a utility-based decision engine (`ai`)
//!
//! Entity state lives in components (`entity`) that subscribe to the bus;
//! the kernel itself owns no entities.

pub mod ai;
pub mod bus;
pub mod core;
pub mod entity;
pub mod environment;
pub mod grid;
pub mod pathfinding;
pub mod turn;
pub mod undo;

pub use environment::{EntityBlueprint, Environment};
