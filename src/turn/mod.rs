//! Turn scheduling: the counting lock and the round tracker

pub mod lock;
pub mod tracker;

pub use lock::{TurnHold, TurnLock};
pub use tracker::TurnTracker;
