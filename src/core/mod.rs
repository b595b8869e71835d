//! Core types, errors, and configuration

pub mod config;
pub mod error;
pub mod types;

pub use config::{GridConfig, SimConfig};
pub use error::{KernelError, Result};
pub use types::{Coord, EntityId, Round, Vec2};
