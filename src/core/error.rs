//! Error types for the simulation kernel

use thiserror::Error;

use crate::core::types::Coord;

/// Kernel-level errors. Absence of a queried entity or path is never an
/// error (callers get `Option`/empty results); these cover configuration
/// and spawning failures.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("spawn rejected: cell ({},{}) is obstructed", .0.x, .0.y)]
    CellObstructed(Coord),

    #[error("spawn rejected: cell ({},{}) is out of bounds", .0.x, .0.y)]
    CellOutOfBounds(Coord),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KernelError>;
