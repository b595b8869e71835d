//! Simulation configuration
//!
//! Everything tunable lives here as serde structs with defaults, loadable
//! from TOML. Charts and weights are explicit data handed to constructors;
//! nothing reads process-wide state.

use serde::{Deserialize, Serialize};

use crate::core::error::{KernelError, Result};
use crate::core::types::{Coord, Vec2};
use crate::entity::alignment::AlignmentChart;

/// Bounds and scale of the playable cell rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// World-space edge length of one cell.
    pub cell_size: f32,
    /// World-space position of cell (0, 0).
    pub origin: Vec2,
    /// Inclusive lower corner of the bounded rectangle.
    pub lower: Coord,
    /// Inclusive upper corner of the bounded rectangle.
    pub upper: Coord,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            origin: Vec2::new(0.0, 0.0),
            lower: Coord::new(0, 0),
            upper: Coord::new(11, 11),
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub chart: AlignmentChart,
}

impl SimConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.cell_size <= 0.0 {
            return Err(KernelError::InvalidConfig(format!(
                "cell_size must be positive, got {}",
                self.grid.cell_size
            )));
        }
        if self.grid.upper.x < self.grid.lower.x || self.grid.upper.y < self.grid.lower.y {
            return Err(KernelError::InvalidConfig(format!(
                "grid upper corner ({},{}) below lower corner ({},{})",
                self.grid.upper.x, self.grid.upper.y, self.grid.lower.x, self.grid.lower.y
            )));
        }
        Ok(())
    }
}
