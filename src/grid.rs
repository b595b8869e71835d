//! Bounded cell grid
//!
//! A fixed inclusive rectangle of integer cells with world-space mapping.
//! Built once from config; the cell set never changes afterwards.

use crate::core::config::GridConfig;
use crate::core::types::{Coord, Vec2};

pub struct CellGrid {
    cell_size: f32,
    origin: Vec2,
    lower: Coord,
    upper: Coord,
    cells: Vec<Coord>,
}

impl CellGrid {
    pub fn new(config: &GridConfig) -> Self {
        let mut cells = Vec::new();
        for y in config.lower.y..=config.upper.y {
            for x in config.lower.x..=config.upper.x {
                cells.push(Coord::new(x, y));
            }
        }
        Self {
            cell_size: config.cell_size,
            origin: config.origin,
            lower: config.lower,
            upper: config.upper,
            cells,
        }
    }

    /// Inclusive (lower, upper) corners.
    pub fn bounds(&self) -> (Coord, Coord) {
        (self.lower, self.upper)
    }

    /// Every in-bounds cell, row-major from the lower corner.
    pub fn bounded_cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn contains(&self, cell: Coord) -> bool {
        cell.x >= self.lower.x
            && cell.x <= self.upper.x
            && cell.y >= self.lower.y
            && cell.y <= self.upper.y
    }

    /// Nearest cell to a world-space point. The result may be out of bounds;
    /// callers that care check `contains`.
    pub fn world_to_cell(&self, point: Vec2) -> Coord {
        let local = point - self.origin;
        Coord::new(
            (local.x / self.cell_size).round() as i32,
            (local.y / self.cell_size).round() as i32,
        )
    }

    /// World-space center of `cell`. Inverse of `world_to_cell`.
    pub fn cell_to_world(&self, cell: Coord) -> Vec2 {
        self.origin + Vec2::new(cell.x as f32, cell.y as f32) * self.cell_size
    }
}
