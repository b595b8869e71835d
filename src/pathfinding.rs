//! Grid pathfinder
//!
//! One node per bounded cell, built once at startup. For every node a
//! distance-sorted array of all other nodes is precomputed (O(N² log N)),
//! used both for multi-goal heuristics and for radius queries. Obstruction
//! is never cached: each check is a live occupancy query on the bus.

use std::rc::Rc;

use ahash::{AHashMap, AHashSet};

use crate::bus::events::OccupancyQuery;
use crate::bus::EventBus;
use crate::core::types::Coord;
use crate::grid::CellGrid;

/// Metric cost of one diagonal step.
pub const DIAGONAL_STEP: u32 = 3;
/// Metric cost of one axis-aligned step.
pub const STRAIGHT_STEP: u32 = 2;

/// Distance between two cells: diagonal steps cost 3, straight steps 2.
pub fn distance(a: Coord, b: Coord) -> u32 {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    let (diagonal, chebyshev) = if dx < dy { (dx, dy) } else { (dy, dx) };
    DIAGONAL_STEP * diagonal + STRAIGHT_STEP * (chebyshev - diagonal)
}

pub struct PathFinder {
    bus: Rc<EventBus>,
    cells: Vec<Coord>,
    index: AHashMap<Coord, usize>,
    /// For each node, all node indices sorted ascending by distance from it.
    nearest: Vec<Vec<usize>>,
}

impl PathFinder {
    pub fn new(grid: &CellGrid, bus: Rc<EventBus>) -> Self {
        let cells = grid.bounded_cells().to_vec();
        let index: AHashMap<Coord, usize> =
            cells.iter().enumerate().map(|(i, &cell)| (cell, i)).collect();
        let nearest = cells
            .iter()
            .map(|&from| {
                let mut order: Vec<usize> = (0..cells.len()).collect();
                order.sort_by_key(|&i| distance(from, cells[i]));
                order
            })
            .collect();
        Self { bus, cells, index, nearest }
    }

    /// Shortest path from `start` to any cell of `goals`, excluding `start`
    /// itself: `Some(vec![])` when `start` is already a goal, `None` when
    /// `start` is out of bounds, no goal is in bounds, or every goal is
    /// unreachable. Neighbors are the 8 surrounding cells, skipping
    /// obstructed ones by live query.
    pub fn find_path(&self, start: Coord, goals: &[Coord]) -> Option<Vec<Coord>> {
        let start_index = *self.index.get(&start)?;
        let goal_set: AHashSet<usize> = goals
            .iter()
            .filter_map(|goal| self.index.get(goal).copied())
            .collect();
        if goal_set.is_empty() {
            tracing::debug!(?start, "path search with no in-bounds goal");
            return None;
        }

        let node_count = self.cells.len();
        let mut g_scores = vec![u32::MAX; node_count];
        let mut h_scores: Vec<Option<u32>> = vec![None; node_count];
        let mut parents: Vec<Option<usize>> = vec![None; node_count];
        g_scores[start_index] = 0;
        let mut open = vec![start_index];

        while !open.is_empty() {
            // linear scan for the least f-score; the grid is small and static
            let mut least_position = 0;
            let mut least_f = u32::MAX;
            for (position, &node) in open.iter().enumerate() {
                let h = match h_scores[node] {
                    Some(h) => h,
                    None => {
                        let h = self.nearest_goal_distance(node, &goal_set);
                        h_scores[node] = Some(h);
                        h
                    }
                };
                let f = g_scores[node].saturating_add(h);
                if f < least_f {
                    least_f = f;
                    least_position = position;
                }
            }
            let current = open.swap_remove(least_position);

            if goal_set.contains(&current) {
                let mut path = Vec::new();
                let mut walk = current;
                while let Some(parent) = parents[walk] {
                    path.push(self.cells[walk]);
                    walk = parent;
                }
                path.reverse();
                return Some(path);
            }

            for neighbor in self.unobstructed_neighbors(current) {
                let step = distance(self.cells[current], self.cells[neighbor]);
                let candidate = g_scores[current].saturating_add(step);
                if candidate < g_scores[neighbor] {
                    parents[neighbor] = Some(current);
                    g_scores[neighbor] = candidate;
                    if !open.contains(&neighbor) {
                        open.push(neighbor);
                    }
                }
            }
        }

        tracing::debug!(?start, goals = goal_set.len(), "no path found");
        None
    }

    /// Every in-bounds cell within `radius` of `center` inclusive, nearest
    /// first. Scans the precomputed array from the front, so cost is
    /// proportional to the result size.
    pub fn circle(&self, center: Coord, radius: u32) -> Vec<Coord> {
        let Some(&center_index) = self.index.get(&center) else {
            return Vec::new();
        };
        let mut cells = Vec::new();
        for &i in &self.nearest[center_index] {
            if distance(center, self.cells[i]) > radius {
                break;
            }
            cells.push(self.cells[i]);
        }
        cells
    }

    /// Whether any occupant of `cell` blocks movement, answered by a live
    /// occupancy query. Out-of-bounds cells report obstructed so movement
    /// can never leave the grid.
    pub fn is_obstructed(&self, cell: Coord) -> bool {
        if !self.index.contains_key(&cell) {
            return true;
        }
        let mut query = OccupancyQuery::new([cell]);
        self.bus.raise(&mut query);
        query.includes_obstruction
    }

    fn nearest_goal_distance(&self, node: usize, goal_set: &AHashSet<usize>) -> u32 {
        for &i in &self.nearest[node] {
            if goal_set.contains(&i) {
                return distance(self.cells[node], self.cells[i]);
            }
        }
        u32::MAX
    }

    fn unobstructed_neighbors(&self, node: usize) -> Vec<usize> {
        let origin = self.cells[node];
        let mut neighbors = Vec::with_capacity(8);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let cell = Coord::new(origin.x + dx, origin.y + dy);
                if let Some(&i) = self.index.get(&cell) {
                    if !self.is_obstructed(cell) {
                        neighbors.push(i);
                    }
                }
            }
        }
        neighbors
    }
}
