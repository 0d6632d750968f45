//! Rapidly-exploring random tree over the occupancy grid.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::NavigationError;
use crate::map::{GridPoint, OccupancyGrid};
use crate::planner::{Path, PathPlanner, check_endpoints, planning_snapshot};
use crate::smoothing::is_walkable;

/// Longest edge the tree grows in one step, in tiles.
pub const MAX_STEP: f64 = 4.0;

struct TreeNode {
    tile: GridPoint,
    parent: Option<usize>,
}

/// Grows a single tree from the start tile with uniform sampling and no goal bias.
///
/// The search ends when a newly accepted node lands exactly on the destination.
/// Every edge must pass the footprint-aware walkability check.
pub struct SamplingPlanner {
    footprint_tiles: f64,
    max_iterations: usize,
    rng: StdRng,
}

impl SamplingPlanner {
    /// Creates a planner.
    ///
    /// # Arguments
    /// * `footprint_tiles` - Vehicle footprint used for edge checks
    /// * `max_iterations` - Samples drawn before reporting no path
    /// * `seed` - Fixed seed, or `None` to seed from the OS
    pub fn new(footprint_tiles: f64, max_iterations: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        SamplingPlanner {
            footprint_tiles,
            max_iterations,
            rng,
        }
    }

    fn steer(near: GridPoint, sample: GridPoint) -> Option<GridPoint> {
        let (dx, dy) = near.delta_to(sample);
        let distance = ((dx * dx + dy * dy) as f64).sqrt();
        if distance <= MAX_STEP {
            return Some(sample);
        }
        let step_x = (dx as f64 / distance * MAX_STEP).trunc() as i64;
        let step_y = (dy as f64 / distance * MAX_STEP).trunc() as i64;
        near.offset(step_x, step_y)
    }

    fn nearest(tree: &[TreeNode], sample: GridPoint) -> (usize, u64) {
        let mut best = (0, u64::MAX);
        for (index, node) in tree.iter().enumerate() {
            let d = node.tile.distance_sq(sample);
            if d < best.1 {
                best = (index, d);
            }
        }
        best
    }
}

impl PathPlanner for SamplingPlanner {
    fn name(&self) -> &str {
        "rrt"
    }

    fn calculate_path(
        &mut self,
        grid: &OccupancyGrid,
        start: GridPoint,
        destination: GridPoint,
        _heading: f64,
    ) -> Result<Path, NavigationError> {
        check_endpoints(grid, start, destination)?;
        if start == destination {
            return Ok(Vec::new());
        }

        let grid = planning_snapshot(grid, destination)?;
        let mut tree = vec![TreeNode {
            tile: start,
            parent: None,
        }];

        for iteration in 0..self.max_iterations {
            let sample = GridPoint::new(
                self.rng.random_range(0..grid.width()),
                self.rng.random_range(0..grid.height()),
            );
            let (near_index, distance_sq) = Self::nearest(&tree, sample);
            if distance_sq == 0 {
                continue;
            }

            let near = tree[near_index].tile;
            let Some(candidate) = Self::steer(near, sample) else {
                continue;
            };
            if !grid.is_clear(candidate) || !is_walkable(&grid, near, candidate, Some(self.footprint_tiles)) {
                continue;
            }

            tree.push(TreeNode {
                tile: candidate,
                parent: Some(near_index),
            });

            if candidate == destination {
                debug!(iterations = iteration + 1, tree_size = tree.len(), "RRT reached destination");
                return Ok(backtrack(&tree, tree.len() - 1));
            }
        }

        warn!(max_iterations = self.max_iterations, tree_size = tree.len(), "RRT sample budget exhausted");
        Err(NavigationError::NoPathFound)
    }
}

fn backtrack(tree: &[TreeNode], mut current: usize) -> Path {
    let mut path = Vec::new();
    while let Some(parent) = tree[current].parent {
        path.push(tree[current].tile);
        current = parent;
    }
    path.reverse();
    path
}
