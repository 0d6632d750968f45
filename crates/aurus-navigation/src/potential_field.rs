//! Local planning with an attractive/repulsive potential field.
//!
//! The planner does not search. It takes a handful of greedy steps down the
//! field and then appends the destination, so its paths may cross obstacles
//! and stall in local minima.

use crate::error::NavigationError;
use crate::map::{GridPoint, OccupancyGrid};
use crate::planner::{Path, PathPlanner, check_endpoints, planning_snapshot};
use crate::smoothing::{Smoothing, smooth_path};

/// Magnitude of the pull toward the destination.
pub const GOAL_FORCE: f64 = 0.5;
/// Obstacles further than this (squared tiles) exert no force.
pub const REPULSION_CUTOFF_SQ: f64 = 32.0;
/// Consecutive waypoints the smoothing variants may remove.
pub const MAX_CUTS: usize = 5;

/// Greedy force-following planner.
#[derive(Debug, Clone)]
pub struct PotentialFieldPlanner {
    name: &'static str,
    steps: usize,
    smoothing: Option<Smoothing>,
}

impl PotentialFieldPlanner {
    /// Five lookahead steps, no smoothing.
    pub const fn plain() -> Self {
        PotentialFieldPlanner {
            name: "potential-field",
            steps: 5,
            smoothing: None,
        }
    }

    /// Eight lookahead steps with capped centre-line smoothing.
    pub const fn smoothed() -> Self {
        PotentialFieldPlanner {
            name: "potential-field-smooth",
            steps: 8,
            smoothing: Some(Smoothing::centre_line().with_max_cuts(MAX_CUTS)),
        }
    }

    /// Eight lookahead steps with capped footprint-aware smoothing.
    pub const fn smoothed_wide(footprint_tiles: f64) -> Self {
        PotentialFieldPlanner {
            name: "potential-field-smooth-wide",
            steps: 8,
            smoothing: Some(Smoothing::wide(footprint_tiles).with_max_cuts(MAX_CUTS)),
        }
    }
}

/// Net force on a tile: attraction toward `destination` plus inverse-square
/// repulsion from every obstacle inside the cutoff.
pub fn field_force(position: GridPoint, destination: GridPoint, obstacles: &[GridPoint]) -> (f64, f64) {
    let (gx, gy) = position.delta_to(destination);
    let (gx, gy) = (gx as f64, gy as f64);
    let goal_distance = (gx * gx + gy * gy).sqrt();
    let (mut fx, mut fy) = if goal_distance > 0.0 {
        (GOAL_FORCE * gx / goal_distance, GOAL_FORCE * gy / goal_distance)
    } else {
        (0.0, 0.0)
    };

    for obstacle in obstacles {
        let (ox, oy) = obstacle.delta_to(position);
        let (ox, oy) = (ox as f64, oy as f64);
        let d2 = ox * ox + oy * oy;
        if d2 == 0.0 || d2 > REPULSION_CUTOFF_SQ {
            continue;
        }
        let d = d2.sqrt();
        fx += ox / d / d2;
        fy += oy / d / d2;
    }
    (fx, fy)
}

impl PathPlanner for PotentialFieldPlanner {
    fn name(&self) -> &str {
        self.name
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
        let obstacles: Vec<GridPoint> = grid.occupied_points().collect();

        let mut path = Vec::with_capacity(self.steps + 1);
        let mut position = start;
        for _ in 0..self.steps {
            let (fx, fy) = field_force(position, destination, &obstacles);
            let (dx, dy) = if fx.abs() > fy.abs() {
                (fx.signum() as i64, 0)
            } else if fy != 0.0 {
                (0, fy.signum() as i64)
            } else {
                break;
            };

            let Some(next) = position.offset(dx, dy).filter(|p| grid.contains(*p)) else {
                break;
            };
            position = next;
            path.push(position);
            if position == destination {
                break;
            }
        }

        if path.last() != Some(&destination) {
            path.push(destination);
        }

        Ok(match &self.smoothing {
            Some(smoothing) => smooth_path(&grid, start, path, smoothing),
            None => path,
        })
    }
}
