//! The capability set shared by every path planner.

use crate::error::NavigationError;
use crate::map::{GridPoint, OccupancyGrid};

/// An ordered list of waypoints. The head is the next tile to reach, the tail
/// is the destination tile. The start tile is never included.
pub type Path = Vec<GridPoint>;

/// Tunables handed to strategy factories when a planner is created.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    /// Vehicle footprint in tiles, used by width-aware walkability checks.
    pub footprint_tiles: f64,
    /// Upper bound on RRT samples before giving up.
    pub rrt_max_iterations: usize,
    /// Fixed RRT seed for reproducible runs; entropy-seeded when `None`.
    pub rrt_seed: Option<u64>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        PlannerSettings {
            footprint_tiles: 4.0,
            rrt_max_iterations: 200_000,
            rrt_seed: None,
        }
    }
}

/// A pluggable grid path planner.
///
/// Planners receive a snapshot of the grid and return a [`Path`] from the
/// tile after `start` to `destination`. Stateless planners ignore earlier
/// calls; incremental planners reuse state across calls, which is why the
/// receiver is `&mut self`.
pub trait PathPlanner: Send {
    /// The registry name of this planner.
    fn name(&self) -> &str;

    /// Plans a path over `grid`.
    ///
    /// # Arguments
    /// * `grid` - Occupancy snapshot. The destination tile is treated as clear.
    /// * `start` - The vehicle's tile.
    /// * `destination` - The goal tile.
    /// * `heading` - Vehicle heading in degrees (CCW from East). Only
    ///   direction-aware planners use it.
    ///
    /// # Errors
    /// * `NoPathFound` when the destination cannot be reached.
    /// * `OutOfBounds` when `start` or `destination` lies outside the grid.
    fn calculate_path(
        &mut self,
        grid: &OccupancyGrid,
        start: GridPoint,
        destination: GridPoint,
        heading: f64,
    ) -> Result<Path, NavigationError>;

    /// Whether the planner keeps search state between calls.
    fn is_incremental(&self) -> bool {
        false
    }
}

/// Rejects endpoints outside the grid.
pub(crate) fn check_endpoints(
    grid: &OccupancyGrid,
    start: GridPoint,
    destination: GridPoint,
) -> Result<(), NavigationError> {
    for p in [start, destination] {
        if !grid.contains(p) {
            return Err(NavigationError::OutOfBounds {
                x: p.x as i64,
                y: p.y as i64,
            });
        }
    }
    Ok(())
}

/// Copies the grid with the destination forced clear.
pub(crate) fn planning_snapshot(
    grid: &OccupancyGrid,
    destination: GridPoint,
) -> Result<OccupancyGrid, NavigationError> {
    let mut snapshot = grid.clone();
    snapshot.force_clear(destination)?;
    Ok(snapshot)
}

/// Sum of step costs along `start` followed by `path`, with 10 per orthogonal
/// and 14 per diagonal move. Non-adjacent hops (from smoothing) are costed by
/// their octile length.
pub fn path_cost(start: GridPoint, path: &[GridPoint]) -> u64 {
    let mut previous = start;
    let mut total = 0;
    for &p in path {
        total += octile_distance(previous, p);
        previous = p;
    }
    total
}

/// Octile distance in fixed-point tenths: 14 per diagonal step, 10 per straight step.
pub fn octile_distance(a: GridPoint, b: GridPoint) -> u64 {
    let dx = a.x.abs_diff(b.x) as u64;
    let dy = a.y.abs_diff(b.y) as u64;
    let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
    crate::map::DIAGONAL_COST * lo + crate::map::ORTHOGONAL_COST * (hi - lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octile_distance() {
        let o = GridPoint::new(0, 0);
        assert_eq!(octile_distance(o, GridPoint::new(9, 9)), 126);
        assert_eq!(octile_distance(o, GridPoint::new(3, 0)), 30);
        assert_eq!(octile_distance(o, GridPoint::new(2, 5)), 28 + 30);
    }

    #[test]
    fn test_path_cost() {
        let path = vec![GridPoint::new(1, 1), GridPoint::new(2, 1), GridPoint::new(2, 2)];
        assert_eq!(path_cost(GridPoint::new(0, 0), &path), 14 + 10 + 10);
        assert_eq!(path_cost(GridPoint::new(0, 0), &[]), 0);
    }

    #[test]
    fn test_planning_snapshot_clears_destination() {
        let mut grid = OccupancyGrid::new(3, 3).unwrap();
        let dest = GridPoint::new(2, 2);
        grid.increment(dest).unwrap();
        let snapshot = planning_snapshot(&grid, dest).unwrap();
        assert!(snapshot.is_clear(dest));
        assert!(grid.is_occupied(dest));
    }

    #[test]
    fn test_check_endpoints() {
        let grid = OccupancyGrid::new(3, 3).unwrap();
        assert!(check_endpoints(&grid, GridPoint::new(0, 0), GridPoint::new(2, 2)).is_ok());
        assert_eq!(
            check_endpoints(&grid, GridPoint::new(0, 0), GridPoint::new(3, 1)),
            Err(NavigationError::OutOfBounds { x: 3, y: 1 })
        );
    }
}
