//! Grid A* and its cost/neighbourhood variants.

/*

A* = f(n) = g(n) + h(n)

Where:
    n = a tile (or a tile + arrival direction for the turn-penalized variant)
    g(n) = cost from the start tile to n, including any variant penalties
    h(n) = 10 * manhattan(n, destination)

Loop:
    - pop the node with the lowest f(n); ties go to the node inserted first
    - if n is the destination, backtrack and return the path
    - for each neighbour of n that is clear and has never been queued:
        - g(neighbour) = g(n) + step cost (10 straight, 14 diagonal) + penalty
        - push it

Nodes are never re-relaxed once queued. The destination is always treated as
clear, and the start tile is not part of the returned path.

*/

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use tracing::debug;

use crate::error::NavigationError;
use crate::map::{GridPoint, OccupancyGrid, step_cost};
use crate::planner::{Path, PathPlanner, check_endpoints, planning_snapshot};
use crate::smoothing::{Smoothing, smooth_path};

/// Weight applied to the Manhattan heuristic.
pub const HEURISTIC_WEIGHT: u64 = 10;
/// Numerator of the per-obstacle repulsion penalty.
pub const REPULSION_WEIGHT: f64 = 30.0;
/// Obstacles closer than this many tiles on both axes repel a candidate.
pub const REPULSION_RADIUS: i64 = 5;
/// Penalty per 45° of heading change for the turn-penalized variant.
pub const TURN_WEIGHT: u64 = 10;

/// Coarse 8-way heading, counter-clockwise from East.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// +x
    East,
    /// +x +y
    NorthEast,
    /// +y
    North,
    /// -x +y
    NorthWest,
    /// -x
    West,
    /// -x -y
    SouthWest,
    /// -y
    South,
    /// +x -y
    SouthEast,
}

impl Direction {
    const ALL: [Direction; 8] = [
        Direction::East,
        Direction::NorthEast,
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// The sector nearest a heading in degrees.
    pub fn from_heading(heading: f64) -> Direction {
        let sector = (aurus_kinematics::normalize_degrees(heading) / 45.0).round() as i64;
        Direction::ALL[sector.rem_euclid(8) as usize]
    }

    /// Direction of a single grid step. Returns `None` for a zero step.
    pub fn from_step(dx: i64, dy: i64) -> Option<Direction> {
        let d = match (dx.signum(), dy.signum()) {
            (1, 0) => Direction::East,
            (1, 1) => Direction::NorthEast,
            (0, 1) => Direction::North,
            (-1, 1) => Direction::NorthWest,
            (-1, 0) => Direction::West,
            (-1, -1) => Direction::SouthWest,
            (0, -1) => Direction::South,
            (1, -1) => Direction::SouthEast,
            _ => return None,
        };
        Some(d)
    }

    /// Number of 45° sectors between two directions, 0 to 4.
    pub fn turn_steps(self, other: Direction) -> u64 {
        let diff = self.index().abs_diff(other.index());
        diff.min(8 - diff) as u64
    }
}

/// Which neighbours a node expands to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Neighborhood {
    /// All eight grid-adjacent tiles.
    Full,
    /// Diagonals only when both flanking orthogonal tiles are clear.
    CornerSafe,
}

/// Extra cost a variant adds on top of the step cost.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CostModifier {
    /// Plain step costs.
    None,
    /// Penalize tiles close to obstacle evidence.
    Repulsion,
    /// Penalize heading changes; states are keyed by (tile, direction).
    TurnPenalty,
}

#[derive(Debug, Clone)]
struct SearchNode {
    tile: GridPoint,
    g: u64,
    direction: Option<Direction>,
    parent: Option<usize>,
}

/// Best-first grid search with configurable neighbourhood, cost model and smoothing.
#[derive(Debug, Clone)]
pub struct GridAStar {
    name: &'static str,
    neighborhood: Neighborhood,
    modifier: CostModifier,
    smoothing: Option<Smoothing>,
}

impl GridAStar {
    /// Creates a custom variant.
    pub const fn new(
        name: &'static str,
        neighborhood: Neighborhood,
        modifier: CostModifier,
        smoothing: Option<Smoothing>,
    ) -> Self {
        GridAStar {
            name,
            neighborhood,
            modifier,
            smoothing,
        }
    }

    /// Plain 8-connected A*.
    pub const fn standard() -> Self {
        Self::new("astar", Neighborhood::Full, CostModifier::None, None)
    }

    /// Corner-safe neighbours followed by centre-line smoothing.
    pub const fn corner_safe() -> Self {
        Self::new(
            "astar-corner-safe",
            Neighborhood::CornerSafe,
            CostModifier::None,
            Some(Smoothing::centre_line()),
        )
    }

    /// Obstacle repulsion added to the path cost.
    pub const fn repulsion() -> Self {
        Self::new("astar-repulsion", Neighborhood::Full, CostModifier::Repulsion, None)
    }

    /// Obstacle repulsion plus footprint-aware smoothing.
    pub const fn repulsion_wide(footprint_tiles: f64) -> Self {
        Self::new(
            "astar-repulsion-wide",
            Neighborhood::Full,
            CostModifier::Repulsion,
            Some(Smoothing::wide(footprint_tiles)),
        )
    }

    /// Heading-change penalty with direction-aware duplicate filtering.
    pub const fn turn_penalized() -> Self {
        Self::new("astar-turn", Neighborhood::Full, CostModifier::TurnPenalty, None)
    }

    fn heuristic(tile: GridPoint, destination: GridPoint) -> u64 {
        HEURISTIC_WEIGHT * tile.manhattan(destination)
    }

    fn candidates(&self, grid: &OccupancyGrid, tile: GridPoint) -> Vec<GridPoint> {
        grid.neighbors(tile)
            .filter(|n| grid.is_clear(*n))
            .filter(|n| match self.neighborhood {
                Neighborhood::Full => true,
                Neighborhood::CornerSafe => {
                    n.x == tile.x
                        || n.y == tile.y
                        || (grid.is_clear(GridPoint::new(n.x, tile.y)) && grid.is_clear(GridPoint::new(tile.x, n.y)))
                }
            })
            .collect()
    }

    fn penalty(&self, grid: &OccupancyGrid, parent: &SearchNode, tile: GridPoint, direction: Option<Direction>) -> u64 {
        match self.modifier {
            CostModifier::None => 0,
            CostModifier::Repulsion => repulsion(grid, tile),
            CostModifier::TurnPenalty => match (parent.direction, direction) {
                (Some(from), Some(to)) => TURN_WEIGHT * from.turn_steps(to),
                _ => 0,
            },
        }
    }

    fn search(
        &self,
        grid: &OccupancyGrid,
        start: GridPoint,
        destination: GridPoint,
        heading: f64,
    ) -> Result<Path, NavigationError> {
        let tracks_direction = self.modifier == CostModifier::TurnPenalty;
        let start_direction = tracks_direction.then(|| Direction::from_heading(heading));

        let mut nodes = vec![SearchNode {
            tile: start,
            g: 0,
            direction: start_direction,
            parent: None,
        }];
        let mut queued: HashSet<(GridPoint, Option<Direction>)> = HashSet::new();
        queued.insert((start, start_direction));

        // (f, insertion order, node index): the heap pops the first-inserted minimum
        let mut open = BinaryHeap::new();
        let mut sequence: u64 = 0;
        open.push(Reverse((Self::heuristic(start, destination), sequence, 0usize)));

        while let Some(Reverse((_, _, current))) = open.pop() {
            if nodes[current].tile == destination {
                debug!(planner = self.name, explored = nodes.len(), "Destination reached");
                return Ok(reconstruct_path(&nodes, current));
            }

            let tile = nodes[current].tile;
            for neighbor in self.candidates(grid, tile) {
                let (dx, dy) = tile.delta_to(neighbor);
                let direction = if tracks_direction { Direction::from_step(dx, dy) } else { None };
                if !queued.insert((neighbor, direction)) {
                    continue;
                }

                let g = nodes[current].g + step_cost(tile, neighbor) + self.penalty(grid, &nodes[current], neighbor, direction);
                nodes.push(SearchNode {
                    tile: neighbor,
                    g,
                    direction,
                    parent: Some(current),
                });
                sequence += 1;
                open.push(Reverse((g + Self::heuristic(neighbor, destination), sequence, nodes.len() - 1)));
            }
        }

        debug!(planner = self.name, explored = nodes.len(), "Open set exhausted");
        Err(NavigationError::NoPathFound)
    }
}

/// Repulsion penalty for a tile: `Σ REPULSION_WEIGHT / manhattan` over every
/// occupied tile in the surrounding window, truncated to an integer.
pub fn repulsion(grid: &OccupancyGrid, tile: GridPoint) -> u64 {
    let mut total = 0.0;
    for dy in -(REPULSION_RADIUS - 1)..REPULSION_RADIUS {
        for dx in -(REPULSION_RADIUS - 1)..REPULSION_RADIUS {
            if dx == 0 && dy == 0 {
                continue;
            }
            let Some(p) = grid.checked_point(tile.x as i64 + dx, tile.y as i64 + dy) else {
                continue;
            };
            if grid.is_occupied(p) {
                total += REPULSION_WEIGHT / (dx.abs() + dy.abs()) as f64;
            }
        }
    }
    total as u64
}

fn reconstruct_path(nodes: &[SearchNode], mut current: usize) -> Path {
    let mut path = Vec::new();
    while let Some(parent) = nodes[current].parent {
        path.push(nodes[current].tile);
        current = parent;
    }
    path.reverse();
    path
}

impl PathPlanner for GridAStar {
    fn name(&self) -> &str {
        self.name
    }

    fn calculate_path(
        &mut self,
        grid: &OccupancyGrid,
        start: GridPoint,
        destination: GridPoint,
        heading: f64,
    ) -> Result<Path, NavigationError> {
        check_endpoints(grid, start, destination)?;
        if start == destination {
            return Ok(Vec::new());
        }

        let snapshot = planning_snapshot(grid, destination)?;
        let raw = self.search(&snapshot, start, destination, heading)?;
        Ok(match &self.smoothing {
            Some(smoothing) => smooth_path(&snapshot, start, raw, smoothing),
            None => raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::path_cost;

    fn all_variants() -> Vec<GridAStar> {
        vec![
            GridAStar::standard(),
            GridAStar::corner_safe(),
            GridAStar::repulsion(),
            GridAStar::repulsion_wide(4.0),
            GridAStar::turn_penalized(),
        ]
    }

    fn wall_grid() -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(10, 10).unwrap();
        for y in 0..10 {
            grid.increment(GridPoint::new(5, y)).unwrap();
        }
        grid
    }

    fn assert_adjacent_steps(start: GridPoint, path: &[GridPoint]) {
        let mut previous = start;
        for p in path {
            let (dx, dy) = previous.delta_to(*p);
            assert!(dx.abs() <= 1 && dy.abs() <= 1 && (dx, dy) != (0, 0), "jump {previous} -> {p}");
            previous = *p;
        }
    }

    #[test]
    fn test_start_equals_destination() {
        let grid = OccupancyGrid::new(5, 5).unwrap();
        let p = GridPoint::new(2, 2);
        for mut planner in all_variants() {
            assert_eq!(planner.calculate_path(&grid, p, p, 0.0).unwrap(), Vec::new());
        }
    }

    #[test]
    fn test_empty_grid_diagonal() {
        let grid = OccupancyGrid::new(10, 10).unwrap();
        let start = GridPoint::new(0, 0);
        let destination = GridPoint::new(9, 9);
        let path = GridAStar::standard().calculate_path(&grid, start, destination, 0.0).unwrap();

        let expected: Vec<_> = (1..=9).map(|i| GridPoint::new(i, i)).collect();
        assert_eq!(path, expected);
        assert_eq!(path_cost(start, &path), 9 * 14);
    }

    #[test]
    fn test_path_avoids_obstacles() {
        let mut grid = wall_grid();
        // Open a gap in the wall
        grid.force_clear(GridPoint::new(5, 7)).unwrap();
        let start = GridPoint::new(1, 1);
        let destination = GridPoint::new(8, 2);

        for mut planner in all_variants() {
            let path = planner.calculate_path(&grid, start, destination, 0.0).unwrap();
            assert_eq!(*path.last().unwrap(), destination, "{}", planner.name());
            for p in &path {
                assert!(grid.is_clear(*p), "{} visited occupied {p}", planner.name());
            }
            assert!(path.contains(&GridPoint::new(5, 7)) || planner.smoothing.is_some());
        }
    }

    #[test]
    fn test_unsmoothed_paths_are_contiguous() {
        let mut grid = wall_grid();
        grid.force_clear(GridPoint::new(5, 3)).unwrap();
        let start = GridPoint::new(0, 9);
        for mut planner in [GridAStar::standard(), GridAStar::repulsion(), GridAStar::turn_penalized()] {
            let path = planner.calculate_path(&grid, start, GridPoint::new(9, 0), 90.0).unwrap();
            assert_adjacent_steps(start, &path);
        }
    }

    #[test]
    fn test_wall_means_no_path() {
        let grid = wall_grid();
        for mut planner in all_variants() {
            assert_eq!(
                planner.calculate_path(&grid, GridPoint::new(1, 1), GridPoint::new(8, 8), 0.0),
                Err(NavigationError::NoPathFound),
                "{}",
                planner.name()
            );
        }
    }

    #[test]
    fn test_obstructed_destination_still_reached() {
        let mut grid = OccupancyGrid::new(6, 6).unwrap();
        let destination = GridPoint::new(4, 4);
        grid.increment(destination).unwrap();
        grid.increment(destination).unwrap();
        for mut planner in all_variants() {
            let path = planner.calculate_path(&grid, GridPoint::new(0, 0), destination, 0.0).unwrap();
            assert_eq!(*path.last().unwrap(), destination);
        }
        // The caller's grid is untouched
        assert_eq!(grid.evidence(destination).unwrap(), 2);
    }

    #[test]
    fn test_corner_safe_refuses_pinched_diagonal() {
        // Clear diagonal from (0,0) to (1,1), but both flanks are blocked
        let grid = OccupancyGrid::from_rows(&[vec![0, 1, 0], vec![1, 0, 0], vec![0, 0, 0]]).unwrap();
        let start = GridPoint::new(0, 0);
        let destination = GridPoint::new(2, 2);

        let plain = GridAStar::standard().calculate_path(&grid, start, destination, 0.0).unwrap();
        assert_eq!(plain.first(), Some(&GridPoint::new(1, 1)));

        let safe = GridAStar::corner_safe().calculate_path(&grid, start, destination, 0.0);
        assert_eq!(safe, Err(NavigationError::NoPathFound));
    }

    #[test]
    fn test_repulsion_penalty() {
        let mut grid = OccupancyGrid::new(11, 11).unwrap();
        let centre = GridPoint::new(5, 5);
        assert_eq!(repulsion(&grid, centre), 0);

        grid.increment(GridPoint::new(6, 5)).unwrap(); // distance 1 -> 30
        grid.increment(GridPoint::new(3, 3)).unwrap(); // distance 4 -> 7.5
        assert_eq!(repulsion(&grid, centre), 37);

        // Outside the window
        grid.increment(GridPoint::new(10, 5)).unwrap();
        assert_eq!(repulsion(&grid, centre), 37);
    }

    #[test]
    fn test_repulsion_keeps_distance_from_obstacles() {
        // A single block next to the straight line pushes the repulsion route away
        let mut grid = OccupancyGrid::new(12, 9).unwrap();
        grid.increment(GridPoint::new(6, 5)).unwrap();
        let start = GridPoint::new(0, 4);
        let destination = GridPoint::new(11, 4);

        let plain = GridAStar::standard().calculate_path(&grid, start, destination, 0.0).unwrap();
        let repelled = GridAStar::repulsion().calculate_path(&grid, start, destination, 0.0).unwrap();

        let min_clearance = |path: &[GridPoint]| {
            path.iter()
                .map(|p| p.manhattan(GridPoint::new(6, 5)))
                .min()
                .unwrap()
        };
        assert!(min_clearance(&repelled) >= min_clearance(&plain));
    }

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::from_heading(0.0), Direction::East);
        assert_eq!(Direction::from_heading(90.0), Direction::North);
        assert_eq!(Direction::from_heading(-135.0), Direction::SouthWest);
        assert_eq!(Direction::from_heading(180.0), Direction::West);
        assert_eq!(Direction::from_heading(-170.0), Direction::West);
        assert_eq!(Direction::from_step(0, -1), Some(Direction::South));
        assert_eq!(Direction::from_step(0, 0), None);

        assert_eq!(Direction::East.turn_steps(Direction::East), 0);
        assert_eq!(Direction::East.turn_steps(Direction::SouthEast), 1);
        assert_eq!(Direction::East.turn_steps(Direction::West), 4);
        assert_eq!(Direction::NorthEast.turn_steps(Direction::South), 3);
    }

    #[test]
    fn test_turn_penalty_prefers_straight_runs() {
        let grid = OccupancyGrid::new(10, 10).unwrap();
        let start = GridPoint::new(0, 0);
        let destination = GridPoint::new(6, 0);
        // Facing north, the first move must still head east along the row
        let path = GridAStar::turn_penalized().calculate_path(&grid, start, destination, 90.0).unwrap();
        assert_eq!(path.last(), Some(&destination));
        let mut turns = 0;
        let mut previous = start;
        let mut last_direction = None;
        for p in &path {
            let (dx, dy) = previous.delta_to(*p);
            let d = Direction::from_step(dx, dy);
            if last_direction.is_some() && d != last_direction {
                turns += 1;
            }
            last_direction = d;
            previous = *p;
        }
        assert_eq!(turns, 0);
    }

    #[test]
    fn test_out_of_bounds_endpoint() {
        let grid = OccupancyGrid::new(4, 4).unwrap();
        let result = GridAStar::standard().calculate_path(&grid, GridPoint::new(0, 0), GridPoint::new(4, 0), 0.0);
        assert_eq!(result, Err(NavigationError::OutOfBounds { x: 4, y: 0 }));
    }
}
