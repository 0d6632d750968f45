#![warn(missing_docs)]

//! Occupancy grid of obstacle evidence counts.

use crate::error::NavigationError;
use super::GridPoint;

/// The eight grid-adjacent offsets, orthogonal first.
pub const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

/// Cost of an orthogonal step, in fixed-point tenths of a tile.
pub const ORTHOGONAL_COST: u64 = 10;
/// Cost of a diagonal step (fixed-point approximation of 10·√2).
pub const DIAGONAL_COST: u64 = 14;

/// Returns the step cost between two grid-adjacent tiles.
pub fn step_cost(from: GridPoint, to: GridPoint) -> u64 {
    if from.x != to.x && from.y != to.y {
        DIAGONAL_COST
    } else {
        ORTHOGONAL_COST
    }
}

/// A 2D occupancy grid of obstacle evidence counts.
///
/// A value of `0` means the tile is clear; anything above zero is obstacle
/// evidence accumulated from sensor hits. Evidence only ever grows through
/// [`OccupancyGrid::increment`]; [`OccupancyGrid::force_clear`] exists for
/// planners working on private snapshots.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    /// Width of the grid in tiles
    width: usize,
    /// Height of the grid in tiles
    height: usize,
    /// Row-major evidence counts
    data: Vec<u32>,
}

impl OccupancyGrid {
    /// Creates a new, fully clear grid.
    ///
    /// # Arguments
    /// * `width` - Width of the grid in tiles
    /// * `height` - Height of the grid in tiles
    ///
    /// # Returns
    /// * `Result<Self, NavigationError>` - The grid or an error if the dimensions are unusable
    pub fn new(width: usize, height: usize) -> Result<Self, NavigationError> {
        if width == 0 || height == 0 {
            return Err(NavigationError::InvalidDimensions("Width and height must be non-zero"));
        }
        let Some(cells) = width.checked_mul(height) else {
            return Err(NavigationError::InvalidDimensions("Map dimensions too large, would cause overflow"));
        };
        if i64::try_from(cells).is_err() {
            return Err(NavigationError::InvalidDimensions("Map dimensions too large, would cause overflow"));
        }

        Ok(OccupancyGrid {
            width,
            height,
            data: vec![0; cells],
        })
    }

    /// Builds a grid from rows of evidence, `rows[y][x]`.
    ///
    /// Handy for tests and fixtures. All rows must share the same length.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, NavigationError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut grid = OccupancyGrid::new(width, height)?;
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(NavigationError::InvalidDimensions("Rows must all have the same length"));
            }
            for (x, &value) in row.iter().enumerate() {
                grid.data[y * width + x] = value;
            }
        }
        Ok(grid)
    }

    /// Width of the grid in tiles.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid in tiles.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of tiles.
    pub fn cell_count(&self) -> usize {
        self.data.len()
    }

    /// Calculates the index in the data vector for a given grid point.
    /// The caller must have checked bounds.
    pub fn index_of(&self, p: GridPoint) -> usize {
        p.y * self.width + p.x
    }

    /// Inverse of [`OccupancyGrid::index_of`].
    pub fn point_of(&self, index: usize) -> GridPoint {
        GridPoint::new(index % self.width, index / self.width)
    }

    /// Returns `true` if the point lies inside the grid.
    pub fn contains(&self, p: GridPoint) -> bool {
        p.x < self.width && p.y < self.height
    }

    /// Returns the in-bounds point at signed coordinates, if any.
    pub fn checked_point(&self, x: i64, y: i64) -> Option<GridPoint> {
        if x < 0 || y < 0 {
            return None;
        }
        let p = GridPoint::new(x as usize, y as usize);
        self.contains(p).then_some(p)
    }

    /// Gets the evidence count at a grid point.
    ///
    /// # Returns
    /// * `Result<u32, NavigationError>` - The evidence or an error if out of bounds
    pub fn evidence(&self, p: GridPoint) -> Result<u32, NavigationError> {
        if self.contains(p) {
            Ok(self.data[self.index_of(p)])
        } else {
            Err(out_of_bounds(p))
        }
    }

    /// Returns `true` if the tile is in bounds and has no obstacle evidence.
    pub fn is_clear(&self, p: GridPoint) -> bool {
        self.contains(p) && self.data[self.index_of(p)] == 0
    }

    /// Returns `true` if the tile is in bounds and has obstacle evidence.
    pub fn is_occupied(&self, p: GridPoint) -> bool {
        self.contains(p) && self.data[self.index_of(p)] > 0
    }

    /// Adds one unit of obstacle evidence to a tile.
    ///
    /// # Returns
    /// * `Result<u32, NavigationError>` - The new evidence count or an error if out of bounds
    pub fn increment(&mut self, p: GridPoint) -> Result<u32, NavigationError> {
        if !self.contains(p) {
            return Err(out_of_bounds(p));
        }
        let index = self.index_of(p);
        self.data[index] = self.data[index].saturating_add(1);
        Ok(self.data[index])
    }

    /// Sets a tile's evidence to an explicit value.
    pub fn set_evidence(&mut self, p: GridPoint, value: u32) -> Result<(), NavigationError> {
        if !self.contains(p) {
            return Err(out_of_bounds(p));
        }
        let index = self.index_of(p);
        self.data[index] = value;
        Ok(())
    }

    /// Resets a tile to clear. Only meant for planner-private snapshots, where
    /// the destination tile must never count as an obstacle.
    pub fn force_clear(&mut self, p: GridPoint) -> Result<(), NavigationError> {
        self.set_evidence(p, 0)
    }

    /// In-bounds 8-neighbours of `p`, orthogonal first.
    pub fn neighbors(&self, p: GridPoint) -> impl Iterator<Item = GridPoint> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| self.checked_point(p.x as i64 + dx, p.y as i64 + dy))
    }

    /// Iterates over every tile with obstacle evidence.
    pub fn occupied_points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, value)| **value > 0)
            .map(|(index, _)| self.point_of(index))
    }

    /// Gets a reference to the underlying evidence data (row-major).
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Indices whose clear/occupied state differs between `self` and `other`.
    ///
    /// # Errors
    /// Returns `InvalidDimensions` if the grids are not the same size.
    pub fn changed_cells(&self, other: &OccupancyGrid) -> Result<Vec<usize>, NavigationError> {
        if self.width != other.width || self.height != other.height {
            return Err(NavigationError::InvalidDimensions("Grids must share dimensions to be compared"));
        }
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .enumerate()
            .filter(|(_, (a, b))| (**a == 0) != (**b == 0))
            .map(|(index, _)| index)
            .collect())
    }
}

fn out_of_bounds(p: GridPoint) -> NavigationError {
    NavigationError::OutOfBounds {
        x: p.x as i64,
        y: p.y as i64,
    }
}

impl std::fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "OccupancyGrid ({}x{})", self.width, self.height)?;

        // Top row first so the printout matches the world frame (y up)
        for y_idx in (0..self.height).rev() {
            for x_idx in 0..self.width {
                let value = self.data[y_idx * self.width + x_idx];
                write!(f, "{}", if value == 0 { '.' } else { '#' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = OccupancyGrid::new(10, 5).unwrap();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.cell_count(), 50);
        assert!(grid.data().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_invalid_creation() {
        assert!(matches!(
            OccupancyGrid::new(0, 10),
            Err(NavigationError::InvalidDimensions(_))
        ));
        assert!(matches!(
            OccupancyGrid::new(10, 0),
            Err(NavigationError::InvalidDimensions(_))
        ));
        assert!(matches!(
            OccupancyGrid::new(usize::MAX, 2),
            Err(NavigationError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_evidence_is_monotonic() {
        let mut grid = OccupancyGrid::new(5, 5).unwrap();
        let p = GridPoint::new(2, 3);
        let mut last = 0;
        for _ in 0..10 {
            let now = grid.increment(p).unwrap();
            assert!(now > last);
            last = now;
        }
        assert_eq!(grid.evidence(p).unwrap(), 10);
        assert!(grid.is_occupied(p));
        assert!(!grid.is_clear(p));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut grid = OccupancyGrid::new(5, 5).unwrap();
        assert_eq!(
            grid.increment(GridPoint::new(5, 2)),
            Err(NavigationError::OutOfBounds { x: 5, y: 2 })
        );
        assert!(matches!(
            grid.evidence(GridPoint::new(2, 5)),
            Err(NavigationError::OutOfBounds { .. })
        ));
        assert!(grid.data().iter().all(|v| *v == 0));
        assert!(!grid.is_clear(GridPoint::new(7, 7)));
    }

    #[test]
    fn test_neighbors_at_corner() {
        let grid = OccupancyGrid::new(3, 3).unwrap();
        let corner: Vec<_> = grid.neighbors(GridPoint::new(0, 0)).collect();
        assert_eq!(
            corner,
            vec![GridPoint::new(1, 0), GridPoint::new(0, 1), GridPoint::new(1, 1)]
        );
        assert_eq!(grid.neighbors(GridPoint::new(1, 1)).count(), 8);
    }

    #[test]
    fn test_from_rows_and_changed_cells() {
        let a = OccupancyGrid::from_rows(&[vec![0, 0, 0], vec![0, 2, 0]]).unwrap();
        let mut b = a.clone();
        assert!(a.changed_cells(&b).unwrap().is_empty());

        // More evidence on an occupied tile is not a change of state
        b.increment(GridPoint::new(1, 1)).unwrap();
        assert!(a.changed_cells(&b).unwrap().is_empty());

        b.increment(GridPoint::new(2, 0)).unwrap();
        assert_eq!(a.changed_cells(&b).unwrap(), vec![2]);
        assert_eq!(a.point_of(2), GridPoint::new(2, 0));

        let other = OccupancyGrid::new(2, 2).unwrap();
        assert!(a.changed_cells(&other).is_err());
    }

    #[test]
    fn test_step_cost() {
        let origin = GridPoint::new(1, 1);
        assert_eq!(step_cost(origin, GridPoint::new(2, 1)), ORTHOGONAL_COST);
        assert_eq!(step_cost(origin, GridPoint::new(2, 2)), DIAGONAL_COST);
    }
}
