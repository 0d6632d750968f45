//! Metric arena to tile grid conversion.

use crate::error::NavigationError;
use super::{GridPoint, WorldPoint};

/// Maps a rectangular metric arena onto a tile grid.
///
/// The arena spans `[0, width_m) x [0, height_m)` with the origin at the
/// bottom-left corner. Tile `(0, 0)` covers the origin.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricFrame {
    width_m: f64,
    height_m: f64,
    tiles_x: usize,
    tiles_y: usize,
}

impl MetricFrame {
    /// Creates a frame for an arena of `width_m x height_m` meters split into
    /// `tiles_x x tiles_y` tiles.
    pub fn new(width_m: f64, height_m: f64, tiles_x: usize, tiles_y: usize) -> Result<Self, NavigationError> {
        if !(width_m > 0.0 && height_m > 0.0) || !width_m.is_finite() || !height_m.is_finite() {
            return Err(NavigationError::InvalidParameter("arena extents must be positive and finite"));
        }
        if tiles_x == 0 || tiles_y == 0 {
            return Err(NavigationError::InvalidDimensions("Tile counts must be non-zero"));
        }
        Ok(MetricFrame {
            width_m,
            height_m,
            tiles_x,
            tiles_y,
        })
    }

    /// Arena width in meters.
    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    /// Arena height in meters.
    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    /// Number of tiles along x.
    pub fn tiles_x(&self) -> usize {
        self.tiles_x
    }

    /// Number of tiles along y.
    pub fn tiles_y(&self) -> usize {
        self.tiles_y
    }

    /// Tile edge length along x, in meters.
    pub fn tile_width_m(&self) -> f64 {
        self.width_m / self.tiles_x as f64
    }

    /// Tile edge length along y, in meters.
    pub fn tile_height_m(&self) -> f64 {
        self.height_m / self.tiles_y as f64
    }

    /// Converts world coordinates (in meters) to the containing tile.
    ///
    /// # Errors
    /// Returns `OutOfBounds` (carrying the signed tile index that was computed)
    /// for points outside the arena.
    pub fn world_to_grid(&self, p: WorldPoint) -> Result<GridPoint, NavigationError> {
        let fx = (p.x / self.width_m * self.tiles_x as f64).floor();
        let fy = (p.y / self.height_m * self.tiles_y as f64).floor();
        if !fx.is_finite() || !fy.is_finite() {
            return Err(NavigationError::InvalidParameter("world coordinates must be finite"));
        }

        let (x, y) = (fx as i64, fy as i64);
        if x < 0 || y < 0 || x >= self.tiles_x as i64 || y >= self.tiles_y as i64 {
            return Err(NavigationError::OutOfBounds { x, y });
        }
        Ok(GridPoint::new(x as usize, y as usize))
    }

    /// Converts a tile to the world coordinates of its centre.
    pub fn grid_to_world(&self, p: GridPoint) -> WorldPoint {
        WorldPoint::new(
            (p.x as f64 + 0.5) * self.tile_width_m(),
            (p.y as f64 + 0.5) * self.tile_height_m(),
        )
    }

    /// Converts a length in meters to tiles along x.
    pub fn meters_to_tiles(&self, meters: f64) -> f64 {
        meters / self.tile_width_m()
    }

    /// Returns `true` if the point lies inside the arena.
    pub fn contains(&self, p: WorldPoint) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width_m && p.y < self.height_m
    }
}
