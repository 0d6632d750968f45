//! Path smoothing by string-pulling.
//!
//! After a planner backtracks its raw path, intermediate waypoints are dropped
//! whenever the straight segment from the last kept waypoint to a farther one
//! is collision free.

use crate::map::{GridPoint, OccupancyGrid};
use crate::planner::Path;

/// Distance between samples along a segment, in tiles.
pub const SAMPLE_STEP: f64 = 0.25;

/// Smoothing configuration attached to a planner variant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Smoothing {
    /// Vehicle footprint in tiles. `None` checks only the centre line.
    pub footprint_tiles: Option<f64>,
    /// Maximum number of consecutive waypoints that may be removed.
    pub max_cuts: Option<usize>,
}

impl Smoothing {
    /// Centre-line checks, no cut cap.
    pub const fn centre_line() -> Self {
        Smoothing {
            footprint_tiles: None,
            max_cuts: None,
        }
    }

    /// Footprint-aware checks, no cut cap.
    pub const fn wide(footprint_tiles: f64) -> Self {
        Smoothing {
            footprint_tiles: Some(footprint_tiles),
            max_cuts: None,
        }
    }

    /// Adds a cap on consecutive cuts.
    pub const fn with_max_cuts(mut self, max_cuts: usize) -> Self {
        self.max_cuts = Some(max_cuts);
        self
    }
}

fn sample_tile(grid: &OccupancyGrid, x: f64, y: f64) -> Option<GridPoint> {
    let tx = (x + 0.5).floor();
    let ty = (y + 0.5).floor();
    grid.checked_point(tx as i64, ty as i64)
}

/// Checks whether the straight segment between two tile centres is free.
///
/// The segment is sampled every [`SAMPLE_STEP`] tiles. A centre sample that
/// leaves the grid or lands on an occupied tile rejects the segment. With a
/// footprint, each sample also probes `±footprint/4` and `±footprint/2`
/// perpendicular to the segment; those probes reject on occupied tiles but
/// ignore positions beyond the grid edge, which is not an obstacle.
pub fn is_walkable(grid: &OccupancyGrid, from: GridPoint, to: GridPoint, footprint_tiles: Option<f64>) -> bool {
    let (dx, dy) = from.delta_to(to);
    let (dx, dy) = (dx as f64, dy as f64);
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return grid.is_clear(from);
    }

    let (ux, uy) = (dx / length, dy / length);
    // Left-hand normal of the segment
    let (nx, ny) = (-uy, ux);
    let offsets: Vec<f64> = match footprint_tiles {
        Some(w) if w > 0.0 => vec![w / 4.0, -w / 4.0, w / 2.0, -w / 2.0],
        _ => Vec::new(),
    };

    let samples = (length / SAMPLE_STEP).floor() as usize;
    for i in 1..=samples {
        let travelled = i as f64 * SAMPLE_STEP;
        let px = from.x as f64 + ux * travelled;
        let py = from.y as f64 + uy * travelled;

        match sample_tile(grid, px, py) {
            Some(tile) if grid.is_clear(tile) => {}
            _ => return false,
        }

        for offset in &offsets {
            if let Some(tile) = sample_tile(grid, px + nx * offset, py + ny * offset) {
                if grid.is_occupied(tile) {
                    return false;
                }
            }
        }
    }
    true
}

/// Greedily removes waypoints whose neighbours can see each other.
///
/// `start` is the tile the path departs from; it is not part of `path`. The
/// final waypoint is always kept.
pub fn smooth_path(grid: &OccupancyGrid, start: GridPoint, path: Path, smoothing: &Smoothing) -> Path {
    if path.len() < 2 {
        return path;
    }

    let mut smoothed = Vec::with_capacity(path.len());
    let mut check = start;
    let mut current = path[0];
    let mut cuts = 0usize;

    for &next in &path[1..] {
        let under_cap = smoothing.max_cuts.is_none_or(|cap| cuts < cap);
        if under_cap && is_walkable(grid, check, next, smoothing.footprint_tiles) {
            cuts += 1;
        } else {
            smoothed.push(current);
            check = current;
            cuts = 0;
        }
        current = next;
    }
    smoothed.push(current);
    smoothed
}
