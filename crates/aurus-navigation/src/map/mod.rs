//! Map-related functionality for navigation.
//!
//! This module provides the occupancy grid planners operate on, the point
//! types used for tiles and meters, and the metric frame that converts between them.

pub mod frame;
pub mod occupancy;
pub mod point_types;

pub use frame::MetricFrame;
pub use occupancy::{DIAGONAL_COST, NEIGHBOR_OFFSETS, ORTHOGONAL_COST, OccupancyGrid, step_cost};
pub use point_types::{GridPoint, WorldPoint};
