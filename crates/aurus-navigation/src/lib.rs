#![warn(missing_docs)]
//! Grid navigation for the aurus simulator.
//!
//! The crate is layered bottom-up:
//! - [`map`]: the occupancy grid, tile/meter point types and the metric frame
//! - [`astar`], [`rrt`], [`potential_field`]: stateless planners over grid snapshots
//! - [`smoothing`]: string-pulling shared by the smoothed variants
//! - [`dstar_lite`]: the incremental planner that keeps its search between calls
//! - [`registry`]: name-based lookup of all of the above

pub mod astar;
pub mod dstar_lite;
pub mod error;
pub mod map;
pub mod planner;
pub mod potential_field;
pub mod registry;
pub mod rrt;
pub mod smoothing;

pub use astar::GridAStar;
pub use dstar_lite::DStarLite;
pub use error::NavigationError;
pub use map::{GridPoint, MetricFrame, OccupancyGrid, WorldPoint};
pub use planner::{Path, PathPlanner, PlannerSettings};
pub use potential_field::PotentialFieldPlanner;
pub use registry::StrategyRegistry;
pub use rrt::SamplingPlanner;
