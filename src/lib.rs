//! Autonomous ground-vehicle navigation simulator.
//!
//! A simulated LIDAR and camera sweep a ground-truth arena and feed an
//! occupancy grid. A pluggable planner from `aurus-navigation` plans over
//! that grid, and a motion thread follows the result while the vehicle pose
//! is published back with GPS/IMU-style noise.

pub mod config;
pub mod error;
pub mod motion;
pub mod perception;
pub mod pose_estimator;
pub mod shutdown;
pub mod simulation;
pub mod world;

pub use config::SimConfig;
pub use error::SimError;
pub use shutdown::ShutdownSignal;
pub use simulation::{Simulation, SimulationOutcome};
