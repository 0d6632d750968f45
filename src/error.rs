//! Error type for the simulator crate.

use aurus_kinematics::KinematicsError;
use aurus_navigation::NavigationError;
use thiserror::Error;

/// Errors raised while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ::config::ConfigError),
    /// The configuration was read but holds unusable values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// A grid or planner operation failed.
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    /// Pose integration failed.
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
    /// A worker thread could not be spawned.
    #[error("Failed to spawn thread: {0}")]
    Thread(#[from] std::io::Error),
}
