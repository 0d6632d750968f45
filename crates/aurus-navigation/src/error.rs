//! This module defines the error types used by the `aurus-navigation` crate.

use thiserror::Error;

/// Error type for navigation operations.
///
/// This enum encapsulates all possible errors that can occur during
/// grid access and path planning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// Error for invalid map dimensions.
    /// This variant is returned when grid width or height is zero or the cell count overflows.
    #[error("Invalid map dimensions: {0}")]
    InvalidDimensions(&'static str),
    /// Error for out-of-bounds access.
    /// This variant is returned when attempting to access grid cells outside the valid range.
    #[error("Map access out of bounds at ({x}, {y})")]
    OutOfBounds {
        /// Requested column (may be negative for metric lookups).
        x: i64,
        /// Requested row (may be negative for metric lookups).
        y: i64,
    },
    /// The planner exhausted its search without reaching the destination.
    #[error("No path found to the destination")]
    NoPathFound,
    /// A strategy name did not resolve against the registry.
    #[error("Unknown planning strategy: {0}")]
    UnknownStrategy(String),
    /// A planner or frame was configured with an unusable parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),
}
