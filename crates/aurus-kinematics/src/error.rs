#![warn(missing_docs)]

//! Error types for the kinematics library.
//!
//! This module defines error types that can occur while integrating
//! commanded motion into a pose.

use core::fmt;

/// Errors that can occur in kinematic calculations.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Error for negative time delta.
    /// This variant is returned when a negative time delta is used for pose updates.
    NegativeTimeDelta(&'static str),
    /// Error for a NaN or infinite input.
    /// Returned when a twist or distance would poison the pose with non-finite values.
    NonFiniteValue(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
            KinematicsError::NonFiniteValue(msg) => write!(f, "Non-finite value: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
