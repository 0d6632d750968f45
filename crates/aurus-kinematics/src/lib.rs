#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for planar vehicle pose math."]
#![doc = ""]
#![doc = "Headings are expressed in degrees, counter-clockwise from the world x-axis (East),"]
#![doc = "and normalized to `(-180, 180]`. Positions are in meters with the y-axis pointing up."]

use core::fmt;
use libm::{atan2, cos, fabs, sin, sqrt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::KinematicsError;

/// Normalize a heading in degrees to `(-180, 180]`.
///
/// Exactly `-180` maps to `180`, so a half turn always has a single
/// representation.
///
/// # Arguments
///
/// * `degrees`: The angle to normalize.
///
/// # Returns
///
/// The equivalent angle in `(-180, 180]`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let a = degrees % 360.0;
    if a > 180.0 {
        a - 360.0
    } else if a <= -180.0 {
        a + 360.0
    } else {
        a
    }
}

/// Bearing in degrees of the vector `(dx, dy)`, measured counter-clockwise from East.
///
/// Returns `0.0` for the zero vector.
pub fn bearing_degrees(dx: f64, dy: f64) -> f64 {
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    atan2(dy, dx).to_degrees()
}

/// A 2‑D pose `(x, y, heading)` in meters and degrees.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World‑frame x position (m).
    pub x: f64,
    /// World‑frame y position (m).
    pub y: f64,
    /// Heading (deg), normalized to `(-180, 180]`.
    pub heading: f64,
}

impl Pose {
    /// Construct a new pose. The heading is normalized.
    ///
    /// # Arguments
    ///
    /// * `x`: World-frame x position in meters.
    /// * `y`: World-frame y position in meters.
    /// * `heading`: Heading in degrees.
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Pose {
            x,
            y,
            heading: normalize_degrees(heading),
        }
    }

    /// Returns this pose moved `distance` meters along its heading.
    pub fn advanced(&self, distance: f64) -> Pose {
        let rad = self.heading.to_radians();
        Pose {
            x: self.x + distance * cos(rad),
            y: self.y + distance * sin(rad),
            heading: self.heading,
        }
    }

    /// Returns this pose rotated counter-clockwise by `degrees`.
    pub fn rotated(&self, degrees: f64) -> Pose {
        Pose {
            x: self.x,
            y: self.y,
            heading: normalize_degrees(self.heading + degrees),
        }
    }

    /// Euclidean distance to another pose, ignoring heading.
    pub fn distance_to(&self, other: &Pose) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        sqrt(dx * dx + dy * dy)
    }

    /// Manhattan (L1) distance to a point, ignoring heading.
    pub fn manhattan_to(&self, x: f64, y: f64) -> f64 {
        fabs(x - self.x) + fabs(y - self.y)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.3}, y: {:.3}, θ: {:.1}°)", self.x, self.y, self.heading)
    }
}

/// A twist expressed in the vehicle base frame.
/// A twist represents the commanded linear and angular velocities of the vehicle.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Twist {
    /// Linear x velocity (m/s) in the vehicle's base frame.
    pub vx: f64,
    /// Angular velocity (deg/s), positive counter-clockwise.
    pub wz: f64,
}

impl Twist {
    /// Construct a new twist.
    ///
    /// # Arguments
    ///
    /// * `vx`: Linear velocity along the vehicle's x-axis (m/s).
    /// * `wz`: Angular velocity around the vehicle's z-axis (deg/s).
    pub const fn new(vx: f64, wz: f64) -> Self {
        Twist { vx, wz }
    }

    /// A twist that commands no motion.
    pub const fn stop() -> Self {
        Twist { vx: 0.0, wz: 0.0 }
    }

    /// Returns `true` if the twist commands no motion.
    pub fn is_stopped(&self) -> bool {
        self.vx == 0.0 && self.wz == 0.0
    }
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(vx: {:.2} m/s, ωz: {:.1} deg/s)", self.vx, self.wz)
    }
}

/// Integrates a twist over `dt` seconds starting from `current_pose`.
///
/// Translation is applied along the heading held at the start of the interval,
/// then the rotation is applied. For the spin-in-place or drive-straight
/// commands the simulator issues, this is exact.
///
/// # Arguments
///
/// * `current_pose`: The vehicle's current pose.
/// * `twist`: The commanded linear and angular velocity.
/// * `dt`: The time delta in seconds over which the twist is applied.
///
/// # Errors
///
/// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative.
/// Returns `Err(KinematicsError::NonFiniteValue)` if any input is NaN or infinite.
///
/// # Returns
///
/// The vehicle's new pose.
pub fn update_pose(current_pose: Pose, twist: Twist, dt: f64) -> Result<Pose, KinematicsError> {
    if dt < 0.0 {
        return Err(KinematicsError::NegativeTimeDelta("must be non-negative"));
    }
    if !dt.is_finite() || !twist.vx.is_finite() || !twist.wz.is_finite() {
        return Err(KinematicsError::NonFiniteValue("twist and dt must be finite"));
    }

    Ok(current_pose.advanced(twist.vx * dt).rotated(twist.wz * dt))
}
