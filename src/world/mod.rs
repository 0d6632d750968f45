//! The three world models.
//!
//! - [`RealWorld`]: ground truth, immutable geometry plus the true pose
//! - [`ObservedWorld`]: noisy pose and raw sensor hits
//! - [`DiscreteWorld`]: the occupancy grid the planners work on
//!
//! Each world guards its mutable state with one `RwLock`. Listeners run after
//! the lock is released; two notifications give no joint consistency.

pub mod discrete;
pub mod listeners;
pub mod observed;
pub mod real;

pub use discrete::{DiscreteSnapshot, DiscreteState, DiscreteWorld};
pub use listeners::{Listener, Listeners};
pub use observed::{ObservedState, ObservedWorld, PointKind, SensedPoint};
pub use real::{Ellipse, LaserSegment, RealState, RealWorld};
