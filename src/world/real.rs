//! Ground truth: arena geometry and the true vehicle pose.

use aurus_kinematics::Pose;
use aurus_navigation::WorldPoint;
use parking_lot::{RwLock, RwLockReadGuard};
use serde::Deserialize;

use super::listeners::Listeners;

/// Axis-aligned ellipse given by its bounding box in meters.
///
/// `(x, y)` is the minimum corner of the box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Ellipse {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Ellipse {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Ellipse { x, y, width, height }
    }

    pub fn centre(&self) -> WorldPoint {
        WorldPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns `true` if `p` lies inside or on the ellipse.
    pub fn contains(&self, p: WorldPoint) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }
        let c = self.centre();
        let rx_sq = self.width * self.width / 4.0;
        let ry_sq = self.height * self.height / 4.0;
        (p.x - c.x).powi(2) / rx_sq + (p.y - c.y).powi(2) / ry_sq <= 1.0
    }
}

/// One traced sensor ray, kept for visualization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserSegment {
    pub from: WorldPoint,
    pub to: WorldPoint,
}

#[derive(Debug, Clone, Default)]
pub struct RealState {
    pub vehicle: Pose,
    pub destination: WorldPoint,
    pub lasers: Vec<LaserSegment>,
}

/// The ground-truth world. Geometry is fixed at construction; only the
/// vehicle pose, destination and laser traces change.
#[derive(Debug)]
pub struct RealWorld {
    width_m: f64,
    height_m: f64,
    obstacles: Vec<Ellipse>,
    lines: Vec<Ellipse>,
    state: RwLock<RealState>,
    listeners: Listeners<RealWorld>,
}

impl RealWorld {
    pub fn new(width_m: f64, height_m: f64, obstacles: Vec<Ellipse>, lines: Vec<Ellipse>) -> Self {
        RealWorld {
            width_m,
            height_m,
            obstacles,
            lines,
            state: RwLock::new(RealState::default()),
            listeners: Listeners::new(),
        }
    }

    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    pub fn obstacles(&self) -> &[Ellipse] {
        &self.obstacles
    }

    pub fn lines(&self) -> &[Ellipse] {
        &self.lines
    }

    pub fn is_in_bounds(&self, p: WorldPoint) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width_m && p.y < self.height_m
    }

    /// Read access to the mutable state. Keep the guard short-lived.
    pub fn read(&self) -> RwLockReadGuard<'_, RealState> {
        self.state.read()
    }

    pub fn snapshot(&self) -> RealState {
        self.state.read().clone()
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&RealWorld) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback);
    }

    pub fn vehicle_pose(&self) -> Pose {
        self.state.read().vehicle
    }

    pub fn set_vehicle_pose(&self, pose: Pose) {
        self.state.write().vehicle = pose;
        self.listeners.notify(self);
    }

    pub fn destination(&self) -> WorldPoint {
        self.state.read().destination
    }

    pub fn set_destination(&self, destination: WorldPoint) {
        self.state.write().destination = destination;
        self.listeners.notify(self);
    }

    pub fn add_laser(&self, laser: LaserSegment) {
        self.state.write().lasers.push(laser);
    }

    pub fn clear_lasers(&self) {
        self.state.write().lasers.clear();
    }

    pub fn lasers(&self) -> Vec<LaserSegment> {
        self.state.read().lasers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipse_contains() {
        // Centre (1.0, 0.5), semi-axes 0.5 and 0.25
        let e = Ellipse::new(0.5, 0.25, 1.0, 0.5);
        assert!(e.contains(WorldPoint::new(1.0, 0.5)));
        assert!(e.contains(WorldPoint::new(1.5, 0.5)));
        assert!(e.contains(WorldPoint::new(1.0, 0.75)));
        assert!(!e.contains(WorldPoint::new(1.0, 0.76)));
        // The bounding box corner is outside the ellipse
        assert!(!e.contains(WorldPoint::new(0.52, 0.27)));
        assert!(!Ellipse::new(0.0, 0.0, 0.0, 1.0).contains(WorldPoint::new(0.0, 0.5)));
    }

    #[test]
    fn test_bounds_and_lasers() {
        let world = RealWorld::new(2.0, 1.0, vec![], vec![]);
        assert!(world.is_in_bounds(WorldPoint::new(0.0, 0.0)));
        assert!(world.is_in_bounds(WorldPoint::new(1.99, 0.99)));
        assert!(!world.is_in_bounds(WorldPoint::new(2.0, 0.5)));
        assert!(!world.is_in_bounds(WorldPoint::new(0.5, -0.01)));

        let laser = LaserSegment {
            from: WorldPoint::new(0.0, 0.0),
            to: WorldPoint::new(1.0, 0.0),
        };
        world.add_laser(laser);
        world.add_laser(laser);
        assert_eq!(world.lasers().len(), 2);
        world.clear_lasers();
        assert!(world.lasers().is_empty());
    }

    #[test]
    fn test_pose_updates_notify() {
        let world = RealWorld::new(2.0, 2.0, vec![], vec![]);
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(None));
        let sink = std::sync::Arc::clone(&seen);
        // The world is readable from inside the callback
        world.subscribe(move |w: &RealWorld| *sink.lock() = Some(w.vehicle_pose()));

        world.set_vehicle_pose(Pose::new(0.5, 0.25, 90.0));
        assert_eq!(*seen.lock(), Some(Pose::new(0.5, 0.25, 90.0)));
    }
}
