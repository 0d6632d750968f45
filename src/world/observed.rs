//! What the vehicle believes: noisy pose and raw sensor hits.

use aurus_kinematics::{Pose, normalize_degrees};
use aurus_navigation::WorldPoint;
use parking_lot::{RwLock, RwLockReadGuard};

use super::listeners::Listeners;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    Obstacle,
    Line,
}

/// A sensor hit rounded to whole millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensedPoint {
    pub x_mm: i64,
    pub y_mm: i64,
    pub kind: PointKind,
}

impl SensedPoint {
    pub fn from_meters(p: WorldPoint, kind: PointKind) -> Self {
        SensedPoint {
            x_mm: (p.x * 1000.0).round() as i64,
            y_mm: (p.y * 1000.0).round() as i64,
            kind,
        }
    }

    pub fn to_meters(&self) -> WorldPoint {
        WorldPoint::new(self.x_mm as f64 / 1000.0, self.y_mm as f64 / 1000.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObservedState {
    pub vehicle: Pose,
    pub destination: WorldPoint,
    /// Hits from the sweep in progress
    pub new_points: Vec<SensedPoint>,
    /// Hits from every completed sweep
    pub old_points: Vec<SensedPoint>,
}

/// The vehicle's noisy view of the world. Points only accumulate; each
/// completed sweep ages the new bucket into the old one.
#[derive(Debug, Default)]
pub struct ObservedWorld {
    state: RwLock<ObservedState>,
    listeners: Listeners<ObservedWorld>,
}

impl ObservedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ObservedState> {
        self.state.read()
    }

    pub fn snapshot(&self) -> ObservedState {
        self.state.read().clone()
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&ObservedWorld) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback);
    }

    pub fn vehicle_pose(&self) -> Pose {
        self.state.read().vehicle
    }

    pub fn set_vehicle_position(&self, x: f64, y: f64) {
        {
            let mut state = self.state.write();
            state.vehicle.x = x;
            state.vehicle.y = y;
        }
        self.listeners.notify(self);
    }

    pub fn set_vehicle_heading(&self, heading: f64) {
        self.state.write().vehicle.heading = normalize_degrees(heading);
        self.listeners.notify(self);
    }

    pub fn destination(&self) -> WorldPoint {
        self.state.read().destination
    }

    pub fn set_destination(&self, destination: WorldPoint) {
        self.state.write().destination = destination;
        self.listeners.notify(self);
    }

    pub fn add_obstacle_point(&self, p: WorldPoint) {
        self.add_point(SensedPoint::from_meters(p, PointKind::Obstacle));
    }

    pub fn add_line_point(&self, p: WorldPoint) {
        self.add_point(SensedPoint::from_meters(p, PointKind::Line));
    }

    fn add_point(&self, point: SensedPoint) {
        self.state.write().new_points.push(point);
        self.listeners.notify(self);
    }

    /// Moves every new point into the old bucket.
    pub fn refresh_points(&self) {
        {
            let mut state = self.state.write();
            let fresh = std::mem::take(&mut state.new_points);
            state.old_points.extend(fresh);
        }
        self.listeners.notify(self);
    }

    pub fn new_points(&self) -> Vec<SensedPoint> {
        self.state.read().new_points.clone()
    }

    pub fn old_points(&self) -> Vec<SensedPoint> {
        self.state.read().old_points.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_are_millimetres() {
        let p = SensedPoint::from_meters(WorldPoint::new(1.23456, 0.0004), PointKind::Line);
        assert_eq!((p.x_mm, p.y_mm), (1235, 0));
        assert!((p.to_meters().x - 1.235).abs() < 1e-9);
    }

    #[test]
    fn test_point_ageing() {
        let world = ObservedWorld::new();
        world.add_obstacle_point(WorldPoint::new(0.5, 0.5));
        world.add_line_point(WorldPoint::new(1.0, 1.0));
        assert_eq!(world.new_points().len(), 2);
        assert!(world.old_points().is_empty());

        world.refresh_points();
        assert!(world.new_points().is_empty());
        assert_eq!(world.old_points().len(), 2);

        world.add_obstacle_point(WorldPoint::new(0.7, 0.5));
        world.refresh_points();
        let old = world.old_points();
        assert_eq!(old.len(), 3);
        assert_eq!(old[1].kind, PointKind::Line);
        assert_eq!(old[2], SensedPoint { x_mm: 700, y_mm: 500, kind: PointKind::Obstacle });
    }

    #[test]
    fn test_position_and_heading_are_separate() {
        let world = ObservedWorld::new();
        world.set_vehicle_heading(270.0);
        world.set_vehicle_position(1.0, 2.0);
        let pose = world.vehicle_pose();
        assert!((pose.x - 1.0).abs() < 1e-9);
        assert!((pose.y - 2.0).abs() < 1e-9);
        assert!((pose.heading + 90.0).abs() < 1e-9);
    }
}
