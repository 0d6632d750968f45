//! The planning view: occupancy grid, vehicle and destination tiles, path.

use std::time::Instant;

use aurus_kinematics::normalize_degrees;
use aurus_navigation::{GridPoint, MetricFrame, NavigationError, OccupancyGrid, Path, PathPlanner, WorldPoint};
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, warn};

use super::listeners::Listeners;

#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteState {
    pub grid: OccupancyGrid,
    pub vehicle: GridPoint,
    /// Noisy heading in degrees
    pub heading: f64,
    pub destination: GridPoint,
    pub path: Path,
    /// Bumped every time a new path is stored
    pub path_revision: u64,
}

/// An owned copy of the discrete world taken under a single lock.
pub type DiscreteSnapshot = DiscreteState;

/// Tile-level world model shared by perception, planning and motion.
#[derive(Debug)]
pub struct DiscreteWorld {
    frame: MetricFrame,
    state: RwLock<DiscreteState>,
    listeners: Listeners<DiscreteWorld>,
}

impl DiscreteWorld {
    pub fn new(frame: MetricFrame) -> Result<Self, NavigationError> {
        let grid = OccupancyGrid::new(frame.tiles_x(), frame.tiles_y())?;
        Ok(DiscreteWorld {
            frame,
            state: RwLock::new(DiscreteState {
                grid,
                vehicle: GridPoint::default(),
                heading: 0.0,
                destination: GridPoint::default(),
                path: Path::new(),
                path_revision: 0,
            }),
            listeners: Listeners::new(),
        })
    }

    pub fn frame(&self) -> &MetricFrame {
        &self.frame
    }

    pub fn read(&self) -> RwLockReadGuard<'_, DiscreteState> {
        self.state.read()
    }

    pub fn snapshot(&self) -> DiscreteSnapshot {
        self.state.read().clone()
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&DiscreteWorld) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback);
    }

    /// Adds one unit of obstacle evidence at a metric position.
    ///
    /// Points outside the arena are logged and dropped. Returns whether the
    /// point landed on the grid.
    pub fn add_point(&self, p: WorldPoint) -> bool {
        let tile = match self.frame.world_to_grid(p) {
            Ok(tile) => tile,
            Err(e) => {
                debug!(x = p.x, y = p.y, error = %e, "Ignoring sensed point");
                return false;
            }
        };
        let result = self.state.write().grid.increment(tile);
        match result {
            Ok(_) => {
                self.listeners.notify(self);
                true
            }
            Err(e) => {
                warn!(%tile, error = %e, "Ignoring sensed point");
                false
            }
        }
    }

    pub fn vehicle_tile(&self) -> GridPoint {
        self.state.read().vehicle
    }

    pub fn heading(&self) -> f64 {
        self.state.read().heading
    }

    pub fn destination_tile(&self) -> GridPoint {
        self.state.read().destination
    }

    pub fn path(&self) -> Path {
        self.state.read().path.clone()
    }

    pub fn path_revision(&self) -> u64 {
        self.state.read().path_revision
    }

    pub fn grid(&self) -> OccupancyGrid {
        self.state.read().grid.clone()
    }

    /// Moves the vehicle to the tile containing `p`. Positions outside the
    /// arena leave the last tile in place.
    pub fn set_vehicle_position(&self, p: WorldPoint) {
        match self.frame.world_to_grid(p) {
            Ok(tile) => {
                self.state.write().vehicle = tile;
                self.listeners.notify(self);
            }
            Err(e) => warn!(x = p.x, y = p.y, error = %e, "Vehicle position outside the grid"),
        }
    }

    pub fn set_vehicle_heading(&self, heading: f64) {
        self.state.write().heading = normalize_degrees(heading);
        self.listeners.notify(self);
    }

    pub fn set_destination(&self, p: WorldPoint) -> Result<(), NavigationError> {
        let tile = self.frame.world_to_grid(p)?;
        self.state.write().destination = tile;
        self.listeners.notify(self);
        Ok(())
    }

    /// Plans from the vehicle tile to the destination and stores the result.
    ///
    /// The planner works on a private snapshot with the vehicle and destination
    /// tiles cleared, so the lock is not held while it runs. When no path
    /// exists the previous path is kept.
    pub fn calculate_path(&self, planner: &mut dyn PathPlanner) -> Result<Path, NavigationError> {
        let (mut grid, start, destination, heading) = {
            let state = self.state.read();
            (state.grid.clone(), state.vehicle, state.destination, state.heading)
        };
        // The vehicle stands on its own tile, so neither endpoint can block
        grid.force_clear(destination)?;
        grid.force_clear(start)?;

        let started = Instant::now();
        match planner.calculate_path(&grid, start, destination, heading) {
            Ok(path) => {
                let revision = {
                    let mut state = self.state.write();
                    state.path = path.clone();
                    state.path_revision += 1;
                    state.path_revision
                };
                debug!(
                    planner = planner.name(),
                    %start,
                    %destination,
                    waypoints = path.len(),
                    revision,
                    elapsed = ?started.elapsed(),
                    "Stored new path"
                );
                self.listeners.notify(self);
                Ok(path)
            }
            Err(NavigationError::NoPathFound) => {
                warn!(planner = planner.name(), %start, %destination, "No path found, keeping the previous path");
                Err(NavigationError::NoPathFound)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurus_navigation::{DStarLite, GridAStar};
    use std::sync::Arc;

    fn world() -> DiscreteWorld {
        DiscreteWorld::new(MetricFrame::new(1.0, 1.0, 10, 10).unwrap()).unwrap()
    }

    #[test]
    fn test_add_point() {
        let world = world();
        assert!(world.add_point(WorldPoint::new(0.55, 0.15)));
        assert!(world.add_point(WorldPoint::new(0.55, 0.15)));
        assert_eq!(world.grid().evidence(GridPoint::new(5, 1)).unwrap(), 2);

        // Off the arena: logged and ignored
        assert!(!world.add_point(WorldPoint::new(1.2, 0.5)));
        assert!(!world.add_point(WorldPoint::new(-0.1, 0.5)));
        assert_eq!(world.grid().occupied_points().count(), 1);
    }

    #[test]
    fn test_tracking() {
        let world = world();
        world.set_vehicle_position(WorldPoint::new(0.25, 0.35));
        world.set_vehicle_heading(-270.0);
        world.set_destination(WorldPoint::new(0.95, 0.95)).unwrap();
        assert_eq!(world.vehicle_tile(), GridPoint::new(2, 3));
        assert!((world.heading() - 90.0).abs() < 1e-9);
        assert_eq!(world.destination_tile(), GridPoint::new(9, 9));

        world.set_vehicle_position(WorldPoint::new(5.0, 0.5));
        assert_eq!(world.vehicle_tile(), GridPoint::new(2, 3));
        assert!(world.set_destination(WorldPoint::new(1.0, 0.5)).is_err());
    }

    #[test]
    fn test_calculate_path_stores_and_keeps() {
        let world = world();
        world.set_vehicle_position(WorldPoint::new(0.05, 0.05));
        world.set_destination(WorldPoint::new(0.35, 0.05)).unwrap();

        let mut planner = GridAStar::standard();
        let path = world.calculate_path(&mut planner).unwrap();
        assert_eq!(path.last(), Some(&GridPoint::new(3, 0)));
        assert_eq!(world.path(), path);
        assert_eq!(world.path_revision(), 1);

        // Wall off the destination completely
        for (x, y) in [(2, 0), (2, 1), (3, 1), (4, 1), (4, 0)] {
            let p = WorldPoint::new(x as f64 / 10.0 + 0.05, y as f64 / 10.0 + 0.05);
            world.add_point(p);
        }
        assert_eq!(world.calculate_path(&mut planner), Err(NavigationError::NoPathFound));
        assert_eq!(world.path(), path);
        assert_eq!(world.path_revision(), 1);
    }

    #[test]
    fn test_evidence_on_endpoints_is_ignored_by_planning() {
        let world = world();
        world.set_vehicle_position(WorldPoint::new(0.05, 0.05));
        world.set_destination(WorldPoint::new(0.25, 0.05)).unwrap();
        world.add_point(WorldPoint::new(0.25, 0.05));

        world.add_point(WorldPoint::new(0.05, 0.05));

        let mut planner = DStarLite::new();
        let path = world.calculate_path(&mut planner).unwrap();
        assert_eq!(path, vec![GridPoint::new(1, 0), GridPoint::new(2, 0)]);
        // The stored grid keeps its evidence
        assert!(world.grid().is_occupied(GridPoint::new(2, 0)));
        assert!(world.grid().is_occupied(GridPoint::new(0, 0)));
    }

    #[test]
    fn test_listener_reads_after_release() {
        let world = Arc::new(world());
        let revisions = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&revisions);
        world.subscribe(move |w: &DiscreteWorld| {
            // Would deadlock if the write lock were still held
            sink.lock().push(w.read().path_revision);
        });

        world.set_destination(WorldPoint::new(0.55, 0.55)).unwrap();
        world.calculate_path(&mut GridAStar::standard()).unwrap();
        assert_eq!(*revisions.lock(), vec![0, 1]);
    }
}
