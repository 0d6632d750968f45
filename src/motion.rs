//! Path following.
//!
//! The controller mirrors the discrete world's vehicle tile, heading and path
//! through a listener, then turns toward or drives at the next waypoint.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use aurus_kinematics::{Twist, bearing_degrees, normalize_degrees};
use aurus_navigation::GridPoint;
use parking_lot::Mutex;
use spin_sleep::SpinSleeper;
use tracing::{debug, error, info};

use crate::config::VehicleConfig;
use crate::error::SimError;
use crate::pose_estimator::PoseEstimator;
use crate::shutdown::ShutdownSignal;
use crate::world::DiscreteWorld;

/// A waypoint closer than this many tiles counts as reached.
pub const ARRIVAL_RADIUS_TILES: f64 = 0.3;
/// Heading error below which the vehicle drives instead of turning, in degrees.
pub const HEADING_TOLERANCE_DEG: f64 = 2.0;

/// The controller's private copy of what it needs from the discrete world.
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub tile: GridPoint,
    pub heading: f64,
    pub path: VecDeque<GridPoint>,
    pub revision: u64,
}

impl Track {
    /// Decides the next command. Pops the head waypoint once it is reached,
    /// in which case no command is issued this step.
    pub fn command(&mut self, linear_velocity: f64, rotational_velocity: f64) -> Option<Twist> {
        let head = *self.path.front()?;
        let (dx, dy) = self.tile.delta_to(head);
        let (dx, dy) = (dx as f64, dy as f64);
        if dx * dx + dy * dy < ARRIVAL_RADIUS_TILES * ARRIVAL_RADIUS_TILES {
            self.path.pop_front();
            debug!(waypoint = %head, remaining = self.path.len(), "Waypoint reached");
            return None;
        }

        let change = normalize_degrees(bearing_degrees(dx, dy) - self.heading);
        if change.abs() < HEADING_TOLERANCE_DEG {
            Some(Twist::new(linear_velocity, 0.0))
        } else {
            Some(Twist::new(0.0, rotational_velocity.copysign(change)))
        }
    }
}

pub struct MotionController {
    track: Arc<Mutex<Track>>,
    estimator: Arc<PoseEstimator>,
    linear_velocity: f64,
    rotational_velocity: f64,
    period: Duration,
}

impl MotionController {
    /// Creates a controller and subscribes it to `discrete`.
    pub fn new(
        discrete: &DiscreteWorld,
        estimator: Arc<PoseEstimator>,
        vehicle: &VehicleConfig,
        period: Duration,
    ) -> Self {
        let track = Arc::new(Mutex::new(Track::default()));
        {
            let track = Arc::clone(&track);
            discrete.subscribe(move |world: &DiscreteWorld| {
                let state = world.read();
                let mut track = track.lock();
                track.tile = state.vehicle;
                track.heading = state.heading;
                // Only a new path replaces the waypoints already consumed
                if state.path_revision != track.revision {
                    track.path = state.path.iter().copied().collect();
                    track.revision = state.path_revision;
                }
            });
        }

        MotionController {
            track,
            estimator,
            linear_velocity: vehicle.linear_velocity,
            rotational_velocity: vehicle.rotational_velocity,
            period,
        }
    }

    pub fn track(&self) -> Track {
        self.track.lock().clone()
    }

    /// One control step of `dt` seconds. Returns the twist that was applied.
    pub fn step(&self, dt: f64) -> Result<Option<Twist>, SimError> {
        let twist = self
            .track
            .lock()
            .command(self.linear_velocity, self.rotational_velocity);
        if let Some(twist) = twist {
            self.estimator.apply_twist(twist, dt)?;
        }
        Ok(twist)
    }

    /// Steps every period until shutdown is triggered.
    pub fn run(&self, shutdown: &ShutdownSignal) {
        info!(period = ?self.period, "Motion loop started");
        let sleeper = SpinSleeper::new(1_000);
        let dt = self.period.as_secs_f64();
        while !shutdown.is_triggered() {
            if let Err(e) = self.step(dt) {
                error!(error = %e, "Motion step failed");
            }
            sleeper.sleep(self.period);
        }
        info!("Motion loop stopped");
    }

    /// Runs [`MotionController::run`] on a thread named `motion`.
    pub fn spawn(self: Arc<Self>, shutdown: Arc<ShutdownSignal>) -> Result<JoinHandle<()>, SimError> {
        let handle = std::thread::Builder::new()
            .name("motion".into())
            .spawn(move || self.run(&shutdown))?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseConfig;
    use crate::world::{ObservedWorld, RealWorld};
    use aurus_kinematics::Pose;
    use aurus_navigation::{GridAStar, MetricFrame, WorldPoint};

    const EPSILON: f64 = 1e-9;

    fn track(tile: (usize, usize), heading: f64, path: &[(usize, usize)]) -> Track {
        Track {
            tile: GridPoint::new(tile.0, tile.1),
            heading,
            path: path.iter().map(|&(x, y)| GridPoint::new(x, y)).collect(),
            revision: 1,
        }
    }

    #[test]
    fn test_empty_path_issues_nothing() {
        assert_eq!(track((3, 3), 0.0, &[]).command(0.5, 60.0), None);
    }

    #[test]
    fn test_reached_waypoint_is_popped() {
        let mut t = track((3, 3), 0.0, &[(3, 3), (4, 3)]);
        assert_eq!(t.command(0.5, 60.0), None);
        assert_eq!(t.path, VecDeque::from(vec![GridPoint::new(4, 3)]));
        assert_eq!(t.command(0.5, 60.0), Some(Twist::new(0.5, 0.0)));
    }

    #[test]
    fn test_rotate_or_advance() {
        // Waypoint due North while facing East: turn left
        let mut t = track((3, 3), 0.0, &[(3, 4)]);
        assert_eq!(t.command(0.5, 60.0), Some(Twist::new(0.0, 60.0)));

        // Facing North-West: turn right
        t.heading = 135.0;
        assert_eq!(t.command(0.5, 60.0), Some(Twist::new(0.0, -60.0)));

        // Within tolerance: drive
        t.heading = 91.5;
        assert_eq!(t.command(0.5, 60.0), Some(Twist::new(0.5, 0.0)));

        // Behind across the +-180 seam: the short way round
        let mut t = track((3, 3), 170.0, &[(2, 2)]);
        assert_eq!(t.command(0.5, 60.0), Some(Twist::new(0.0, 60.0)));
    }

    fn controller() -> (MotionController, Arc<DiscreteWorld>, Arc<PoseEstimator>) {
        let real = Arc::new(RealWorld::new(1.0, 1.0, vec![], vec![]));
        let observed = Arc::new(ObservedWorld::new());
        let discrete = Arc::new(DiscreteWorld::new(MetricFrame::new(1.0, 1.0, 10, 10).unwrap()).unwrap());
        let exact = NoiseConfig { error: 0.0, period_s: 0.0 };
        let estimator = Arc::new(
            PoseEstimator::new(real, observed, Arc::clone(&discrete), &exact, &exact, Some(1)).unwrap(),
        );
        let vehicle = VehicleConfig {
            linear_velocity: 1.0,
            rotational_velocity: 90.0,
            ..VehicleConfig::default()
        };
        let controller = MotionController::new(&discrete, Arc::clone(&estimator), &vehicle, Duration::from_millis(5));
        (controller, discrete, estimator)
    }

    #[test]
    fn test_listener_copies_path_once_per_revision() {
        let (controller, discrete, estimator) = controller();
        estimator.place(Pose::new(0.05, 0.05, 0.0));
        discrete.set_destination(WorldPoint::new(0.35, 0.05)).unwrap();
        discrete.calculate_path(&mut GridAStar::standard()).unwrap();
        assert_eq!(controller.track().path.len(), 3);
        assert_eq!(controller.track().revision, 1);

        // Consume the first waypoint by hand, then trigger an unrelated update
        controller.track.lock().path.pop_front();
        discrete.set_vehicle_heading(0.0);
        assert_eq!(controller.track().path.len(), 2);
    }

    #[test]
    fn test_steps_drive_toward_waypoint() {
        let (controller, discrete, estimator) = controller();
        estimator.place(Pose::new(0.05, 0.05, 90.0));
        discrete.set_destination(WorldPoint::new(0.15, 0.05)).unwrap();
        discrete.calculate_path(&mut GridAStar::standard()).unwrap();

        // Turn right from North to East: 90 deg at 90 deg/s in 0.01 s steps
        let mut turns = 0;
        while let Some(twist) = controller.step(0.01).unwrap() {
            if twist.vx > 0.0 {
                break;
            }
            assert!((twist.wz + 90.0).abs() < EPSILON);
            turns += 1;
            assert!(turns < 200);
        }
        assert!(estimator.pose().heading.abs() < HEADING_TOLERANCE_DEG);

        // Drive until the waypoint is popped
        for _ in 0..100 {
            controller.step(0.01).unwrap();
            if controller.track().path.is_empty() {
                break;
            }
        }
        assert!(controller.track().path.is_empty());
        assert_eq!(discrete.vehicle_tile(), GridPoint::new(1, 0));
        assert!(estimator.pose().x >= 0.1);
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let (controller, _, _) = controller();
        let shutdown = Arc::new(ShutdownSignal::new());
        let handle = Arc::new(controller).spawn(Arc::clone(&shutdown)).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        shutdown.trigger();
        handle.join().unwrap();
    }
}
