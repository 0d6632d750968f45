//! Simulated LIDAR and camera sweeps.
//!
//! Rays are marched from the true vehicle position against the ground-truth
//! geometry. Hits are written to the observed and discrete worlds; every
//! traced ray is also recorded as a laser segment in the real world.

use std::sync::Arc;
use std::time::Duration;

use aurus_navigation::WorldPoint;
use tracing::{debug, trace};

use crate::config::SensorConfig;
use crate::shutdown::ShutdownSignal;
use crate::world::{DiscreteWorld, LaserSegment, ObservedWorld, PointKind, RealWorld};

/// Distance advanced per ray-march step, in meters.
pub const RAY_STEP_M: f64 = 0.01;

/// Relative ray angles of one sweep, from `-fov/2` upwards.
pub fn ray_angles(sensor: &SensorConfig) -> impl Iterator<Item = f64> + '_ {
    (0..sensor.ray_count()).map(move |i| i as f64 * sensor.increment_deg - sensor.fov_deg / 2.0)
}

pub struct PerceptionSimulator {
    real: Arc<RealWorld>,
    observed: Arc<ObservedWorld>,
    discrete: Arc<DiscreteWorld>,
    lidar: SensorConfig,
    camera: SensorConfig,
    shutdown: Arc<ShutdownSignal>,
}

impl PerceptionSimulator {
    pub fn new(
        real: Arc<RealWorld>,
        observed: Arc<ObservedWorld>,
        discrete: Arc<DiscreteWorld>,
        lidar: SensorConfig,
        camera: SensorConfig,
        shutdown: Arc<ShutdownSignal>,
    ) -> Self {
        PerceptionSimulator {
            real,
            observed,
            discrete,
            lidar,
            camera,
            shutdown,
        }
    }

    /// Marches one ray `relative_deg` off the vehicle heading.
    ///
    /// Stops past `range_m`, at the arena edge, or inside an ellipse of the
    /// requested kind. The traced segment is recorded either way.
    pub fn trace_ray(&self, relative_deg: f64, range_m: f64, kind: PointKind) -> Option<WorldPoint> {
        let pose = self.real.vehicle_pose();
        let bearing = (pose.heading + relative_deg).to_radians();
        let (step_x, step_y) = (bearing.cos() * RAY_STEP_M, bearing.sin() * RAY_STEP_M);
        let targets = match kind {
            PointKind::Obstacle => self.real.obstacles(),
            PointKind::Line => self.real.lines(),
        };

        let origin = WorldPoint::new(pose.x, pose.y);
        let mut end = origin;
        let mut hit = None;
        for i in 1.. {
            if i as f64 * RAY_STEP_M > range_m {
                break;
            }
            let sample = WorldPoint::new(origin.x + i as f64 * step_x, origin.y + i as f64 * step_y);
            if !self.real.is_in_bounds(sample) {
                break;
            }
            end = sample;
            if targets.iter().any(|e| e.contains(sample)) {
                hit = Some(sample);
                break;
            }
        }

        self.real.add_laser(LaserSegment { from: origin, to: end });
        hit
    }

    /// One LIDAR fan against the obstacles. Returns the number of hits.
    pub fn lidar_sweep(&self) -> usize {
        let rays = self.lidar.ray_count();
        let per_ray = self.lidar.period().div_f64(rays as f64);
        let mut hits = 0;
        for angle in ray_angles(&self.lidar) {
            if let Some(p) = self.trace_ray(angle, self.lidar.range_m, PointKind::Obstacle) {
                self.observed.add_obstacle_point(p);
                self.discrete.add_point(p);
                hits += 1;
            }
            self.pace(per_ray);
            self.real.clear_lasers();
        }
        trace!(rays, hits, "LIDAR sweep done");
        hits
    }

    /// One camera fan against the lines. Returns the number of hits.
    pub fn camera_sweep(&self) -> usize {
        let mut hits = 0;
        for angle in ray_angles(&self.camera) {
            if let Some(p) = self.trace_ray(angle, self.camera.range_m, PointKind::Line) {
                self.observed.add_line_point(p);
                self.discrete.add_point(p);
                hits += 1;
            }
        }
        self.pace(self.camera.period());
        self.real.clear_lasers();
        trace!(rays = self.camera.ray_count(), hits, "Camera sweep done");
        hits
    }

    fn pace(&self, period: Duration) {
        if self.shutdown.wait_timeout(period) {
            debug!("Sensor wait interrupted by shutdown, continuing sweep");
        }
    }
}
