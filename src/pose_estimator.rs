//! True pose bookkeeping and noisy GPS/IMU publication.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aurus_kinematics::{Pose, Twist, update_pose};
use aurus_navigation::WorldPoint;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::trace;

use crate::config::NoiseConfig;
use crate::error::SimError;
use crate::world::{DiscreteWorld, ObservedWorld, RealWorld};

/// Opens at most once per `period`.
///
/// The first poll always opens. Afterwards the gate opens again once at
/// least `period` has passed since it last opened.
#[derive(Debug, Clone)]
pub struct RateGate {
    period: Duration,
    last_open: Option<Instant>,
}

impl RateGate {
    pub fn new(period: Duration) -> Self {
        RateGate {
            period,
            last_open: None,
        }
    }

    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    pub fn ready_at(&mut self, now: Instant) -> bool {
        match self.last_open {
            Some(last) if now.saturating_duration_since(last) < self.period => false,
            _ => {
                self.last_open = Some(now);
                true
            }
        }
    }
}

/// Gaussian noise with the configured error taken as the 3-sigma bound.
fn noise_for(field: &str, source: &NoiseConfig) -> Result<Normal<f64>, SimError> {
    Normal::new(0.0, source.error / 3.0)
        .map_err(|e| SimError::InvalidConfig(format!("{field} noise: {e}")))
}

struct EstimatorState {
    pose: Pose,
    gps_gate: RateGate,
    imu_gate: RateGate,
    gps_noise: Normal<f64>,
    imu_noise: Normal<f64>,
    rng: StdRng,
}

/// What to push to the worlds after one pose change.
struct Publication {
    truth: Pose,
    position: Option<WorldPoint>,
    heading: Option<f64>,
}

/// Owns the true vehicle pose and fans it out to the three worlds.
///
/// The real world always receives the exact pose. The observed and discrete
/// worlds receive noisy position and heading, each rate limited by its own
/// gate.
pub struct PoseEstimator {
    real: Arc<RealWorld>,
    observed: Arc<ObservedWorld>,
    discrete: Arc<DiscreteWorld>,
    state: Mutex<EstimatorState>,
}

impl PoseEstimator {
    pub fn new(
        real: Arc<RealWorld>,
        observed: Arc<ObservedWorld>,
        discrete: Arc<DiscreteWorld>,
        gps: &NoiseConfig,
        imu: &NoiseConfig,
        seed: Option<u64>,
    ) -> Result<Self, SimError> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(PoseEstimator {
            real,
            observed,
            discrete,
            state: Mutex::new(EstimatorState {
                pose: Pose::default(),
                gps_gate: RateGate::new(gps.period()),
                imu_gate: RateGate::new(imu.period()),
                gps_noise: noise_for("gps", gps)?,
                imu_noise: noise_for("imu", imu)?,
                rng,
            }),
        })
    }

    /// The current true pose.
    pub fn pose(&self) -> Pose {
        self.state.lock().pose
    }

    /// Sets the pose and publishes it exactly to all three worlds, bypassing
    /// the gates.
    pub fn place(&self, pose: Pose) {
        self.state.lock().pose = pose;
        self.publish(Publication {
            truth: pose,
            position: Some(WorldPoint::new(pose.x, pose.y)),
            heading: Some(pose.heading),
        });
    }

    pub fn move_forward(&self, distance: f64) -> Pose {
        self.move_forward_at(distance, Instant::now())
    }

    pub fn move_forward_at(&self, distance: f64, now: Instant) -> Pose {
        let Ok(pose) = self.update_at::<Infallible>(now, |pose| Ok(pose.advanced(distance)));
        pose
    }

    pub fn rotate_ccw(&self, degrees: f64) -> Pose {
        self.rotate_ccw_at(degrees, Instant::now())
    }

    pub fn rotate_ccw_at(&self, degrees: f64, now: Instant) -> Pose {
        let Ok(pose) = self.update_at::<Infallible>(now, |pose| Ok(pose.rotated(degrees)));
        pose
    }

    /// Integrates `twist` over `dt` seconds.
    pub fn apply_twist(&self, twist: Twist, dt: f64) -> Result<Pose, SimError> {
        self.apply_twist_at(twist, dt, Instant::now())
    }

    pub fn apply_twist_at(&self, twist: Twist, dt: f64, now: Instant) -> Result<Pose, SimError> {
        self.update_at(now, |pose| Ok(update_pose(pose, twist, dt)?))
    }

    fn update_at<E>(&self, now: Instant, step: impl FnOnce(Pose) -> Result<Pose, E>) -> Result<Pose, E> {
        let publication = {
            let mut state = self.state.lock();
            let pose = step(state.pose)?;
            state.pose = pose;

            let position = if state.gps_gate.ready_at(now) {
                let EstimatorState { rng, gps_noise, .. } = &mut *state;
                let (nx, ny) = (gps_noise.sample(rng), gps_noise.sample(rng));
                Some(WorldPoint::new(pose.x + nx, pose.y + ny))
            } else {
                None
            };
            let heading = if state.imu_gate.ready_at(now) {
                let EstimatorState { rng, imu_noise, .. } = &mut *state;
                Some(pose.heading + imu_noise.sample(rng))
            } else {
                None
            };

            Publication {
                truth: pose,
                position,
                heading,
            }
        };

        let pose = publication.truth;
        self.publish(publication);
        Ok(pose)
    }

    // Runs without the estimator lock so listeners may call back in.
    fn publish(&self, publication: Publication) {
        self.real.set_vehicle_pose(publication.truth);
        if let Some(p) = publication.position {
            trace!(x = p.x, y = p.y, "Publishing noisy position");
            self.observed.set_vehicle_position(p.x, p.y);
            self.discrete.set_vehicle_position(p);
        }
        if let Some(heading) = publication.heading {
            trace!(heading, "Publishing noisy heading");
            self.observed.set_vehicle_heading(heading);
            self.discrete.set_vehicle_heading(heading);
        }
    }
}
