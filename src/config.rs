//! Simulation configuration.
//!
//! Settings are read from a TOML file through the `config` crate and
//! deserialized into [`SimConfig`]. Every field has a default, so a file only
//! needs to name what it changes.

use std::path::Path;
use std::time::Duration;

use ::config::{Config, File, FileFormat};
use aurus_navigation::{PlannerSettings, WorldPoint};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::SimError;
use crate::world::Ellipse;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Largest accepted sensor field of view, in degrees.
pub const MAX_FOV_DEG: f64 = 359.0;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub arena: ArenaConfig,
    pub environment: EnvironmentConfig,
    pub vehicle: VehicleConfig,
    pub planner: PlannerConfig,
    pub simulation: SimulationConfig,
}

/// Metric size of the arena and its tile resolution.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width_m: f64,
    pub height_m: f64,
    pub tiles_x: usize,
    pub tiles_y: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            width_m: 2.8,
            height_m: 2.8,
            tiles_x: 50,
            tiles_y: 50,
        }
    }
}

/// Obstacles, lane lines and the start/goal points, all in meters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub start: WorldPoint,
    pub goal: WorldPoint,
    pub obstacles: Vec<Ellipse>,
    pub lines: Vec<Ellipse>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig {
            start: WorldPoint::new(0.1, 0.1),
            goal: WorldPoint::new(2.0, 2.0),
            obstacles: Vec::new(),
            lines: Vec::new(),
        }
    }
}

/// A ray-fan sensor: LIDAR (obstacles) or camera (lines).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SensorConfig {
    pub fov_deg: f64,
    pub increment_deg: f64,
    pub range_m: f64,
    pub period_s: f64,
}

impl SensorConfig {
    /// Number of rays in one sweep.
    pub fn ray_count(&self) -> usize {
        (self.fov_deg / self.increment_deg).floor() as usize + 1
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.period_s)
    }
}

/// A noisy pose source (GPS or IMU) publishing at most once per period.
///
/// `error` is the 3-sigma bound of the injected Gaussian noise, in meters for
/// GPS and degrees for the IMU.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NoiseConfig {
    pub error: f64,
    pub period_s: f64,
}

impl NoiseConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.period_s)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub width_m: f64,
    pub height_m: f64,
    /// Forward speed in m/s
    pub linear_velocity: f64,
    /// Turn rate in deg/s
    pub rotational_velocity: f64,
    pub lidar: SensorConfig,
    pub camera: SensorConfig,
    pub gps: NoiseConfig,
    pub imu: NoiseConfig,
    /// Registry name of the planning strategy
    pub strategy: String,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        VehicleConfig {
            width_m: 0.3,
            height_m: 0.5,
            linear_velocity: 0.5,
            rotational_velocity: 60.0,
            lidar: SensorConfig {
                fov_deg: 180.0,
                increment_deg: 1.0,
                range_m: 8.0,
                period_s: 1.0,
            },
            camera: SensorConfig {
                fov_deg: 180.0,
                increment_deg: 1.0,
                range_m: 2.0,
                period_s: 0.6,
            },
            gps: NoiseConfig {
                error: 0.0,
                period_s: 0.5,
            },
            imu: NoiseConfig {
                error: 0.0,
                period_s: 0.01,
            },
            strategy: "astar".to_string(),
        }
    }
}

/// Planner tunables handed to the strategy factory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub footprint_tiles: f64,
    pub rrt_max_iterations: usize,
    pub rrt_seed: Option<u64>,
    /// Seed for GPS/IMU noise; entropy-seeded when unset
    pub noise_seed: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let settings = PlannerSettings::default();
        PlannerConfig {
            footprint_tiles: settings.footprint_tiles,
            rrt_max_iterations: settings.rrt_max_iterations,
            rrt_seed: settings.rrt_seed,
            noise_seed: None,
        }
    }
}

impl PlannerConfig {
    pub fn settings(&self) -> PlannerSettings {
        PlannerSettings {
            footprint_tiles: self.footprint_tiles,
            rrt_max_iterations: self.rrt_max_iterations,
            rrt_seed: self.rrt_seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// The run ends once the L1 distance to the goal drops below this (m)
    pub goal_tolerance_m: f64,
    pub motion_period_ms: u64,
    pub max_cycles: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            goal_tolerance_m: 0.2,
            motion_period_ms: 5,
            max_cycles: None,
        }
    }
}

impl SimulationConfig {
    pub fn motion_period(&self) -> Duration {
        Duration::from_millis(self.motion_period_ms)
    }
}

impl SimConfig {
    /// Loads and validates the configuration at [`DEFAULT_CONFIG_PATH`].
    pub fn load() -> Result<Self, SimError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Loads and validates a TOML configuration file.
    pub fn load_from(path: &Path) -> Result<Self, SimError> {
        info!(path = %path.display(), "Attempting to load configuration");

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .build();

        let settings = match settings {
            Ok(settings) => settings,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                return Err(e.into());
            }
        };

        let config: SimConfig = settings.try_deserialize()?;
        config.validate()?;
        info!(strategy = %config.vehicle.strategy, "Successfully loaded configuration");
        Ok(config)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(source: &str) -> Result<Self, SimError> {
        let config: SimConfig = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value the simulation relies on.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        let arena = &self.arena;
        positive("arena.width_m", arena.width_m)?;
        positive("arena.height_m", arena.height_m)?;
        if arena.tiles_x == 0 || arena.tiles_y == 0 {
            return Err(invalid("arena tile counts must be non-zero"));
        }

        let vehicle = &self.vehicle;
        positive("vehicle.width_m", vehicle.width_m)?;
        positive("vehicle.height_m", vehicle.height_m)?;
        positive("vehicle.linear_velocity", vehicle.linear_velocity)?;
        positive("vehicle.rotational_velocity", vehicle.rotational_velocity)?;
        validate_sensor("vehicle.lidar", &vehicle.lidar)?;
        validate_sensor("vehicle.camera", &vehicle.camera)?;
        validate_noise("vehicle.gps", &vehicle.gps)?;
        validate_noise("vehicle.imu", &vehicle.imu)?;
        if vehicle.strategy.trim().is_empty() {
            return Err(invalid("vehicle.strategy must not be empty"));
        }

        let env = &self.environment;
        self.inside_arena("environment.start", env.start)?;
        self.inside_arena("environment.goal", env.goal)?;
        for (i, e) in env.obstacles.iter().chain(&env.lines).enumerate() {
            if !(e.x >= 0.0 && e.y >= 0.0 && e.width > 0.0 && e.height > 0.0) {
                return Err(invalid(format!("environment ellipse #{i} must have non-negative corner and positive size")));
            }
            if e.x + e.width > arena.width_m || e.y + e.height > arena.height_m {
                return Err(invalid(format!("environment ellipse #{i} extends past the arena")));
            }
        }

        positive("planner.footprint_tiles", self.planner.footprint_tiles)?;
        if self.planner.rrt_max_iterations == 0 {
            return Err(invalid("planner.rrt_max_iterations must be positive"));
        }

        positive("simulation.goal_tolerance_m", self.simulation.goal_tolerance_m)?;
        if self.simulation.motion_period_ms == 0 {
            return Err(invalid("simulation.motion_period_ms must be positive"));
        }
        Ok(())
    }

    fn inside_arena(&self, field: &str, p: WorldPoint) -> Result<(), SimError> {
        if p.x >= 0.0 && p.y >= 0.0 && p.x < self.arena.width_m && p.y < self.arena.height_m {
            Ok(())
        } else {
            Err(invalid(format!("{field} ({}, {}) lies outside the arena", p.x, p.y)))
        }
    }
}

fn invalid(msg: impl Into<String>) -> SimError {
    SimError::InvalidConfig(msg.into())
}

fn positive(field: &str, value: f64) -> Result<(), SimError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be positive, got {value}")))
    }
}

fn validate_sensor(field: &str, sensor: &SensorConfig) -> Result<(), SimError> {
    positive(&format!("{field}.fov_deg"), sensor.fov_deg)?;
    positive(&format!("{field}.increment_deg"), sensor.increment_deg)?;
    positive(&format!("{field}.range_m"), sensor.range_m)?;
    positive(&format!("{field}.period_s"), sensor.period_s)?;
    if sensor.fov_deg > MAX_FOV_DEG {
        return Err(invalid(format!("{field}.fov_deg must be at most {MAX_FOV_DEG}")));
    }
    Ok(())
}

fn validate_noise(field: &str, noise: &NoiseConfig) -> Result<(), SimError> {
    if !(noise.error >= 0.0 && noise.error.is_finite()) {
        return Err(invalid(format!("{field}.error must be non-negative")));
    }
    positive(&format!("{field}.period_s"), noise.period_s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vehicle.strategy, "astar");
        assert_eq!(config.vehicle.lidar.ray_count(), 181);
        assert!((config.simulation.goal_tolerance_m - 0.2).abs() < EPSILON);
        assert_eq!(config.planner.settings(), PlannerSettings::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimConfig::from_toml(
            r#"
            [vehicle]
            strategy = "dstar-lite"
            linear_velocity = 1.5

            [[environment.obstacles]]
            x = 1.0
            y = 1.0
            width = 0.4
            height = 0.2

            [environment.goal]
            x = 2.5
            y = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.vehicle.strategy, "dstar-lite");
        assert!((config.vehicle.linear_velocity - 1.5).abs() < EPSILON);
        assert!((config.vehicle.rotational_velocity - 60.0).abs() < EPSILON);
        assert_eq!(config.environment.obstacles.len(), 1);
        assert!((config.environment.goal.x - 2.5).abs() < EPSILON);
        assert!((config.environment.start.x - 0.1).abs() < EPSILON);
        assert_eq!(config.arena, ArenaConfig::default());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = SimConfig::default();
        config.vehicle.lidar.fov_deg = 360.0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.vehicle.camera.increment_deg = 0.0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.vehicle.gps.error = -0.1;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.environment.goal = WorldPoint::new(2.8, 1.0);
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.environment.obstacles.push(Ellipse::new(2.7, 0.0, 0.5, 0.5));
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.arena.tiles_y = 0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(matches!(
            SimConfig::from_toml("[vehicle]\nlinear_velocity = -1.0\n"),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimConfig::from_toml("[vehicle]\nlinear_velocity = \"fast\"\n"),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_shipped_default_file() {
        let config = SimConfig::load().unwrap();
        assert_eq!(config.environment.obstacles.len(), 3);
        assert_eq!(config.environment.lines.len(), 1);
        assert_eq!(config.vehicle, VehicleConfig::default());
        assert_eq!(config.arena, ArenaConfig::default());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SimConfig::load_from(Path::new("does/not/exist.toml")),
            Err(SimError::Config(_))
        ));
    }
}
