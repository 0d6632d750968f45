//! The perceive, plan, act loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use aurus_kinematics::Pose;
use aurus_navigation::{MetricFrame, NavigationError, PathPlanner, StrategyRegistry};
use tracing::{debug, error, info, warn};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::motion::MotionController;
use crate::perception::PerceptionSimulator;
use crate::pose_estimator::PoseEstimator;
use crate::shutdown::ShutdownSignal;
use crate::world::{DiscreteWorld, ObservedWorld, RealWorld};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub reached_goal: bool,
    pub cycles: u64,
    /// True pose when the loop ended
    pub final_pose: Pose,
    pub elapsed: Duration,
}

/// A fully wired simulation, ready to [`run`](Simulation::run).
pub struct Simulation {
    config: SimConfig,
    real: Arc<RealWorld>,
    observed: Arc<ObservedWorld>,
    discrete: Arc<DiscreteWorld>,
    estimator: Arc<PoseEstimator>,
    perception: PerceptionSimulator,
    motion: Arc<MotionController>,
    planner: Box<dyn PathPlanner>,
    shutdown: Arc<ShutdownSignal>,
}

impl Simulation {
    /// Builds the worlds, resolves the strategy and places the vehicle.
    pub fn new(config: SimConfig, registry: &StrategyRegistry) -> Result<Self, SimError> {
        config.validate()?;
        let planner = registry.create(&config.vehicle.strategy, &config.planner.settings())?;

        let arena = &config.arena;
        let env = &config.environment;
        let real = Arc::new(RealWorld::new(
            arena.width_m,
            arena.height_m,
            env.obstacles.clone(),
            env.lines.clone(),
        ));
        let observed = Arc::new(ObservedWorld::new());
        let frame = MetricFrame::new(arena.width_m, arena.height_m, arena.tiles_x, arena.tiles_y)?;
        let discrete = Arc::new(DiscreteWorld::new(frame)?);
        let shutdown = Arc::new(ShutdownSignal::new());

        let estimator = Arc::new(PoseEstimator::new(
            Arc::clone(&real),
            Arc::clone(&observed),
            Arc::clone(&discrete),
            &config.vehicle.gps,
            &config.vehicle.imu,
            config.planner.noise_seed,
        )?);
        let perception = PerceptionSimulator::new(
            Arc::clone(&real),
            Arc::clone(&observed),
            Arc::clone(&discrete),
            config.vehicle.lidar,
            config.vehicle.camera,
            Arc::clone(&shutdown),
        );
        let motion = Arc::new(MotionController::new(
            &discrete,
            Arc::clone(&estimator),
            &config.vehicle,
            config.simulation.motion_period(),
        ));

        real.set_destination(env.goal);
        observed.set_destination(env.goal);
        discrete.set_destination(env.goal)?;
        estimator.place(Pose::new(env.start.x, env.start.y, 0.0));

        info!(
            strategy = planner.name(),
            start = ?env.start,
            goal = ?env.goal,
            obstacles = env.obstacles.len(),
            lines = env.lines.len(),
            "Simulation ready"
        );

        Ok(Simulation {
            config,
            real,
            observed,
            discrete,
            estimator,
            perception,
            motion,
            planner,
            shutdown,
        })
    }

    pub fn real(&self) -> &Arc<RealWorld> {
        &self.real
    }

    pub fn observed(&self) -> &Arc<ObservedWorld> {
        &self.observed
    }

    pub fn discrete(&self) -> &Arc<DiscreteWorld> {
        &self.discrete
    }

    pub fn estimator(&self) -> &Arc<PoseEstimator> {
        &self.estimator
    }

    /// Handle for stopping the run from another thread.
    pub fn shutdown_handle(&self) -> Arc<ShutdownSignal> {
        Arc::clone(&self.shutdown)
    }

    /// L1 distance from the true position to the goal is within tolerance.
    pub fn goal_reached(&self) -> bool {
        let goal = self.config.environment.goal;
        self.real.vehicle_pose().manhattan_to(goal.x, goal.y) < self.config.simulation.goal_tolerance_m
    }

    /// One sensing and planning cycle. A missing path is not an error; the
    /// previous path stays in effect.
    pub fn run_cycle(&mut self) -> Result<(), SimError> {
        self.perception.lidar_sweep();
        self.observed.refresh_points();
        self.perception.camera_sweep();
        self.observed.refresh_points();

        match self.discrete.calculate_path(self.planner.as_mut()) {
            Ok(path) => debug!(waypoints = path.len(), "Path updated"),
            Err(NavigationError::NoPathFound) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Runs cycles until the goal is reached, `max_cycles` is hit or shutdown
    /// is triggered. The motion thread is stopped and joined before returning.
    pub fn run(mut self) -> Result<SimulationOutcome, SimError> {
        let started = Instant::now();
        let max_cycles = self.config.simulation.max_cycles;
        let motion = Arc::clone(&self.motion).spawn(Arc::clone(&self.shutdown))?;

        let mut cycles = 0;
        let mut reached_goal = self.goal_reached();
        let result = loop {
            if reached_goal || self.shutdown.is_triggered() {
                break Ok(());
            }
            if max_cycles.is_some_and(|max| cycles >= max) {
                warn!(cycles, "Cycle limit reached before the goal");
                break Ok(());
            }
            if let Err(e) = self.run_cycle() {
                break Err(e);
            }
            cycles += 1;
            reached_goal = self.goal_reached();
        };

        self.shutdown.trigger();
        if motion.join().is_err() {
            error!("Motion thread panicked");
        }
        result?;

        let outcome = SimulationOutcome {
            reached_goal,
            cycles,
            final_pose: self.estimator.pose(),
            elapsed: started.elapsed(),
        };
        info!(
            reached_goal,
            cycles,
            final_pose = %outcome.final_pose,
            elapsed = ?outcome.elapsed,
            "Simulation finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurus_navigation::GridPoint;

    #[test]
    fn test_unknown_strategy() {
        let mut config = SimConfig::default();
        config.vehicle.strategy = "teleport".to_string();
        let result = Simulation::new(config, &StrategyRegistry::with_defaults());
        assert!(matches!(
            result,
            Err(SimError::Navigation(NavigationError::UnknownStrategy(name))) if name == "teleport"
        ));
    }

    #[test]
    fn test_startup_places_vehicle() {
        let sim = Simulation::new(SimConfig::default(), &StrategyRegistry::with_defaults()).unwrap();
        assert_eq!(sim.discrete().vehicle_tile(), GridPoint::new(1, 1));
        assert_eq!(sim.discrete().destination_tile(), GridPoint::new(35, 35));
        assert!((sim.real().vehicle_pose().x - 0.1).abs() < 1e-9);
        assert!(!sim.goal_reached());
    }

    #[test]
    fn test_cycle_plans_a_path() {
        let mut config = SimConfig::default();
        config.vehicle.lidar.period_s = 0.001;
        config.vehicle.camera.period_s = 0.001;
        let mut sim = Simulation::new(config, &StrategyRegistry::with_defaults()).unwrap();

        sim.run_cycle().unwrap();
        let path = sim.discrete().path();
        assert_eq!(path.last(), Some(&GridPoint::new(35, 35)));
        assert_eq!(sim.discrete().path_revision(), 1);
        assert!(sim.observed().new_points().is_empty());
    }

    #[test]
    fn test_cycle_limit() {
        let mut config = SimConfig::default();
        config.vehicle.lidar.period_s = 0.001;
        config.vehicle.camera.period_s = 0.001;
        config.simulation.max_cycles = Some(2);
        let sim = Simulation::new(config, &StrategyRegistry::with_defaults()).unwrap();

        let outcome = sim.run().unwrap();
        assert_eq!(outcome.cycles, 2);
        assert!(!outcome.reached_goal);
    }

    #[test]
    fn test_shutdown_before_run() {
        let sim = Simulation::new(SimConfig::default(), &StrategyRegistry::with_defaults()).unwrap();
        sim.shutdown_handle().trigger();
        let outcome = sim.run().unwrap();
        assert_eq!(outcome.cycles, 0);
        assert!(!outcome.reached_goal);
    }
}
