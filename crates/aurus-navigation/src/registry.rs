//! Name-to-planner lookup.
//!
//! The registry is an ordinary value: the application builds one at startup
//! and passes it to whatever needs to resolve strategy names. New planners can
//! be registered at runtime without touching this crate.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::astar::GridAStar;
use crate::dstar_lite::DStarLite;
use crate::error::NavigationError;
use crate::planner::{PathPlanner, PlannerSettings};
use crate::potential_field::PotentialFieldPlanner;
use crate::rrt::SamplingPlanner;

/// Builds a fresh planner instance from shared settings.
pub type PlannerFactory = Box<dyn Fn(&PlannerSettings) -> Box<dyn PathPlanner> + Send + Sync>;

/// Maps strategy names to planner factories.
#[derive(Default)]
pub struct StrategyRegistry {
    factories: BTreeMap<String, PlannerFactory>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        StrategyRegistry {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding every planner this crate ships.
    pub fn with_defaults() -> Self {
        let mut registry = StrategyRegistry::new();
        registry.register("astar", |_| Box::new(GridAStar::standard()));
        registry.register("astar-corner-safe", |_| Box::new(GridAStar::corner_safe()));
        registry.register("astar-repulsion", |_| Box::new(GridAStar::repulsion()));
        registry.register("astar-repulsion-wide", |s| {
            Box::new(GridAStar::repulsion_wide(s.footprint_tiles))
        });
        registry.register("astar-turn", |_| Box::new(GridAStar::turn_penalized()));
        registry.register("dstar-lite", |_| Box::new(DStarLite::new()));
        registry.register("rrt", |s| {
            Box::new(SamplingPlanner::new(s.footprint_tiles, s.rrt_max_iterations, s.rrt_seed))
        });
        registry.register("potential-field", |_| Box::new(PotentialFieldPlanner::plain()));
        registry.register("potential-field-smooth", |_| Box::new(PotentialFieldPlanner::smoothed()));
        registry.register("potential-field-smooth-wide", |s| {
            Box::new(PotentialFieldPlanner::smoothed_wide(s.footprint_tiles))
        });
        registry
    }

    /// Adds or replaces a strategy.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PlannerSettings) -> Box<dyn PathPlanner> + Send + Sync + 'static,
    {
        if self.factories.insert(name.to_string(), Box::new(factory)).is_some() {
            debug!(strategy = name, "Replaced registered strategy");
        }
    }

    /// Creates a new planner by name.
    ///
    /// # Errors
    /// Returns `UnknownStrategy` if nothing is registered under `name`.
    pub fn create(&self, name: &str, settings: &PlannerSettings) -> Result<Box<dyn PathPlanner>, NavigationError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| NavigationError::UnknownStrategy(name.to_string()))?;
        Ok(factory(settings))
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}
