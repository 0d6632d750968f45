//! Moving-start D* Lite.
//!
//! The search runs backwards: the algorithmic start is pinned to the
//! destination tile and the algorithmic goal follows the vehicle. Each call
//! folds the vehicle's motion into the heuristic offset `km`, diffs the new
//! grid against the cached copy, repairs only the affected vertices and then
//! re-extracts the path. The node cache lives as long as the planner.
//!
//! Keys are `(k1, k2, sequence)`. The sequence is a per-planner counter that
//! only makes queue ordering total; staleness and termination checks compare
//! `(k1, k2)` alone.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, trace};

use crate::error::NavigationError;
use crate::map::{GridPoint, OccupancyGrid, step_cost};
use crate::planner::{Path, PathPlanner, check_endpoints, octile_distance, planning_snapshot};

/// Stand-in for an infinite cost.
pub const INFINITY: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    k1: u64,
    k2: u64,
    sequence: u64,
}

impl Key {
    fn priority(&self) -> (u64, u64) {
        (self.k1, self.k2)
    }
}

#[derive(Debug, Clone)]
struct IncrementalNode {
    tile: GridPoint,
    g: u64,
    rhs: u64,
    h: u64,
    key: Key,
    queued: bool,
    predecessors: Vec<usize>,
}

impl IncrementalNode {
    fn new(tile: GridPoint) -> Self {
        IncrementalNode {
            tile,
            g: INFINITY,
            rhs: INFINITY,
            h: 0,
            key: Key {
                k1: INFINITY,
                k2: INFINITY,
                sequence: 0,
            },
            queued: false,
            predecessors: Vec::new(),
        }
    }
}

fn add_costs(a: u64, b: u64) -> u64 {
    if a == INFINITY || b == INFINITY {
        INFINITY
    } else {
        a.saturating_add(b)
    }
}

struct SearchState {
    /// Obstacle snapshot from the previous call, destination forced clear.
    grid: OccupancyGrid,
    nodes: Vec<Option<IncrementalNode>>,
    queue: BTreeSet<(Key, usize)>,
    /// Algorithmic start: the destination tile.
    start: usize,
    /// Algorithmic goal: the vehicle tile.
    goal: usize,
    km: u64,
    sequence: u64,
}

impl SearchState {
    fn new(grid: OccupancyGrid, destination: GridPoint, vehicle: GridPoint) -> Self {
        let start = grid.index_of(destination);
        let goal = grid.index_of(vehicle);
        let mut state = SearchState {
            nodes: vec![None; grid.cell_count()],
            grid,
            queue: BTreeSet::new(),
            start,
            goal,
            km: 0,
            sequence: 0,
        };

        state.node_mut(goal);
        state.node_mut(start).rhs = 0;
        let key = state.calculate_key(start);
        let node = state.node_mut(start);
        node.key = key;
        node.queued = true;
        state.queue.insert((key, start));
        state
    }

    fn node_mut(&mut self, index: usize) -> &mut IncrementalNode {
        let tile = self.grid.point_of(index);
        self.nodes[index].get_or_insert_with(|| IncrementalNode::new(tile))
    }

    fn g(&self, index: usize) -> u64 {
        self.nodes[index].as_ref().map_or(INFINITY, |n| n.g)
    }

    fn rhs(&self, index: usize) -> u64 {
        self.nodes[index].as_ref().map_or(INFINITY, |n| n.rhs)
    }

    fn is_clear(&self, index: usize) -> bool {
        index == self.start || self.grid.data()[index] == 0
    }

    fn cost(&self, a: usize, b: usize) -> u64 {
        if !self.is_clear(a) || !self.is_clear(b) {
            return INFINITY;
        }
        step_cost(self.grid.point_of(a), self.grid.point_of(b))
    }

    fn neighbors(&self, index: usize) -> Vec<usize> {
        let tile = self.grid.point_of(index);
        self.grid.neighbors(tile).map(|p| self.grid.index_of(p)).collect()
    }

    fn heuristic(&self, index: usize) -> u64 {
        octile_distance(self.grid.point_of(index), self.grid.point_of(self.goal))
    }

    fn priority(&self, index: usize) -> (u64, u64) {
        let best = self.g(index).min(self.rhs(index));
        if best == INFINITY {
            return (INFINITY, INFINITY);
        }
        (add_costs(add_costs(best, self.heuristic(index)), self.km), best)
    }

    fn calculate_key(&mut self, index: usize) -> Key {
        let (k1, k2) = self.priority(index);
        let h = self.heuristic(index);
        self.node_mut(index).h = h;
        self.sequence += 1;
        Key {
            k1,
            k2,
            sequence: self.sequence,
        }
    }

    fn update_vertex(&mut self, index: usize) {
        let node = self.node_mut(index);
        if node.queued {
            let key = node.key;
            node.queued = false;
            self.queue.remove(&(key, index));
        }

        if index != self.start {
            let predecessors = self.node_mut(index).predecessors.clone();
            let rhs = predecessors
                .iter()
                .map(|&p| add_costs(self.g(p), self.cost(p, index)))
                .min()
                .unwrap_or(INFINITY);
            self.node_mut(index).rhs = rhs;
        }

        let key = self.calculate_key(index);
        let node = self.node_mut(index);
        node.key = key;
        if node.g != node.rhs {
            node.queued = true;
            self.queue.insert((key, index));
        }
    }

    /// `u` now has a finite `g`: record it as a predecessor of its reachable
    /// neighbours and repair them.
    fn settle(&mut self, u: usize) {
        for s in self.neighbors(u) {
            if self.cost(u, s) == INFINITY {
                continue;
            }
            let node = self.node_mut(s);
            if !node.predecessors.contains(&u) {
                node.predecessors.push(u);
            }
            self.update_vertex(s);
        }
    }

    /// `u` lost its settled cost: drop it from its neighbours' predecessor
    /// sets and repair them and `u` itself.
    fn invalidate(&mut self, u: usize) {
        self.node_mut(u).g = INFINITY;
        for s in self.neighbors(u) {
            if let Some(node) = self.nodes[s].as_mut() {
                node.predecessors.retain(|&p| p != u);
            }
            if self.is_clear(s) {
                self.update_vertex(s);
            }
        }
        self.update_vertex(u);
    }

    fn compute_shortest_path(&mut self) -> usize {
        let mut expansions = 0;
        while let Some(&(top, u)) = self.queue.first() {
            let goal_consistent = self.g(self.goal) == self.rhs(self.goal);
            if top.priority() >= self.priority(self.goal) && goal_consistent {
                break;
            }

            self.queue.pop_first();
            self.node_mut(u).queued = false;
            debug_assert_ne!(self.g(u), self.rhs(u), "consistent node popped from the queue");
            expansions += 1;

            let fresh = self.calculate_key(u);
            if top.priority() < fresh.priority() {
                let node = self.node_mut(u);
                node.key = fresh;
                node.queued = true;
                self.queue.insert((fresh, u));
                continue;
            }

            let rhs = self.rhs(u);
            if self.g(u) > rhs {
                self.node_mut(u).g = rhs;
                self.settle(u);
            } else {
                self.invalidate(u);
            }
        }
        expansions
    }

    /// Folds a new vehicle tile and grid into the search.
    fn apply_changes(&mut self, grid: OccupancyGrid, vehicle: GridPoint) -> Result<(), NavigationError> {
        let mut touched = Vec::new();

        let new_goal = grid.index_of(vehicle);
        if new_goal != self.goal {
            // h under the old anchor: h_old(new) - h_old(old), and h_old(old) is zero
            self.km += octile_distance(self.grid.point_of(self.goal), vehicle);
            self.goal = new_goal;
            self.node_mut(new_goal);
            touched.push(new_goal);
        }

        let changed = self.grid.changed_cells(&grid)?;
        self.grid = grid;
        for &cell in &changed {
            if self.is_clear(cell) {
                // Settled neighbours never recorded this tile while it was blocked
                for n in self.neighbors(cell) {
                    if self.g(n) != INFINITY {
                        let node = self.node_mut(cell);
                        if !node.predecessors.contains(&n) {
                            node.predecessors.push(n);
                        }
                    }
                }
            }
            touched.push(cell);
            touched.extend(self.neighbors(cell));
        }

        if !changed.is_empty() {
            debug!(changed = changed.len(), km = self.km, "Grid changes folded into D* Lite");
        }

        let mut seen = HashSet::new();
        for index in touched {
            if seen.insert(index) {
                self.update_vertex(index);
            }
        }
        Ok(())
    }

    fn extract_path(&self) -> Result<Path, NavigationError> {
        if self.g(self.goal) == INFINITY {
            return Err(NavigationError::NoPathFound);
        }

        let mut path = Vec::new();
        let mut current = self.goal;
        while current != self.start {
            if path.len() >= self.grid.cell_count() {
                return Err(NavigationError::NoPathFound);
            }
            let Some(node) = self.nodes[current].as_ref() else {
                return Err(NavigationError::NoPathFound);
            };

            let mut best: Option<(u64, usize)> = None;
            for &p in &node.predecessors {
                let through = add_costs(self.g(p), self.cost(p, current));
                if through != INFINITY && best.is_none_or(|(cost, _)| through < cost) {
                    best = Some((through, p));
                }
            }
            let Some((_, next)) = best else {
                return Err(NavigationError::NoPathFound);
            };
            path.push(self.grid.point_of(next));
            current = next;
        }
        Ok(path)
    }
}

/// Incremental planner that keeps its search tree between calls.
///
/// Calls must not overlap on one instance; `&mut self` enforces that.
#[derive(Default)]
pub struct DStarLite {
    state: Option<SearchState>,
}

impl DStarLite {
    /// Creates an uninitialized planner. The first call builds the node cache.
    pub fn new() -> Self {
        DStarLite { state: None }
    }

    /// Returns `true` once a search has been run.
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Settled cost of the vehicle tile, `None` while unreachable.
    pub fn goal_cost(&self) -> Option<u64> {
        let state = self.state.as_ref()?;
        let g = state.g(state.goal);
        (g != INFINITY).then_some(g)
    }

    /// Whether the vehicle tile is locally consistent (`g == rhs`).
    pub fn goal_is_consistent(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.g(state.goal) == state.rhs(state.goal))
    }

    /// Number of nodes the cache has materialized so far.
    pub fn cached_nodes(&self) -> usize {
        self.state
            .as_ref()
            .map_or(0, |state| state.nodes.iter().filter(|n| n.is_some()).count())
    }
}

impl PathPlanner for DStarLite {
    fn name(&self) -> &str {
        "dstar-lite"
    }

    fn calculate_path(
        &mut self,
        grid: &OccupancyGrid,
        start: GridPoint,
        destination: GridPoint,
        _heading: f64,
    ) -> Result<Path, NavigationError> {
        check_endpoints(grid, start, destination)?;
        if start == destination {
            return Ok(Vec::new());
        }

        let snapshot = planning_snapshot(grid, destination)?;
        let reusable = self.state.as_ref().is_some_and(|state| {
            state.start == snapshot.index_of(destination)
                && state.grid.width() == snapshot.width()
                && state.grid.height() == snapshot.height()
        });

        let state = match self.state.take() {
            Some(mut state) if reusable => {
                state.apply_changes(snapshot, start)?;
                state
            }
            _ => {
                debug!(%destination, "Initializing D* Lite search");
                SearchState::new(snapshot, destination, start)
            }
        };
        let state = self.state.insert(state);

        let expansions = state.compute_shortest_path();
        trace!(expansions, queue = state.queue.len(), "D* Lite repair finished");
        state.extract_path()
    }

    fn is_incremental(&self) -> bool {
        true
    }
}
