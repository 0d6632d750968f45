use aurus_navigation::planner::path_cost;
use aurus_navigation::{GridPoint, OccupancyGrid, PlannerSettings, StrategyRegistry};

fn main() {
    // 0 = clear, anything else is obstacle evidence
    let rows = vec![
        vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0], // Row 0
        vec![0, 1, 1, 0, 0, 0, 0, 1, 1, 0], // Row 1
        vec![0, 0, 0, 0, 1, 0, 0, 0, 0, 0], // Row 2
        vec![0, 0, 1, 1, 1, 1, 0, 1, 0, 0], // Row 3
        vec![0, 0, 0, 0, 0, 1, 0, 1, 0, 0], // Row 4
        vec![0, 1, 1, 1, 0, 1, 0, 1, 1, 0], // Row 5
        vec![0, 0, 0, 1, 0, 0, 0, 0, 0, 0], // Row 6
        vec![0, 1, 0, 1, 0, 1, 1, 1, 0, 0], // Row 7
        vec![0, 1, 0, 0, 0, 0, 0, 0, 1, 0], // Row 8
        vec![0, 0, 0, 1, 1, 1, 0, 0, 0, 0], // Row 9
    ];
    let grid = match OccupancyGrid::from_rows(&rows) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Invalid grid: {e}");
            return;
        }
    };

    let start = GridPoint::new(0, 0);
    let destination = GridPoint::new(9, 9);
    println!("Grid (start {start}, destination {destination}):");
    println!("{grid}");

    let registry = StrategyRegistry::with_defaults();
    let settings = PlannerSettings {
        footprint_tiles: 1.0,
        rrt_seed: Some(7),
        ..PlannerSettings::default()
    };

    for name in registry.names() {
        let mut planner = match registry.create(name, &settings) {
            Ok(planner) => planner,
            Err(e) => {
                println!("{name:<22} failed to build: {e}");
                continue;
            }
        };
        match planner.calculate_path(&grid, start, destination, 0.0) {
            Ok(path) => println!(
                "{name:<22} {:>3} waypoints, cost {}",
                path.len(),
                path_cost(start, &path)
            ),
            Err(e) => println!("{name:<22} {e}"),
        }
    }
}
