use aurus_kinematics::*;

fn main() {
    let dt = 0.1; // Time step in seconds
    let drive = Twist::new(0.5, 0.0); // 0.5 m/s forward
    let turn = Twist::new(0.0, 90.0); // 90 deg/s counter-clockwise

    let mut pose = Pose::new(0.0, 0.0, 0.0);
    println!("Driving a 1 m square from {pose}");

    for side in 0..4 {
        // 20 steps of 0.05 m, then 10 steps of 9 degrees
        for (twist, steps) in [(drive, 20), (turn, 10)] {
            for _ in 0..steps {
                match update_pose(pose, twist, dt) {
                    Ok(next) => pose = next,
                    Err(e) => {
                        eprintln!("Error updating pose: {e:?}");
                        return;
                    }
                }
            }
        }
        println!("  after side {}: {pose}", side + 1);
    }
}
