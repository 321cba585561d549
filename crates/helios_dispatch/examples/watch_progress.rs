//! Example: Render the demo scene while polling progress, then cancel
//! part-way through.
//!
//! Run with: cargo run --example watch_progress

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use helios_dispatch::{Master, SessionConfig};
use helios_renderer::{demo_scene, TracerFactory};

fn main() {
    env_logger::init();

    let (width, height) = (800, 600);
    let factory = Arc::new(TracerFactory::new(
        move || demo_scene(width, height),
        width,
        height,
        Default::default(),
    ));

    let master = Master::new();
    let handle = master
        .start_render(SessionConfig::new(width, height, 4), factory, Vec::new())
        .expect("session should start");

    for tick in 0.. {
        let report = handle.progress();
        println!(
            "t+{:.2}s  continuing={}  [ {} ]",
            report.elapsed.as_secs_f64(),
            report.continuing,
            handle.statistics()
        );
        if tick == 8 {
            println!("requesting cancellation");
            handle.cancel();
            break;
        }
        thread::sleep(Duration::from_millis(100));
    }

    let result = handle.join().expect("supervisor should not panic");
    println!(
        "outcome: {:?} after {} rows in {:.2}s",
        result.outcome,
        result.rows_rendered,
        result.elapsed.as_secs_f64()
    );
}
