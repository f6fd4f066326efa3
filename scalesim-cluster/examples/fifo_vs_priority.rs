//! Run the same seeded overload scenario under FIFO and strict-priority
//! admission and print both recaps side by side.
//!
//! ```bash
//! cargo run --example fifo_vs_priority
//! RUST_LOG=scalesim_cluster=debug cargo run --example fifo_vs_priority
//! ```

use scalesim_cluster::{ClusterSim, QueueDiscipline, SimConfig};
use scalesim_core::{init_simulation_logging, SimTime};
use scalesim_stats::{batch_means_ci, SummaryReport};

fn main() {
    init_simulation_logging();

    for discipline in [QueueDiscipline::Fifo, QueueDiscipline::StrictPriority] {
        let mut config = SimConfig::default();
        config.discipline = discipline;

        let metrics = ClusterSim::new(config)
            .expect("default scenario is valid")
            .run();

        println!("=== {discipline:?} ===");
        println!("{}", SummaryReport::from_collector(&metrics));

        match batch_means_ci(
            &metrics.response_time_series(None),
            SimTime::from_secs(200),
            16,
            0.95,
        ) {
            Ok(estimate) => println!(
                "steady-state response time: {:.4}s ± {:.4}s ({}% CI, {} batches)\n",
                estimate.mean,
                estimate.half_width,
                (estimate.confidence_level * 100.0) as u32,
                estimate.num_batches,
            ),
            Err(err) => println!("steady-state estimate unavailable: {err}\n"),
        }
    }
}
