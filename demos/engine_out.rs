use aircraft_sim::io::csv;
use aircraft_sim::io::json::{self, FlightSummary, Scenario};
use aircraft_sim::sim::{self, Engine, SimulationEvents};

fn main() {
    let mut run = Scenario::cruise();
    run.config.total_time = 60.0;
    run.events = SimulationEvents::none().with_failed_engine(Engine::Two);

    println!("Simulating right engine failure ...");
    let trajectory = sim::integrate(&run.params, &run.initial, &run.nominal, &run.config, &run.events)
        .expect("Simulation failed");

    let summary = FlightSummary::from_trajectory(&trajectory);
    let last = trajectory.last().expect("trajectory is never empty");
    println!("Heading change: {:.1} deg", last.state.yaw().to_degrees());
    println!("Max |roll|: {:.1} deg", summary.max_abs_roll.to_degrees());
    if let Some(d) = trajectory.divergence() {
        println!("Diverged at t = {:.2} s (iteration {})", d.time, d.iteration);
    }

    csv::write_trajectory_file("engine_out_trajectory.csv", &trajectory)
        .expect("Failed to write CSV");
    json::write_summary_file("engine_out_summary.json", &summary)
        .expect("Failed to write JSON");

    println!("Exported: engine_out_trajectory.csv, engine_out_summary.json");
}
