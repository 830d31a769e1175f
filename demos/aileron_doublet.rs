use aircraft_sim::io::csv;
use aircraft_sim::io::json::{self, FlightSummary, Scenario};
use aircraft_sim::sim::{self, SimulationEvents};

fn main() {
    let mut run = Scenario::cruise();
    run.config.total_time = 60.0;
    run.events = SimulationEvents::none().with_deflection(5.0, 10.0, 12.0);

    println!("Simulating 5 deg aileron pulse from 10 s to 12 s ...");
    let trajectory = sim::integrate(&run.params, &run.initial, &run.nominal, &run.config, &run.events)
        .expect("Simulation failed");

    let summary = FlightSummary::from_trajectory(&trajectory);
    println!("Max |roll|: {:.1} deg", summary.max_abs_roll.to_degrees());
    println!("Max airspeed: {:.1} m/s", summary.max_airspeed);
    if summary.diverged {
        println!("Trajectory left the flight envelope");
    }

    csv::write_trajectory_file("aileron_pulse_trajectory.csv", &trajectory)
        .expect("Failed to write CSV");
    json::write_summary_file("aileron_pulse_summary.json", &summary)
        .expect("Failed to write JSON");

    println!("Exported: aileron_pulse_trajectory.csv, aileron_pulse_summary.json");
}
