use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aircraft_sim::io::csv;
use aircraft_sim::io::json::{self, FlightSummary, Scenario};
use aircraft_sim::sim;
use aircraft_sim::Result;

const OUTPUT_DIR: &str = "states_simulated";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn run(run_file: Option<PathBuf>) -> Result<()> {
    if let Some(path) = &run_file {
        tracing::info!(path = %path.display(), "loading run file");
    }
    let scenario = Scenario::load_or_cruise(run_file.as_deref())?;

    let trajectory = sim::integrate(
        &scenario.params,
        &scenario.initial,
        &scenario.nominal,
        &scenario.config,
        &scenario.events,
    )?;
    let summary = FlightSummary::from_trajectory(&trajectory);

    print_report(&scenario, &trajectory, &summary);

    std::fs::create_dir_all(OUTPUT_DIR)?;
    let stamp = chrono::Local::now().format("%Y_%m_%d-%H_%M_%S");
    let states_path = Path::new(OUTPUT_DIR).join(format!("simulation_data_{stamp}.txt"));
    let summary_path = Path::new(OUTPUT_DIR).join(format!("simulation_summary_{stamp}.json"));
    csv::write_trajectory_file(&states_path, &trajectory)?;
    json::write_summary_file(&summary_path, &summary)?;
    tracing::info!(
        states = %states_path.display(),
        summary = %summary_path.display(),
        "saved simulation states"
    );
    Ok(())
}

fn print_report(scenario: &Scenario, trajectory: &sim::Trajectory, summary: &FlightSummary) {
    println!();
    println!("====================================================================");
    println!("  AIRCRAFT 6DOF SIMULATION");
    println!("====================================================================");
    println!();
    println!("  Run Parameters");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Initial state X0:   {:?}", scenario.initial.to_array());
    println!("  Control vector U0:  {:?}", scenario.nominal.to_array());
    println!(
        "  Time:          {:>8.1} s     dt:           {:>8.4} s",
        scenario.config.total_time, scenario.config.dt
    );
    match scenario.events.deflection {
        Some(d) => println!(
            "  Aileron:       {:>8.2} deg   window:       {:.1}-{:.1} s",
            d.magnitude_deg, d.start_time, d.end_time
        ),
        None => println!("  Aileron:           none"),
    }
    match scenario.events.failed_engine {
        Some(e) => println!("  Engine fail:   {:>8}", u8::from(e)),
        None => println!("  Engine fail:       none"),
    }
    println!();

    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}",
        "t (s)", "u (m/s)", "w (m/s)", "phi(deg)", "the(deg)", "psi(deg)", "alp(deg)"
    );
    println!("  {}", "─".repeat(66));

    let sample_interval = (trajectory.len() / 30).max(1);
    for (i, s) in trajectory.iter().enumerate() {
        if i % sample_interval != 0 && i != trajectory.len() - 1 {
            continue;
        }
        println!(
            "  {:>7.2}  {:>8.2}  {:>8.2}  {:>8.2}  {:>8.2}  {:>8.2}  {:>8.2}",
            s.time,
            s.state.vel.x,
            s.state.vel.z,
            s.state.roll().to_degrees(),
            s.state.pitch().to_degrees(),
            s.state.yaw().to_degrees(),
            s.angles.alpha.to_degrees(),
        );
    }
    println!();

    println!("  Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Max airspeed:  {:>8.1} m/s", summary.max_airspeed);
    println!("  Max |roll|:    {:>8.1} deg", summary.max_abs_roll.to_degrees());
    println!("  Max |pitch|:   {:>8.1} deg", summary.max_abs_pitch.to_degrees());
    if let Some(t) = summary.divergence_time {
        println!("  WARNING: simulation left the physical envelope at t = {t:.2} s");
    }
    println!();
    println!("  Simulation: {} steps, dt={} s", trajectory.len(), scenario.config.dt);
    println!("====================================================================");
    println!();
}

fn main() -> ExitCode {
    init_tracing();

    let run_file = std::env::args_os().nth(1).map(PathBuf::from);
    match run(run_file) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "simulation failed");
            ExitCode::FAILURE
        }
    }
}
