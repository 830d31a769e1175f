use std::path::PathBuf;

use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};

use aircraft_sim::io::json::{FlightSummary, Scenario};
use aircraft_sim::sim::{self, Snapshot};

/// Plotted channels: label, unit and accessor.
const CHANNELS: [(&str, &str, fn(&Snapshot) -> f64); 9] = [
    ("u", "m/s", |s| s.state.vel.x),
    ("v", "m/s", |s| s.state.vel.y),
    ("w", "m/s", |s| s.state.vel.z),
    ("p", "deg/s", |s| s.state.omega.x.to_degrees()),
    ("q", "deg/s", |s| s.state.omega.y.to_degrees()),
    ("r", "deg/s", |s| s.state.omega.z.to_degrees()),
    ("phi", "deg", |s| s.state.euler.x.to_degrees()),
    ("theta", "deg", |s| s.state.euler.y.to_degrees()),
    ("psi", "deg", |s| s.state.euler.z.to_degrees()),
];

fn main() -> eframe::Result {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let run_file = std::env::args_os().nth(1).map(PathBuf::from);
    let scenario = match Scenario::load_or_cruise(run_file.as_deref()) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(error = %e, "could not load run");
            std::process::exit(1);
        }
    };
    let trajectory = match sim::integrate(
        &scenario.params,
        &scenario.initial,
        &scenario.nominal,
        &scenario.config,
        &scenario.events,
    ) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "simulation failed");
            std::process::exit(1);
        }
    };

    let summary = FlightSummary::from_trajectory(&trajectory);
    let app = SimViz { snapshots: trajectory.into_snapshots(), summary };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1400.0, 900.0]),
        ..Default::default()
    };
    eframe::run_native("Aircraft 6DOF Simulator", options, Box::new(|_| Ok(Box::new(app))))
}

struct SimViz {
    snapshots: Vec<Snapshot>,
    summary: FlightSummary,
}

impl eframe::App for SimViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let step = (self.snapshots.len() / 2000).max(1);
        let sampled: Vec<&Snapshot> = self.snapshots.iter().step_by(step).collect();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading("Simulated states");
            let mut line = format!(
                "Flight: {:.0} s  |  Max airspeed: {:.1} m/s  |  Max roll: {:.1} deg  |  Snapshots: {}",
                self.summary.final_time,
                self.summary.max_airspeed,
                self.summary.max_abs_roll.to_degrees(),
                self.summary.snapshots,
            );
            if let Some(t) = self.summary.divergence_time {
                line.push_str(&format!("  |  diverged at {t:.1} s"));
            }
            ui.label(line);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let cell_w = available.x / 3.0 - 8.0;
            let cell_h = available.y / 3.0 - 24.0;

            for row in CHANNELS.chunks(3) {
                ui.horizontal(|ui| {
                    for &(name, unit, value) in row {
                        ui.vertical(|ui| {
                            ui.label(format!("{name} ({unit})"));
                            let points: PlotPoints =
                                sampled.iter().map(|s| [s.time, value(s)]).collect();
                            Plot::new(name)
                                .width(cell_w)
                                .height(cell_h)
                                .x_axis_label("Time (s)")
                                .show(ui, |plot_ui| {
                                    plot_ui.line(Line::new(name, points));
                                });
                        });
                    }
                });
            }
        });
    }
}
