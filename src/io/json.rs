use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::state::{Control, DivergencePolicy, SimConfig, State};
use crate::error::{Result, SimError};
use crate::sim::event::{AileronDeflection, Engine, SimulationEvents};
use crate::sim::Trajectory;
use crate::vehicle::{presets, AircraftParameters};

// ---------------------------------------------------------------------------
// Input documents
// ---------------------------------------------------------------------------

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Load a parameter mapping from a JSON or YAML file (chosen by extension).
pub fn load_parameters(path: impl AsRef<Path>) -> Result<AircraftParameters> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    if is_yaml(path) {
        AircraftParameters::from_yaml_value(serde_yaml::from_str(&text)?)
    } else {
        AircraftParameters::from_json_value(serde_json::from_str(&text)?)
    }
}

/// Parameters from `path`, or the default transport when none is given.
pub fn load_parameters_or_default(path: Option<&Path>) -> Result<AircraftParameters> {
    match path {
        Some(p) => load_parameters(p),
        None => Ok(presets::rcam()),
    }
}

/// Everything needed for one run, as written in a run file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFile {
    pub initial_state: Vec<f64>,
    pub control: Vec<f64>,
    pub total_time: f64,
    pub dt: f64,
    #[serde(default)]
    pub divergence: DivergencePolicy,
    #[serde(default)]
    pub deflection: Option<AileronDeflection>,
    #[serde(default)]
    pub failed_engine: Option<Engine>,
    /// Parameter file, relative to the run file.
    #[serde(default)]
    pub parameters: Option<PathBuf>,
}

/// Validated contents of a [`RunFile`].
#[derive(Debug, Clone)]
pub struct Scenario {
    pub params: AircraftParameters,
    pub initial: State,
    pub nominal: Control,
    pub config: SimConfig,
    pub events: SimulationEvents,
}

impl Scenario {
    /// Three minutes of near-level cruise at 85 m/s with both engines at 80 %.
    pub fn cruise() -> Self {
        Scenario {
            params: presets::rcam(),
            initial: State::new(
                Vector3::new(85.0, 0.0, 0.0),
                Vector3::zeros(),
                Vector3::new(0.0, 0.1, 0.0),
            ),
            nominal: Control {
                aileron: 0.0,
                elevator: -0.1,
                rudder: 0.0,
                throttle1: 0.8,
                throttle2: 0.8,
            },
            config: SimConfig::default(),
            events: SimulationEvents::none(),
        }
    }

    /// Load a run file, or fall back to [`Scenario::cruise`] when none is given.
    pub fn load_or_cruise(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => RunFile::load(p)?.into_scenario(p.parent()),
            None => Ok(Self::cruise()),
        }
    }
}

impl RunFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        if is_yaml(path) {
            Ok(serde_yaml::from_str(&text)?)
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }

    /// Check vector lengths and steps, and load the referenced parameters.
    pub fn into_scenario(self, base_dir: Option<&Path>) -> Result<Scenario> {
        let initial = State::from_slice(&self.initial_state)?;
        let nominal = Control::from_slice(&self.control)?;
        let config = SimConfig::new(self.total_time, self.dt).with_policy(self.divergence);
        config.validate()?;

        if let Some(d) = &self.deflection {
            if d.end_time < d.start_time {
                return Err(SimError::Validation(format!(
                    "deflection window ends ({}) before it starts ({})",
                    d.end_time, d.start_time
                )));
            }
        }

        let params_path = self.parameters.map(|p| match base_dir {
            Some(dir) if p.is_relative() => dir.join(p),
            _ => p,
        });

        Ok(Scenario {
            params: load_parameters_or_default(params_path.as_deref())?,
            initial,
            nominal,
            config,
            events: SimulationEvents {
                deflection: self.deflection,
                failed_engine: self.failed_engine,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Flight summary
// ---------------------------------------------------------------------------

/// Summary statistics computed from a trajectory.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub snapshots: usize,
    pub final_time: f64,
    pub max_airspeed: f64,
    pub max_abs_roll: f64,
    pub max_abs_pitch: f64,
    pub final_state: [f64; 9],
    pub diverged: bool,
    pub divergence_time: Option<f64>,
}

impl FlightSummary {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        let max_of = |f: &dyn Fn(&State) -> f64| {
            trajectory.iter().map(|s| f(&s.state)).fold(0.0_f64, f64::max)
        };

        FlightSummary {
            snapshots: trajectory.len(),
            final_time: trajectory.last().map_or(0.0, |s| s.time),
            max_airspeed: max_of(&|s: &State| s.vel.norm()),
            max_abs_roll: max_of(&|s: &State| s.roll().abs()),
            max_abs_pitch: max_of(&|s: &State| s.pitch().abs()),
            final_state: trajectory.last().map_or([0.0; 9], |s| s.state.to_array()),
            diverged: trajectory.diverged(),
            divergence_time: trajectory.divergence().map(|d| d.time),
        }
    }
}

/// Write flight summary as JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &FlightSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

/// Write flight summary JSON to a file.
pub fn write_summary_file(path: impl AsRef<Path>, summary: &FlightSummary) -> Result<()> {
    let mut file = fs::File::create(path)?;
    write_summary(&mut file, summary)
}
