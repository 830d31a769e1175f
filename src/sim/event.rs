use serde::{Deserialize, Serialize};

use crate::dynamics::state::Control;
use crate::error::SimError;

// ---------------------------------------------------------------------------
// Scheduled control events
// ---------------------------------------------------------------------------

/// Temporary aileron input added on top of the nominal aileron.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AileronDeflection {
    pub magnitude_deg: f64,
    pub start_time: f64, // s, inclusive
    pub end_time: f64,   // s, inclusive
}

impl AileronDeflection {
    pub fn active_at(&self, time: f64) -> bool {
        self.start_time <= time && time <= self.end_time
    }
}

/// Engine that stays shut down for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Engine {
    One,
    Two,
}

impl TryFrom<u8> for Engine {
    type Error = SimError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Engine::One),
            2 => Ok(Engine::Two),
            other => Err(SimError::Validation(format!(
                "engine index must be 1 or 2, got {other}"
            ))),
        }
    }
}

impl From<Engine> for u8 {
    fn from(e: Engine) -> u8 {
        match e {
            Engine::One => 1,
            Engine::Two => 2,
        }
    }
}

/// Event configuration for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvents {
    #[serde(default)]
    pub deflection: Option<AileronDeflection>,
    #[serde(default)]
    pub failed_engine: Option<Engine>,
}

impl SimulationEvents {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_deflection(mut self, magnitude_deg: f64, start_time: f64, end_time: f64) -> Self {
        self.deflection = Some(AileronDeflection { magnitude_deg, start_time, end_time });
        self
    }

    pub fn with_failed_engine(mut self, engine: Engine) -> Self {
        self.failed_engine = Some(engine);
        self
    }

    /// Control applied at `time`, rebuilt from the nominal vector on every call.
    ///
    /// The deflection is added before the failure override, so an engine that is
    /// out stays at zero throttle regardless of the nominal setting.
    pub fn effective_control(&self, nominal: &Control, time: f64) -> Control {
        let mut u = *nominal;

        if let Some(d) = self.deflection {
            if d.magnitude_deg != 0.0 && d.active_at(time) {
                u.aileron += d.magnitude_deg.to_radians();
            }
        }

        match self.failed_engine {
            Some(Engine::One) => u.throttle1 = 0.0,
            Some(Engine::Two) => u.throttle2 = 0.0,
            None => {}
        }

        u
    }
}
