pub mod error;
pub mod physics;
pub mod dynamics;
pub mod vehicle;
pub mod sim;
pub mod io;

pub use dynamics::evaluate_derivative;
pub use error::{Result, SimError};
pub use sim::{integrate, integrate_with, Trajectory};

pub mod types {
    pub use crate::dynamics::state::{
        AeroAngles, Control, Deriv, DivergencePolicy, SimConfig, State, AIRSPEED_FLOOR, G0,
        MAX_DEFLECTION, RHO,
    };
    pub use crate::sim::event::{AileronDeflection, Engine, SimulationEvents};
    pub use crate::vehicle::{AircraftParameters, Airframe, ParamValue};
}
