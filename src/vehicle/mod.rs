pub mod params;

pub use params::{presets, AircraftParameters, Airframe, ParamValue, ParametersBuilder, INERTIA_KEY};
