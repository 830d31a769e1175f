pub mod integrator;
pub mod runner;
pub mod event;

pub use runner::{integrate, integrate_with, out_of_envelope, warn_due, Divergence, Snapshot, Trajectory};
pub use integrator::euler_step;
pub use event::{AileronDeflection, Engine, SimulationEvents};
