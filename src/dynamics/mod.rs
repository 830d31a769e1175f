pub mod state;
pub mod sixdof;

pub use sixdof::{derivatives, euler_kinematics, evaluate_derivative};
