pub mod aerodynamics;
pub mod gravity;
pub mod propulsion;
