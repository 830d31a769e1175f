use crate::dynamics;
use crate::dynamics::state::{Control, State};
use crate::error::Result;
use crate::vehicle::Airframe;

// ---------------------------------------------------------------------------
// Explicit Euler integrator with constant control over the step
// ---------------------------------------------------------------------------

/// Single first-order step: `x(t + dt) = x(t) + f(x, u) * dt`.
pub fn euler_step(state: &State, control: &Control, airframe: &Airframe, dt: f64) -> Result<State> {
    let d = dynamics::derivatives(state, control, airframe)?;
    Ok(state.apply(&d, dt))
}
