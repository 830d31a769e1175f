use nalgebra::Matrix3;

use crate::dynamics::state::{Control, Deriv, State};
use crate::error::{Result, SimError};
use crate::physics::{aerodynamics, gravity, propulsion};
use crate::vehicle::{AircraftParameters, Airframe};

// ---------------------------------------------------------------------------
// 6DOF Equations of motion
// ---------------------------------------------------------------------------

/// Evaluate the state derivative straight from a parameter mapping.
///
/// Resolves and validates `params` on every call; loops should resolve once and
/// call [`derivatives`] instead.
pub fn evaluate_derivative(
    state: &State,
    control: &Control,
    params: &AircraftParameters,
) -> Result<Deriv> {
    let airframe = params.resolve()?;
    derivatives(state, control, &airframe)
}

/// Compute full 6DOF state derivatives.
///
/// Forces & moments:
///   1. Aerodynamics (stability frame → body, moments transferred to the cg)
///   2. Propulsion from two wing-mounted engines
///   3. Gravity
///
/// Controls are clamped here regardless of what the caller passes.
pub fn derivatives(state: &State, control: &Control, af: &Airframe) -> Result<Deriv> {
    let u = control.clamped();

    // --- Air data ---
    let va = state.airspeed();
    let alpha = state.alpha();
    let beta = state.beta();

    // --- Loads ---
    let aero = aerodynamics::aero_loads(alpha, beta, va, &state.omega, &u.surfaces(), af);
    let prop = propulsion::propulsion_loads([u.throttle1, u.throttle2], af);
    let f_gravity = gravity::gravity_force(state.roll(), state.pitch(), af.mass);

    let force = aero.force + prop.force + f_gravity;
    let moment = aero.moment + prop.moment;

    // --- Translational: dV/dt = F/m - omega × V ---
    let dvel = force / af.mass - state.omega.cross(&state.vel);

    // --- Euler's equation: I * domega = M - omega × (I * omega) ---
    let domega = af.inertia_inv * (moment - state.omega.cross(&(af.inertia * state.omega)));

    // --- Attitude kinematics ---
    let deuler = euler_kinematics(state.roll(), state.pitch()) * state.omega;

    let d = Deriv { dvel, domega, deuler };
    if !d.is_finite() {
        return Err(SimError::Numerical(format!(
            "non-finite state derivative (theta = {:.4} rad, Va = {:.4} m/s)",
            state.pitch(),
            va
        )));
    }
    Ok(d)
}

/// Maps body rates to Euler angle rates. Singular at theta = ±90°.
pub fn euler_kinematics(phi: f64, theta: f64) -> Matrix3<f64> {
    let (sp, cp) = phi.sin_cos();
    let (tt, ct) = (theta.tan(), theta.cos());
    Matrix3::new(
        1.0, sp * tt, cp * tt,
        0.0, cp, -sp,
        0.0, sp / ct, cp / ct,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
