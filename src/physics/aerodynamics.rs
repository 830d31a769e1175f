use nalgebra::{Matrix3, Vector3};

use crate::dynamics::state::RHO;
use crate::vehicle::Airframe;

// ---------------------------------------------------------------------------
// Model constants
// ---------------------------------------------------------------------------

/// Angle of attack where the wing-body lift curve leaves its linear region.
pub const STALL_ALPHA: f64 = 14.5 / 180.0 * std::f64::consts::PI;

/// Post-stall cubic: CL = A0 + A1·α + A2·α² + A3·α³
const STALL_A0: f64 = 15.212;
const STALL_A1: f64 = -155.2;
const STALL_A2: f64 = 609.2;
const STALL_A3: f64 = -768.5;

const DOWNWASH_SLOPE: f64 = 0.25; // dε/dα
const TAIL_LIFT_SLOPE: f64 = 3.1; // per rad

/// Lift-curve branch selected by angle of attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiftRegime {
    Linear,
    Stall,
}

impl LiftRegime {
    pub fn at(alpha: f64) -> Self {
        if alpha <= STALL_ALPHA {
            LiftRegime::Linear
        } else {
            LiftRegime::Stall
        }
    }
}

/// Non-dimensional coefficients in the stability frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroCoefficients {
    pub cl: f64,
    pub cd: f64,
    pub cy: f64,
    /// Roll, pitch and yaw moment coefficients about the aerodynamic centre.
    pub cm_ac: Vector3<f64>,
}

/// Aerodynamic force and moment about the cg, body frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroLoads {
    pub force: Vector3<f64>,
    pub moment: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// Coefficients
// ---------------------------------------------------------------------------

/// Wing-body lift coefficient.
pub fn wing_body_lift(alpha: f64, af: &Airframe) -> f64 {
    match LiftRegime::at(alpha) {
        LiftRegime::Linear => af.lift_slope * (alpha - af.alpha0),
        LiftRegime::Stall => {
            STALL_A0 + STALL_A1 * alpha + STALL_A2 * alpha.powi(2) + STALL_A3 * alpha.powi(3)
        }
    }
}

/// Downwash angle at the tail (rad).
pub fn downwash(alpha: f64, af: &Airframe) -> f64 {
    DOWNWASH_SLOPE * (alpha - af.alpha0)
}

/// Full coefficient set.
///
/// `surfaces` is `[aileron, elevator, rudder]` (rad, already clamped), `omega` the
/// body rates and `va` the floored airspeed.
pub fn coefficients(
    alpha: f64,
    beta: f64,
    va: f64,
    omega: &Vector3<f64>,
    surfaces: &Vector3<f64>,
    af: &Airframe,
) -> AeroCoefficients {
    let epsilon = downwash(alpha, af);

    // Tail lift
    let alpha_t = alpha - epsilon + surfaces.y + 1.3 * omega.y * af.tail_arm / va;
    let cl_t = af.tail_area / af.wing_area * TAIL_LIFT_SLOPE * alpha_t;

    let cl = wing_body_lift(alpha, af) + cl_t;
    let cd = 0.13 + 0.0061 * (af.lift_slope * alpha + 0.645).powi(2);
    let cy = -1.6 * beta + 0.24 * surfaces.z;

    // Moments about the aerodynamic centre
    let tail_volume = af.tail_area * af.tail_arm / (af.wing_area * af.mac);
    let eta = Vector3::new(
        -1.4 * beta,
        -0.59 - TAIL_LIFT_SLOPE * tail_volume * (alpha - epsilon),
        (1.0 - alpha * 180.0 / (15.0 * std::f64::consts::PI)) * beta,
    );
    let dcm_dx = af.mac / va
        * Matrix3::new(
            -11.0, 0.0, 5.0,
            0.0, -4.03 * af.tail_area * af.tail_arm.powi(2) / (af.wing_area * af.mac.powi(2)), 0.0,
            1.7, 0.0, -11.5,
        );
    let dcm_du = Matrix3::new(
        -0.6, 0.0, 0.22,
        0.0, -TAIL_LIFT_SLOPE * tail_volume, 0.0,
        0.0, 0.0, -0.63,
    );

    AeroCoefficients {
        cl,
        cd,
        cy,
        cm_ac: eta + dcm_dx * omega + dcm_du * surfaces,
    }
}

// ---------------------------------------------------------------------------
// Frames and loads
// ---------------------------------------------------------------------------

/// Stability-frame → body-frame rotation.
pub fn stability_to_body(alpha: f64) -> Matrix3<f64> {
    let (s, c) = alpha.sin_cos();
    Matrix3::new(
        c, 0.0, -s,
        0.0, 1.0, 0.0,
        s, 0.0, c,
    )
}

pub fn dynamic_pressure(va: f64) -> f64 {
    0.5 * RHO * va * va
}

/// Aerodynamic force and cg moment in the body frame.
pub fn aero_loads(
    alpha: f64,
    beta: f64,
    va: f64,
    omega: &Vector3<f64>,
    surfaces: &Vector3<f64>,
    af: &Airframe,
) -> AeroLoads {
    let coef = coefficients(alpha, beta, va, omega, surfaces, af);
    let q_s = dynamic_pressure(va) * af.wing_area;

    let force_stab = q_s * Vector3::new(-coef.cd, coef.cy, -coef.cl);
    let force = stability_to_body(alpha) * force_stab;

    let moment_ac = coef.cm_ac * (af.mac * q_s);
    let moment = moment_ac + force.cross(&(af.r_cg - af.r_ac));

    AeroLoads { force, moment }
}
