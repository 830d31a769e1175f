use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.80665; // standard gravity, m/s^2
pub const RHO: f64 = 1.225; // sea-level air density, kg/m^3
pub const AIRSPEED_FLOOR: f64 = 1e-6; // m/s, lower bound for airspeed divisors

/// Control surface authority, rad (±25°).
pub const MAX_DEFLECTION: f64 = 25.0 * std::f64::consts::PI / 180.0;

// ---------------------------------------------------------------------------
// Rigid-body state
// ---------------------------------------------------------------------------

/// Body-frame aircraft state.
///
/// Flat ordering is `[u, v, w, p, q, r, phi, theta, psi]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub vel: Vector3<f64>,   // m/s   [u, v, w]
    pub omega: Vector3<f64>, // rad/s [p, q, r]
    pub euler: Vector3<f64>, // rad   [phi, theta, psi]
}

impl State {
    pub const LEN: usize = 9;

    pub fn new(vel: Vector3<f64>, omega: Vector3<f64>, euler: Vector3<f64>) -> Self {
        Self { vel, omega, euler }
    }

    /// Build from a flat `[u, v, w, p, q, r, phi, theta, psi]` slice.
    pub fn from_slice(x: &[f64]) -> Result<Self> {
        if x.len() != Self::LEN {
            return Err(SimError::Validation(format!(
                "state vector must have {} components, got {}",
                Self::LEN,
                x.len()
            )));
        }
        Ok(Self {
            vel: Vector3::new(x[0], x[1], x[2]),
            omega: Vector3::new(x[3], x[4], x[5]),
            euler: Vector3::new(x[6], x[7], x[8]),
        })
    }

    pub fn to_array(&self) -> [f64; 9] {
        [
            self.vel.x, self.vel.y, self.vel.z,
            self.omega.x, self.omega.y, self.omega.z,
            self.euler.x, self.euler.y, self.euler.z,
        ]
    }

    /// Explicit Euler update: `self + d * dt`.
    pub fn apply(&self, d: &Deriv, dt: f64) -> State {
        State {
            vel: self.vel + d.dvel * dt,
            omega: self.omega + d.domega * dt,
            euler: self.euler + d.deuler * dt,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|x| x.is_finite())
    }

    /// True airspeed magnitude, floored at [`AIRSPEED_FLOOR`].
    pub fn airspeed(&self) -> f64 {
        let va = self.vel.norm();
        if va < AIRSPEED_FLOOR {
            AIRSPEED_FLOOR
        } else {
            va
        }
    }

    /// Angle of attack (rad).
    pub fn alpha(&self) -> f64 {
        self.vel.z.atan2(self.vel.x)
    }

    /// Sideslip angle (rad). The ratio is clamped so asin never leaves its domain.
    pub fn beta(&self) -> f64 {
        (self.vel.y / self.airspeed()).clamp(-1.0, 1.0).asin()
    }

    pub fn roll(&self) -> f64 {
        self.euler.x
    }

    pub fn pitch(&self) -> f64 {
        self.euler.y
    }

    pub fn yaw(&self) -> f64 {
        self.euler.z
    }
}

// ---------------------------------------------------------------------------
// State derivative
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deriv {
    pub dvel: Vector3<f64>,   // linear acceleration, body frame
    pub domega: Vector3<f64>, // angular acceleration, body frame
    pub deuler: Vector3<f64>, // Euler angle rates
}

impl Deriv {
    pub fn to_array(&self) -> [f64; 9] {
        [
            self.dvel.x, self.dvel.y, self.dvel.z,
            self.domega.x, self.domega.y, self.domega.z,
            self.deuler.x, self.deuler.y, self.deuler.z,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|x| x.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Pilot controls
// ---------------------------------------------------------------------------

/// Flat ordering is `[aileron, elevator, rudder, throttle1, throttle2]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub aileron: f64,   // rad
    pub elevator: f64,  // rad
    pub rudder: f64,    // rad
    pub throttle1: f64, // [0, 1]
    pub throttle2: f64, // [0, 1]
}

impl Control {
    pub const LEN: usize = 5;

    pub fn from_slice(u: &[f64]) -> Result<Self> {
        if u.len() != Self::LEN {
            return Err(SimError::Validation(format!(
                "control vector must have {} components, got {}",
                Self::LEN,
                u.len()
            )));
        }
        Ok(Self {
            aileron: u[0],
            elevator: u[1],
            rudder: u[2],
            throttle1: u[3],
            throttle2: u[4],
        })
    }

    pub fn to_array(&self) -> [f64; 5] {
        [self.aileron, self.elevator, self.rudder, self.throttle1, self.throttle2]
    }

    /// Surfaces limited to ±25°, throttles to [0, 1].
    pub fn clamped(&self) -> Control {
        Control {
            aileron: self.aileron.clamp(-MAX_DEFLECTION, MAX_DEFLECTION),
            elevator: self.elevator.clamp(-MAX_DEFLECTION, MAX_DEFLECTION),
            rudder: self.rudder.clamp(-MAX_DEFLECTION, MAX_DEFLECTION),
            throttle1: self.throttle1.clamp(0.0, 1.0),
            throttle2: self.throttle2.clamp(0.0, 1.0),
        }
    }

    pub fn surfaces(&self) -> Vector3<f64> {
        Vector3::new(self.aileron, self.elevator, self.rudder)
    }
}

// ---------------------------------------------------------------------------
// Aerodynamic angles (logged, never fed back)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AeroAngles {
    pub alpha: f64, // rad
    pub beta: f64,  // rad
    pub gamma: f64, // rad, flight-path angle = theta - alpha
    pub time: f64,  // s
}

impl AeroAngles {
    pub fn from_state(state: &State, time: f64) -> Self {
        let alpha = state.alpha();
        AeroAngles {
            alpha,
            beta: state.beta(),
            gamma: state.pitch() - alpha,
            time,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

/// What the integrator does once the trajectory leaves the physical envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergencePolicy {
    /// Flag and log, keep integrating to the configured end time.
    #[default]
    ObserveOnly,
    /// Stop with [`SimError::Diverged`] at the first out-of-envelope state.
    AbortOnDivergence,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub dt: f64,         // integration timestep, s
    pub total_time: f64, // simulated time, s
    #[serde(default)]
    pub divergence: DivergencePolicy,
}

impl SimConfig {
    pub fn new(total_time: f64, dt: f64) -> Self {
        Self { dt, total_time, divergence: DivergencePolicy::ObserveOnly }
    }

    pub fn with_policy(mut self, policy: DivergencePolicy) -> Self {
        self.divergence = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::Validation(format!("dt must be positive, got {}", self.dt)));
        }
        if !(self.total_time.is_finite() && self.total_time > 0.0) {
            return Err(SimError::Validation(format!(
                "total time must be positive, got {}",
                self.total_time
            )));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,           // 100 Hz
            total_time: 180.0,  // 3 min
            divergence: DivergencePolicy::ObserveOnly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn clamp_bounds_every_channel() {
        let wild = Control {
            aileron: 3.0,
            elevator: -40.0,
            rudder: 1e9,
            throttle1: -0.5,
            throttle2: 7.0,
        };
        let c = wild.clamped();
        for d in [c.aileron, c.elevator, c.rudder] {
            assert!(d.abs() <= MAX_DEFLECTION);
        }
        assert_eq!(c.aileron, MAX_DEFLECTION);
        assert_eq!(c.elevator, -MAX_DEFLECTION);
        assert_eq!(c.throttle1, 0.0);
        assert_eq!(c.throttle2, 1.0);
    }

    #[test]
    fn clamp_leaves_valid_controls_alone() {
        let c = Control::from_slice(&[0.01, -0.1, 0.0, 0.8, 0.3]).unwrap();
        assert_eq!(c.clamped(), c);
    }

    #[test]
    fn airspeed_floor_at_rest() {
        let s = State::from_slice(&[0.0, 1e-9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(s.airspeed(), AIRSPEED_FLOOR);
    }

    #[test]
    fn beta_defined_below_airspeed_floor() {
        let s = State::from_slice(&[0.0, 5e-7, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let beta = s.beta();
        assert!(beta.is_finite());
        assert!(beta <= std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn wrong_lengths_rejected() {
        assert!(matches!(State::from_slice(&[1.0; 8]), Err(SimError::Validation(_))));
        assert!(matches!(Control::from_slice(&[1.0; 6]), Err(SimError::Validation(_))));
    }

    #[test]
    fn config_rejects_bad_steps() {
        assert!(SimConfig::new(1.0, 0.0).validate().is_err());
        assert!(SimConfig::new(-1.0, 0.1).validate().is_err());
        assert!(SimConfig::new(1.0, f64::NAN).validate().is_err());
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn flight_path_angle() {
        let s = State::from_slice(&[85.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.1, 0.0]).unwrap();
        let a = AeroAngles::from_state(&s, 0.5);
        assert_relative_eq!(a.alpha, (5.0_f64).atan2(85.0));
        assert_relative_eq!(a.gamma, 0.1 - a.alpha);
        assert_eq!(a.time, 0.5);
    }
}
