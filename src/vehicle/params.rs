use std::collections::BTreeMap;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Reserved key for the mass-normalised inertia tensor.
pub const INERTIA_KEY: &str = "inertia_matrix";

// cg and aerodynamic-centre stations as fractions of the mean chord
const DEFAULT_CG_X: f64 = 0.23;
const DEFAULT_CG_Z: f64 = 0.10;
const DEFAULT_AC_X: f64 = 0.12;

// ---------------------------------------------------------------------------
// Raw parameter mapping
// ---------------------------------------------------------------------------

/// A single named parameter: a scalar or a 3x3 matrix (row major).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Matrix([[f64; 3]; 3]),
}

/// Name → value mapping of physical constants, immutable during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AircraftParameters {
    values: BTreeMap<String, ParamValue>,
}

impl AircraftParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts only a top-level object; anything else is a validation failure.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(SimError::Validation(
                "aircraft parameters must be a key-value mapping".into(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_yaml_value(value: serde_yaml::Value) -> Result<Self> {
        if !value.is_mapping() {
            return Err(SimError::Validation(
                "aircraft parameters must be a key-value mapping".into(),
            ));
        }
        Ok(serde_yaml::from_value(value)?)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) -> Option<ParamValue> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn scalar(&self, key: &str) -> Result<f64> {
        match self.values.get(key) {
            Some(ParamValue::Scalar(v)) if v.is_finite() => Ok(*v),
            Some(ParamValue::Scalar(v)) => Err(SimError::Validation(format!(
                "parameter '{key}' is not finite ({v})"
            ))),
            Some(ParamValue::Matrix(_)) => Err(SimError::Validation(format!(
                "parameter '{key}' must be a scalar"
            ))),
            None => Err(SimError::Validation(format!("missing parameter '{key}'"))),
        }
    }

    /// Like [`scalar`](Self::scalar) but absent keys fall back to `default`.
    pub fn scalar_or(&self, key: &str, default: f64) -> Result<f64> {
        if self.values.contains_key(key) {
            self.scalar(key)
        } else {
            Ok(default)
        }
    }

    pub fn matrix(&self, key: &str) -> Result<Matrix3<f64>> {
        match self.values.get(key) {
            Some(ParamValue::Matrix(rows)) => {
                let m = Matrix3::from_fn(|i, j| rows[i][j]);
                if m.iter().all(|x| x.is_finite()) {
                    Ok(m)
                } else {
                    Err(SimError::Validation(format!("parameter '{key}' has non-finite entries")))
                }
            }
            Some(ParamValue::Scalar(_)) => Err(SimError::Validation(format!(
                "parameter '{key}' must be a 3x3 matrix"
            ))),
            None => Err(SimError::Validation(format!("missing parameter '{key}'"))),
        }
    }

    /// Resolve the mapping into typed constants, inverting the inertia tensor once.
    pub fn resolve(&self) -> Result<Airframe> {
        Airframe::from_params(self)
    }
}

// ---------------------------------------------------------------------------
// Typed, validated view used on the hot path
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Airframe {
    pub mass: f64,                // kg
    pub inertia: Matrix3<f64>,    // kg·m^2, body frame
    pub inertia_inv: Matrix3<f64>,
    pub lift_slope: f64,          // n, per rad
    pub alpha0: f64,              // zero-lift angle of attack, rad
    pub wing_area: f64,           // s, m^2
    pub tail_area: f64,           // s_t, m^2
    pub tail_arm: f64,            // l_t, m
    pub mac: f64,                 // mean aerodynamic chord, m
    pub r_cg: Vector3<f64>,       // m
    pub r_ac: Vector3<f64>,       // m
    pub engine_mounts: [Vector3<f64>; 2], // m
}

impl Airframe {
    pub fn from_params(params: &AircraftParameters) -> Result<Self> {
        let mass = params.scalar("m")?;
        if mass <= 0.0 {
            return Err(SimError::Validation(format!("mass must be positive, got {mass}")));
        }
        let mac = params.scalar("mac")?;
        let wing_area = params.scalar("s")?;
        if mac <= 0.0 || wing_area <= 0.0 {
            return Err(SimError::Validation(
                "reference chord and wing area must be positive".into(),
            ));
        }

        let inertia = params.matrix(INERTIA_KEY)? * mass;
        let inertia_inv = inertia.try_inverse().ok_or_else(|| {
            SimError::Numerical("inertia tensor is singular".into())
        })?;
        if !inertia_inv.iter().all(|x| x.is_finite()) {
            return Err(SimError::Numerical("inertia tensor inverse is not finite".into()));
        }

        let mount = |i: u8| -> Result<Vector3<f64>> {
            Ok(Vector3::new(
                params.scalar(&format!("x_apt{i}"))?,
                params.scalar(&format!("y_apt{i}"))?,
                params.scalar(&format!("z_apt{i}"))?,
            ))
        };

        Ok(Airframe {
            mass,
            inertia,
            inertia_inv,
            lift_slope: params.scalar("n")?,
            alpha0: params.scalar("alpha0")?,
            wing_area,
            tail_area: params.scalar("s_t")?,
            tail_arm: params.scalar("l_t")?,
            mac,
            r_cg: Vector3::new(
                params.scalar_or("cg_x", DEFAULT_CG_X)? * mac,
                0.0,
                params.scalar_or("cg_z", DEFAULT_CG_Z)? * mac,
            ),
            r_ac: Vector3::new(params.scalar_or("ac_x", DEFAULT_AC_X)? * mac, 0.0, 0.0),
            engine_mounts: [mount(1)?, mount(2)?],
        })
    }

    pub fn weight(&self) -> f64 {
        self.mass * crate::dynamics::state::G0
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct ParametersBuilder {
    params: AircraftParameters,
}

impl ParametersBuilder {
    pub fn new() -> Self {
        Self { params: AircraftParameters::new() }
    }

    /// Start from an existing set, overriding selected entries.
    pub fn starting_from(params: AircraftParameters) -> Self {
        Self { params }
    }

    pub fn scalar(mut self, key: impl Into<String>, v: f64) -> Self {
        self.params.insert(key, ParamValue::Scalar(v));
        self
    }

    pub fn inertia(mut self, rows: [[f64; 3]; 3]) -> Self {
        self.params.insert(INERTIA_KEY, ParamValue::Matrix(rows));
        self
    }

    pub fn build(self) -> AircraftParameters {
        self.params
    }
}

impl Default for ParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Preset parameter sets
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// Twin-engine civil transport (RCAM). Used whenever no parameter file is given.
    pub fn rcam() -> AircraftParameters {
        ParametersBuilder::new()
            .scalar("m", 120_000.0)
            .inertia([
                [40.07, 0.0, -2.0923],
                [0.0, 64.0, 0.0],
                [-2.0923, 0.0, 99.92],
            ])
            .scalar("n", 5.5)
            .scalar("alpha0", -11.5_f64.to_radians())
            .scalar("s", 260.0)
            .scalar("s_t", 64.0)
            .scalar("l_t", 24.8)
            .scalar("mac", 6.6)
            .scalar("x_apt1", 0.0)
            .scalar("y_apt1", -7.94)
            .scalar("z_apt1", -1.9)
            .scalar("x_apt2", 0.0)
            .scalar("y_apt2", 7.94)
            .scalar("z_apt2", -1.9)
            .build()
    }
}
