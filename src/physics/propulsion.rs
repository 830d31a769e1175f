use nalgebra::Vector3;

use crate::vehicle::Airframe;

/// Each engine delivers at most this fraction of the aircraft's weight.
pub const MAX_THRUST_FRACTION: f64 = 0.175;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropulsionLoads {
    pub thrust: [f64; 2],      // N, per engine
    pub force: Vector3<f64>,   // N, body frame
    pub moment: Vector3<f64>,  // N·m, about the cg
}

/// Thrust of one engine for a throttle setting already limited to [0, 1].
pub fn engine_thrust(throttle: f64, af: &Airframe) -> f64 {
    let weight = af.weight();
    (throttle * weight).min(MAX_THRUST_FRACTION * weight)
}

/// Forces and moments from both engines. Thrust acts along body x.
pub fn propulsion_loads(throttle: [f64; 2], af: &Airframe) -> PropulsionLoads {
    let thrust = [engine_thrust(throttle[0], af), engine_thrust(throttle[1], af)];

    let mut moment = Vector3::zeros();
    for (mount, f) in af.engine_mounts.iter().zip(thrust) {
        let arm = mount - af.r_cg;
        moment += arm.cross(&Vector3::new(f, 0.0, 0.0));
    }

    PropulsionLoads {
        thrust,
        force: Vector3::new(thrust[0] + thrust[1], 0.0, 0.0),
        moment,
    }
}
