use nalgebra::Vector3;

use crate::dynamics::state::G0;

/// Gravitational force in the body frame for roll `phi` and pitch `theta`.
pub fn gravity_force(phi: f64, theta: f64, mass: f64) -> Vector3<f64> {
    mass * Vector3::new(
        -G0 * theta.sin(),
        G0 * theta.cos() * phi.sin(),
        G0 * theta.cos() * phi.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn level_attitude_points_down() {
        let f = gravity_force(0.0, 0.0, 2.0);
        assert_relative_eq!(f, Vector3::new(0.0, 0.0, 2.0 * G0));
    }

    #[test]
    fn magnitude_independent_of_attitude() {
        let f = gravity_force(0.4, -0.3, 10.0);
        assert_relative_eq!(f.norm(), 10.0 * G0, epsilon = 1e-9);
    }

    #[test]
    fn nose_up_pulls_back() {
        let f = gravity_force(0.0, 0.2, 1.0);
        assert!(f.x < 0.0);
    }
}
