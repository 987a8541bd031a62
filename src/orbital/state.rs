use nalgebra::Vector3;
use serde_derive::{Deserialize, Serialize};

use crate::physics::CentralBody;

use super::elements::OrbitElements;

/// Cartesian orbital state vector (position, velocity) relative to a central body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub pos: Vector3<f64>, // m, body-centred inertial
    pub vel: Vector3<f64>, // m/s
}

impl StateVector {
    pub fn new(pos: Vector3<f64>, vel: Vector3<f64>) -> Self {
        StateVector { pos, vel }
    }

    pub fn radius(&self) -> f64 {
        self.pos.norm()
    }

    pub fn speed(&self) -> f64 {
        self.vel.norm()
    }

    pub fn altitude(&self, body: &CentralBody) -> f64 {
        self.pos.norm() - body.radius
    }

    /// Specific angular momentum vector (orbit normal).
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.pos.cross(&self.vel)
    }

    pub fn to_elements<'a>(&self, body: &'a CentralBody) -> OrbitElements<'a> {
        OrbitElements::from_state_vector(&self.pos, &self.vel, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn altitude_above_surface() {
        let body = CentralBody::EARTH;
        let osv = StateVector::new(
            Vector3::new(body.radius + 400_000.0, 0.0, 0.0),
            Vector3::new(0.0, 7_670.0, 0.0),
        );
        assert!((osv.altitude(&body) - 400_000.0).abs() < 1e-6);
        assert!((osv.speed() - 7_670.0).abs() < 1e-9);
        assert!(osv.angular_momentum().z > 0.0);
    }
}
