//! Named policies for the singular geometries of element conversion.
//!
//! Element sets are undefined for equatorial orbits (no ascending node) and for
//! circular orbits (no periapsis). Conversions classify the geometry first and
//! then branch on the classification, so each case can be exercised on its own.

use nalgebra::Vector3;

/// Node vector magnitude, relative to |h|, below which the orbit counts as equatorial.
pub const NODE_EPSILON: f64 = 1e-15;

/// How the orbital plane meets the reference plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeGeometry {
    /// Planes intersect along a well defined line of nodes.
    Inclined,
    /// Orbit lies in the reference plane, moving counter-clockwise about the pole.
    EquatorialPrograde,
    /// Orbit lies in the reference plane, moving clockwise about the pole.
    EquatorialRetrograde,
}

impl NodeGeometry {
    /// Classify from the specific angular momentum (orbit normal) vector.
    pub fn classify(h: &Vector3<f64>) -> Self {
        let node = Vector3::z().cross(h);
        if node.norm() > NODE_EPSILON * h.norm() {
            NodeGeometry::Inclined
        } else if h.z > 0.0 {
            NodeGeometry::EquatorialPrograde
        } else {
            NodeGeometry::EquatorialRetrograde
        }
    }

    pub fn is_equatorial(self) -> bool {
        self != NodeGeometry::Inclined
    }
}

/// Whether the eccentricity vector defines a periapsis direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccentricityGeometry {
    Eccentric,
    /// Eccentricity vector is exactly zero: angles are measured from the node line instead.
    Circular,
}

impl EccentricityGeometry {
    pub fn classify(ecc: f64) -> Self {
        if ecc == 0.0 {
            EccentricityGeometry::Circular
        } else {
            EccentricityGeometry::Eccentric
        }
    }
}
