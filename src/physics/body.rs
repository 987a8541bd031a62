use nalgebra::Vector3;
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;

use crate::errors::{BodyError, InvalidAtmosphereSnafu, InvalidGravParamSnafu, InvalidRadiusSnafu};

// ---------------------------------------------------------------------------
// Reference constants
// ---------------------------------------------------------------------------

pub const MU_EARTH: f64 = 3.986_004_418e14;   // m^3/s^2
pub const R_EARTH: f64 = 6_378_137.0;          // equatorial radius, m
pub const EARTH_ATMOSPHERE: f64 = 100_000.0;   // Karman line, m

pub const MU_SUN: f64 = 1.327_124_400_18e20;  // m^3/s^2
pub const R_SUN: f64 = 695_700_000.0;          // nominal radius, m

// ---------------------------------------------------------------------------
// Central body projection
// ---------------------------------------------------------------------------

/// The numeric projection of a celestial body that orbit math needs.
///
/// Bodies are owned by whoever models the celestial system; everything in this
/// crate only borrows them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentralBody {
    pub mu: f64,                  // gravitational parameter, m^3/s^2
    pub radius: f64,              // m
    pub atmosphere_altitude: f64, // top of the atmosphere above the surface, m
}

impl CentralBody {
    pub const EARTH: CentralBody = CentralBody {
        mu: MU_EARTH,
        radius: R_EARTH,
        atmosphere_altitude: EARTH_ATMOSPHERE,
    };

    pub const SUN: CentralBody = CentralBody {
        mu: MU_SUN,
        radius: R_SUN,
        atmosphere_altitude: 0.0,
    };

    /// Validated constructor for an airless body.
    pub fn new(mu: f64, radius: f64) -> Result<Self, BodyError> {
        ensure!(mu.is_finite() && mu > 0.0, InvalidGravParamSnafu { mu });
        ensure!(radius.is_finite() && radius >= 0.0, InvalidRadiusSnafu { radius });
        Ok(CentralBody {
            mu,
            radius,
            atmosphere_altitude: 0.0,
        })
    }

    pub fn with_atmosphere(self, altitude: f64) -> Result<Self, BodyError> {
        ensure!(
            altitude.is_finite() && altitude >= 0.0,
            InvalidAtmosphereSnafu { altitude }
        );
        Ok(CentralBody {
            atmosphere_altitude: altitude,
            ..self
        })
    }

    /// Lowest radius a trajectory may pass without touching surface or atmosphere.
    pub fn safe_radius(&self) -> f64 {
        self.radius + self.atmosphere_altitude
    }

    /// Point-mass gravitational acceleration at `pos` (body-centred inertial frame).
    pub fn acceleration(&self, pos: &Vector3<f64>) -> Vector3<f64> {
        let r = pos.norm();
        if r < 1.0 {
            return Vector3::zeros();
        }
        -self.mu / (r * r * r) * pos
    }
}
