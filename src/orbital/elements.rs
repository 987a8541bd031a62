use std::f64::consts::{FRAC_PI_2, PI, TAU};

use log::{debug, warn};
use nalgebra::{Rotation2, Rotation3, Vector2, Vector3};
use serde_derive::Serialize;

use crate::config::SolverConfig;
use crate::physics::CentralBody;

use super::degenerate::{EccentricityGeometry, NodeGeometry};
use super::state::StateVector;

/// Exactly-zero eccentricity and inclination are replaced by this value so that
/// node and eccentricity vectors never vanish on the way to a state vector and back.
pub const ELEMENT_EPSILON: f64 = 1e-12;

/// Wrap an angle into [0, 2pi).
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// `acos` with its argument clamped to [-1, 1] to absorb floating-point overshoot.
pub(crate) fn acos_clamped(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).acos()
}

/// Flight path angle (angle of the velocity above the local horizontal), rad.
pub fn flight_path_angle(ecc: f64, true_anom: f64) -> f64 {
    (ecc * true_anom.sin() / (1.0 + ecc * true_anom.cos())).atan()
}

/// Perifocal velocity from speed, true anomaly and flight path angle.
pub fn perifocal_velocity(speed: f64, true_anom: f64, flight_path: f64) -> Vector2<f64> {
    // Local horizontal sits a quarter turn ahead of the radius; climb tilts it back.
    Rotation2::new(true_anom + FRAC_PI_2 - flight_path) * Vector2::new(speed, 0.0)
}

/// 3-1-3 rotation taking perifocal coordinates into the reference frame.
pub fn perifocal_to_inertial(raan: f64, argp: f64, inc: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), raan)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), inc)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), argp)
}

/// Classical orbital elements around a borrowed central body.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrbitElements<'a> {
    pub sma: f64,       // semi-major axis, m (negative for hyperbolas)
    pub ecc: f64,       // eccentricity
    pub inc: f64,       // inclination, rad
    pub raan: f64,      // right ascension of ascending node, rad
    pub argp: f64,      // argument of periapsis, rad
    pub true_anom: f64, // true anomaly, rad in [0, 2pi)
    pub body: &'a CentralBody,
}

impl<'a> OrbitElements<'a> {
    pub fn from_elements(
        sma: f64,
        ecc: f64,
        inc: f64,
        raan: f64,
        argp: f64,
        true_anom: f64,
        body: &'a CentralBody,
    ) -> Self {
        OrbitElements {
            sma,
            ecc: if ecc == 0.0 { ELEMENT_EPSILON } else { ecc },
            inc: if inc == 0.0 { ELEMENT_EPSILON } else { inc },
            raan,
            argp,
            true_anom: wrap_angle(true_anom),
            body,
        }
    }

    /// Orbit through two apsides; orientation and position along the orbit are left at zero.
    pub fn from_apsides(apsis1: f64, apsis2: f64, inc: f64, body: &'a CentralBody) -> Self {
        let (apo, peri) = if apsis1 > apsis2 {
            (apsis1, apsis2)
        } else {
            (apsis2, apsis1)
        };
        Self::from_elements(
            (apo + peri) / 2.0,
            (apo - peri) / (apo + peri),
            inc,
            0.0,
            0.0,
            0.0,
            body,
        )
    }

    /// Convert a body-centred state vector to elements.
    pub fn from_state_vector(
        pos: &Vector3<f64>,
        vel: &Vector3<f64>,
        body: &'a CentralBody,
    ) -> Self {
        let mu = body.mu;
        let r = pos.norm();
        let v = vel.norm();
        let v_r = pos.dot(vel) / r;

        let sma = 1.0 / (2.0 / r - v * v / mu);

        let h = pos.cross(vel);
        let h_hat = h.normalize();
        let e_vec = vel.cross(&h) / mu - pos / r;
        let ecc = e_vec.norm();

        let node = Vector3::z().cross(&h);
        let node_geometry = NodeGeometry::classify(&h);
        let ecc_geometry = EccentricityGeometry::classify(ecc);

        let (raan, inc, argp) = match node_geometry {
            NodeGeometry::Inclined => {
                let n_hat = node.normalize();
                let raan = if n_hat.y >= 0.0 {
                    acos_clamped(n_hat.x)
                } else {
                    TAU - acos_clamped(n_hat.x)
                };
                let inc = acos_clamped(h_hat.z);
                let argp = match ecc_geometry {
                    EccentricityGeometry::Circular => 0.0,
                    EccentricityGeometry::Eccentric => {
                        let w = acos_clamped(n_hat.dot(&e_vec) / ecc);
                        if e_vec.z >= 0.0 {
                            w
                        } else {
                            TAU - w
                        }
                    }
                };
                (raan, inc, argp)
            }
            NodeGeometry::EquatorialPrograde | NodeGeometry::EquatorialRetrograde => {
                debug!("equatorial orbit ({node_geometry:?}): RAAN fixed at 0");
                let inc = if node_geometry == NodeGeometry::EquatorialPrograde {
                    0.0
                } else {
                    PI
                };
                let argp = match ecc_geometry {
                    EccentricityGeometry::Circular => 0.0,
                    EccentricityGeometry::Eccentric => {
                        let w = acos_clamped(e_vec.x / ecc);
                        if h.z * e_vec.y > 0.0 {
                            w
                        } else {
                            TAU - w
                        }
                    }
                };
                (0.0, inc, argp)
            }
        };

        let true_anom = match ecc_geometry {
            EccentricityGeometry::Eccentric => {
                let nu = acos_clamped(e_vec.dot(pos) / (ecc * r));
                if v_r >= 0.0 {
                    nu
                } else {
                    TAU - nu
                }
            }
            EccentricityGeometry::Circular => {
                debug!("circular orbit: true anomaly measured from the line of nodes");
                let reference = if node_geometry.is_equatorial() {
                    Vector3::x()
                } else {
                    node.normalize()
                };
                reference.cross(pos).dot(&h_hat).atan2(reference.dot(pos))
            }
        };

        Self::from_elements(
            sma,
            ecc,
            inc,
            wrap_angle(raan),
            wrap_angle(argp),
            true_anom,
            body,
        )
    }

    /// Convert to a body-centred state vector.
    pub fn to_state_vector(&self) -> StateVector {
        let (sin_ta, cos_ta) = self.true_anom.sin_cos();
        let r_mag = self.semi_latus_rectum() / (1.0 + self.ecc * cos_ta);
        let v_mag = self.speed_at(r_mag);
        let gamma = flight_path_angle(self.ecc, self.true_anom);

        let r_pqw = Vector2::new(r_mag * cos_ta, r_mag * sin_ta);
        let v_pqw = perifocal_velocity(v_mag, self.true_anom, gamma);

        let rot = perifocal_to_inertial(self.raan, self.argp, self.inc);
        StateVector {
            pos: rot * Vector3::new(r_pqw.x, r_pqw.y, 0.0),
            vel: rot * Vector3::new(v_pqw.x, v_pqw.y, 0.0),
        }
    }

    /// Same orbit, different position along it.
    pub fn with_true_anomaly(&self, true_anom: f64) -> Self {
        OrbitElements {
            true_anom: wrap_angle(true_anom),
            ..*self
        }
    }

    pub fn is_elliptical(&self) -> bool {
        self.ecc < 1.0
    }

    // -----------------------------------------------------------------------
    // Shape and energy
    // -----------------------------------------------------------------------

    pub fn semi_latus_rectum(&self) -> f64 {
        self.sma * (1.0 - self.ecc * self.ecc)
    }

    pub fn periapsis(&self) -> f64 {
        self.sma * (1.0 - self.ecc)
    }

    /// Apoapsis radius; infinite for open orbits.
    pub fn apoapsis(&self) -> f64 {
        if self.is_elliptical() {
            self.sma * (1.0 + self.ecc)
        } else {
            f64::INFINITY
        }
    }

    /// Vis-viva speed at radius `r`.
    pub fn speed_at(&self, r: f64) -> f64 {
        (self.body.mu * (2.0 / r - 1.0 / self.sma)).sqrt()
    }

    pub fn specific_energy(&self) -> f64 {
        -self.body.mu / (2.0 * self.sma)
    }

    pub fn mean_motion(&self) -> f64 {
        (self.body.mu / self.sma.abs().powi(3)).sqrt()
    }

    pub fn flight_path_angle(&self) -> f64 {
        flight_path_angle(self.ecc, self.true_anom)
    }

    // -----------------------------------------------------------------------
    // Anomalies
    // -----------------------------------------------------------------------

    /// Eccentric anomaly in (-pi, pi] for the current true anomaly (elliptical orbits).
    pub fn eccentric_anomaly(&self) -> f64 {
        let half = self.true_anom / 2.0;
        2.0 * ((1.0 - self.ecc).sqrt() * half.sin()).atan2((1.0 + self.ecc).sqrt() * half.cos())
    }

    /// Unsigned hyperbolic anomaly for the current true anomaly (open orbits).
    ///
    /// NaN when the true anomaly lies beyond the asymptotes.
    pub fn hyperbolic_anomaly(&self) -> f64 {
        let cos_ta = self.true_anom.cos();
        ((self.ecc + cos_ta) / (1.0 + self.ecc * cos_ta)).acosh()
    }

    pub fn true_anomaly_from_mean_anomaly(&self, mean_anom: f64) -> f64 {
        self.true_anomaly_from_mean_anomaly_with(mean_anom, &SolverConfig::default())
    }

    /// Solve Kepler's equation by Newton-Raphson and convert to a true anomaly in [0, 2pi).
    pub fn true_anomaly_from_mean_anomaly_with(
        &self,
        mean_anom: f64,
        config: &SolverConfig,
    ) -> f64 {
        let e = self.ecc;
        if self.is_elliptical() {
            let mut ecc_anom = mean_anom;
            let mut converged = false;
            for _ in 0..config.kepler_max_iterations {
                let delta =
                    (ecc_anom - e * ecc_anom.sin() - mean_anom) / (1.0 - e * ecc_anom.cos());
                ecc_anom -= delta;
                if delta.abs() < config.kepler_tolerance {
                    converged = true;
                    break;
                }
            }
            if !converged {
                warn!("Kepler equation did not converge for M={mean_anom:.6} e={e:.6}");
            }
            let half = ecc_anom / 2.0;
            wrap_angle(2.0 * ((1.0 + e).sqrt() * half.sin()).atan2((1.0 - e).sqrt() * half.cos()))
        } else {
            let mut hyp_anom = (mean_anom / e).asinh();
            let mut converged = false;
            for _ in 0..config.kepler_max_iterations {
                let delta =
                    (e * hyp_anom.sinh() - hyp_anom - mean_anom) / (e * hyp_anom.cosh() - 1.0);
                hyp_anom -= delta;
                if delta.abs() < config.kepler_tolerance {
                    converged = true;
                    break;
                }
            }
            if !converged {
                warn!("hyperbolic Kepler equation did not converge for M={mean_anom:.6} e={e:.6}");
            }
            let half = hyp_anom / 2.0;
            wrap_angle(2.0 * ((e + 1.0).sqrt() * half.sinh()).atan2((e - 1.0).sqrt() * half.cosh()))
        }
    }
}
