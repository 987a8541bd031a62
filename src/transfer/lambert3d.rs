use std::f64::consts::TAU;

use log::{debug, warn};
use nalgebra::Vector3;
use serde_derive::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::errors::LambertError;
use crate::orbital::degenerate::{NodeGeometry, NODE_EPSILON};
use crate::orbital::elements::acos_clamped;
use crate::orbital::{wrap_angle, OrbitElements};
use crate::physics::CentralBody;

use super::lambert::{solve_lambert_2d_with, LambertStatus};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambertSolution3D {
    pub pos0: Vector3<f64>, // m
    pub vel0: Vector3<f64>, // m/s, departure velocity on the transfer orbit
    pub pos1: Vector3<f64>, // m
    pub vel1: Vector3<f64>, // m/s, arrival velocity on the transfer orbit
    pub status: LambertStatus,
    pub iterations: usize,
}

impl LambertSolution3D {
    pub fn ok(self) -> Result<Self, LambertError> {
        self.status.check(self.iterations).map(|_| self)
    }
}

/// How the transfer plane is pinned down by the two position vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPlane {
    /// Positions span a plane that crosses the reference plane.
    Inclined,
    /// Positions span the reference plane itself.
    Equatorial,
    /// Positions are (anti)parallel; the plane through r0 closest to the reference plane is used.
    Collinear,
}

/// Prograde transfer angle from `r0` to `r1`, in (0, 2pi).
pub fn transfer_angle(r0: &Vector3<f64>, r1: &Vector3<f64>) -> f64 {
    let angle = acos_clamped(r0.dot(r1) / (r0.norm() * r1.norm()));
    if r0.cross(r1).z < 0.0 {
        TAU - angle
    } else {
        angle
    }
}

/// Unit normal of the transfer plane, oriented with non-negative height (prograde).
pub fn transfer_plane(r0: &Vector3<f64>, r1: &Vector3<f64>) -> (Vector3<f64>, TransferPlane) {
    let cross = r0.cross(r1);
    if cross.norm() <= NODE_EPSILON * r0.norm() * r1.norm() {
        let r0_hat = r0.normalize();
        let tilted = Vector3::z() - r0_hat * r0_hat.z;
        let normal = if tilted.norm() > NODE_EPSILON {
            tilted.normalize()
        } else {
            Vector3::x()
        };
        return (normal, TransferPlane::Collinear);
    }

    let normal = if cross.z < 0.0 {
        -cross.normalize()
    } else {
        cross.normalize()
    };
    match NodeGeometry::classify(&normal) {
        NodeGeometry::Inclined => (normal, TransferPlane::Inclined),
        _ => (normal, TransferPlane::Equatorial),
    }
}

/// Orientation angles (RAAN, inclination, argument of periapsis) of the transfer orbit.
fn orientation(normal: &Vector3<f64>, r0: &Vector3<f64>, ta0: f64) -> (f64, f64, f64) {
    let node = Vector3::z().cross(normal);
    let (node_hat, raan) = match NodeGeometry::classify(normal) {
        NodeGeometry::Inclined => {
            let node_hat = node.normalize();
            (node_hat, wrap_angle(node_hat.y.atan2(node_hat.x)))
        }
        _ => (Vector3::x(), 0.0),
    };
    let inc = acos_clamped(normal.z);

    // argument of latitude of r0, measured about the orbit normal
    let r0_hat = r0.normalize();
    let arg_lat = node_hat.cross(&r0_hat).dot(normal).atan2(node_hat.dot(&r0_hat));
    (raan, inc, wrap_angle(arg_lat - ta0))
}

pub fn solve_lambert_3d(
    r0: &Vector3<f64>,
    r1: &Vector3<f64>,
    target_dt: f64,
    body: &CentralBody,
) -> LambertSolution3D {
    solve_lambert_3d_with(r0, r1, target_dt, body, &SolverConfig::default())
}

/// Solve the Lambert problem between two position vectors (prograde transfer).
pub fn solve_lambert_3d_with(
    r0: &Vector3<f64>,
    r1: &Vector3<f64>,
    target_dt: f64,
    body: &CentralBody,
    config: &SolverConfig,
) -> LambertSolution3D {
    let dta = transfer_angle(r0, r1);
    let planar = solve_lambert_2d_with(r0.norm(), r1.norm(), dta, target_dt, body, config);

    if matches!(planar.status, LambertStatus::FailEcc | LambertStatus::FailNan) {
        warn!("3D Lambert solve failed in the planar stage: {:?}", planar.status);
        return LambertSolution3D {
            pos0: *r0,
            vel0: Vector3::zeros(),
            pos1: *r1,
            vel1: Vector3::zeros(),
            status: planar.status,
            iterations: planar.iterations,
        };
    }

    let (normal, plane) = transfer_plane(r0, r1);
    let (raan, inc, argp) = orientation(&normal, r0, planar.true_anom0);
    debug!("transfer plane {plane:?}: raan={raan:.6} inc={inc:.6} argp={argp:.6} rad");

    let departure = OrbitElements::from_elements(
        planar.orbit.sma,
        planar.orbit.ecc,
        inc,
        raan,
        argp,
        planar.true_anom0,
        body,
    );
    let arrival = departure.with_true_anomaly(planar.true_anom1);

    LambertSolution3D {
        pos0: *r0,
        vel0: departure.to_state_vector().vel,
        pos1: *r1,
        vel1: arrival.to_state_vector().vel,
        status: planar.status,
        iterations: planar.iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn tight() -> SolverConfig {
        SolverConfig {
            time_tolerance: 1e-4,
            ..SolverConfig::default()
        }
    }

    fn assert_close(got: &Vector3<f64>, want: &Vector3<f64>) {
        let err = (got - want).norm();
        assert!(err < 1e-4 * want.norm(), "velocity off by {:.3e} m/s", err);
    }

    fn flight_time(orbit: &OrbitElements, ta0: f64, ta1: f64) -> f64 {
        let mut dt = orbit.with_true_anomaly(ta1).time_since_periapsis()
            - orbit.with_true_anomaly(ta0).time_since_periapsis();
        if dt < 0.0 {
            dt += orbit.period();
        }
        dt
    }

    #[test]
    fn transfer_angle_resolves_long_way() {
        let r0 = Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(transfer_angle(&r0, &Vector3::new(0.0, 1.0, 0.0)), PI / 2.0);
        assert_relative_eq!(transfer_angle(&r0, &Vector3::new(0.0, -1.0, 0.0)), 1.5 * PI);
    }

    #[test]
    fn plane_policies() {
        let x = Vector3::new(7e6, 0.0, 0.0);
        let (normal, plane) = transfer_plane(&x, &Vector3::new(0.0, 7e6, 0.0));
        assert_eq!(plane, TransferPlane::Equatorial);
        assert_relative_eq!(normal, Vector3::z());

        // long way: cross product points down, normal flips up
        let (normal, plane) = transfer_plane(&x, &Vector3::new(0.0, -5e6, 5e6));
        assert_eq!(plane, TransferPlane::Inclined);
        assert!(normal.z > 0.0);

        let (normal, plane) = transfer_plane(&x, &(x * 2.0));
        assert_eq!(plane, TransferPlane::Collinear);
        assert_relative_eq!(normal, Vector3::z());
        assert!(normal.dot(&x).abs() < 1e-9);
    }

    #[test]
    fn recovers_inclined_transfer() {
        let body = CentralBody::EARTH;
        let orbit = OrbitElements::from_elements(1e7, 0.2, 0.5, 1.0, 0.7, 0.0, &body);
        let (ta0, ta1) = (0.4, 2.3);
        let dep = orbit.with_true_anomaly(ta0).to_state_vector();
        let arr = orbit.with_true_anomaly(ta1).to_state_vector();
        let dt = flight_time(&orbit, ta0, ta1);

        let sol = solve_lambert_3d_with(&dep.pos, &arr.pos, dt, &body, &tight());
        assert_eq!(sol.status, LambertStatus::Success);
        assert_close(&sol.vel0, &dep.vel);
        assert_close(&sol.vel1, &arr.vel);
        assert_eq!(sol.pos0, dep.pos);
    }

    #[test]
    fn recovers_long_way_transfer() {
        let body = CentralBody::EARTH;
        let orbit = OrbitElements::from_elements(2e7, 0.1, 1.2, 4.0, 2.0, 0.0, &body);
        let (ta0, ta1) = (0.4, 4.4);
        let dep = orbit.with_true_anomaly(ta0).to_state_vector();
        let arr = orbit.with_true_anomaly(ta1).to_state_vector();
        let dt = flight_time(&orbit, ta0, ta1);

        let sol = solve_lambert_3d_with(&dep.pos, &arr.pos, dt, &body, &tight());
        assert_eq!(sol.status, LambertStatus::Success);
        assert_close(&sol.vel0, &dep.vel);
        assert_close(&sol.vel1, &arr.vel);
    }

    #[test]
    fn recovers_equatorial_transfer() {
        let body = CentralBody::EARTH;
        let orbit = OrbitElements::from_elements(1.2e7, 0.3, 0.0, 0.0, 1.0, 0.0, &body);
        let (ta0, ta1) = (0.2, 1.7);
        let dep = orbit.with_true_anomaly(ta0).to_state_vector();
        let arr = orbit.with_true_anomaly(ta1).to_state_vector();
        let dt = flight_time(&orbit, ta0, ta1);
        // drop the out-of-plane residue left by the inclination nudge
        let r0 = Vector3::new(dep.pos.x, dep.pos.y, 0.0);
        let r1 = Vector3::new(arr.pos.x, arr.pos.y, 0.0);
        assert_eq!(transfer_plane(&r0, &r1).1, TransferPlane::Equatorial);

        let sol = solve_lambert_3d_with(&r0, &r1, dt, &body, &tight());
        assert_eq!(sol.status, LambertStatus::Success);
        assert_close(&sol.vel0, &dep.vel);
        assert_close(&sol.vel1, &arr.vel);
    }

    #[test]
    fn planar_failure_short_circuits() {
        let body = CentralBody::EARTH;
        let r0 = Vector3::new(7e6, 0.0, 0.0);
        let r1 = Vector3::new(0.0, 8e6, 1e6);
        let sol = solve_lambert_3d(&r0, &r1, -10.0, &body);
        assert_eq!(sol.status, LambertStatus::FailEcc);
        assert_eq!(sol.vel0, Vector3::zeros());
        assert!(sol.ok().is_err());
    }
}
