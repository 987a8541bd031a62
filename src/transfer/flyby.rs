//! Hyperbolic passes at a body: flyby periapsis and plane, asymptote
//! geometry of departure/arrival legs, and flyby viability.
//!
//! All velocities are heliocentric (or parent-frame) vectors; the body's own
//! velocity is subtracted to obtain the hyperbolic excess velocities.

use log::debug;
use nalgebra::Vector3;
use serde_derive::{Deserialize, Serialize};

use crate::orbital::degenerate::NODE_EPSILON;
use crate::orbital::elements::acos_clamped;
use crate::orbital::wrap_angle;
use crate::physics::CentralBody;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HyperbolaKind {
    Departure,
    Arrival,
    Flyby,
}

/// Asymptote direction of one leg of a hyperbola.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperbolaLeg {
    pub declination: f64,             // rad, above the reference plane
    pub bplane_angle: f64,            // rad, in-plane angle of the asymptote from the x-axis
    pub bvector_azimuth: Option<f64>, // rad, flyby legs only
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperbolaParameters {
    pub kind: HyperbolaKind,
    pub periapsis: f64, // m, radius
    pub c3: f64,        // m^2/s^2
    pub incoming: Option<HyperbolaLeg>,
    pub outgoing: Option<HyperbolaLeg>,
}

fn excess_velocities(
    v_arr: &Vector3<f64>,
    v_dep: &Vector3<f64>,
    v_body: &Vector3<f64>,
) -> (Vector3<f64>, Vector3<f64>) {
    (v_arr - v_body, v_dep - v_body)
}

/// Unit normal of the flyby plane, if the pass bends the trajectory at all.
fn flyby_normal(v_inf_in: &Vector3<f64>, v_inf_out: &Vector3<f64>) -> Option<Vector3<f64>> {
    let cross = v_inf_in.cross(v_inf_out);
    cross.try_normalize(NODE_EPSILON * v_inf_in.norm() * v_inf_out.norm())
}

/// Periapsis radius needed to turn the incoming excess velocity onto the outgoing one.
pub fn flyby_periapsis(
    v_arr: &Vector3<f64>,
    v_dep: &Vector3<f64>,
    v_body: &Vector3<f64>,
    body: &CentralBody,
) -> f64 {
    let (v_inf_in, v_inf_out) = excess_velocities(v_arr, v_dep, v_body);
    let beta = (-v_inf_in).angle(&v_inf_out) / 2.0;
    (1.0 / beta.cos() - 1.0) * body.mu / v_inf_in.norm_squared()
}

/// Inclination of the flyby plane to the reference plane. A pass with no
/// bending defines no plane and reports zero.
pub fn flyby_inclination(v_arr: &Vector3<f64>, v_dep: &Vector3<f64>, v_body: &Vector3<f64>) -> f64 {
    let (v_inf_in, v_inf_out) = excess_velocities(v_arr, v_dep, v_body);
    match flyby_normal(&v_inf_in, &v_inf_out) {
        Some(normal) => acos_clamped(normal.z),
        None => {
            debug!("undeflected flyby, inclination taken as zero");
            0.0
        }
    }
}

/// Angle in the B-plane from the projected south pole to the B-vector, in [0, 2pi).
fn bvector_azimuth(asymptote: &Vector3<f64>, normal: &Vector3<f64>) -> f64 {
    let s = asymptote.normalize();
    let b = s.cross(normal);

    let south = -Vector3::z();
    let reference = (south - s * s.dot(&south))
        .try_normalize(NODE_EPSILON)
        .unwrap_or_else(|| (Vector3::x() - s * s.x).normalize());

    wrap_angle(reference.cross(&b).dot(&s).atan2(reference.dot(&b)))
}

fn leg(v_inf: &Vector3<f64>, normal: Option<&Vector3<f64>>) -> HyperbolaLeg {
    HyperbolaLeg {
        declination: (v_inf.z / v_inf.norm()).clamp(-1.0, 1.0).asin(),
        bplane_angle: wrap_angle(v_inf.y.atan2(v_inf.x)),
        bvector_azimuth: normal.map(|n| bvector_azimuth(v_inf, n)),
    }
}

/// Asymptote geometry of a departure, arrival or flyby hyperbola.
///
/// For departures and arrivals the periapsis is `periapsis_altitude` above the
/// body's surface; for flybys it follows from the turn angle and
/// `periapsis_altitude` is ignored. C3 is taken from the outgoing leg on
/// departure and from the incoming leg otherwise.
pub fn hyperbola_parameters(
    v_arr: &Vector3<f64>,
    v_dep: &Vector3<f64>,
    v_body: &Vector3<f64>,
    body: &CentralBody,
    periapsis_altitude: f64,
    kind: HyperbolaKind,
) -> HyperbolaParameters {
    let (v_inf_in, v_inf_out) = excess_velocities(v_arr, v_dep, v_body);

    match kind {
        HyperbolaKind::Departure => HyperbolaParameters {
            kind,
            periapsis: periapsis_altitude + body.radius,
            c3: v_inf_out.norm_squared(),
            incoming: None,
            outgoing: Some(leg(&v_inf_out, None)),
        },
        HyperbolaKind::Arrival => HyperbolaParameters {
            kind,
            periapsis: periapsis_altitude + body.radius,
            c3: v_inf_in.norm_squared(),
            incoming: Some(leg(&v_inf_in, None)),
            outgoing: None,
        },
        HyperbolaKind::Flyby => {
            let normal = flyby_normal(&v_inf_in, &v_inf_out);
            HyperbolaParameters {
                kind,
                periapsis: flyby_periapsis(v_arr, v_dep, v_body, body),
                c3: v_inf_in.norm_squared(),
                incoming: Some(leg(&v_inf_in, normal.as_ref())),
                outgoing: Some(leg(&v_inf_out, normal.as_ref())),
            }
        }
    }
}

/// An unpowered flyby needs matching excess speeds and a periapsis clear of the atmosphere.
pub fn is_flyby_viable(
    v_arr: &Vector3<f64>,
    v_dep: &Vector3<f64>,
    v_body: &Vector3<f64>,
    body: &CentralBody,
    precision: f64,
) -> bool {
    let (v_inf_in, v_inf_out) = excess_velocities(v_arr, v_dep, v_body);
    let speed_mismatch = (v_inf_in.norm() - v_inf_out.norm()).abs();
    let rp = flyby_periapsis(v_arr, v_dep, v_body, body);
    debug!(
        "flyby check: |dv_inf|={:.3} m/s rp={:.0} m floor={:.0} m",
        speed_mismatch,
        rp,
        body.safe_radius()
    );
    speed_mismatch < precision && rp > body.safe_radius()
}
