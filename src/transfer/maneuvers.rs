use serde_derive::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::orbital::OrbitElements;
use crate::physics::CentralBody;

/// Result of a Hohmann transfer calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HohmannTransfer {
    pub duration: f64,     // s, half the transfer orbit period
    pub dv_departure: f64, // m/s, first burn (raise/lower the far apsis)
    pub dv_arrival: f64,   // m/s, second burn (circularize)
    pub total_dv: f64,     // m/s
}

/// Delta-v to move the opposite apsis from `initial_apsis` to `new_apsis`,
/// burning at `static_apsis`. All values are radii in meters.
pub fn apsis_maneuver_dv(
    static_apsis: f64,
    initial_apsis: f64,
    new_apsis: f64,
    body: &CentralBody,
) -> f64 {
    let before = OrbitElements::from_apsides(static_apsis, initial_apsis, 0.0, body);
    let after = OrbitElements::from_apsides(static_apsis, new_apsis, 0.0, body);
    (after.speed_at(static_apsis) - before.speed_at(static_apsis)).abs()
}

/// Compute Hohmann transfer between two circular orbits.
///
/// `r0` and `r1` are orbital radii (not altitudes), in meters.
pub fn hohmann_transfer(r0: f64, r1: f64, body: &CentralBody) -> HohmannTransfer {
    let a_transfer = (r0 + r1) / 2.0;
    let duration = PI * (a_transfer.powi(3) / body.mu).sqrt();

    let dv_departure = apsis_maneuver_dv(r0, r0, r1, body);
    let dv_arrival = apsis_maneuver_dv(r1, r0, r1, body);

    HohmannTransfer {
        duration,
        dv_departure,
        dv_arrival,
        total_dv: dv_departure + dv_arrival,
    }
}

/// Calculate circular orbit velocity at a given radius.
pub fn circular_velocity(r: f64, body: &CentralBody) -> f64 {
    (body.mu / r).sqrt()
}

fn periapsis_escape_speed(body: &CentralBody, periapsis_altitude: f64, v_inf: f64) -> f64 {
    let rp = periapsis_altitude + body.radius;
    (2.0 * body.mu / rp + v_inf * v_inf).sqrt()
}

/// Delta-v between a circular orbit at `periapsis_altitude` and a hyperbola with
/// excess speed `v_inf`.
pub fn dv_circ(body: &CentralBody, periapsis_altitude: f64, v_inf: f64) -> f64 {
    let rp = periapsis_altitude + body.radius;
    periapsis_escape_speed(body, periapsis_altitude, v_inf) - circular_velocity(rp, body)
}

/// Delta-v between a hyperbola and a marginally bound (parabolic) capture orbit
/// with the same periapsis.
pub fn dv_capture(body: &CentralBody, periapsis_altitude: f64, v_inf: f64) -> f64 {
    let rp = periapsis_altitude + body.radius;
    periapsis_escape_speed(body, periapsis_altitude, v_inf) - (2.0 * body.mu / rp).sqrt()
}

// ---------------------------------------------------------------------------
// Interplanetary legs
// ---------------------------------------------------------------------------

/// Parking orbit an interplanetary leg starts from or ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Insertion {
    Capture,
    Circular,
    /// Unpowered pass; costs nothing at this end.
    Flyby,
}

impl Insertion {
    pub fn dv(self, body: &CentralBody, periapsis_altitude: f64, v_inf: f64) -> f64 {
        match self {
            Insertion::Capture => dv_capture(body, periapsis_altitude, v_inf),
            Insertion::Circular => dv_circ(body, periapsis_altitude, v_inf),
            Insertion::Flyby => 0.0,
        }
    }
}

/// One end of an interplanetary leg.
#[derive(Debug, Clone, Copy)]
pub struct LegEnd<'a> {
    pub body: &'a CentralBody,
    pub periapsis_altitude: f64, // m
    pub v_inf: f64,              // m/s, hyperbolic excess speed
}

/// Departure and arrival parking orbits of a transfer leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferType {
    CaptureCapture,
    CircularCapture,
    CaptureCircular,
    CircularCircular,
    CaptureFlyby,
    CircularFlyby,
}

impl TransferType {
    pub fn departure(self) -> Insertion {
        match self {
            TransferType::CaptureCapture
            | TransferType::CaptureCircular
            | TransferType::CaptureFlyby => Insertion::Capture,
            TransferType::CircularCapture
            | TransferType::CircularCircular
            | TransferType::CircularFlyby => Insertion::Circular,
        }
    }

    pub fn arrival(self) -> Insertion {
        match self {
            TransferType::CaptureCapture | TransferType::CircularCapture => Insertion::Capture,
            TransferType::CaptureCircular | TransferType::CircularCircular => Insertion::Circular,
            TransferType::CaptureFlyby | TransferType::CircularFlyby => Insertion::Flyby,
        }
    }

    /// Departure plus arrival insertion delta-v, m/s.
    pub fn total_dv(self, departure: &LegEnd, arrival: &LegEnd) -> f64 {
        self.departure()
            .dv(departure.body, departure.periapsis_altitude, departure.v_inf)
            + self
                .arrival()
                .dv(arrival.body, arrival.periapsis_altitude, arrival.v_inf)
    }
}
