//! Planar Lambert problem: the conic through two radii separated by a transfer
//! angle that takes a given time to fly between them.
//!
//! The family of conics through both points (focus fixed) is parameterized by the
//! true anomaly `ta0` at the first radius. Transfer time grows monotonically along
//! the admissible `ta0` arc, from zero at the degenerate straight-line/radial conic
//! to infinity at the parabola that runs out through apoapsis, so a bracketing
//! search on `ta0` always has a single root.

use std::f64::consts::{PI, TAU};

use log::{debug, warn};
use nalgebra::Vector2;
use serde_derive::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::errors::LambertError;
use crate::orbital::{wrap_angle, OrbitElements};
use crate::physics::CentralBody;

/// Added to an exactly parabolic eccentricity so the hyperbolic formulas apply.
const PARABOLIC_NUDGE: f64 = 1e-10;
/// Relative split applied to equal radii, which collapse the conic family.
const EQUAL_RADII_SPLIT: f64 = 1e-9;

/// Outcome of an iterative Lambert solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LambertStatus {
    /// Transfer time matched within tolerance.
    Success,
    /// Search stalled on floating-point resolution; the best sample is returned.
    Imprecision,
    /// Iteration cap reached before convergence.
    MaxIterations,
    /// A domain error produced a NaN transfer time.
    FailNan,
    /// The geometry needs a negative eccentricity (unreachable transfer).
    FailEcc,
}

impl LambertStatus {
    /// Success and imprecision both carry a transfer the caller may use.
    pub fn is_usable(self) -> bool {
        matches!(self, LambertStatus::Success | LambertStatus::Imprecision)
    }

    pub fn check(self, iterations: usize) -> Result<(), LambertError> {
        match self {
            LambertStatus::Success | LambertStatus::Imprecision => Ok(()),
            LambertStatus::MaxIterations => Err(LambertError::MaxIterations { iterations }),
            LambertStatus::FailNan => Err(LambertError::NotANumber),
            LambertStatus::FailEcc => Err(LambertError::NegativeEccentricity),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LambertSolution2D<'a> {
    pub orbit: OrbitElements<'a>, // planar: RAAN, inclination and periapsis argument are zero
    pub true_anom0: f64,          // rad, at the first radius
    pub true_anom1: f64,          // rad, at the second radius
    pub status: LambertStatus,
    pub iterations: usize,
}

impl<'a> LambertSolution2D<'a> {
    pub fn ok(self) -> Result<Self, LambertError> {
        self.status.check(self.iterations).map(|_| self)
    }
}

// ---------------------------------------------------------------------------
// Geometry of the conic family
// ---------------------------------------------------------------------------

/// Keep the transfer angle in (0, 2pi) and at least `nudge` away from 0, pi and 2pi.
///
/// Angles inside a guard band are moved out to its edge, on the side they already lie.
pub fn nudge_transfer_angle(delta_ta: f64, nudge: f64) -> f64 {
    let dta = wrap_angle(delta_ta);
    let nudged = if dta < nudge {
        nudge
    } else if (dta - PI).abs() < nudge {
        if dta >= PI {
            PI + nudge
        } else {
            PI - nudge
        }
    } else if TAU - dta < nudge {
        TAU - nudge
    } else {
        dta
    };
    if nudged != dta {
        debug!("transfer angle {dta:.6} rad nudged to {nudged:.6} rad");
    }
    nudged
}

/// Eccentricity of the conic through (r0, ta0) and (r1, ta0 + dta).
fn conic_eccentricity(r0: f64, r1: f64, ta0: f64, dta: f64) -> f64 {
    (r1 - r0) / (r0 * ta0.cos() - r1 * (ta0 + dta).cos())
}

/// `ta0` of the zero-time limit.
///
/// Short way: the straight line through both points, whose periapsis direction
/// is perpendicular to the chord. Long way: the radial conic through the focus.
pub fn zero_time_bound(r0: f64, r1: f64, dta: f64) -> f64 {
    if dta < PI {
        let p0 = Vector2::new(r0, 0.0);
        let p1 = Vector2::new(r1 * dta.cos(), r1 * dta.sin());
        let chord = (p1 - p0).normalize();
        let foot = p0 - chord * p0.dot(&chord);
        wrap_angle(-foot.y.atan2(foot.x))
    } else {
        wrap_angle(-dta / 2.0)
    }
}

/// `ta0` of the infinite-time limit: the parabola whose arc passes through apoapsis.
pub fn infinite_time_bound(r0: f64, r1: f64, dta: f64) -> f64 {
    let half = dta / 2.0;
    wrap_angle(2.0 * (r0.sqrt() + r1.sqrt() * half.cos()).atan2(r1.sqrt() * half.sin()))
}

/// Whether `ta0` yields a conic that really connects both radii along the arc.
fn admissible(r0: f64, r1: f64, ta0: f64, dta: f64) -> bool {
    let ecc = conic_eccentricity(r0, r1, ta0, dta);
    if !ecc.is_finite() || ecc < 0.0 {
        return false;
    }
    let p = r0 * (1.0 + ecc * ta0.cos());
    let crosses_apoapsis = wrap_angle(PI - ta0) < dta;
    p > 0.0 && (ecc < 1.0 || !crosses_apoapsis)
}

/// Admissible `ta0` arc as (zero-time end, infinite-time end), unwrapped so the
/// two ends differ by less than a full turn.
///
/// With r1 > r0 the transfer time grows with `ta0`; with r1 < r0 it shrinks.
fn search_arc(r0: f64, r1: f64, dta: f64) -> (f64, f64) {
    let zero = zero_time_bound(r0, r1, dta);
    let inf = infinite_time_bound(r0, r1, dta);
    let forward = wrap_angle(inf - zero);
    if admissible(r0, r1, zero + forward / 2.0, dta) {
        (zero, zero + forward)
    } else {
        (zero, zero - wrap_angle(zero - inf))
    }
}

// ---------------------------------------------------------------------------
// Root finder
// ---------------------------------------------------------------------------

/// Ordered (ta0, transfer time - target) samples for a single solve.
struct SampleSet {
    samples: Vec<(f64, f64)>,
}

impl SampleSet {
    fn new(a: (f64, f64), b: (f64, f64)) -> Self {
        let mut set = SampleSet {
            samples: Vec::with_capacity(16),
        };
        set.insert(a.0, a.1);
        set.insert(b.0, b.1);
        set
    }

    fn insert(&mut self, x: f64, f: f64) {
        let idx = self.samples.partition_point(|&(sx, _)| sx < x);
        self.samples.insert(idx, (x, f));
    }

    /// Adjacent samples whose residuals straddle zero.
    fn bracket(&self) -> Option<((f64, f64), (f64, f64))> {
        self.samples
            .windows(2)
            .find(|w| (w[0].1 <= 0.0) != (w[1].1 <= 0.0))
            .map(|w| (w[0], w[1]))
    }
}

/// One member of the conic family, evaluated.
#[derive(Clone, Copy)]
struct Candidate {
    ta0: f64,
    sma: f64,
    ecc: f64,
    dt: f64,
}

fn evaluate(
    r0: f64,
    r1: f64,
    ta0: f64,
    dta: f64,
    body: &CentralBody,
) -> Result<Candidate, LambertStatus> {
    let mut ecc = conic_eccentricity(r0, r1, ta0, dta);
    if ecc < 0.0 {
        return Err(LambertStatus::FailEcc);
    }
    if ecc == 1.0 {
        ecc += PARABOLIC_NUDGE;
    }
    let p = r0 * (1.0 + ecc * ta0.cos());
    let sma = p / (1.0 - ecc * ecc);

    let start = OrbitElements::from_elements(sma, ecc, 0.0, 0.0, 0.0, ta0, body);
    let end = start.with_true_anomaly(ta0 + dta);
    let mut dt = end.time_since_periapsis() - start.time_since_periapsis();
    if start.is_elliptical() && dt < 0.0 {
        dt += start.period();
    }
    if dt.is_nan() {
        return Err(LambertStatus::FailNan);
    }
    Ok(Candidate { ta0, sma, ecc, dt })
}

fn solution<'a>(
    body: &'a CentralBody,
    ta0: f64,
    sma: f64,
    ecc: f64,
    dta: f64,
    status: LambertStatus,
    iterations: usize,
) -> LambertSolution2D<'a> {
    let orbit =
        OrbitElements::from_elements(sma, ecc, 0.0, 0.0, 0.0, 0.0, body).with_true_anomaly(ta0);
    LambertSolution2D {
        orbit,
        true_anom0: wrap_angle(ta0),
        true_anom1: wrap_angle(ta0 + dta),
        status,
        iterations,
    }
}

pub fn solve_lambert_2d<'a>(
    r0: f64,
    r1: f64,
    delta_ta: f64,
    target_dt: f64,
    body: &'a CentralBody,
) -> LambertSolution2D<'a> {
    solve_lambert_2d_with(r0, r1, delta_ta, target_dt, body, &SolverConfig::default())
}

/// Solve the planar Lambert problem between radii `r0` and `r1` separated by `delta_ta`.
pub fn solve_lambert_2d_with<'a>(
    r0: f64,
    r1: f64,
    delta_ta: f64,
    target_dt: f64,
    body: &'a CentralBody,
    config: &SolverConfig,
) -> LambertSolution2D<'a> {
    let dta = nudge_transfer_angle(delta_ta, config.lambert_angle_nudge);
    let r1 = if r1 == r0 { r1 * (1.0 + EQUAL_RADII_SPLIT) } else { r1 };

    if !(target_dt > 0.0) {
        warn!("Lambert transfer time must be positive, got {target_dt} s");
        return solution(body, 0.0, f64::NAN, f64::NAN, dta, LambertStatus::FailEcc, 0);
    }

    let (zero_end, inf_end) = search_arc(r0, r1, dta);
    let mut samples = SampleSet::new((zero_end, -target_dt), (inf_end, f64::INFINITY));

    let mut best: Option<(Candidate, f64)> = None;
    let mut last_guess = f64::NAN;
    let mut prev_width = (inf_end - zero_end).abs();
    let mut status = LambertStatus::MaxIterations;
    let mut iterations = 0;

    while iterations < config.lambert_max_iterations {
        let Some(((xa, fa), (xb, fb))) = samples.bracket() else {
            status = LambertStatus::Imprecision;
            break;
        };
        let (lo, hi) = (xa.min(xb), xa.max(xb));
        let width = hi - lo;

        let interpolated = if fa.is_finite() && fb.is_finite() {
            xa - fa * (xb - xa) / (fb - fa)
        } else {
            f64::NAN
        };
        // interpolate, but at least halve the bracket every other step
        let guess = if width <= 0.5 * prev_width && interpolated > lo && interpolated < hi {
            interpolated
        } else {
            0.5 * (lo + hi)
        };
        prev_width = width;

        if guess == last_guess || guess == lo || guess == hi {
            status = LambertStatus::Imprecision;
            break;
        }
        last_guess = guess;
        iterations += 1;

        let candidate = match evaluate(r0, r1, guess, dta, body) {
            Ok(candidate) => candidate,
            Err(fail) => {
                warn!("Lambert solve aborted at ta0={guess:.6}: {fail:?}");
                let ecc = conic_eccentricity(r0, r1, guess, dta);
                return solution(body, guess, f64::NAN, ecc, dta, fail, iterations);
            }
        };

        let residual = candidate.dt - target_dt;
        samples.insert(guess, residual);
        if best.map_or(true, |(_, r)| residual.abs() < r) {
            best = Some((candidate, residual.abs()));
        }
        if residual.abs() < config.time_tolerance {
            status = LambertStatus::Success;
            break;
        }
    }

    debug!("Lambert 2D finished with {status:?} after {iterations} iterations");
    match best {
        Some((c, _)) => solution(body, c.ta0, c.sma, c.ecc, dta, status, iterations),
        None => {
            let status = if status.is_usable() { LambertStatus::FailNan } else { status };
            solution(body, zero_end, f64::NAN, f64::NAN, dta, status, iterations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sun() -> CentralBody {
        CentralBody::SUN
    }

    /// Radii and flight time between two true anomalies of a reference orbit.
    fn sample_transfer(orbit: &OrbitElements, ta0: f64, dta: f64) -> (f64, f64, f64) {
        let start = orbit.with_true_anomaly(ta0);
        let end = orbit.with_true_anomaly(ta0 + dta);
        let p = orbit.semi_latus_rectum();
        let r0 = p / (1.0 + orbit.ecc * ta0.cos());
        let r1 = p / (1.0 + orbit.ecc * (ta0 + dta).cos());
        let mut dt = end.time_since_periapsis() - start.time_since_periapsis();
        if orbit.is_elliptical() && dt < 0.0 {
            dt += orbit.period();
        }
        (r0, r1, dt)
    }

    #[test]
    fn transfer_angle_nudges() {
        assert_relative_eq!(nudge_transfer_angle(0.0, 1e-3), 1e-3);
        assert_relative_eq!(nudge_transfer_angle(5e-4, 1e-3), 1e-3);
        assert_relative_eq!(nudge_transfer_angle(PI + 5e-4, 1e-3), PI + 1e-3);
        assert_relative_eq!(nudge_transfer_angle(PI, 1e-3), PI + 1e-3);
        assert_relative_eq!(nudge_transfer_angle(PI - 1e-4, 1e-3), PI - 1e-3);
        assert_relative_eq!(nudge_transfer_angle(TAU - 1e-4, 1e-3), TAU - 1e-3);
        assert_eq!(nudge_transfer_angle(1.0, 1e-3), 1.0);
    }

    #[test]
    fn bounds_are_degenerate_conics() {
        let (r0, r1, dta) = (1.0, 2.0, PI / 2.0);
        let zero = zero_time_bound(r0, r1, dta);
        // straight line: eccentricity denominator vanishes
        let denom = r0 * zero.cos() - r1 * (zero + dta).cos();
        assert!(denom.abs() < 1e-12, "denominator {denom:e}");

        let inf = infinite_time_bound(r0, r1, dta);
        assert_relative_eq!(conic_eccentricity(r0, r1, inf, dta), 1.0, epsilon = 1e-12);
        assert!(inf < PI && inf + dta > PI, "arc must contain apoapsis");
    }

    #[test]
    fn long_way_zero_bound_is_radial() {
        let (r0, r1, dta) = (1.0, 1.5, 4.0);
        let zero = zero_time_bound(r0, r1, dta);
        assert_relative_eq!(zero, TAU - 2.0, epsilon = 1e-12);
        let ecc = conic_eccentricity(r0, r1, zero, dta);
        // semi-latus rectum collapses
        assert!((1.0 + ecc * zero.cos()).abs() < 1e-12);
    }

    #[test]
    fn arc_direction_follows_radius_ratio() {
        let (zero, inf) = search_arc(1.0, 2.0, PI / 2.0);
        assert!(inf > zero, "outbound transfers gain time with ta0");
        let (zero, inf) = search_arc(2.0, 1.0, PI / 2.0);
        assert!(inf < zero, "inbound transfers lose time with ta0");
        assert!(admissible(2.0, 1.0, 0.5 * (zero + inf), PI / 2.0));
    }

    #[test]
    fn recovers_elliptical_orbit() {
        let body = sun();
        let orbit = OrbitElements::from_elements(1.5e11, 0.2, 0.0, 0.0, 0.0, 0.0, &body);
        let (r0, r1, dt) = sample_transfer(&orbit, 0.3, 1.2);

        let sol = solve_lambert_2d(r0, r1, 1.2, dt, &body);
        assert_eq!(sol.status, LambertStatus::Success);
        assert_relative_eq!(sol.orbit.sma, orbit.sma, max_relative = 1e-3);
        assert_relative_eq!(sol.orbit.ecc, orbit.ecc, max_relative = 1e-3);
        assert_relative_eq!(sol.true_anom0, 0.3, epsilon = 1e-3);
        assert_relative_eq!(sol.true_anom1, 1.5, epsilon = 1e-3);
        assert!(sol.ok().is_ok());
    }

    #[test]
    fn recovers_long_way_transfer() {
        let body = sun();
        let orbit = OrbitElements::from_elements(2.0e11, 0.3, 0.0, 0.0, 0.0, 0.0, &body);
        let (r0, r1, dt) = sample_transfer(&orbit, 2.0, 4.0);

        let sol = solve_lambert_2d(r0, r1, 4.0, dt, &body);
        assert_eq!(sol.status, LambertStatus::Success);
        assert_relative_eq!(sol.orbit.sma, orbit.sma, max_relative = 1e-3);
        assert_relative_eq!(sol.orbit.ecc, orbit.ecc, max_relative = 1e-3);
    }

    #[test]
    fn recovers_inbound_hyperbola() {
        let body = CentralBody::EARTH;
        let orbit = OrbitElements::from_elements(-2.0e7, 1.6, 0.0, 0.0, 0.0, 0.0, &body);
        let (r0, r1, dt) = sample_transfer(&orbit, -0.8, 1.5);
        assert!(r0 > r1);

        let sol = solve_lambert_2d(r0, r1, 1.5, dt, &body);
        assert_eq!(sol.status, LambertStatus::Success);
        assert_relative_eq!(sol.orbit.sma, orbit.sma, max_relative = 1e-3);
        assert_relative_eq!(sol.orbit.ecc, orbit.ecc, max_relative = 1e-3);
    }

    #[test]
    fn equal_radii_quarter_orbit() {
        let body = CentralBody::EARTH;
        let r = 7_000e3;
        let circular = OrbitElements::from_elements(r, 0.0, 0.0, 0.0, 0.0, 0.0, &body);
        let dt = circular.period() / 4.0;
        let sol = solve_lambert_2d(r, r, PI / 2.0, dt, &body);
        assert!(sol.status.is_usable(), "status {:?}", sol.status);
        assert_relative_eq!(sol.orbit.sma, r, max_relative = 1e-3);
        assert!(sol.orbit.ecc < 1e-2);
    }

    #[test]
    fn non_positive_time_is_unreachable() {
        let body = sun();
        let sol = solve_lambert_2d(1.5e11, 2.0e11, 1.0, 0.0, &body);
        assert_eq!(sol.status, LambertStatus::FailEcc);
        assert_eq!(sol.ok().unwrap_err(), LambertError::NegativeEccentricity);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let body = sun();
        let orbit = OrbitElements::from_elements(1.5e11, 0.2, 0.0, 0.0, 0.0, 0.0, &body);
        let (r0, r1, dt) = sample_transfer(&orbit, 0.3, 1.2);
        let config = SolverConfig {
            lambert_max_iterations: 3,
            ..SolverConfig::default()
        };
        let sol = solve_lambert_2d_with(r0, r1, 1.2, dt, &body, &config);
        assert_eq!(sol.status, LambertStatus::MaxIterations);
        assert_eq!(sol.iterations, 3);
        assert_eq!(sol.ok().unwrap_err(), LambertError::MaxIterations { iterations: 3 });
    }

    #[test]
    fn stalled_search_reports_imprecision() {
        let body = sun();
        // a zero tolerance can only end when the bracket stops shrinking
        let config = SolverConfig {
            time_tolerance: 0.0,
            ..SolverConfig::default()
        };
        let sol = solve_lambert_2d_with(1.5e11, 2.2e11, 2.0, 200.0 * 86_400.0, &body, &config);

        assert_eq!(sol.status, LambertStatus::Imprecision);
        assert!(
            sol.iterations < config.lambert_max_iterations,
            "stalled after {} iterations",
            sol.iterations
        );
        assert!(sol.status.is_usable());
        assert!(sol.ok().is_ok());
        assert!(sol.orbit.sma.is_finite() && sol.orbit.ecc >= 0.0);
    }

    #[test]
    fn samples_stay_ordered() {
        let mut set = SampleSet::new((0.0, -5.0), (2.0, f64::INFINITY));
        set.insert(1.0, 3.0);
        set.insert(0.5, -1.0);
        let xs: Vec<f64> = set.samples.iter().map(|s| s.0).collect();
        assert_eq!(xs, vec![0.0, 0.5, 1.0, 2.0]);
        assert_eq!(set.bracket(), Some(((0.5, -1.0), (1.0, 3.0))));
    }
}
