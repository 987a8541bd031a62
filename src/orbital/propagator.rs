use std::f64::consts::{PI, TAU};

use log::{debug, warn};

use crate::config::SolverConfig;
use crate::physics::CentralBody;

use super::elements::OrbitElements;
use super::state::StateVector;

impl<'a> OrbitElements<'a> {
    /// Time elapsed since the last periapsis passage, s.
    ///
    /// In [0, period) for closed orbits; negative on the incoming leg of an open orbit.
    pub fn time_since_periapsis(&self) -> f64 {
        let n = self.mean_motion();
        if self.is_elliptical() {
            let ecc_anom = self.eccentric_anomaly();
            let t = (ecc_anom - self.ecc * ecc_anom.sin()) / n;
            if t < 0.0 {
                t + self.period()
            } else {
                t
            }
        } else {
            let hyp_anom = self.hyperbolic_anomaly();
            let t = (self.ecc * hyp_anom.sinh() - hyp_anom) / n;
            if self.true_anom > PI {
                -t
            } else {
                t
            }
        }
    }

    /// Orbital period (s); infinite for open orbits.
    pub fn period(&self) -> f64 {
        if self.is_elliptical() {
            TAU / self.mean_motion()
        } else {
            f64::INFINITY
        }
    }

    pub fn propagate_by_time(&self, dt: f64) -> OrbitElements<'a> {
        self.propagate_by_time_with(dt, &SolverConfig::default())
    }

    /// Move along the orbit by `dt` seconds (negative to go back in time).
    pub fn propagate_by_time_with(&self, dt: f64, config: &SolverConfig) -> OrbitElements<'a> {
        let t0 = self.time_since_periapsis();
        if self.is_elliptical() {
            let period = self.period();
            let target = (t0 + dt).rem_euclid(period);
            let seed =
                self.true_anomaly_from_mean_anomaly_with(self.mean_motion() * target, config);
            let ta = solve_true_anomaly(self, target, (0.0, TAU), seed, Some(period), config);
            self.with_true_anomaly(ta)
        } else {
            let ta_inf = (-1.0 / self.ecc).acos();
            let target = t0 + dt;
            let seed =
                self.true_anomaly_from_mean_anomaly_with(self.mean_motion() * target, config);
            let seed = if seed > PI { seed - TAU } else { seed };
            let ta = solve_true_anomaly(self, target, (-ta_inf, ta_inf), seed, None, config);
            self.with_true_anomaly(ta)
        }
    }

    /// Move along the orbit by a change of true anomaly.
    pub fn propagate_by_true_anomaly(&self, delta_ta: f64) -> OrbitElements<'a> {
        self.with_true_anomaly(self.true_anom + delta_ta)
    }
}

/// Find the true anomaly inside `bracket` whose time since periapsis is `target`.
///
/// Newton steps on dt/dnu = r^2/h, falling back to bisection whenever a step
/// leaves the shrinking bracket. Closed orbits compare times modulo `period` so a
/// target just before periapsis can also be met from just after it.
fn solve_true_anomaly(
    orbit: &OrbitElements,
    target: f64,
    bracket: (f64, f64),
    seed: f64,
    period: Option<f64>,
    config: &SolverConfig,
) -> f64 {
    let (mut lo, mut hi) = bracket;
    let p = orbit.semi_latus_rectum();
    let h = (orbit.body.mu * p).sqrt();

    let mut ta = if seed > lo && seed < hi {
        seed
    } else {
        0.5 * (lo + hi)
    };
    let mut best = (ta, f64::INFINITY);

    for iteration in 0..config.propagation_max_iterations {
        let residual = orbit.with_true_anomaly(ta).time_since_periapsis() - target;

        if residual.is_nan() {
            // acosh left its domain next to an asymptote: halve towards the bracket centre
            if ta > 0.5 * (lo + hi) {
                hi = ta;
            } else {
                lo = ta;
            }
            ta = 0.5 * (lo + hi);
            continue;
        }

        let error = match period {
            Some(period) => residual - period * (residual / period).round(),
            None => residual,
        };
        if error.abs() < best.1 {
            best = (ta, error.abs());
        }
        if error.abs() < config.time_tolerance {
            debug!("propagation converged after {} iterations ({error:.3e} s)", iteration + 1);
            return ta;
        }

        if residual > 0.0 {
            hi = ta;
        } else {
            lo = ta;
        }

        let r = p / (1.0 + orbit.ecc * ta.cos());
        let newton = ta - residual * h / (r * r);
        ta = if newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
    }

    warn!(
        "propagation stopped at the {} iteration cap, best residual {:.3e} s",
        config.propagation_max_iterations, best.1
    );
    best.0
}

pub fn propagate_state_vector_by_time(
    osv: &StateVector,
    body: &CentralBody,
    dt: f64,
) -> StateVector {
    osv.to_elements(body).propagate_by_time(dt).to_state_vector()
}

pub fn propagate_state_vector_by_true_anomaly(
    osv: &StateVector,
    body: &CentralBody,
    delta_ta: f64,
) -> StateVector {
    osv.to_elements(body)
        .propagate_by_true_anomaly(delta_ta)
        .to_state_vector()
}
