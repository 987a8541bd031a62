use serde_derive::{Deserialize, Serialize};

/// Tolerances and iteration caps shared by every iterative solver in the crate.
///
/// The defaults are the values the solvers are specified against; callers only
/// need a custom config to trade accuracy for speed (or the reverse).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub time_tolerance: f64,              // s, convergence band on transfer/propagation time
    pub propagation_max_iterations: usize,
    pub lambert_max_iterations: usize,
    pub lambert_angle_nudge: f64,         // rad, distance kept from 0, pi and 2pi transfer angles
    pub kepler_tolerance: f64,            // rad, Newton correction threshold on Kepler's equation
    pub kepler_max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            time_tolerance: 1.0,
            propagation_max_iterations: 500,
            lambert_max_iterations: 100,
            lambert_angle_nudge: 1e-3,
            kepler_tolerance: 1e-6,
            kepler_max_iterations: 100,
        }
    }
}
