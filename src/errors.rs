use snafu::prelude::*;

/// Errors raised when building a [`CentralBody`](crate::physics::CentralBody) projection.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BodyError {
    #[snafu(display("gravitational parameter must be finite and positive, got {mu} m^3/s^2"))]
    InvalidGravParam { mu: f64 },
    #[snafu(display("body radius must be finite and non-negative, got {radius} m"))]
    InvalidRadius { radius: f64 },
    #[snafu(display("atmosphere altitude must be finite and non-negative, got {altitude} m"))]
    InvalidAtmosphere { altitude: f64 },
}

/// Lambert outcomes that the caller must not use as a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LambertError {
    #[snafu(display("Lambert solver did not converge within {iterations} iterations"))]
    MaxIterations { iterations: usize },
    #[snafu(display("Lambert solver hit a domain error (NaN transfer time)"))]
    NotANumber,
    #[snafu(display("requested geometry needs a negative eccentricity: transfer is unreachable"))]
    NegativeEccentricity,
}
