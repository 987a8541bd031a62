pub mod flyby;
pub mod lambert;
pub mod lambert3d;
pub mod maneuvers;

pub use flyby::{
    flyby_inclination, flyby_periapsis, hyperbola_parameters, is_flyby_viable, HyperbolaKind,
    HyperbolaLeg, HyperbolaParameters,
};
pub use lambert::{solve_lambert_2d, solve_lambert_2d_with, LambertSolution2D, LambertStatus};
pub use lambert3d::{solve_lambert_3d, solve_lambert_3d_with, LambertSolution3D, TransferPlane};
pub use maneuvers::{
    apsis_maneuver_dv, circular_velocity, dv_capture, dv_circ, hohmann_transfer, HohmannTransfer,
    Insertion, LegEnd, TransferType,
};
