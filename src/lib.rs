pub mod config;
pub mod errors;
pub mod orbital;
pub mod physics;
pub mod transfer;

pub use config::SolverConfig;
pub use errors::{BodyError, LambertError};
pub use orbital::{OrbitElements, StateVector};
pub use physics::CentralBody;
