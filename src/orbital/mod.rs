pub mod degenerate;
pub mod elements;
pub mod propagator;
pub mod state;

pub use degenerate::{EccentricityGeometry, NodeGeometry};
pub use elements::{wrap_angle, OrbitElements, ELEMENT_EPSILON};
pub use propagator::{propagate_state_vector_by_time, propagate_state_vector_by_true_anomaly};
pub use state::StateVector;
