pub mod body;

pub use body::{CentralBody, MU_EARTH, MU_SUN, R_EARTH, R_SUN};
