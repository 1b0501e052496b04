//! Damped spring simulators used to smooth velocity and rotation targets.
#![forbid(unsafe_code)]

mod integrator;
mod relative;
mod vector;

pub use integrator::{SpringConfig, SpringError, SpringValue};
pub use relative::{wrap_angle, RelativeSpringSimulator};
pub use vector::VectorSpringSimulator;
