//! Domain-specific simulation engines.
//!
//! - Physics: fixed-step RK4 integration of an autonomous vector field

pub mod physics;

pub use physics::{Dynamics, Rk4Integrator};
