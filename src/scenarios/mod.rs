//! Pre-built simulation scenarios.
//!
//! - Double pendulum (two links, point masses, fixed pivot)

pub mod pendulum;

pub use pendulum::{CartesianSample, DoublePendulum, PendulumParams, STANDARD_GRAVITY};
