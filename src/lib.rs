//! # double-pendulum
//!
//! Deterministic double pendulum simulation.
//!
//! A two-link pendulum model integrated with fixed-step classical RK4:
//! - Closed-form equations of motion and Cartesian positions
//! - A fixed time grid known before the run starts
//! - Jidoka: stop on the first non-finite value instead of recording it
//! - Poka-Yoke: validated YAML or builder configuration
//!
//! ## Example
//!
//! ```rust
//! use double_pendulum::prelude::*;
//!
//! let config = SimConfig::builder()
//!     .initial_angles_deg(120.0, -10.0)
//!     .step(0.01)
//!     .horizon(2.0)
//!     .build();
//!
//! let trajectory = Simulator::new(&config)?.simulate()?;
//! assert_eq!(trajectory.len(), 200);
//! # Ok::<(), SimError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Equations are written term by term
    clippy::imprecise_flops,
    clippy::many_single_char_names,
    clippy::missing_const_for_fn,
)]

pub mod config;
pub mod domains;
pub mod engine;
pub mod error;
pub mod scenarios;
pub mod trajectory;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{SimConfig, SimConfigBuilder};
    pub use crate::domains::physics::{Dynamics, Rk4Integrator};
    pub use crate::engine::jidoka::{JidokaConfig, JidokaGuard};
    pub use crate::engine::{KinematicState, Simulator, StepProgress, TimeGrid};
    pub use crate::error::{SimError, SimResult};
    pub use crate::scenarios::pendulum::{CartesianSample, DoublePendulum, PendulumParams};
    pub use crate::trajectory::{Frame, Trajectory, TrajectoryRecord};
}

/// Re-export for public API
pub use error::{SimError, SimResult};

/// Simulate a configuration from start to horizon.
///
/// # Errors
///
/// Returns `InvalidParameter` for a bad configuration and
/// `NumericalInstability` if the run produces a non-finite value.
pub fn simulate(config: &config::SimConfig) -> SimResult<trajectory::Trajectory> {
    engine::Simulator::new(config)?.simulate()
}
