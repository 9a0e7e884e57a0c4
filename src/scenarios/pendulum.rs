//! Double pendulum: two rigid massless arms in series, each ending in a
//! point mass, swinging under gravity from a fixed pivot at the origin.
//!
//! # Equations of Motion
//!
//! With `q`, `r` the arm angles from the downward vertical and `u`, `v`
//! their angular velocities, and `Δ = q − r`:
//!
//! ```text
//! D  = m1 − m2·cos²(Δ) + m2          (always ≥ m1 > 0)
//!
//! du = [2g·m1·sin q + g·m2·sin q + g·m2·sin(q − 2r)
//!       + l1·m2·u²·sin 2Δ + 2·l2·m2·v²·sin Δ] / (−2·l1·D)
//!
//! dv = [−(m1 + m2)·(g·sin r − l1·u²·sin Δ)
//!       + cos Δ·(g·m1·sin q + g·m2·sin q + l2·m2·v²·sin Δ)] / (l2·D)
//! ```
//!
//! These are the closed-form solutions of the two Newton equations for the
//! bobs, solved for the angular accelerations.

use serde::{Deserialize, Serialize};

use crate::domains::physics::Dynamics;
use crate::engine::state::{KinematicState, StateDerivative};
use crate::error::{SimError, SimResult};

/// Standard gravitational acceleration (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Physical constants of a double pendulum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumParams {
    /// Mass of bob 1 (kg).
    pub m1: f64,
    /// Mass of bob 2 (kg).
    pub m2: f64,
    /// Length of arm 1 (m).
    pub l1: f64,
    /// Length of arm 2 (m).
    pub l2: f64,
    /// Gravitational acceleration (m/s²).
    pub g: f64,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            m1: 1.0,
            m2: 1.0,
            l1: 1.0,
            l2: 1.0,
            g: STANDARD_GRAVITY,
        }
    }
}

impl PendulumParams {
    /// Check that every constant is a finite, strictly positive real.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` naming the first offending constant.
    pub fn validate(&self) -> SimResult<()> {
        for (name, value) in [
            ("m1", self.m1),
            ("m2", self.m2),
            ("l1", self.l1),
            ("l2", self.l2),
            ("g", self.g),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::invalid_parameter(
                    name,
                    format!("must be finite and > 0, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Cartesian positions of both bobs relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartesianSample {
    /// Bob 1 x (m).
    pub x1: f64,
    /// Bob 1 y (m), negative below the pivot.
    pub y1: f64,
    /// Bob 2 x (m).
    pub x2: f64,
    /// Bob 2 y (m).
    pub y2: f64,
}

/// Double pendulum physical model.
///
/// Holds only immutable constants; every method is a pure function of its
/// arguments, so one model can be shared across independent simulations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoublePendulum {
    params: PendulumParams,
}

impl Default for DoublePendulum {
    /// Unit masses and arms under standard gravity.
    fn default() -> Self {
        Self {
            params: PendulumParams::default(),
        }
    }
}

impl DoublePendulum {
    /// Create a model from validated constants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if any constant is not finite and > 0.
    pub fn new(params: PendulumParams) -> SimResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Get the physical constants.
    #[must_use]
    pub const fn params(&self) -> &PendulumParams {
        &self.params
    }

    /// Angular velocities and accelerations at `(q, r, u, v)`.
    ///
    /// The system is autonomous; time does not enter.
    #[must_use]
    pub fn derivatives(&self, q: f64, r: f64, u: f64, v: f64) -> StateDerivative {
        let PendulumParams { m1, m2, l1, l2, g } = self.params;

        let delta = q - r;
        let (sin_d, cos_d) = delta.sin_cos();
        let sin_q = q.sin();
        let denom = m1 - m2 * cos_d * cos_d + m2;

        let num_u = 2.0 * g * m1 * sin_q
            + g * m2 * sin_q
            + g * m2 * (q - 2.0 * r).sin()
            + l1 * m2 * u * u * (2.0 * delta).sin()
            + 2.0 * l2 * m2 * v * v * sin_d;
        let du = num_u / (-2.0 * l1 * denom);

        let num_v = -(m1 + m2) * (g * r.sin() - l1 * u * u * sin_d)
            + cos_d * (g * m1 * sin_q + g * m2 * sin_q + l2 * m2 * v * v * sin_d);
        let dv = num_v / (l2 * denom);

        StateDerivative::new(u, v, du, dv)
    }

    /// Cartesian positions of both bobs for arm angles `(q, r)`.
    #[must_use]
    pub fn positions(&self, q: f64, r: f64) -> CartesianSample {
        let PendulumParams { l1, l2, .. } = self.params;
        let x1 = l1 * q.sin();
        let y1 = -l1 * q.cos();
        CartesianSample {
            x1,
            y1,
            x2: x1 + l2 * r.sin(),
            y2: y1 - l2 * r.cos(),
        }
    }

    /// Kinetic energy of both bobs (J).
    #[must_use]
    pub fn kinetic_energy(&self, state: &KinematicState) -> f64 {
        let PendulumParams { m1, m2, l1, l2, .. } = self.params;
        let KinematicState { q, r, u, v, .. } = *state;
        0.5 * (m1 + m2) * l1 * l1 * u * u
            + 0.5 * m2 * l2 * l2 * v * v
            + m2 * l1 * l2 * u * v * (q - r).cos()
    }

    /// Gravitational potential energy with the pivot as reference (J).
    #[must_use]
    pub fn potential_energy(&self, state: &KinematicState) -> f64 {
        let PendulumParams { m1, m2, l1, l2, g } = self.params;
        -(m1 + m2) * g * l1 * state.q.cos() - m2 * g * l2 * state.r.cos()
    }

    /// Total mechanical energy (J).
    #[must_use]
    pub fn total_energy(&self, state: &KinematicState) -> f64 {
        self.kinetic_energy(state) + self.potential_energy(state)
    }

    /// Depth of the potential well: `|V|` with both arms hanging down (J).
    ///
    /// A natural unit for energy drift when the total energy is near zero.
    #[must_use]
    pub fn energy_scale(&self) -> f64 {
        let PendulumParams { m1, m2, l1, l2, g } = self.params;
        (m1 + m2) * g * l1 + m2 * g * l2
    }

    /// Maximum distance of bob 2 from the pivot (`l1 + l2`).
    ///
    /// Renderers use this as a symmetric axis extent.
    #[must_use]
    pub fn reach(&self) -> f64 {
        self.params.l1 + self.params.l2
    }
}

impl Dynamics for DoublePendulum {
    fn derivatives(&self, state: &KinematicState) -> StateDerivative {
        Self::derivatives(self, state.q, state.r, state.u, state.v)
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The equilibrium is a fixed point for every valid parameter set.
        #[test]
        fn prop_equilibrium_fixed_point(
            m1 in 0.01f64..100.0, m2 in 0.01f64..100.0,
            l1 in 0.01f64..10.0, l2 in 0.01f64..10.0, g in 0.1f64..30.0,
        ) {
            let model = DoublePendulum::new(PendulumParams { m1, m2, l1, l2, g }).unwrap();
            let d = model.derivatives(0.0, 0.0, 0.0, 0.0);
            prop_assert_eq!(d.to_array(), [0.0, 0.0, 0.0, 0.0]);
        }

        /// The denominator never vanishes, so derivatives stay finite.
        #[test]
        fn prop_derivatives_finite(
            m1 in 0.01f64..100.0, m2 in 0.01f64..100.0,
            q in -20.0f64..20.0, r in -20.0f64..20.0,
            u in -50.0f64..50.0, v in -50.0f64..50.0,
        ) {
            let model = DoublePendulum::new(PendulumParams { m1, m2, ..Default::default() }).unwrap();
            let d = model.derivatives(q, r, u, v);
            prop_assert!(d.du.is_finite() && d.dv.is_finite());
        }

        /// Bobs stay on their arms: |bob1| = l1 and |bob2 − bob1| = l2.
        #[test]
        fn prop_positions_preserve_arm_lengths(
            l1 in 0.1f64..5.0, l2 in 0.1f64..5.0,
            q in -20.0f64..20.0, r in -20.0f64..20.0,
        ) {
            let model = DoublePendulum::new(PendulumParams { l1, l2, ..Default::default() }).unwrap();
            let p = model.positions(q, r);
            let arm1 = p.x1.hypot(p.y1);
            let arm2 = (p.x2 - p.x1).hypot(p.y2 - p.y1);
            prop_assert!((arm1 - l1).abs() < 1e-9);
            prop_assert!((arm2 - l2).abs() < 1e-9);
        }

        /// Kinetic energy is non-negative.
        #[test]
        fn prop_kinetic_energy_nonnegative(
            m1 in 0.01f64..100.0, m2 in 0.01f64..100.0,
            q in -20.0f64..20.0, r in -20.0f64..20.0,
            u in -50.0f64..50.0, v in -50.0f64..50.0,
        ) {
            let model = DoublePendulum::new(PendulumParams { m1, m2, ..Default::default() }).unwrap();
            let ke = model.kinetic_energy(&KinematicState::new(q, r, u, v, 0.0));
            prop_assert!(ke >= -1e-9 * (1.0 + u * u + v * v));
        }
    }
}
