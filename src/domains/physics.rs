//! Physics domain engine.
//!
//! Implements fixed-step classical Runge-Kutta (RK4) integration of the
//! 5-component kinematic state `(q, r, u, v, t)`.
//!
//! Time is integrated as a fifth coordinate whose derivative is the constant
//! `1`, so every stage carries the time increment `h` and the state's clock
//! advances by exactly `h` per step.
//!
//! RK4 is fourth-order accurate and non-symplectic: energy drifts slowly over
//! long runs, shrinking by a factor of 16 or more each time the step is
//! halved.

use crate::engine::jidoka::JidokaGuard;
use crate::engine::state::{KinematicState, StateDerivative, StateIncrement};
use crate::error::SimResult;

/// Autonomous vector field over the kinematic state.
///
/// Implementors map `(q, r, u, v)` to `(dq, dr, du, dv)`. The time slot is
/// handled by the integrator.
pub trait Dynamics {
    /// Compute the state derivative.
    fn derivatives(&self, state: &KinematicState) -> StateDerivative;
}

/// Runge-Kutta 4th order integrator.
///
/// Algorithm (classical RK4 over `s = (q, r, u, v, t)`, `f = (dq, dr, du, dv, 1)`):
/// ```text
/// k1 = h · f(s)
/// k2 = h · f(s + k1/2)      time slot t + h/2
/// k3 = h · f(s + k2/2)      time slot t + h/2
/// k4 = h · f(s + k3)        time slot t + h
///
/// s_{n+1} = s_n + (k1 + 2·k2 + 2·k3 + k4) / 6
/// ```
///
/// Every stage is checked for non-finite values before it is used.
#[derive(Debug, Clone, Default)]
pub struct Rk4Integrator;

impl Rk4Integrator {
    /// Create a new RK4 integrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Advance `state` by one step of size `h`.
    ///
    /// `step` is the grid index being advanced, used for error reporting.
    /// On error `state` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `NumericalInstability` if any stage or the updated state
    /// contains NaN or infinity.
    pub fn step<D: Dynamics>(
        &self,
        dynamics: &D,
        state: &mut KinematicState,
        h: f64,
        step: usize,
    ) -> SimResult<()> {
        let s = *state;

        // Stage 1: k1 at t_n
        let k1 = dynamics.derivatives(&s).scaled_increment(h);
        JidokaGuard::check_stage(step, 1, &k1, &s)?;

        // Stage 2: k2 at t_n + h/2
        let k2 = dynamics.derivatives(&s.offset(&k1, 0.5)).scaled_increment(h);
        JidokaGuard::check_stage(step, 2, &k2, &s)?;

        // Stage 3: k3 at t_n + h/2
        let k3 = dynamics.derivatives(&s.offset(&k2, 0.5)).scaled_increment(h);
        JidokaGuard::check_stage(step, 3, &k3, &s)?;

        // Stage 4: k4 at t_n + h
        let k4 = dynamics.derivatives(&s.offset(&k3, 1.0)).scaled_increment(h);
        JidokaGuard::check_stage(step, 4, &k4, &s)?;

        let next = s.offset(&Self::weighted(&k1, &k2, &k3, &k4), 1.0);
        JidokaGuard::check_state(step, &next, &s)?;

        *state = next;
        Ok(())
    }

    /// Combine four stages with weights `1/6, 2/6, 2/6, 1/6`.
    #[must_use]
    pub fn weighted(
        k1: &StateIncrement,
        k2: &StateIncrement,
        k3: &StateIncrement,
        k4: &StateIncrement,
    ) -> StateIncrement {
        let combine = |a: f64, b: f64, c: f64, d: f64| (a + 2.0 * b + 2.0 * c + d) / 6.0;
        StateIncrement {
            dq: combine(k1.dq, k2.dq, k3.dq, k4.dq),
            dr: combine(k1.dr, k2.dr, k3.dr, k4.dr),
            du: combine(k1.du, k2.du, k3.du, k4.du),
            dv: combine(k1.dv, k2.dv, k3.dv, k4.dv),
            // All four stages carry the same time increment h, so their
            // weighted mean is h itself. Summing them in floating point
            // would not round-trip to h.
            dt: k1.dt,
        }
    }

    /// Get the error order of this integrator.
    #[must_use]
    pub const fn error_order(&self) -> u32 {
        4
    }

    /// Check if integrator is symplectic (preserves phase space volume).
    #[must_use]
    pub const fn is_symplectic(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::SimError;

    /// Unit harmonic oscillator in the `q` slot: q'' = -q.
    struct SpringField;

    impl Dynamics for SpringField {
        fn derivatives(&self, state: &KinematicState) -> StateDerivative {
            StateDerivative::new(state.u, state.v, -state.q, 0.0)
        }
    }

    /// Field that blows up once q passes a threshold.
    struct Blowup;

    impl Dynamics for Blowup {
        fn derivatives(&self, state: &KinematicState) -> StateDerivative {
            let du = if state.q > 0.5 { f64::INFINITY } else { 1.0 };
            StateDerivative::new(1.0, 0.0, du, 0.0)
        }
    }

    fn spring_error(h: f64, steps: usize) -> f64 {
        let rk4 = Rk4Integrator::new();
        let mut state = KinematicState::new(1.0, 0.0, 0.0, 0.0, 0.0);
        for i in 0..steps {
            rk4.step(&SpringField, &mut state, h, i).unwrap();
        }
        (state.q - state.t.cos()).abs()
    }

    #[test]
    fn test_rk4_tracks_analytic_oscillator() {
        let err = spring_error(0.01, 100);
        assert!(err < 1e-9, "err={err}");
    }

    #[test]
    fn test_rk4_fourth_order_convergence() {
        // Same horizon, half the step: global error falls by ~2^4
        let coarse = spring_error(0.1, 20);
        let fine = spring_error(0.05, 40);
        let ratio = coarse / fine;
        assert!((12.0..20.0).contains(&ratio), "ratio={ratio}");
    }

    #[test]
    fn test_rk4_time_advances_by_exactly_h() {
        let rk4 = Rk4Integrator::new();
        let h = 0.1;
        let mut state = KinematicState::new(0.3, 0.0, 0.0, 0.0, 0.7);
        rk4.step(&SpringField, &mut state, h, 0).unwrap();
        assert_eq!(state.t, 0.7 + h);
    }

    #[test]
    fn test_rk4_weighted_time_slot() {
        let k = StateDerivative::new(1.0, 2.0, 3.0, 4.0).scaled_increment(0.1);
        let w = Rk4Integrator::weighted(&k, &k, &k, &k);
        assert_eq!(w.dt, 0.1);
        assert!((w.dq - 0.1).abs() < 1e-15);
        assert!((w.dv - 0.4).abs() < 1e-15);
    }

    #[test]
    fn test_rk4_stage_instability_reported() {
        let rk4 = Rk4Integrator::new();
        // k1 moves q to 0.3 at the half step, k3 pushes past 0.5 for k4
        let mut state = KinematicState::new(0.0, 0.0, 0.0, 0.0, 0.0);
        let before = state;
        let err = rk4.step(&Blowup, &mut state, 0.6, 7).unwrap_err();
        match err {
            SimError::NumericalInstability { step, location, state: at } => {
                assert_eq!(step, 7);
                assert_eq!(location, "k4.du");
                assert_eq!(at, before);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // State untouched on failure
        assert_eq!(state, before);
    }

    #[test]
    fn test_rk4_metadata() {
        let rk4 = Rk4Integrator::new();
        assert_eq!(rk4.error_order(), 4);
        assert!(!rk4.is_symplectic());
    }
}
