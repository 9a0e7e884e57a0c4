//! Jidoka (自働化) - Autonomous anomaly detection.
//!
//! Implements Toyota's Jidoka principle: machines that detect problems
//! and stop automatically to prevent defect propagation.
//!
//! # Anomaly Types
//!
//! 1. **Non-finite values**: NaN or Inf in a derivative stage or in the
//!    state. Always fatal; the run stops with `NumericalInstability`.
//! 2. **Energy drift**: total mechanical energy wanders from its initial
//!    value. RK4 is not energy conserving, so this is only a warning.
//!
//! # Design
//!
//! The finite checks run after every derivative evaluation and after every
//! state update, so a corrupted value never reaches the next step or the
//! recorded trajectory.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::state::{KinematicState, StateIncrement};
use crate::error::{SimError, SimResult};

/// Jidoka guard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JidokaConfig {
    /// Relative energy drift above which a warning is logged.
    ///
    /// `None` disables energy monitoring.
    #[serde(default)]
    pub energy_tolerance: Option<f64>,
}

impl JidokaConfig {
    /// Enable energy monitoring with the given relative tolerance.
    #[must_use]
    pub const fn with_energy_tolerance(tolerance: f64) -> Self {
        Self {
            energy_tolerance: Some(tolerance),
        }
    }
}

/// Warning raised by the energy monitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyDriftWarning {
    /// Step at which the drift was observed.
    pub step: usize,
    /// Relative drift `|E - E0| / |E0|`.
    pub drift: f64,
    /// Configured tolerance.
    pub tolerance: f64,
}

/// Jidoka guard for autonomous anomaly detection.
///
/// # Example
///
/// ```rust
/// use double_pendulum::engine::jidoka::JidokaGuard;
/// use double_pendulum::engine::state::KinematicState;
///
/// let state = KinematicState::new(0.1, 0.2, 0.0, 0.0, 0.0);
/// assert!(JidokaGuard::check_initial(0, &state).is_ok());
///
/// let corrupt = KinematicState::new(0.1, 0.2, f64::NAN, 0.0, 0.0);
/// assert!(JidokaGuard::check_initial(0, &corrupt).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct JidokaGuard {
    /// Configuration.
    config: JidokaConfig,
    /// Initial energy (set on first observation).
    initial_energy: Option<f64>,
    /// Lower bound for the drift denominator (J).
    energy_scale: f64,
    /// Largest relative drift observed so far.
    max_drift: f64,
    /// Energy warnings raised so far.
    warnings: Vec<EnergyDriftWarning>,
}

impl JidokaGuard {
    /// Create a new Jidoka guard with given configuration.
    #[must_use]
    pub const fn new(config: JidokaConfig) -> Self {
        Self {
            config,
            initial_energy: None,
            energy_scale: 0.0,
            max_drift: 0.0,
            warnings: Vec::new(),
        }
    }

    /// Measure drift against at least `scale` joules.
    ///
    /// The pivot is the potential reference, so the initial energy can sit
    /// at or near zero. Dividing by `max(|E0|, scale)` keeps the relative
    /// drift meaningful there.
    #[must_use]
    pub const fn with_energy_scale(mut self, scale: f64) -> Self {
        self.energy_scale = scale;
        self
    }

    /// Check a state before it is recorded or stepped from.
    ///
    /// # Errors
    ///
    /// Returns `NumericalInstability` naming the first non-finite slot.
    pub fn check_initial(step: usize, state: &KinematicState) -> SimResult<()> {
        match state.first_non_finite() {
            Some(slot) => Err(SimError::instability(step, format!("state.{slot}"), *state)),
            None => Ok(()),
        }
    }

    /// Check one RK4 stage `k{stage}` computed from `origin`.
    ///
    /// # Errors
    ///
    /// Returns `NumericalInstability` with location `k{stage}.{slot}`.
    pub fn check_stage(
        step: usize,
        stage: usize,
        k: &StateIncrement,
        origin: &KinematicState,
    ) -> SimResult<()> {
        match k.first_non_finite() {
            Some(slot) => Err(SimError::instability(
                step,
                format!("k{stage}.{slot}"),
                *origin,
            )),
            None => Ok(()),
        }
    }

    /// Check the state produced by a step that started from `origin`.
    ///
    /// # Errors
    ///
    /// Returns `NumericalInstability` with location `next.{slot}`.
    pub fn check_state(
        step: usize,
        next: &KinematicState,
        origin: &KinematicState,
    ) -> SimResult<()> {
        match next.first_non_finite() {
            Some(slot) => Err(SimError::instability(step, format!("next.{slot}"), *origin)),
            None => Ok(()),
        }
    }

    /// Feed the total energy after `step` to the drift monitor.
    ///
    /// The first observation becomes the reference. Returns a warning when
    /// the relative drift exceeds the configured tolerance. Non-finite
    /// energies are ignored, as is every observation when the reference
    /// and the energy scale are both zero.
    pub fn observe_energy(&mut self, step: usize, energy: f64) -> Option<EnergyDriftWarning> {
        let tolerance = self.config.energy_tolerance?;

        if !energy.is_finite() {
            return None;
        }

        let Some(initial) = self.initial_energy else {
            self.initial_energy = Some(energy);
            return None;
        };

        // Skip if no energy scale is defined
        let denom = initial.abs().max(self.energy_scale);
        if denom < f64::EPSILON {
            return None;
        }

        let drift = (energy - initial).abs() / denom;
        self.max_drift = self.max_drift.max(drift);

        if drift > tolerance {
            warn!(step, drift, tolerance, "energy drift exceeds tolerance");
            let warning = EnergyDriftWarning {
                step,
                drift,
                tolerance,
            };
            self.warnings.push(warning);
            Some(warning)
        } else {
            None
        }
    }

    /// Largest relative energy drift observed.
    #[must_use]
    pub const fn max_drift(&self) -> f64 {
        self.max_drift
    }

    /// Energy warnings raised so far.
    #[must_use]
    pub fn warnings(&self) -> &[EnergyDriftWarning] {
        &self.warnings
    }

    /// Get current configuration.
    #[must_use]
    pub const fn config(&self) -> &JidokaConfig {
        &self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::engine::state::StateDerivative;

    #[test]
    fn test_check_initial_finite() {
        let state = KinematicState::new(1.0, 2.0, 3.0, 4.0, 5.0);
        assert!(JidokaGuard::check_initial(0, &state).is_ok());
    }

    #[test]
    fn test_check_initial_reports_slot() {
        let state = KinematicState::new(0.0, 0.0, 0.0, f64::NAN, 0.0);
        match JidokaGuard::check_initial(3, &state).unwrap_err() {
            SimError::NumericalInstability { step, location, .. } => {
                assert_eq!(step, 3);
                assert_eq!(location, "state.v");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_stage_reports_stage_and_slot() {
        let origin = KinematicState::at_rest(0.0);
        let k = StateDerivative::new(0.0, 0.0, f64::INFINITY, 0.0).scaled_increment(0.1);
        match JidokaGuard::check_stage(9, 2, &k, &origin).unwrap_err() {
            SimError::NumericalInstability { step, location, state } => {
                assert_eq!(step, 9);
                assert_eq!(location, "k2.du");
                assert_eq!(state, origin);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_state_reports_next() {
        let origin = KinematicState::at_rest(0.0);
        let next = KinematicState::new(f64::NAN, 0.0, 0.0, 0.0, 0.1);
        let err = JidokaGuard::check_state(1, &next, &origin).unwrap_err();
        assert!(err.to_string().contains("next.q"));
    }

    #[test]
    fn test_energy_monitor_disabled_by_default() {
        let mut guard = JidokaGuard::default();
        assert!(guard.observe_energy(0, 1.0).is_none());
        assert!(guard.observe_energy(1, 100.0).is_none());
        assert!(guard.warnings().is_empty());
    }

    #[test]
    fn test_energy_monitor_warns_above_tolerance() {
        let mut guard = JidokaGuard::new(JidokaConfig::with_energy_tolerance(0.01));
        assert!(guard.observe_energy(0, -10.0).is_none());
        assert!(guard.observe_energy(1, -10.05).is_none());
        let warning = guard.observe_energy(2, -10.5).unwrap();
        assert_eq!(warning.step, 2);
        assert!((warning.drift - 0.05).abs() < 1e-12);
        assert_eq!(guard.warnings().len(), 1);
        assert!((guard.max_drift() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_energy_monitor_near_zero_reference_uses_scale() {
        // Both arms horizontal: E0 is rounding noise around zero
        let mut guard =
            JidokaGuard::new(JidokaConfig::with_energy_tolerance(1e-3)).with_energy_scale(29.43);
        assert!(guard.observe_energy(0, -1.8e-15).is_none());
        for step in 1..=20 {
            assert!(guard.observe_energy(step, 1.5e-3).is_none());
        }
        assert!(guard.warnings().is_empty());
        assert!(guard.max_drift() < 1e-4);

        // A real departure is still reported
        let warning = guard.observe_energy(21, 0.1).unwrap();
        assert!((warning.drift - 0.1 / 29.43).abs() < 1e-12);
    }

    #[test]
    fn test_energy_monitor_skips_zero_reference_without_scale() {
        let mut guard = JidokaGuard::new(JidokaConfig::with_energy_tolerance(1e-3));
        assert!(guard.observe_energy(0, 0.0).is_none());
        assert!(guard.observe_energy(1, 5.0).is_none());
        assert!(guard.warnings().is_empty());
        assert_eq!(guard.max_drift(), 0.0);
    }

    #[test]
    fn test_energy_monitor_ignores_non_finite() {
        let mut guard = JidokaGuard::new(JidokaConfig::with_energy_tolerance(1e-3));
        assert!(guard.observe_energy(0, f64::NAN).is_none());
        // The first finite value becomes the reference
        assert!(guard.observe_energy(1, -10.0).is_none());
        assert!(guard.observe_energy(2, -10.0).is_none());
        assert!(guard.observe_energy(3, -20.0).is_some());
    }

    #[test]
    fn test_config_serde() {
        let config: JidokaConfig = serde_yaml::from_str("energy_tolerance: 0.001").unwrap();
        assert_eq!(config.energy_tolerance, Some(0.001));
        let empty: JidokaConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(empty, JidokaConfig::default());
    }
}
