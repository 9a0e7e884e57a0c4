//! Configuration system with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs
//! - Schema validation via serde and `validator`
//! - Runtime semantic validation (finiteness)
//!
//! The document is flat. Recognized keys are
//! `m1, m2, l1, l2, g, q0, r0, u0, v0, t0, h, T` plus an optional `jidoka`
//! section; every key has a default.
//!
//! ```yaml
//! m1: 1.0
//! m2: 1.0
//! q0: 3.14159
//! r0: 3.14159
//! h: 0.05
//! T: 25.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::engine::clock::TimeGrid;
use crate::engine::jidoka::JidokaConfig;
use crate::engine::state::KinematicState;
use crate::error::{SimError, SimResult};
use crate::scenarios::pendulum::{PendulumParams, STANDARD_GRAVITY};

/// Default step size (s).
pub const DEFAULT_STEP: f64 = 0.05;

/// Default horizon (s).
pub const DEFAULT_HORIZON: f64 = 15.0;

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Mass of bob 1 (kg).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_unit")]
    pub m1: f64,

    /// Mass of bob 2 (kg).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_unit")]
    pub m2: f64,

    /// Length of arm 1 (m).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_unit")]
    pub l1: f64,

    /// Length of arm 2 (m).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_unit")]
    pub l2: f64,

    /// Gravitational acceleration (m/s²).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_gravity")]
    pub g: f64,

    /// Initial angle of arm 1 (rad).
    #[serde(default)]
    pub q0: f64,

    /// Initial angle of arm 2 (rad).
    #[serde(default)]
    pub r0: f64,

    /// Initial angular velocity of arm 1 (rad/s).
    #[serde(default)]
    pub u0: f64,

    /// Initial angular velocity of arm 2 (rad/s).
    #[serde(default)]
    pub v0: f64,

    /// Start time (s).
    #[serde(default)]
    pub t0: f64,

    /// Step size (s).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_step")]
    pub h: f64,

    /// Exclusive horizon (s). A horizon at or before `t0` gives an empty run.
    #[serde(rename = "T", default = "default_horizon")]
    pub horizon: f64,

    /// Jidoka (stop-on-error) configuration.
    #[serde(default)]
    pub jidoka: JidokaConfig,
}

const fn default_unit() -> f64 {
    1.0
}

const fn default_gravity() -> f64 {
    STANDARD_GRAVITY
}

const fn default_step() -> f64 {
    DEFAULT_STEP
}

const fn default_horizon() -> f64 {
    DEFAULT_HORIZON
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            m1: default_unit(),
            m2: default_unit(),
            l1: default_unit(),
            l2: default_unit(),
            g: default_gravity(),
            q0: 0.0,
            r0: 0.0,
            u0: 0.0,
            v0: 0.0,
            t0: 0.0,
            h: default_step(),
            horizon: default_horizon(),
            jidoka: JidokaConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate_config()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Both arms pointing straight up, left to fall for 25 s.
    ///
    /// Any rounding in `sin(π)` seeds the instability, so the run turns
    /// chaotic after a few seconds.
    #[must_use]
    pub fn inverted() -> Self {
        Self::builder()
            .initial_angles_deg(180.0, 180.0)
            .horizon(25.0)
            .build()
    }

    /// Validate schema and semantic constraints.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` naming the offending field.
    pub fn validate_config(&self) -> SimResult<()> {
        // Poka-Yoke: NaN slips through range checks, so check finiteness first
        for (name, value) in [
            ("m1", self.m1),
            ("m2", self.m2),
            ("l1", self.l1),
            ("l2", self.l2),
            ("g", self.g),
            ("q0", self.q0),
            ("r0", self.r0),
            ("u0", self.u0),
            ("v0", self.v0),
            ("t0", self.t0),
            ("h", self.h),
            ("T", self.horizon),
        ] {
            if !value.is_finite() {
                return Err(SimError::invalid_parameter(
                    name,
                    format!("must be finite, got {value}"),
                ));
            }
        }

        self.validate()?;

        if let Some(tolerance) = self.jidoka.energy_tolerance {
            if !(tolerance.is_finite() && tolerance > 0.0) {
                return Err(SimError::invalid_parameter(
                    "jidoka.energy_tolerance",
                    format!("must be finite and > 0, got {tolerance}"),
                ));
            }
        }

        self.time_grid()?;
        Ok(())
    }

    /// Physical constants.
    #[must_use]
    pub const fn params(&self) -> PendulumParams {
        PendulumParams {
            m1: self.m1,
            m2: self.m2,
            l1: self.l1,
            l2: self.l2,
            g: self.g,
        }
    }

    /// Initial kinematic state `(q0, r0, u0, v0, t0)`.
    #[must_use]
    pub const fn initial_state(&self) -> KinematicState {
        KinematicState::new(self.q0, self.r0, self.u0, self.v0, self.t0)
    }

    /// Time grid `t0, t0 + h, ...` below `T`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `h`, `t0` or `T` are out of range.
    pub fn time_grid(&self) -> SimResult<TimeGrid> {
        TimeGrid::new(self.t0, self.h, self.horizon)
    }
}

/// Configuration builder for programmatic construction.
///
/// `build` does not validate; validation happens when the simulator is
/// constructed.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Set both bob masses.
    #[must_use]
    pub const fn masses(mut self, m1: f64, m2: f64) -> Self {
        self.config.m1 = m1;
        self.config.m2 = m2;
        self
    }

    /// Set both arm lengths.
    #[must_use]
    pub const fn lengths(mut self, l1: f64, l2: f64) -> Self {
        self.config.l1 = l1;
        self.config.l2 = l2;
        self
    }

    /// Set gravitational acceleration.
    #[must_use]
    pub const fn gravity(mut self, g: f64) -> Self {
        self.config.g = g;
        self
    }

    /// Set initial arm angles in radians.
    #[must_use]
    pub const fn initial_angles(mut self, q0: f64, r0: f64) -> Self {
        self.config.q0 = q0;
        self.config.r0 = r0;
        self
    }

    /// Set initial arm angles in degrees.
    #[must_use]
    pub fn initial_angles_deg(self, q0: f64, r0: f64) -> Self {
        self.initial_angles(q0.to_radians(), r0.to_radians())
    }

    /// Set initial angular velocities (rad/s).
    #[must_use]
    pub const fn initial_velocities(mut self, u0: f64, v0: f64) -> Self {
        self.config.u0 = u0;
        self.config.v0 = v0;
        self
    }

    /// Set start time.
    #[must_use]
    pub const fn start_time(mut self, t0: f64) -> Self {
        self.config.t0 = t0;
        self
    }

    /// Set the step size in seconds.
    #[must_use]
    pub const fn step(mut self, h: f64) -> Self {
        self.config.h = h;
        self
    }

    /// Set the exclusive horizon in seconds.
    #[must_use]
    pub const fn horizon(mut self, horizon: f64) -> Self {
        self.config.horizon = horizon;
        self
    }

    /// Set Jidoka configuration.
    #[must_use]
    pub const fn jidoka(mut self, config: JidokaConfig) -> Self {
        self.config.jidoka = config;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SimConfig {
        self.config
    }
}
