//! Fixed time grid for a simulation run.
//!
//! The grid is the half-open sequence `t0, t0 + h, t0 + 2h, ...` of every
//! point strictly below the horizon `T`. Its length is fixed before the run
//! starts and equals the number of records the run will emit.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Largest grid a run may have (one record per point).
pub const MAX_GRID_POINTS: usize = 10_000_000;

/// Fixed-step time grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    /// Start time.
    t0: f64,
    /// Step size (s).
    h: f64,
    /// Exclusive horizon.
    horizon: f64,
    /// Number of grid points.
    len: usize,
}

impl TimeGrid {
    /// Create a grid from start time, step size and exclusive horizon.
    ///
    /// A horizon at or before `t0` yields an empty grid, not an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `h` is not a finite positive number, if
    /// `t0`/`horizon` are not finite, or if the grid would have more than
    /// [`MAX_GRID_POINTS`] points.
    pub fn new(t0: f64, h: f64, horizon: f64) -> SimResult<Self> {
        if !(h.is_finite() && h > 0.0) {
            return Err(SimError::invalid_parameter(
                "h",
                format!("step size must be finite and > 0, got {h}"),
            ));
        }
        if !t0.is_finite() {
            return Err(SimError::invalid_parameter(
                "t0",
                format!("start time must be finite, got {t0}"),
            ));
        }
        if !horizon.is_finite() {
            return Err(SimError::invalid_parameter(
                "T",
                format!("horizon must be finite, got {horizon}"),
            ));
        }

        let len = if horizon > t0 {
            // ceil of an exact integer quotient is the quotient itself, so
            // the horizon is never a grid point.
            let points = ((horizon - t0) / h).ceil();
            if !(points.is_finite() && points <= MAX_GRID_POINTS as f64) {
                return Err(SimError::invalid_parameter(
                    "T",
                    format!(
                        "grid from {t0} to {horizon} at step {h} exceeds {MAX_GRID_POINTS} points"
                    ),
                ));
            }
            points as usize
        } else {
            0
        };

        Ok(Self { t0, h, horizon, len })
    }

    /// Number of grid points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when the horizon is at or before the start time.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start time.
    #[must_use]
    pub const fn start(&self) -> f64 {
        self.t0
    }

    /// Step size.
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.h
    }

    /// Exclusive horizon.
    #[must_use]
    pub const fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Nominal time of grid point `i`: `t0 + i * h`.
    ///
    /// Diagnostics only. Records carry the integrator's accumulated time,
    /// which may differ from this in the last bits.
    #[must_use]
    pub fn nominal(&self, i: usize) -> Option<f64> {
        (i < self.len).then(|| self.t0 + i as f64 * self.h)
    }

    /// Iterate over nominal grid times.
    pub fn nominal_times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len).map(move |i| self.t0 + i as f64 * self.h)
    }
}
