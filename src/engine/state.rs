//! Kinematic state of the double pendulum.
//!
//! The state is the 5-tuple `(q, r, u, v, t)`:
//! - `q`, `r`: angles of arm 1 and arm 2 from the downward vertical (rad)
//! - `u`, `v`: angular velocities `dq/dt`, `dr/dt` (rad/s)
//! - `t`: elapsed simulation time (s)
//!
//! Angles are never wrapped to a canonical range.

use serde::{Deserialize, Serialize};

/// Names of the five state slots, in storage order.
pub const COMPONENT_NAMES: [&str; 5] = ["q", "r", "u", "v", "t"];

/// Kinematic state `(q, r, u, v, t)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KinematicState {
    /// Angle of arm 1 from vertical (rad).
    pub q: f64,
    /// Angle of arm 2 from vertical (rad).
    pub r: f64,
    /// Angular velocity of arm 1 (rad/s).
    pub u: f64,
    /// Angular velocity of arm 2 (rad/s).
    pub v: f64,
    /// Elapsed simulation time (s).
    pub t: f64,
}

impl KinematicState {
    /// Create a new state.
    #[must_use]
    pub const fn new(q: f64, r: f64, u: f64, v: f64, t: f64) -> Self {
        Self { q, r, u, v, t }
    }

    /// Both arms hanging straight down, at rest, at time `t`.
    #[must_use]
    pub const fn at_rest(t: f64) -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, t)
    }

    /// State as a fixed-size array in `(q, r, u, v, t)` order.
    #[must_use]
    pub const fn to_array(&self) -> [f64; 5] {
        [self.q, self.r, self.u, self.v, self.t]
    }

    /// Build a state from a `(q, r, u, v, t)` array.
    #[must_use]
    pub const fn from_array(a: [f64; 5]) -> Self {
        Self::new(a[0], a[1], a[2], a[3], a[4])
    }

    /// `self + scale * k`, applied to all five slots.
    ///
    /// Used to build the intermediate RK4 stage states.
    #[must_use]
    pub fn offset(&self, k: &StateIncrement, scale: f64) -> Self {
        Self {
            q: self.q + scale * k.dq,
            r: self.r + scale * k.dr,
            u: self.u + scale * k.du,
            v: self.v + scale * k.dv,
            t: self.t + scale * k.dt,
        }
    }

    /// First non-finite slot, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.to_array()
            .iter()
            .zip(COMPONENT_NAMES)
            .find(|(value, _)| !value.is_finite())
            .map(|(_, name)| name)
    }

    /// Check if all components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }
}

impl std::fmt::Display for KinematicState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "q={:.6}, r={:.6}, u={:.6}, v={:.6}, t={:.6}",
            self.q, self.r, self.u, self.v, self.t
        )
    }
}

/// Rate of change of the angular part of the state: `(dq, dr, du, dv)`.
///
/// The system is autonomous, so this carries no time slot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateDerivative {
    /// dq/dt.
    pub dq: f64,
    /// dr/dt.
    pub dr: f64,
    /// du/dt.
    pub du: f64,
    /// dv/dt.
    pub dv: f64,
}

impl StateDerivative {
    /// Create a new derivative.
    #[must_use]
    pub const fn new(dq: f64, dr: f64, du: f64, dv: f64) -> Self {
        Self { dq, dr, du, dv }
    }

    /// Derivative as a `(dq, dr, du, dv)` array.
    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.dq, self.dr, self.du, self.dv]
    }

    /// Extend with the unit time derivative and scale by the step size.
    ///
    /// This is one RK4 stage `k = h * (dq, dr, du, dv, 1)`.
    #[must_use]
    pub fn scaled_increment(&self, h: f64) -> StateIncrement {
        StateIncrement {
            dq: h * self.dq,
            dr: h * self.dr,
            du: h * self.du,
            dv: h * self.dv,
            dt: h,
        }
    }
}

/// A full 5-slot increment `(Δq, Δr, Δu, Δv, Δt)`: one RK4 stage or the
/// weighted combination of four stages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateIncrement {
    /// Δq.
    pub dq: f64,
    /// Δr.
    pub dr: f64,
    /// Δu.
    pub du: f64,
    /// Δv.
    pub dv: f64,
    /// Δt.
    pub dt: f64,
}

impl StateIncrement {
    /// First non-finite slot, named after the derivative it came from.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            (self.dq, "dq"),
            (self.dr, "dr"),
            (self.du, "du"),
            (self.dv, "dv"),
            (self.dt, "dt"),
        ]
        .into_iter()
        .find(|(value, _)| !value.is_finite())
        .map(|(_, name)| name)
    }
}
