//! Core simulation engine.
//!
//! Implements the central simulation loop with:
//! - A fixed time grid known before the run starts
//! - RK4 stepping of the kinematic state
//! - Jidoka guards for stop-on-error
//! - An optional progress observer

pub mod clock;
pub mod jidoka;
pub mod state;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace};

pub use clock::TimeGrid;
pub use jidoka::{EnergyDriftWarning, JidokaConfig, JidokaGuard};
pub use state::{KinematicState, StateDerivative, StateIncrement};

use crate::config::SimConfig;
use crate::domains::physics::Rk4Integrator;
use crate::error::{SimError, SimResult};
use crate::scenarios::pendulum::DoublePendulum;
use crate::trajectory::{Trajectory, TrajectoryRecord};

/// Records reserved up front; longer runs grow the buffer as they go.
const PREALLOCATED_RECORDS: usize = 1 << 16;

/// Progress report handed to an observer after each completed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    /// Steps completed so far (1-based).
    pub step: usize,
    /// Total steps in the grid.
    pub total: usize,
    /// State after the step.
    pub state: KinematicState,
}

impl StepProgress {
    /// Completed fraction in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.step as f64 / self.total as f64
        }
    }
}

/// Fixed-step double pendulum simulator.
///
/// Owns the running state and the time grid. Each grid point records the
/// pre-step state and then advances it by one RK4 step.
///
/// # Example
///
/// ```rust
/// use double_pendulum::config::SimConfig;
/// use double_pendulum::engine::Simulator;
///
/// let config = SimConfig::builder().initial_angles(0.5, 0.0).horizon(1.0).build();
/// let mut sim = Simulator::new(&config).unwrap();
/// let trajectory = sim.simulate().unwrap();
/// assert_eq!(trajectory.len(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct Simulator {
    /// Physical model.
    model: DoublePendulum,
    /// Running state.
    state: KinematicState,
    /// Time grid.
    grid: TimeGrid,
    /// Jidoka guard for anomaly detection.
    jidoka: JidokaGuard,
    /// Step integrator.
    integrator: Rk4Integrator,
    /// Records emitted so far.
    records: Vec<TrajectoryRecord>,
    /// Grid points consumed so far.
    step: usize,
}

impl Simulator {
    /// Create a simulator from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if configuration validation fails.
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate_config()?;
        let model = DoublePendulum::new(config.params())?;
        let grid = config.time_grid()?;
        Ok(Self::from_parts(
            model,
            config.initial_state(),
            grid,
            config.jidoka.clone(),
        ))
    }

    /// Assemble a simulator from already-built parts.
    ///
    /// The initial state is not validated here; a non-finite state is caught
    /// by the Jidoka guard at step 0 before anything is recorded.
    #[must_use]
    pub fn from_parts(
        model: DoublePendulum,
        initial_state: KinematicState,
        grid: TimeGrid,
        jidoka: JidokaConfig,
    ) -> Self {
        let energy_scale = model.energy_scale();
        Self {
            model,
            state: initial_state,
            records: Vec::with_capacity(grid.len().min(PREALLOCATED_RECORDS)),
            grid,
            jidoka: JidokaGuard::new(jidoka).with_energy_scale(energy_scale),
            integrator: Rk4Integrator::new(),
            step: 0,
        }
    }

    /// Record the current state and advance it by one step.
    ///
    /// Returns `Ok(false)` without doing anything once the grid is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `NumericalInstability` if the state or any RK4 stage is
    /// non-finite. The state and the records are left as they were before
    /// the failing step; the failing grid point itself is not recorded, so
    /// after a failure at step `n` exactly `n` records remain.
    pub fn advance(&mut self) -> SimResult<bool> {
        let i = self.step;
        if i >= self.grid.len() {
            return Ok(false);
        }

        JidokaGuard::check_initial(i, &self.state).map_err(Self::log_stop)?;

        if i == 0 {
            self.jidoka
                .observe_energy(0, self.model.total_energy(&self.state));
        }

        let KinematicState { q, r, t, .. } = self.state;
        let record = TrajectoryRecord::new(self.model.positions(q, r), q, r, t);

        self.integrator
            .step(&self.model, &mut self.state, self.grid.step(), i)
            .map_err(Self::log_stop)?;

        self.records.push(record);
        self.step += 1;
        self.jidoka
            .observe_energy(self.step, self.model.total_energy(&self.state));

        trace!(
            step = i,
            t = self.state.t,
            q = self.state.q,
            r = self.state.r,
            "step"
        );
        Ok(true)
    }

    /// Run the remaining grid and return the full trajectory.
    ///
    /// The records move into the returned trajectory, so
    /// [`Simulator::records`] is empty after a completed run. The grid is
    /// exhausted by then and a second call returns an empty trajectory.
    ///
    /// # Errors
    ///
    /// Returns `NumericalInstability` if any step fails. Records emitted
    /// before the failure stay available through [`Simulator::records`].
    pub fn simulate(&mut self) -> SimResult<Trajectory> {
        self.simulate_with(|_| {})
    }

    /// Run the remaining grid, calling `observer` after each step.
    ///
    /// The observer sees the state but cannot change the run.
    ///
    /// # Errors
    ///
    /// Same as [`Simulator::simulate`].
    pub fn simulate_with<F>(&mut self, mut observer: F) -> SimResult<Trajectory>
    where
        F: FnMut(&StepProgress),
    {
        let total = self.grid.len();
        debug!(
            steps = total,
            h = self.grid.step(),
            t0 = self.grid.start(),
            horizon = self.grid.horizon(),
            order = self.integrator.error_order(),
            symplectic = self.integrator.is_symplectic(),
            "starting simulation"
        );

        while self.advance()? {
            observer(&StepProgress {
                step: self.step,
                total,
                state: self.state,
            });
        }

        info!(
            records = self.records.len(),
            t = self.state.t,
            max_energy_drift = self.jidoka.max_drift(),
            "simulation complete"
        );
        Ok(Trajectory::from_records(std::mem::take(&mut self.records)))
    }

    /// Consume the simulator and keep its records as a trajectory.
    ///
    /// Useful after driving [`Simulator::advance`] by hand.
    #[must_use]
    pub fn into_trajectory(self) -> Trajectory {
        Trajectory::from_records(self.records)
    }

    fn log_stop(err: SimError) -> SimError {
        error!(%err, "simulation stopped");
        err
    }

    /// True once every grid point has been recorded.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.step >= self.grid.len()
    }

    /// Grid points consumed so far.
    #[must_use]
    pub const fn steps_taken(&self) -> usize {
        self.step
    }

    /// Current running state.
    #[must_use]
    pub const fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Records emitted so far by an unfinished or failed run.
    #[must_use]
    pub fn records(&self) -> &[TrajectoryRecord] {
        &self.records
    }

    /// Time grid of this run.
    #[must_use]
    pub const fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Physical model.
    #[must_use]
    pub const fn model(&self) -> &DoublePendulum {
        &self.model
    }

    /// Jidoka guard, including energy drift statistics.
    #[must_use]
    pub const fn guard(&self) -> &JidokaGuard {
        &self.jidoka
    }
}
