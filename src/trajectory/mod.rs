//! Simulation output: the time-indexed trajectory of both bobs.
//!
//! A [`Trajectory`] is produced once by a completed simulation run and is
//! immutable afterwards. It is fully materialized, so a renderer may index it
//! randomly or walk it at any stride.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::scenarios::pendulum::CartesianSample;

/// Number of columns in a trajectory row.
pub const ROW_WIDTH: usize = 7;

/// Column names of a trajectory row, in order.
pub const COLUMNS: [&str; ROW_WIDTH] = ["x1", "y1", "x2", "y2", "q", "r", "t"];

/// One sampled instant: bob positions, arm angles and elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// Bob 1 x (m).
    pub x1: f64,
    /// Bob 1 y (m).
    pub y1: f64,
    /// Bob 2 x (m).
    pub x2: f64,
    /// Bob 2 y (m).
    pub y2: f64,
    /// Arm 1 angle (rad).
    pub q: f64,
    /// Arm 2 angle (rad).
    pub r: f64,
    /// Simulation time (s).
    pub t: f64,
}

impl TrajectoryRecord {
    /// Build a record from Cartesian positions and the angular state.
    #[must_use]
    pub const fn new(positions: CartesianSample, q: f64, r: f64, t: f64) -> Self {
        Self {
            x1: positions.x1,
            y1: positions.y1,
            x2: positions.x2,
            y2: positions.y2,
            q,
            r,
            t,
        }
    }

    /// Fixed-width row `[x1, y1, x2, y2, q, r, t]`.
    #[must_use]
    pub const fn to_row(&self) -> [f64; ROW_WIDTH] {
        [self.x1, self.y1, self.x2, self.y2, self.q, self.r, self.t]
    }

    /// Cartesian part of the record.
    #[must_use]
    pub const fn positions(&self) -> CartesianSample {
        CartesianSample {
            x1: self.x1,
            y1: self.y1,
            x2: self.x2,
            y2: self.y2,
        }
    }

    /// Check if all components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_row().iter().all(|x| x.is_finite())
    }
}

/// One animation frame: pivot, bob 1 and bob 2 as `(x, y)` points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Index of the source record.
    pub index: usize,
    /// Simulation time of the source record.
    pub t: f64,
    /// Fixed pivot, always the origin.
    pub pivot: (f64, f64),
    /// Bob 1 position.
    pub bob1: (f64, f64),
    /// Bob 2 position.
    pub bob2: (f64, f64),
}

impl Frame {
    /// Polyline through pivot, bob 1 and bob 2, as drawn for the arms.
    #[must_use]
    pub const fn arm_polyline(&self) -> [(f64, f64); 3] {
        [self.pivot, self.bob1, self.bob2]
    }
}

/// Ordered, immutable sequence of trajectory records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trajectory {
    records: Vec<TrajectoryRecord>,
}

impl Trajectory {
    /// Wrap the records of a completed run.
    pub(crate) fn from_records(records: Vec<TrajectoryRecord>) -> Self {
        Self { records }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the run's time grid was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TrajectoryRecord> {
        self.records.get(index)
    }

    /// First record (the initial condition).
    #[must_use]
    pub fn first(&self) -> Option<&TrajectoryRecord> {
        self.records.first()
    }

    /// Last record.
    #[must_use]
    pub fn last(&self) -> Option<&TrajectoryRecord> {
        self.records.last()
    }

    /// All records in time order.
    #[must_use]
    pub fn records(&self) -> &[TrajectoryRecord] {
        &self.records
    }

    /// Iterate over records in time order.
    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryRecord> {
        self.records.iter()
    }

    /// Recorded times.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|rec| rec.t)
    }

    /// Materialize as fixed-width rows `[x1, y1, x2, y2, q, r, t]`.
    #[must_use]
    pub fn rows(&self) -> Vec<[f64; ROW_WIDTH]> {
        self.records.iter().map(TrajectoryRecord::to_row).collect()
    }

    /// Every `stride`-th record, starting with the first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `stride` is zero.
    pub fn subsample(
        &self,
        stride: usize,
    ) -> SimResult<impl Iterator<Item = (usize, &TrajectoryRecord)> + '_> {
        if stride == 0 {
            return Err(SimError::invalid_parameter("stride", "must be >= 1"));
        }
        Ok(self.records.iter().enumerate().step_by(stride))
    }

    /// Number of animation frames at the given stride: `len / stride`.
    ///
    /// A trailing partial stride does not produce a frame.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `stride` is zero.
    pub fn frame_count(&self, stride: usize) -> SimResult<usize> {
        if stride == 0 {
            return Err(SimError::invalid_parameter("stride", "must be >= 1"));
        }
        Ok(self.records.len() / stride)
    }

    /// Animation frames at the given stride.
    ///
    /// Frame `i` is taken from record `i * stride`, for
    /// `i < frame_count(stride)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `stride` is zero.
    pub fn frames(&self, stride: usize) -> SimResult<Vec<Frame>> {
        let count = self.frame_count(stride)?;
        Ok((0..count)
            .map(|i| {
                let index = i * stride;
                let rec = &self.records[index];
                Frame {
                    index,
                    t: rec.t,
                    pivot: (0.0, 0.0),
                    bob1: (rec.x1, rec.y1),
                    bob2: (rec.x2, rec.y2),
                }
            })
            .collect())
    }

    /// Largest distance of either bob from the pivot over the whole run.
    #[must_use]
    pub fn max_extent(&self) -> f64 {
        self.records
            .iter()
            .map(|rec| rec.x1.hypot(rec.y1).max(rec.x2.hypot(rec.y2)))
            .fold(0.0, f64::max)
    }
}

impl std::ops::Index<usize> for Trajectory {
    type Output = TrajectoryRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryRecord;
    type IntoIter = std::slice::Iter<'a, TrajectoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
