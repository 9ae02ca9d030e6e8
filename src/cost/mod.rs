/*! Models of the cost of reserving compute resources

This module provides [CostModel], the linear price of a single
reservation, and the trait [CheckpointModel], which describes how long it
takes to write and to read back a checkpoint at a given point of a job's
execution. Two checkpoint models are provided: [Static] (constant costs)
and [Dynamic] (checkpoint size varying over time). */

use auto_impl::auto_impl;

use crate::error::{Error, Result};
use crate::time::{Cost, Duration, Time};

/// The price of reservations on a cluster.
///
/// For a job that runs for `t` more time units, a reservation of
/// length `r` costs `alpha * r + beta * min(t, r) + gamma`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Cost per reserved time unit, charged regardless of use.
    pub alpha: f64,
    /// Cost per utilized time unit.
    pub beta: f64,
    /// Fixed cost per reservation (e.g., deployment overhead).
    pub gamma: f64,
}

impl CostModel {
    /// Construct a new cost model; all coefficients must be non-negative.
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
        if [alpha, beta, gamma].iter().any(|c| !(c.is_finite() && *c >= 0.0)) {
            return Err(Error::invalid(format!(
                "cost coefficients must be non-negative, got ({}, {}, {})",
                alpha, beta, gamma
            )));
        }
        Ok(CostModel { alpha, beta, gamma })
    }

    /// Pay for what is reserved, as on most cloud platforms.
    pub fn reservation_only() -> Self {
        CostModel {
            alpha: 1.0,
            beta: 0.0,
            gamma: 0.0,
        }
    }

    /// Cost of one reservation of length `reserved` for a job that
    /// still needs `remaining` time units.
    pub fn reservation_cost(&self, reserved: Duration, remaining: Duration) -> Cost {
        self.alpha * reserved + self.beta * remaining.min(reserved) + self.gamma
    }
}

impl Default for CostModel {
    /// Pay for what is reserved and for what is used, as on most HPC
    /// platforms.
    fn default() -> Self {
        CostModel {
            alpha: 1.0,
            beta: 1.0,
            gamma: 0.0,
        }
    }
}

/// Generic interface for models of checkpoint/restart overheads.
#[auto_impl(&, Box, Rc)]
pub trait CheckpointModel {
    /// Time needed to write a checkpoint after `ts` time units of execution.
    fn checkpoint_cost(&self, ts: Time) -> Duration;

    /// Time needed to restart from a checkpoint taken after `ts` time
    /// units of execution.
    fn restart_cost(&self, ts: Time) -> Duration;
}

mod dynamic;
mod fixed;

pub use dynamic::Dynamic;
pub use fixed::Static;
