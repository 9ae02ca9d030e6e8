/*! Cost-optimal resource reservations for stochastic jobs

Jobs with unpredictable execution times are submitted to clusters as a
*request sequence*: a reservation of some length is made, and if the job
does not complete within it, a longer one is made (resuming from a
checkpoint if one was written). This crate computes request sequences
that minimize the expected total cost of a job, given

- a [DiscreteDistribution][distribution::DiscreteDistribution] of its
  execution time, typically derived from a historic trace,
- a [CostModel][cost::CostModel] pricing reservations, and
- a [CheckpointModel][cost::CheckpointModel] describing checkpoint and
  restart overheads.

The [optimizer] module contains the dynamic programs; [estimator] wraps
them into a configurable end-to-end pipeline, and [validate] replays
sequences against observed execution times.
*/

pub mod cost;
pub mod distribution;
pub mod error;
pub mod estimator;
pub mod fit;
pub mod optimizer;
pub mod sequence;
pub mod time;
pub mod validate;

pub use error::{Error, Result};
pub use estimator::{Parameters, ResourceEstimator};
pub use sequence::{RequestSequence, Reservation};
