/*! Replay of request sequences against observed execution times

The optimizer judges a sequence by the expectation over its own
discretized distribution. The functions in this module judge it
independently, by replaying the sequence against a trace of execution
times (e.g., held-out data) under a given [CostModel]. */

use crate::cost::CostModel;
use crate::error::{Error, Result};
use crate::sequence::RequestSequence;
use crate::time::{Cost, Duration};

/// The cost incurred by a job that runs for `duration` time units when
/// submitted according to `sequence`.
///
/// Reservations are charged one after the other until one of them
/// (together with the progress saved by earlier checkpoints) suffices
/// to complete the job. If the whole sequence is too short, every
/// reservation is charged.
pub fn instance_cost(sequence: &RequestSequence, duration: Duration, cost: &CostModel) -> Cost {
    let mut total = 0.0;
    let mut completed = 0.0;
    for r in sequence {
        total += cost.reservation_cost(r.length, duration - completed);
        if completed + r.length >= duration {
            break;
        }
        if r.checkpoint {
            completed += r.length;
        }
    }
    total
}

/// The average of [instance_cost] over all given execution times.
pub fn average_cost(
    sequence: &RequestSequence,
    durations: &[Duration],
    cost: &CostModel,
) -> Result<Cost> {
    if durations.is_empty() {
        return Err(Error::invalid("cannot replay a sequence against an empty trace"));
    }
    let uncovered = durations
        .iter()
        .filter(|d| **d > sequence.coverage())
        .count();
    if uncovered > 0 {
        log::warn!(
            "{} of {} execution times exceed the sequence's coverage of {}",
            uncovered,
            durations.len(),
            sequence.coverage()
        );
    }
    let total: Cost = durations
        .iter()
        .map(|d| instance_cost(sequence, *d, cost))
        .sum();
    Ok(total / durations.len() as f64)
}
