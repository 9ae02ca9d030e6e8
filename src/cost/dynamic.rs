use itertools::Itertools;

use super::CheckpointModel;
use crate::error::{Error, Result};
use crate::time::{Duration, Time};

/// Checkpoint and restart overheads derived from a checkpoint size that
/// varies over the course of a job's execution.
///
/// The size is piecewise constant: a breakpoint `(ts, size)` states
/// that from time `ts` onwards (until the next breakpoint) a checkpoint
/// has the given size. The overheads are obtained by scaling the size
/// with a per-unit write or read time.
#[derive(Debug, Clone, PartialEq)]
pub struct Dynamic {
    sizes: Vec<(Time, f64)>,
    write_bandwidth: f64,
    read_bandwidth: f64,
}

impl Dynamic {
    /// Construct a dynamic checkpoint model.
    ///
    /// The breakpoints must start at time zero, have strictly
    /// increasing timestamps, and strictly positive sizes. The
    /// bandwidths are the time needed to write and to read one unit of
    /// checkpoint data, respectively.
    pub fn new(sizes: Vec<(Time, f64)>, write_bandwidth: f64, read_bandwidth: f64) -> Result<Self> {
        match sizes.first() {
            Some((ts, _)) if *ts == 0.0 => (),
            _ => {
                return Err(Error::invalid(
                    "checkpoint sizes need to be given from time 0 on",
                ))
            }
        }
        if !sizes.iter().tuple_windows().all(|(a, b)| a.0 < b.0) {
            return Err(Error::invalid(
                "checkpoint size timestamps must be strictly increasing",
            ));
        }
        if let Some((ts, size)) = sizes.iter().find(|(_, s)| !(*s > 0.0)) {
            return Err(Error::invalid(format!(
                "checkpoint size at time {} must be positive, got {}",
                ts, size
            )));
        }
        if !(write_bandwidth > 0.0 && read_bandwidth > 0.0) {
            return Err(Error::invalid("checkpoint bandwidths must be positive"));
        }
        Ok(Dynamic {
            sizes,
            write_bandwidth,
            read_bandwidth,
        })
    }

    /// A checkpoint of constant `size` with unit bandwidths.
    pub fn constant(size: f64) -> Result<Self> {
        Dynamic::new(vec![(0.0, size)], 1.0, 1.0)
    }

    /// The checkpoint size after `ts` time units of execution.
    pub fn size_at(&self, ts: Time) -> f64 {
        // index of the first breakpoint strictly after ts
        let after = self.sizes.partition_point(|(start, _)| *start <= ts);
        self.sizes[after.saturating_sub(1)].1
    }
}

impl CheckpointModel for Dynamic {
    fn checkpoint_cost(&self, ts: Time) -> Duration {
        self.write_bandwidth * self.size_at(ts)
    }

    fn restart_cost(&self, ts: Time) -> Duration {
        self.read_bandwidth * self.size_at(ts)
    }
}
