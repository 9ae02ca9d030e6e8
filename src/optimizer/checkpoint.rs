use super::{Decision, Policy, Scaffold};
use crate::cost::CheckpointModel;
use crate::time::{Duration, Time};

/// Dense policy table of the checkpoint-aware recurrences, indexed by
/// `(c, p)` with `c <= p <= n`.
pub(super) struct Table {
    width: usize,
    cells: Vec<Decision>,
}

impl Table {
    fn new(n: usize) -> Self {
        let width = n + 1;
        Table {
            width,
            cells: vec![Decision::infeasible(n); width * width],
        }
    }

    fn get(&self, c: usize, p: usize) -> Decision {
        self.cells[c * self.width + p]
    }

    fn set(&mut self, c: usize, p: usize, d: Decision) {
        self.cells[c * self.width + p] = d;
    }
}

impl Policy for Table {
    fn decision(&self, c: usize, p: usize) -> Decision {
        self.get(c, p)
    }
}

/// Solve the checkpoint-aware recurrence bottom-up.
///
/// In state `(c, p)`, a reservation ending at `v[j]` either writes a
/// checkpoint (successor `(j+1, j+1)`) or not (successor `(c, j+1)`).
/// If `forced`, only the former is allowed (except for the final
/// reservation, which never checkpoints), so that only the diagonal
/// states `(p, p)` are reachable.
pub(super) fn solve<CM: CheckpointModel + ?Sized>(
    s: &Scaffold,
    model: &CM,
    forced: bool,
) -> Table {
    let n = s.n();
    let mut table = Table::new(n);
    for c in 0..=n {
        table.set(c, n, s.terminal());
    }

    for p in (0..n).rev() {
        // the restart overhead depends only on where we resume
        let restart = if p > 0 {
            model.restart_cost(s.values[p - 1])
        } else {
            0.0
        };
        let states: Vec<usize> = if forced {
            vec![p]
        } else {
            (0..=p).collect()
        };
        for c in states {
            let saved = if c > 0 { s.values[c - 1] } else { 0.0 };
            let restart = if c > 0 { restart } else { 0.0 };
            let d = decide(s, model, &table, c, p, saved, restart, forced);
            table.set(c, p, d);
        }
    }
    log::trace!("filled checkpoint table of {} x {} states", n + 1, n + 1);
    table
}

#[allow(clippy::too_many_arguments)]
fn decide<CM: CheckpointModel + ?Sized>(
    s: &Scaffold,
    model: &CM,
    table: &Table,
    c: usize,
    p: usize,
    saved: Time,
    restart: Duration,
    forced: bool,
) -> Decision {
    let n = s.n();
    let mut best: Option<Decision> = None;
    for j in p..n {
        // no point in checkpointing the reservation that completes the job
        if j + 1 < n {
            let write = model.checkpoint_cost(s.values[j]);
            let next = table.get(j + 1, j + 1);
            let cost = s.reservation_cost(p, j, saved, restart, Some(write)) + next.cost;
            if s.accepts(cost, best.as_ref(), j, s.successor(j, &next)) {
                best = Some(Decision {
                    cost,
                    next: j,
                    checkpoint: true,
                });
            }
        }
        if !forced || j + 1 == n {
            let next = table.get(c, j + 1);
            let cost = s.reservation_cost(p, j, saved, restart, None) + next.cost;
            if s.accepts(cost, best.as_ref(), j, s.successor(j, &next)) {
                best = Some(Decision {
                    cost,
                    next: j,
                    checkpoint: false,
                });
            }
        }
    }
    best.unwrap_or_else(|| Decision::infeasible(n))
}
