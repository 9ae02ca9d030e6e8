use std::collections::HashMap;

use derive_more::{Add, Display, From, Sub};

use super::{
    CheckpointStrategy, Decision, LimitMode, Plan, Scaffold, SubmissionLimit, AVERAGE_PRECISION,
};
use crate::cost::CheckpointModel;
use crate::error::{Error, Result};
use crate::sequence::Reservation;
use crate::time::{Probability, Time};

// tolerance for converting probabilities into budget units
const EPSILON: f64 = 1e-9;

/// A remaining submission budget, in the units of a [LimitMode]:
/// whole submissions for [LimitMode::Threshold], and tenths of an
/// expected submission (see [AVERAGE_PRECISION]) for
/// [LimitMode::Average].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Add, Sub, Display)]
pub struct Budget(i64);

impl Budget {
    pub const ZERO: Budget = Budget(0);

    /// The budget available for the reservations of a sequence.
    ///
    /// In average mode, the first submission is certain and therefore
    /// deducted up front.
    pub fn initial(limit: &SubmissionLimit) -> Self {
        match limit.mode {
            LimitMode::Threshold => Budget(limit.limit.floor() as i64),
            LimitMode::Average => Budget(
                (limit.limit * AVERAGE_PRECISION as f64 + EPSILON).floor() as i64
                    - AVERAGE_PRECISION,
            ),
        }
    }

    /// The budget consumed by a reservation after which the job is
    /// still running with probability `exceeding`.
    ///
    /// In average mode, the charge is rounded up so that the expected
    /// number of submissions never exceeds the limit.
    pub fn charge(mode: LimitMode, exceeding: Probability) -> Self {
        match mode {
            LimitMode::Threshold => Budget(1),
            LimitMode::Average => {
                Budget((exceeding * AVERAGE_PRECISION as f64 - EPSILON).ceil().max(0.0) as i64)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StateKey {
    checkpoint: usize,
    position: usize,
    budget: Budget,
}

/// The budget-limited recurrence.
///
/// Most `(checkpoint, position, budget)` combinations are unreachable,
/// so decisions are computed lazily and kept in a sparse memo table.
pub(super) struct Limited<'s, 'a, CM: CheckpointModel + ?Sized> {
    scaffold: &'s Scaffold<'a>,
    model: &'s CM,
    strategy: CheckpointStrategy,
    limit: SubmissionLimit,
    memo: HashMap<StateKey, Decision>,
}

impl<'s, 'a, CM: CheckpointModel + ?Sized> Limited<'s, 'a, CM> {
    pub(super) fn new(
        scaffold: &'s Scaffold<'a>,
        model: &'s CM,
        strategy: CheckpointStrategy,
        limit: SubmissionLimit,
    ) -> Self {
        Limited {
            scaffold,
            model,
            strategy,
            limit,
            memo: HashMap::new(),
        }
    }

    /// Budget consumed by a reservation ending at support index `j`.
    fn charge(&self, j: usize) -> Budget {
        Budget::charge(self.limit.mode, self.scaffold.tails.exceeding(j + 1))
    }

    fn evaluate(&mut self, key: StateKey) -> Decision {
        let s = self.scaffold;
        let n = s.n();
        if key.position == n {
            return s.terminal();
        }
        if let Some(d) = self.memo.get(&key) {
            return *d;
        }

        let p = key.position;
        let c = key.checkpoint;
        let (saved, restart) = if c > 0 {
            (s.values[c - 1], self.model.restart_cost(s.values[p - 1]))
        } else {
            (0.0, 0.0)
        };

        let mut best: Option<Decision> = None;
        for j in p..n {
            let budget = key.budget - self.charge(j);
            if budget < Budget::ZERO {
                continue;
            }
            if self.strategy != CheckpointStrategy::Never && j + 1 < n {
                let write = self.model.checkpoint_cost(s.values[j]);
                let next = self.evaluate(StateKey {
                    checkpoint: j + 1,
                    position: j + 1,
                    budget,
                });
                let cost = s.reservation_cost(p, j, saved, restart, Some(write)) + next.cost;
                if s.accepts(cost, best.as_ref(), j, s.successor(j, &next)) {
                    best = Some(Decision {
                        cost,
                        next: j,
                        checkpoint: true,
                    });
                }
            }
            if self.strategy != CheckpointStrategy::Always || j + 1 == n {
                let next = self.evaluate(StateKey {
                    checkpoint: c,
                    position: j + 1,
                    budget,
                });
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

        let d = best.unwrap_or_else(|| Decision::infeasible(n));
        self.memo.insert(key, d);
        d
    }

    /// Solve the recurrence from the initial state and follow the
    /// decisions to obtain the sequence.
    ///
    /// If a final reservation is needed to reach `upper_limit`, its
    /// charge is deducted from the budget up front: one submission in
    /// threshold mode, and the probability of outlasting the last
    /// breakpoint in average mode.
    pub(super) fn plan(mut self, upper_limit: Time) -> Result<Plan> {
        let s = self.scaffold;
        let n = s.n();
        let mut budget = Budget::initial(&self.limit);
        if s.needs_top_up(upper_limit) {
            budget = budget - Budget::charge(self.limit.mode, s.tails.exceeding(n));
        }
        let infeasible = Error::InfeasiblePolicy {
            budget: self.limit.limit,
        };
        if budget < Budget::ZERO {
            return Err(infeasible);
        }

        let mut key = StateKey {
            checkpoint: 0,
            position: 0,
            budget,
        };
        let root = self.evaluate(key);
        log::trace!("budget-limited memo holds {} states", self.memo.len());
        if !root.is_feasible() {
            return Err(infeasible);
        }

        let mut reservations = Vec::new();
        let mut breakpoints = Vec::new();
        let mut saved = 0.0;
        loop {
            let d = self.evaluate(key);
            reservations.push(Reservation::new(s.values[d.next] - saved, d.checkpoint));
            breakpoints.push(d.next);
            if d.next + 1 >= n {
                break;
            }
            if d.checkpoint {
                key.checkpoint = d.next + 1;
                saved = s.values[d.next];
            }
            key.budget = key.budget - self.charge(d.next);
            key.position = d.next + 1;
        }
        Ok(s.finish(reservations, breakpoints, saved, root.cost, upper_limit))
    }
}
