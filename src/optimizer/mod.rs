/*! Dynamic programs computing cost-optimal request sequences

Given a [DiscreteDistribution] of execution times, a [CostModel], and a
[CheckpointModel], the functions in this module compute the sequence of
reservations that minimizes the expected total cost of running a job to
completion. Four variants of the recurrence are provided, selected once
per call through [Variant]:

- [Variant::Resubmit]: no checkpointing; every failed reservation is
  followed by a longer one that starts the job over.
- [Variant::AdaptiveCheckpoint]: each reservation may or may not end
  with a checkpoint, as the optimizer decides.
- [Variant::ForcedCheckpoint]: every reservation but the last ends
  with a checkpoint.
- [Variant::Limited]: any of the above, subject to a budget on the
  number of submissions (exact or in expectation).

## State convention

All variants index states by the *first uncovered support index* `p`:
a reservation starting in state `p` is needed only if the job runs
longer than `v[p-1]`, which happens with probability `exceeding(p)`. A
decision in state `p` selects the index `j >= p` of the support value at
which the reservation ends; the successor state is `j + 1`. The
checkpoint-aware variants additionally track `c`, where `c = 0` means
that no checkpoint has been taken yet and `c > 0` means that progress up
to `v[c-1]` has been saved.
*/

use crate::cost::{CheckpointModel, CostModel};
use crate::distribution::{DiscreteDistribution, TailSums};
use crate::error::{Error, Result};
use crate::sequence::{RequestSequence, Reservation};
use crate::time::{Cost, Duration, Time};

mod checkpoint;
mod limited;
mod plain;

pub use limited::Budget;

/// Distributions with fewer points than this are evaluated by memoized
/// recursion; larger ones by an iterative bottom-up table fill.
pub const RECURSION_THRESHOLD: usize = 600;

/// Fixed-point scaling of expected-submission budgets: a budget of
/// `2.5` submissions is tracked as `25` units.
pub const AVERAGE_PRECISION: i64 = 10;

/// Whether reservations end with a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointStrategy {
    /// Never checkpoint; every resubmission starts from scratch.
    #[default]
    Never,
    /// Checkpoint at the end of every reservation but the last.
    Always,
    /// Let the optimizer decide for each reservation.
    Adaptive,
}

/// How a submission budget is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitMode {
    /// The sequence may contain at most `limit` reservations.
    #[default]
    Threshold,
    /// The expected number of submissions may not exceed `limit`.
    Average,
}

/// A cap on the number of submissions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmissionLimit {
    pub limit: f64,
    pub mode: LimitMode,
}

impl SubmissionLimit {
    pub fn threshold(limit: f64) -> Self {
        SubmissionLimit {
            limit,
            mode: LimitMode::Threshold,
        }
    }

    pub fn average(limit: f64) -> Self {
        SubmissionLimit {
            limit,
            mode: LimitMode::Average,
        }
    }

    /// Check that at least one submission is allowed.
    pub fn validate(&self) -> Result<()> {
        if self.limit.is_finite() && self.limit >= 1.0 {
            Ok(())
        } else {
            Err(Error::invalid(format!(
                "the submission limit must be at least 1, got {}",
                self.limit
            )))
        }
    }
}

/// The recurrence to solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variant {
    Resubmit,
    AdaptiveCheckpoint,
    ForcedCheckpoint,
    Limited(CheckpointStrategy, SubmissionLimit),
}

impl Variant {
    /// Pick the recurrence matching a checkpoint strategy and an
    /// optional submission limit.
    pub fn select(strategy: CheckpointStrategy, limit: Option<SubmissionLimit>) -> Self {
        match (limit, strategy) {
            (Some(limit), _) => Variant::Limited(strategy, limit),
            (None, CheckpointStrategy::Never) => Variant::Resubmit,
            (None, CheckpointStrategy::Always) => Variant::ForcedCheckpoint,
            (None, CheckpointStrategy::Adaptive) => Variant::AdaptiveCheckpoint,
        }
    }
}

/// Tuning knobs shared by all variants.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Options {
    /// Minimum gap between consecutive reservation end points.
    pub increment_floor: Duration,
    /// The longest execution time that must be covered. If it exceeds
    /// the distribution's maximum (e.g., because the distribution was
    /// trimmed), a final reservation reaching it is appended. Under a
    /// submission limit, budget is set aside for that reservation.
    pub upper_limit: Option<Time>,
}

/// An entry of a policy table: the minimal expected cost from some
/// state, the support index at which the next reservation ends, and
/// whether it ends with a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub cost: Cost,
    pub next: usize,
    pub checkpoint: bool,
}

impl Decision {
    fn infeasible(n: usize) -> Self {
        Decision {
            cost: f64::INFINITY,
            next: n - 1,
            checkpoint: false,
        }
    }

    fn is_feasible(&self) -> bool {
        self.cost.is_finite()
    }
}

/// The result of an optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub sequence: RequestSequence,
    /// Support indices at which the optimized reservations end (a
    /// final reservation appended to reach the upper limit has none).
    pub breakpoints: Vec<usize>,
    /// Minimal expected cost according to the distribution. A final
    /// reservation appended to reach the upper limit is not included:
    /// it is only submitted if the job outlasts the distribution's
    /// maximum, which has probability `exceeding(n) = 0`.
    pub expected_cost: Cost,
    /// Expected number of submissions implied by the breakpoints (the
    /// appended reservation contributes nothing, for the same reason).
    pub expected_submissions: f64,
}

/// Compute the optimal request sequence for the given distribution,
/// cost model, and checkpoint model.
pub fn optimize<CM: CheckpointModel + ?Sized>(
    dist: &DiscreteDistribution,
    cost: &CostModel,
    checkpoint: &CM,
    variant: Variant,
    options: &Options,
) -> Result<Plan> {
    if !(options.increment_floor.is_finite() && options.increment_floor >= 0.0) {
        return Err(Error::invalid(format!(
            "the increment floor must be non-negative, got {}",
            options.increment_floor
        )));
    }
    if let Variant::Limited(_, limit) = variant {
        limit.validate()?;
    }

    let scaffold = Scaffold::new(dist, *cost, options.increment_floor);
    log::debug!("optimizing {:?} over {} points", variant, scaffold.n());
    let upper_limit = options.upper_limit.unwrap_or_else(|| dist.max_value());

    match variant {
        Variant::Resubmit => Ok(plain::solve(&scaffold).plan(&scaffold, upper_limit)),
        Variant::AdaptiveCheckpoint => {
            Ok(checkpoint::solve(&scaffold, checkpoint, false).plan(&scaffold, upper_limit))
        }
        Variant::ForcedCheckpoint => {
            Ok(checkpoint::solve(&scaffold, checkpoint, true).plan(&scaffold, upper_limit))
        }
        Variant::Limited(strategy, limit) => {
            limited::Limited::new(&scaffold, checkpoint, strategy, limit).plan(upper_limit)
        }
    }
}

/// State shared by all recurrences: the support, the tail-probability
/// table, the cost model, and the increment floor.
pub(crate) struct Scaffold<'a> {
    values: &'a [Time],
    tails: TailSums,
    cost: CostModel,
    increment_floor: Duration,
}

impl<'a> Scaffold<'a> {
    fn new(dist: &'a DiscreteDistribution, cost: CostModel, increment_floor: Duration) -> Self {
        Scaffold {
            values: dist.support(),
            tails: dist.tail_sums(),
            cost,
            increment_floor,
        }
    }

    fn n(&self) -> usize {
        self.values.len()
    }

    /// Once every support value is covered, the only remaining cost is
    /// the utilization of the successful run.
    fn terminal(&self) -> Decision {
        Decision {
            cost: self.cost.beta * self.tails.expected_value(),
            next: self.n() - 1,
            checkpoint: false,
        }
    }

    /// Expected cost of a reservation that starts in state `p`, ends at
    /// support index `j`, and resumes from `saved` progress after a
    /// restart taking `restart` time units. If `checkpoint` is given,
    /// the reservation additionally writes a checkpoint of that cost.
    ///
    /// The reservation is charged whenever the job exceeds `v[p-1]`.
    /// If the job also exceeds `v[j]`, the utilization that is lost
    /// (all work without a checkpoint; only the checkpoint write with
    /// one) is charged on top; useful work is accounted for once, in
    /// the terminal state.
    fn reservation_cost(
        &self,
        p: usize,
        j: usize,
        saved: Time,
        restart: Duration,
        checkpoint: Option<Duration>,
    ) -> Cost {
        let CostModel { alpha, beta, gamma } = self.cost;
        let work = self.values[j] - saved;
        let (write, lost) = match checkpoint {
            Some(c) => (c, c),
            None => (0.0, work),
        };
        (alpha * (restart + work + write) + beta * restart + gamma) * self.tails.exceeding(p)
            + beta * lost * self.tails.exceeding(j + 1)
    }

    /// The acceptance rule shared by all recurrences.
    ///
    /// A candidate ending at `j` is accepted if its cost is finite, not
    /// worse than the best so far (ties go to the later candidate), and
    /// if the reservation chosen after it (`successor`, absent when `j`
    /// completes the job) ends at least `increment_floor` later.
    fn accepts(
        &self,
        candidate: Cost,
        best: Option<&Decision>,
        j: usize,
        successor: Option<usize>,
    ) -> bool {
        if !candidate.is_finite() {
            return false;
        }
        if best.map_or(false, |b| candidate > b.cost) {
            return false;
        }
        successor.map_or(true, |s| self.values[s] - self.values[j] >= self.increment_floor)
    }

    /// Whether a final reservation is needed to reach `upper_limit`.
    fn needs_top_up(&self, upper_limit: Time) -> bool {
        self.values[self.n() - 1] < upper_limit
    }

    /// Assemble the [Plan] from the reconstructed reservations, topping
    /// it up to `upper_limit` (restarting from the `saved` progress) if
    /// the distribution ends before it.
    fn finish(
        &self,
        mut reservations: Vec<Reservation>,
        breakpoints: Vec<usize>,
        saved: Time,
        expected_cost: Cost,
        upper_limit: Time,
    ) -> Plan {
        if self.needs_top_up(upper_limit) {
            reservations.push(Reservation::plain(upper_limit - saved));
        }
        Plan {
            sequence: RequestSequence::new(reservations),
            expected_submissions: self.tails.expected_submissions(&breakpoints),
            breakpoints,
            expected_cost,
        }
    }

    /// The successor breakpoint relevant to [Scaffold::accepts].
    fn successor(&self, j: usize, next: &Decision) -> Option<usize> {
        (j + 1 < self.n()).then_some(next.next)
    }
}

/// A solved policy: walks the decisions from the initial state and
/// turns them into a [Plan].
trait Policy {
    /// Decision in the state reached after following the given
    /// checkpoint index `c` and position `p`.
    fn decision(&self, c: usize, p: usize) -> Decision;

    fn plan(&self, scaffold: &Scaffold, upper_limit: Time) -> Plan {
        let n = scaffold.n();
        let mut reservations = Vec::new();
        let mut breakpoints = Vec::new();
        let (mut c, mut p, mut saved) = (0, 0, 0.0);
        let expected_cost = self.decision(c, p).cost;
        loop {
            let d = self.decision(c, p);
            reservations.push(Reservation::new(
                scaffold.values[d.next] - saved,
                d.checkpoint,
            ));
            breakpoints.push(d.next);
            if d.next + 1 >= n {
                break;
            }
            if d.checkpoint {
                c = d.next + 1;
                saved = scaffold.values[d.next];
            }
            p = d.next + 1;
        }
        scaffold.finish(reservations, breakpoints, saved, expected_cost, upper_limit)
    }
}

#[cfg(test)]
mod tests;
