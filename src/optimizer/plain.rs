use super::{Decision, Policy, Scaffold, RECURSION_THRESHOLD};

/// Policy table of the resubmission recurrence, indexed by position
/// (`0..=n`, where `n` is the terminal state).
pub(super) struct Table {
    decisions: Vec<Decision>,
}

impl Policy for Table {
    fn decision(&self, _c: usize, p: usize) -> Decision {
        self.decisions[p]
    }
}

/// Solve
///
/// `E[n] = beta * sumFV`
///
/// `E[i] = min_{i <= j < n} (alpha * v[j] + gamma) * sumF[i] + beta * v[j] * sumF[j+1] + E[j+1]`
///
/// using memoized recursion for small and a bottom-up table fill for
/// large distributions.
pub(super) fn solve(s: &Scaffold) -> Table {
    let decisions = if s.n() < RECURSION_THRESHOLD {
        recursive(s)
    } else {
        iterative(s)
    };
    Table { decisions }
}

/// Best decision in state `i`, given access to the decisions of all
/// states after `i`.
fn decide(s: &Scaffold, i: usize, mut successor: impl FnMut(usize) -> Decision) -> Decision {
    let mut best: Option<Decision> = None;
    for j in i..s.n() {
        let next = successor(j + 1);
        let cost = s.reservation_cost(i, j, 0.0, 0.0, None) + next.cost;
        if s.accepts(cost, best.as_ref(), j, s.successor(j, &next)) {
            best = Some(Decision {
                cost,
                next: j,
                checkpoint: false,
            });
        }
    }
    best.unwrap_or_else(|| Decision::infeasible(s.n()))
}

pub(super) fn iterative(s: &Scaffold) -> Vec<Decision> {
    let n = s.n();
    let mut table = vec![s.terminal(); n + 1];
    for i in (0..n).rev() {
        let d = decide(s, i, |k| table[k]);
        table[i] = d;
    }
    table
}

pub(super) fn recursive(s: &Scaffold) -> Vec<Decision> {
    fn evaluate(s: &Scaffold, i: usize, memo: &mut [Option<Decision>]) -> Decision {
        if let Some(d) = memo[i] {
            return d;
        }
        let d = if i == s.n() {
            s.terminal()
        } else {
            decide(s, i, |k| evaluate(s, k, memo))
        };
        memo[i] = Some(d);
        d
    }

    let mut memo = vec![None; s.n() + 1];
    evaluate(s, 0, &mut memo);
    // evaluating state 0 visits every later state
    memo.into_iter().flatten().collect()
}
