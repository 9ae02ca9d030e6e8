use assert_approx_eq::assert_approx_eq;
use itertools::Itertools;

use crate::cost::{CheckpointModel, CostModel, Dynamic, Static};
use crate::distribution::DiscreteDistribution;
use crate::error::Error;
use crate::optimizer::{
    optimize, plain, CheckpointStrategy, LimitMode, Options, Plan, Scaffold, SubmissionLimit,
    Variant,
};
use crate::sequence::Reservation;
use crate::tests::{geometric, trace, uniform};
use crate::validate::average_cost;

const STRATEGIES: [CheckpointStrategy; 3] = [
    CheckpointStrategy::Never,
    CheckpointStrategy::Always,
    CheckpointStrategy::Adaptive,
];

fn all_variants() -> Vec<Variant> {
    let mut variants = vec![
        Variant::Resubmit,
        Variant::AdaptiveCheckpoint,
        Variant::ForcedCheckpoint,
    ];
    for strategy in STRATEGIES {
        variants.push(Variant::Limited(strategy, SubmissionLimit::threshold(3.0)));
        variants.push(Variant::Limited(strategy, SubmissionLimit::average(1.5)));
    }
    variants
}

fn run(dist: &DiscreteDistribution, cost: &CostModel, variant: Variant) -> Plan {
    optimize(dist, cost, &Static::default(), variant, &Options::default()).unwrap()
}

fn breakpoint_values(dist: &DiscreteDistribution, plan: &Plan) -> Vec<f64> {
    plan.breakpoints.iter().map(|j| dist.support()[*j]).collect()
}

#[test]
fn single_point() {
    let dist = DiscreteDistribution::point(42.0);
    for variant in all_variants() {
        let plan = run(&dist, &CostModel::default(), variant);
        assert_eq!(plan.sequence.reservations(), &[Reservation::plain(42.0)]);
        assert_eq!(plan.breakpoints, vec![0]);
        assert_approx_eq!(plan.expected_cost, 84.0);
        assert_approx_eq!(plan.expected_submissions, 1.0);
    }
}

#[test]
fn ties_go_to_longer_reservation() {
    // with reservation-only pricing every candidate costs 4
    let dist = uniform(&[1.0, 2.0, 3.0, 4.0]);
    let plan = run(&dist, &CostModel::reservation_only(), Variant::Resubmit);
    assert_eq!(plan.sequence.reservations(), &[Reservation::plain(4.0)]);
    assert_approx_eq!(plan.expected_cost, 4.0);
}

#[test]
fn checkpoint_splits_work() {
    let dist = uniform(&[1.0, 2.0]);
    let cost = CostModel::reservation_only();
    let free = Static::new(0.0, 0.0);
    let opts = Options::default();

    let plain = optimize(&dist, &cost, &free, Variant::Resubmit, &opts).unwrap();
    assert_eq!(plain.sequence.reservations(), &[Reservation::plain(2.0)]);
    assert_approx_eq!(plain.expected_cost, 2.0);

    let split = [Reservation::new(1.0, true), Reservation::plain(1.0)];
    for variant in [Variant::AdaptiveCheckpoint, Variant::ForcedCheckpoint] {
        let plan = optimize(&dist, &cost, &free, variant, &opts).unwrap();
        assert_eq!(plan.sequence.reservations(), &split);
        assert_approx_eq!(plan.expected_cost, 1.5);
        assert_approx_eq!(plan.expected_submissions, 1.5);
    }

    // a single submission rules out the split
    let one = Variant::Limited(CheckpointStrategy::Adaptive, SubmissionLimit::threshold(1.0));
    let plan = optimize(&dist, &cost, &free, one, &opts).unwrap();
    assert_eq!(plan.sequence.reservations(), &[Reservation::plain(2.0)]);
    let two = Variant::Limited(CheckpointStrategy::Adaptive, SubmissionLimit::threshold(2.0));
    let plan = optimize(&dist, &cost, &free, two, &opts).unwrap();
    assert_eq!(plan.sequence.reservations(), &split);

    // the split needs 1.5 submissions on average
    let tight = Variant::Limited(CheckpointStrategy::Always, SubmissionLimit::average(1.4));
    let plan = optimize(&dist, &cost, &free, tight, &opts).unwrap();
    assert_eq!(plan.sequence.reservations(), &[Reservation::plain(2.0)]);
    let enough = Variant::Limited(CheckpointStrategy::Always, SubmissionLimit::average(1.5));
    let plan = optimize(&dist, &cost, &free, enough, &opts).unwrap();
    assert_eq!(plan.sequence.reservations(), &split);
    assert_approx_eq!(plan.expected_cost, 1.5);
}

#[test]
fn recursive_matches_iterative() {
    for n in [1, 2, 17, 120] {
        let dist = geometric(n);
        let scaffold = Scaffold::new(&dist, CostModel::new(1.0, 0.5, 3.0).unwrap(), 0.0);
        let a = plain::recursive(&scaffold);
        let b = plain::iterative(&scaffold);
        assert_eq!(a.len(), n + 1);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.next, y.next);
            assert_approx_eq!(x.cost, y.cost);
        }
    }
}

#[test]
fn large_distribution() {
    // beyond the recursion threshold
    let dist = geometric(650);
    let plan = run(&dist, &CostModel::default(), Variant::Resubmit);
    assert_approx_eq!(plan.sequence.coverage(), 650.0);
    assert!(plan.breakpoints.iter().tuple_windows().all(|(a, b)| a < b));
}

#[test]
fn deterministic() {
    let dist = geometric(60);
    let cost = CostModel::new(1.0, 1.0, 2.0).unwrap();
    for variant in all_variants() {
        assert_eq!(run(&dist, &cost, variant), run(&dist, &cost, variant));
    }
}

#[test]
fn expected_cost_matches_replay() {
    let samples = trace();
    let dist = DiscreteDistribution::from_samples(&samples).unwrap();
    let cost = CostModel::new(1.0, 1.0, 0.5).unwrap();
    let plan = run(&dist, &cost, Variant::Resubmit);
    let replayed = average_cost(&plan.sequence, &samples, &cost).unwrap();
    assert_approx_eq!(plan.expected_cost, replayed);
}

#[test]
fn more_training_data_never_hurts() {
    // the longest run comes first so that every subset covers it
    let mut samples = trace();
    samples.rotate_right(1);
    let cost = CostModel::new(1.0, 1.0, 1.0).unwrap();
    let full = DiscreteDistribution::from_samples(&samples).unwrap();
    let best = average_cost(
        &run(&full, &cost, Variant::Resubmit).sequence,
        &samples,
        &cost,
    )
    .unwrap();
    for size in [1, 5, 10, 20, 29] {
        let subset = DiscreteDistribution::from_samples(&samples[..size]).unwrap();
        let plan = run(&subset, &cost, Variant::Resubmit);
        let realized = average_cost(&plan.sequence, &samples, &cost).unwrap();
        assert!(best <= realized + 1e-9, "{} > {} with {} samples", best, realized, size);
    }
}

#[test]
fn checkpointing_never_costs_more() {
    let dist = geometric(40);
    let cost = CostModel::new(1.0, 1.0, 2.0).unwrap();
    let checkpoints: [Box<dyn CheckpointModel>; 2] = [
        Box::new(Static::new(0.5, 0.5)),
        Box::new(Dynamic::new(vec![(0.0, 1.0), (10.0, 3.0)], 0.5, 0.2).unwrap()),
    ];
    let opts = Options::default();
    for model in checkpoints.iter() {
        let plain = optimize(&dist, &cost, model, Variant::Resubmit, &opts).unwrap();
        let adaptive = optimize(&dist, &cost, model, Variant::AdaptiveCheckpoint, &opts).unwrap();
        let forced = optimize(&dist, &cost, model, Variant::ForcedCheckpoint, &opts).unwrap();
        assert!(adaptive.expected_cost <= plain.expected_cost + 1e-9);
        assert!(adaptive.expected_cost <= forced.expected_cost + 1e-9);
    }
}

#[test]
fn forced_checkpoints() {
    let dist = geometric(40);
    let cost = CostModel::default();
    let model = Dynamic::constant(0.1).unwrap();
    let plan = optimize(&dist, &cost, &model, Variant::ForcedCheckpoint, &Options::default()).unwrap();
    let flags = plan.sequence.iter().map(|r| r.checkpoint).collect_vec();
    let (last, rest) = flags.split_last().unwrap();
    assert!(!last);
    assert!(rest.iter().all(|c| *c));
    assert_approx_eq!(plan.sequence.coverage(), 40.0);
    // reservations resume from saved progress
    assert_approx_eq!(plan.sequence.lengths().iter().sum::<f64>(), 40.0);
}

#[test]
fn adaptive_resumes_from_checkpoint() {
    let dist = geometric(30);
    let plan = optimize(
        &dist,
        &CostModel::default(),
        &Static::new(0.2, 0.2),
        Variant::AdaptiveCheckpoint,
        &Options::default(),
    )
    .unwrap();
    let mut saved = 0.0;
    for (r, j) in plan.sequence.iter().zip(plan.breakpoints.iter()) {
        assert_approx_eq!(saved + r.length, dist.support()[*j]);
        if r.checkpoint {
            saved += r.length;
        }
    }
    assert_approx_eq!(plan.sequence.coverage(), 30.0);
}

#[test]
fn threshold_limits_length() {
    let dist = geometric(50);
    let cost = CostModel::new(1.0, 1.0, 0.0).unwrap();
    for strategy in STRATEGIES {
        let mut previous = f64::INFINITY;
        for k in 1..=6 {
            let limit = SubmissionLimit::threshold(k as f64);
            let plan = run(&dist, &cost, Variant::Limited(strategy, limit));
            assert!(plan.sequence.len() <= k);
            assert_approx_eq!(plan.sequence.coverage(), 50.0);
            // a larger budget can only help
            assert!(plan.expected_cost <= previous + 1e-9);
            previous = plan.expected_cost;
        }
        let unlimited = run(&dist, &cost, Variant::select(strategy, None));
        assert!(unlimited.expected_cost <= previous + 1e-9);
    }
}

#[test]
fn generous_threshold_matches_unlimited() {
    let dist = geometric(25);
    let cost = CostModel::new(1.0, 1.0, 1.0).unwrap();
    let limited = run(
        &dist,
        &cost,
        Variant::Limited(CheckpointStrategy::Never, SubmissionLimit::threshold(25.0)),
    );
    let unlimited = run(&dist, &cost, Variant::Resubmit);
    assert_eq!(limited.breakpoints, unlimited.breakpoints);
    assert_approx_eq!(limited.expected_cost, unlimited.expected_cost);
}

#[test]
fn average_limits_expected_submissions() {
    let dist = geometric(50);
    let cost = CostModel::new(1.0, 1.0, 0.0).unwrap();
    for strategy in STRATEGIES {
        for limit in [1.0, 1.2, 1.5, 2.0, 3.7] {
            let plan = run(
                &dist,
                &cost,
                Variant::Limited(strategy, SubmissionLimit::average(limit)),
            );
            assert!(plan.expected_submissions <= limit + 1e-9);
            assert_approx_eq!(plan.sequence.coverage(), 50.0);
        }
    }
}

#[test]
fn increment_floor() {
    let dist = geometric(60);
    let cost = CostModel::new(1.0, 1.0, 0.5).unwrap();
    for floor in [0.0, 3.0, 10.0] {
        let opts = Options {
            increment_floor: floor,
            upper_limit: None,
        };
        for variant in all_variants() {
            let plan = optimize(&dist, &cost, &Static::default(), variant, &opts).unwrap();
            let values = breakpoint_values(&dist, &plan);
            assert!(values.iter().tuple_windows().all(|(a, b)| b - a >= floor));
            assert_approx_eq!(values[values.len() - 1], 60.0);
        }
    }
    // nothing but the full reservation fits
    let opts = Options {
        increment_floor: 100.0,
        upper_limit: None,
    };
    let plan = optimize(&dist, &cost, &Static::default(), Variant::Resubmit, &opts).unwrap();
    assert_eq!(plan.sequence.reservations(), &[Reservation::plain(60.0)]);
}

#[test]
fn upper_limit_is_covered() {
    let dist = uniform(&[1.0, 2.0, 3.0, 4.0]);
    let cost = CostModel::default();
    let opts = Options {
        increment_floor: 0.0,
        upper_limit: Some(10.0),
    };
    for variant in [Variant::Resubmit, Variant::ForcedCheckpoint] {
        let plan = optimize(&dist, &cost, &Static::default(), variant, &opts).unwrap();
        assert_eq!(plan.sequence.len(), plan.breakpoints.len() + 1);
        assert_approx_eq!(plan.sequence.coverage(), 10.0);
        assert!(!plan.sequence.reservations()[plan.sequence.len() - 1].checkpoint);
    }
}

#[test]
fn budgeted_upper_limit_is_covered() {
    let dist = geometric(30);
    let cost = CostModel::default();
    let opts = Options {
        increment_floor: 0.0,
        upper_limit: Some(45.0),
    };
    for strategy in STRATEGIES {
        for k in 2..=4 {
            let limit = SubmissionLimit::threshold(k as f64);
            let plan = optimize(
                &dist,
                &cost,
                &Static::default(),
                Variant::Limited(strategy, limit),
                &opts,
            )
            .unwrap();
            // room is left for the final reservation
            assert!(plan.breakpoints.len() < k);
            assert_eq!(plan.sequence.len(), plan.breakpoints.len() + 1);
            assert!(plan.sequence.len() <= k);
            assert_approx_eq!(plan.sequence.coverage(), 45.0);
        }
        for limit in [1.0, 1.3, 2.0] {
            let limit = SubmissionLimit::average(limit);
            let plan = optimize(
                &dist,
                &cost,
                &Static::default(),
                Variant::Limited(strategy, limit),
                &opts,
            )
            .unwrap();
            assert_approx_eq!(plan.sequence.coverage(), 45.0);
            assert!(plan.expected_submissions <= limit.limit + 1e-9);
        }
    }
}

#[test]
fn top_up_is_excluded_from_expectations() {
    let dist = uniform(&[1.0, 2.0, 3.0, 4.0]);
    let cost = CostModel::default();
    let opts = Options {
        increment_floor: 0.0,
        upper_limit: Some(10.0),
    };
    // threshold budgets shrink by the final reservation
    let unaffected = all_variants().into_iter().filter(|v| {
        !matches!(v, Variant::Limited(_, limit) if limit.mode == LimitMode::Threshold)
    });
    for variant in unaffected {
        let bare = run(&dist, &cost, variant);
        let plan = optimize(&dist, &cost, &Static::default(), variant, &opts).unwrap();
        assert_eq!(plan.sequence.len(), bare.sequence.len() + 1);
        assert_approx_eq!(plan.sequence.coverage(), 10.0);
        assert_approx_eq!(plan.expected_cost, bare.expected_cost);
        assert_approx_eq!(plan.expected_submissions, bare.expected_submissions);
    }
}

#[test]
fn budget_too_small_for_upper_limit() {
    let dist = uniform(&[1.0, 2.0, 3.0, 4.0]);
    let opts = Options {
        increment_floor: 0.0,
        upper_limit: Some(10.0),
    };
    for strategy in STRATEGIES {
        let single = Variant::Limited(strategy, SubmissionLimit::threshold(1.0));
        let result = optimize(&dist, &CostModel::default(), &Static::default(), single, &opts);
        assert_eq!(result, Err(Error::InfeasiblePolicy { budget: 1.0 }));
    }
    // without the extra reservation, one submission suffices
    let single = Variant::Limited(CheckpointStrategy::Never, SubmissionLimit::threshold(1.0));
    let plan = optimize(
        &dist,
        &CostModel::default(),
        &Static::default(),
        single,
        &Options::default(),
    )
    .unwrap();
    assert_eq!(plan.sequence.reservations(), &[Reservation::plain(4.0)]);
}

#[test]
fn invalid_options() {
    let dist = geometric(5);
    let cost = CostModel::default();
    let bad_limit = Variant::Limited(CheckpointStrategy::Never, SubmissionLimit::threshold(0.0));
    assert!(optimize(&dist, &cost, &Static::default(), bad_limit, &Options::default()).is_err());
    let nan_limit = Variant::Limited(CheckpointStrategy::Never, SubmissionLimit::average(f64::NAN));
    assert!(optimize(&dist, &cost, &Static::default(), nan_limit, &Options::default()).is_err());
    let bad_floor = Options {
        increment_floor: -1.0,
        upper_limit: None,
    };
    assert!(optimize(&dist, &cost, &Static::default(), Variant::Resubmit, &bad_floor).is_err());
}

#[test]
fn variant_selection() {
    use CheckpointStrategy::*;
    assert_eq!(Variant::select(Never, None), Variant::Resubmit);
    assert_eq!(Variant::select(Always, None), Variant::ForcedCheckpoint);
    assert_eq!(Variant::select(Adaptive, None), Variant::AdaptiveCheckpoint);
    let limit = SubmissionLimit::average(2.0);
    assert_eq!(
        Variant::select(Always, Some(limit)),
        Variant::Limited(Always, limit)
    );
}
