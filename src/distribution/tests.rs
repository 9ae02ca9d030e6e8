use assert_approx_eq::assert_approx_eq;
use itertools::Itertools;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::distribution::DiscreteDistribution;
use crate::tests::{trace, uniform};

fn check_invariants(dist: &DiscreteDistribution) {
    assert!(!dist.is_empty());
    assert_eq!(dist.support().len(), dist.cdf().len());
    assert!(dist.support().iter().tuple_windows().all(|(a, b)| a < b));
    assert!(dist.cdf().iter().tuple_windows().all(|(a, b)| a <= b));
    assert!(dist.cdf().iter().all(|f| (0.0..=1.0).contains(f)));
    assert_approx_eq!(dist.cdf()[dist.len() - 1], 1.0);
}

#[test]
fn empirical_cdf() {
    let dist = DiscreteDistribution::from_samples(&[4.0, 1.0, 2.0, 2.0, 4.0, 4.0, 3.0, 2.0]).unwrap();
    check_invariants(&dist);
    assert_eq!(dist.support(), &[1.0, 2.0, 3.0, 4.0]);
    let expected = [1.0 / 8.0, 4.0 / 8.0, 5.0 / 8.0, 1.0];
    for (f, e) in dist.cdf().iter().zip(expected.iter()) {
        assert_approx_eq!(*f, *e);
    }
    assert_approx_eq!(dist.tail_mass(1), 3.0 / 8.0);
}

#[test]
fn identical_samples() {
    let dist = DiscreteDistribution::from_samples(&[5.5; 17]).unwrap();
    assert_eq!(dist, DiscreteDistribution::point(5.5));
    check_invariants(&dist);
}

#[test]
fn invalid_samples() {
    assert!(DiscreteDistribution::from_samples(&[]).is_err());
    assert!(DiscreteDistribution::from_samples(&[1.0, 0.0]).is_err());
    assert!(DiscreteDistribution::from_samples(&[1.0, f64::NAN]).is_err());
    assert!(DiscreteDistribution::from_samples(&[1.0, f64::INFINITY]).is_err());
}

#[test]
fn construction_clamps_and_normalizes() {
    let dist = DiscreteDistribution::new(vec![1.0, 2.0, 3.0, 4.0], vec![-0.1, 0.6, 0.4, 0.8]).unwrap();
    check_invariants(&dist);
    assert_approx_eq!(dist.cdf()[0], 0.0);
    assert_approx_eq!(dist.cdf()[1], 0.75);
    assert_approx_eq!(dist.cdf()[2], 0.75);

    assert!(DiscreteDistribution::new(vec![], vec![]).is_err());
    assert!(DiscreteDistribution::new(vec![1.0, 2.0], vec![1.0]).is_err());
    assert!(DiscreteDistribution::new(vec![2.0, 1.0], vec![0.5, 1.0]).is_err());
    assert!(DiscreteDistribution::new(vec![1.0, 2.0], vec![0.0, 0.0]).is_err());
}

#[test]
fn tail_sums() {
    let dist = uniform(&[1.0, 2.0, 3.0, 4.0]);
    let tails = dist.tail_sums();
    assert_approx_eq!(tails.exceeding(0), 1.0);
    assert_approx_eq!(tails.exceeding(1), 0.75);
    assert_approx_eq!(tails.exceeding(3), 0.25);
    assert_approx_eq!(tails.exceeding(4), 0.0);
    assert_approx_eq!(tails.expected_value(), 2.5);
    assert_approx_eq!(tails.expected_submissions(&[1, 3]), 1.5);
}

#[test]
fn downsampling() {
    let dist = DiscreteDistribution::from_samples(&trace()).unwrap();
    let mut rng = SmallRng::seed_from_u64(1);
    for points in [3, 5, 10, dist.len() - 1] {
        let small = dist.resample(points, &mut rng).unwrap();
        check_invariants(&small);
        assert_eq!(small.len(), points);
        assert_eq!(small.max_value(), dist.max_value());
        assert!(small.support().iter().all(|v| dist.support().contains(v)));
    }
}

#[test]
fn upsampling() {
    let dist = DiscreteDistribution::from_samples(&trace()).unwrap();
    let mut rng = SmallRng::seed_from_u64(7);
    let large = dist.resample(200, &mut rng).unwrap();
    check_invariants(&large);
    assert_eq!(large.len(), 200);
    assert_eq!(large.min_value(), dist.min_value());
    assert_eq!(large.max_value(), dist.max_value());
    // every original point survives
    assert!(dist.support().iter().all(|v| large.support().contains(v)));
}

#[test]
fn upsampling_around_unsplittable_pair() {
    // no floating-point value lies strictly between the first two points
    let tight = 1.0 + f64::EPSILON;
    let dist = uniform(&[1.0, tight, 5.0]);
    for seed in 0..5 {
        let large = dist.resample(50, &mut SmallRng::seed_from_u64(seed)).unwrap();
        check_invariants(&large);
        assert_eq!(large.len(), 50);
        assert_eq!(&large.support()[..2], &[1.0, tight]);
        assert_eq!(large.max_value(), 5.0);
        assert_approx_eq!(large.cdf()[1], 2.0 / 3.0);
    }
}

#[test]
fn resampling_edge_cases() {
    let mut rng = SmallRng::seed_from_u64(3);
    let dist = DiscreteDistribution::from_samples(&trace()).unwrap();
    assert!(dist.resample(2, &mut rng).is_err());
    assert_eq!(dist.resample(dist.len(), &mut rng).unwrap(), dist);
    let point = DiscreteDistribution::point(3.0);
    assert_eq!(point.resample(50, &mut rng).unwrap(), point);
}

#[test]
fn resampling_is_deterministic() {
    let dist = DiscreteDistribution::from_samples(&trace()).unwrap();
    let a = dist.resample(12, &mut SmallRng::seed_from_u64(99)).unwrap();
    let b = dist.resample(12, &mut SmallRng::seed_from_u64(99)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn restriction() {
    let dist = uniform(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    let r = dist.restrict(Some(2.0), Some(4.0)).unwrap();
    check_invariants(&r);
    assert_eq!(r.support(), &[2.0, 3.0, 4.0]);
    assert_approx_eq!(r.cdf()[0], 0.5);
    assert_approx_eq!(r.cdf()[1], 0.75);

    assert_eq!(dist.restrict(None, None).unwrap(), dist);
    assert!(dist.restrict(Some(6.0), None).is_err());
}
