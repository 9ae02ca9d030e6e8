use std::f64::consts::SQRT_2;

use super::{DistributionModel, Fit};
use crate::error::{Error, Result};
use crate::time::{Probability, Time};

// bracket of the Weibull shape search
const MIN_SHAPE: f64 = 1e-2;
const MAX_SHAPE: f64 = 1e2;
const BISECTION_STEPS: usize = 100;

/// Distribution families whose parameters have (near) closed-form
/// maximum-likelihood estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Parameters: `[rate]`.
    Exponential,
    /// Parameters: `[mu, sigma]` of the underlying normal distribution.
    LogNormal,
    /// Parameters: `[shape, scale]`.
    Weibull,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Exponential, Family::LogNormal, Family::Weibull];
}

/// Fit a distribution family to the empirical CDF by maximum
/// likelihood, treating the probability mass at each support value as
/// the weight of an observation.
///
/// The squared error used to compare models is measured between the
/// fitted and the empirical CDF at the support values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parametric {
    pub family: Family,
}

impl Parametric {
    pub fn new(family: Family) -> Self {
        Parametric { family }
    }

    /// One model per supported family, to be handed to
    /// [best_fit][super::best_fit].
    pub fn all() -> Vec<Box<dyn DistributionModel>> {
        Family::ALL
            .iter()
            .map(|f| Box::new(Parametric::new(*f)) as Box<dyn DistributionModel>)
            .collect()
    }
}

impl DistributionModel for Parametric {
    fn name(&self) -> &'static str {
        match self.family {
            Family::Exponential => "exponential",
            Family::LogNormal => "lognormal",
            Family::Weibull => "weibull",
        }
    }

    fn fit(&self, support: &[Time], cdf: &[Probability]) -> Result<Fit> {
        let failure = || Error::FitFailure { model: self.name() };
        if support.len() < 2
            || support.len() != cdf.len()
            || support.iter().any(|v| !(v.is_finite() && *v > 0.0))
        {
            return Err(failure());
        }
        let weights = observation_weights(cdf).ok_or_else(failure)?;
        let parameters = match self.family {
            Family::Exponential => exponential(support, &weights),
            Family::LogNormal => lognormal(support, &weights),
            Family::Weibull => weibull(support, &weights),
        }
        .ok_or_else(failure)?;

        let mut fit = Fit {
            parameters,
            lower: support[0],
            upper: support[support.len() - 1],
            error: 0.0,
        };
        fit.error = support
            .iter()
            .zip(cdf.iter())
            .map(|(v, f)| (self.cdf_at(&fit, *v) - f).powi(2))
            .sum();
        if fit.error.is_finite() {
            Ok(fit)
        } else {
            Err(failure())
        }
    }

    fn cdf_at(&self, fit: &Fit, value: Time) -> Probability {
        if value <= 0.0 {
            return 0.0;
        }
        let p = &fit.parameters;
        match self.family {
            Family::Exponential => 1.0 - (-p[0] * value).exp(),
            Family::LogNormal => 0.5 * erfc(-(value.ln() - p[0]) / (p[1] * SQRT_2)),
            Family::Weibull => 1.0 - (-(value / p[1]).powf(p[0])).exp(),
        }
    }
}

/// Probability mass at each support value, normalized to sum to one.
fn observation_weights(cdf: &[Probability]) -> Option<Vec<f64>> {
    let mut previous = 0.0;
    let weights: Vec<f64> = cdf
        .iter()
        .map(|f| {
            let w = (f - previous).max(0.0);
            previous = *f;
            w
        })
        .collect();
    let total: f64 = weights.iter().sum();
    (total > 0.0).then(|| weights.iter().map(|w| w / total).collect())
}

fn exponential(x: &[Time], w: &[f64]) -> Option<Vec<f64>> {
    let mean: f64 = x.iter().zip(w).map(|(x, w)| x * w).sum();
    (mean > 0.0).then(|| vec![1.0 / mean])
}

fn lognormal(x: &[Time], w: &[f64]) -> Option<Vec<f64>> {
    let mu: f64 = x.iter().zip(w).map(|(x, w)| w * x.ln()).sum();
    let var: f64 = x.iter().zip(w).map(|(x, w)| w * (x.ln() - mu).powi(2)).sum();
    (var > 0.0).then(|| vec![mu, var.sqrt()])
}

/// The shape `k` solves `E_k[ln y] - 1/k - E[ln y] = 0`, where `E_k`
/// weighs each observation additionally by `y^k`. The left-hand side
/// increases in `k`, so bisection suffices. Values are scaled into
/// `(0, 1]` first, which leaves the shape unchanged and keeps `y^k`
/// from overflowing.
fn weibull(x: &[Time], w: &[f64]) -> Option<Vec<f64>> {
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let logs: Vec<f64> = x.iter().map(|v| (v / max).ln()).collect();
    let mean_log: f64 = logs.iter().zip(w).map(|(l, w)| l * w).sum();
    let moment = |k: f64| -> f64 { logs.iter().zip(w).map(|(l, w)| w * (k * l).exp()).sum() };
    let score = |k: f64| -> f64 {
        let tilted: f64 = logs.iter().zip(w).map(|(l, w)| w * (k * l).exp() * l).sum();
        tilted / moment(k) - 1.0 / k - mean_log
    };

    let (mut lo, mut hi) = (MIN_SHAPE, MAX_SHAPE);
    if !(score(lo) < 0.0 && score(hi) > 0.0) {
        return None;
    }
    for _ in 0..BISECTION_STEPS {
        let mid = (lo + hi) / 2.0;
        if score(mid) < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let shape = (lo + hi) / 2.0;
    let scale = max * moment(shape).powf(1.0 / shape);
    (scale.is_finite() && scale > 0.0).then(|| vec![shape, scale])
}

/// Complementary error function (Chebyshev fit, relative error below
/// 1.2e-7 everywhere).
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = [
        -1.26551223,
        1.00002368,
        0.37409196,
        0.09678418,
        -0.18628806,
        0.27886807,
        -1.13520398,
        1.48851587,
        -0.82215223,
        0.17087277,
    ]
    .iter()
    .rev()
    .fold(0.0, |acc, c| acc * t + c);
    let r = t * (-z * z + poly).exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}
