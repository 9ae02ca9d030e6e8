/*! Smoothing of empirical distributions by fitted models

Traces with few observations yield coarse empirical distributions. This
module provides the trait [DistributionModel], which describes a model
that can be fitted to an empirical CDF and then sampled at an
arbitrarily fine resolution, as well as two least-squares models
([Polynomial] and [Transformed]) and maximum-likelihood fits of common
distribution families ([Parametric]).

The optimizer never depends on a concrete model. Callers hand a list of
candidate models to [best_fit], which selects the one with the least
sum of squared errors.
*/

use auto_impl::auto_impl;

use crate::distribution::DiscreteDistribution;
use crate::error::{Error, Result};
use crate::time::{Probability, Time};

/// A fitted model of a cumulative distribution function.
///
/// The meaning of the parameters is up to the [DistributionModel] that
/// produced the fit (polynomial coefficients, or the parameters of a
/// distribution family).
#[derive(Debug, Clone, PartialEq)]
pub struct Fit {
    parameters: Vec<f64>,
    /// The range of execution times the model was fitted to.
    lower: Time,
    upper: Time,
    /// Sum of squared errors w.r.t. the fitted CDF.
    error: f64,
}

impl Fit {
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn lower(&self) -> Time {
        self.lower
    }

    pub fn upper(&self) -> Time {
        self.upper
    }
}

/// The interface for models that smooth an empirical CDF.
#[auto_impl(&, Box, Rc)]
pub trait DistributionModel {
    /// A short human-readable name of the model, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Fit the model to the given empirical CDF. Fails with
    /// [Error::FitFailure] if no usable fit exists.
    fn fit(&self, support: &[Time], cdf: &[Probability]) -> Result<Fit>;

    /// Evaluate the fitted CDF at execution time `value` (not clamped).
    fn cdf_at(&self, fit: &Fit, value: Time) -> Probability;

    /// Sample the fitted CDF at `points` evenly spaced execution times
    /// spanning the fitted range.
    ///
    /// Values are clamped into `[0, 1]` and forced to be monotonic, so
    /// the result always satisfies the invariants of
    /// [DiscreteDistribution] unless the fit is zero everywhere.
    fn discretize(&self, points: usize, fit: &Fit) -> Result<DiscreteDistribution> {
        if points < 2 {
            return Err(Error::invalid("a fitted model needs at least 2 points"));
        }
        let step = (fit.upper - fit.lower) / (points - 1) as f64;
        let mut support: Vec<Time> = (0..points - 1)
            .map(|i| fit.lower + i as f64 * step)
            .collect();
        support.push(fit.upper);
        support.dedup();

        let mut previous: Probability = 0.0;
        let cdf = support
            .iter()
            .map(|v| {
                previous = self.cdf_at(fit, *v).clamp(0.0, 1.0).max(previous);
                previous
            })
            .collect();
        DiscreteDistribution::new(support, cdf)
    }
}

/// Fit each of the given `models` to the empirical CDF and return the
/// one with the smallest error together with its fit.
///
/// Models that fail to fit are skipped. Returns `None` if no model
/// produced a fit.
pub fn best_fit<'m, M: DistributionModel>(
    models: &'m [M],
    support: &[Time],
    cdf: &[Probability],
) -> Option<(&'m M, Fit)> {
    let mut best: Option<(&'m M, Fit)> = None;
    for model in models {
        match model.fit(support, cdf) {
            Ok(fit) => {
                log::debug!("{} model fitted with error {:e}", model.name(), fit.error());
                if best.as_ref().map_or(true, |(_, b)| fit.error() < b.error()) {
                    best = Some((model, fit));
                }
            }
            Err(e) => log::debug!("skipping model: {}", e),
        }
    }
    best
}

mod least_squares;
mod parametric;
mod polynomial;
mod transformed;

pub use parametric::{Family, Parametric};
pub use polynomial::Polynomial;
pub use transformed::Transformed;
