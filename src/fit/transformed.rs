use super::least_squares::{evaluate, polyfit};
use super::{DistributionModel, Fit};
use crate::error::{Error, Result};
use crate::time::{Probability, Time};

/// Fit the empirical CDF with a polynomial of fixed `order` in a
/// transformed execution time, e.g., `a + b * ln(x)`.
#[derive(Debug, Clone, Copy)]
pub struct Transformed {
    pub transform: fn(Time) -> f64,
    pub order: usize,
}

impl Transformed {
    pub fn new(transform: fn(Time) -> f64, order: usize) -> Self {
        Transformed { transform, order }
    }

    /// The common case: `a + b * ln(x)`.
    pub fn logarithmic() -> Self {
        Transformed::new(f64::ln, 1)
    }
}

impl DistributionModel for Transformed {
    fn name(&self) -> &'static str {
        "transformed"
    }

    fn fit(&self, support: &[Time], cdf: &[Probability]) -> Result<Fit> {
        let failure = Error::FitFailure { model: self.name() };
        let (lower, upper) = match (support.first(), support.last()) {
            (Some(l), Some(u)) => (*l, *u),
            _ => return Err(failure),
        };
        let x: Vec<f64> = support.iter().map(|v| (self.transform)(*v)).collect();
        polyfit(&x, cdf, self.order, lower, upper).ok_or(failure)
    }

    fn cdf_at(&self, fit: &Fit, value: Time) -> Probability {
        evaluate(fit, (self.transform)(value))
    }
}
