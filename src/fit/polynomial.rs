use super::least_squares::{evaluate, polyfit};
use super::{DistributionModel, Fit};
use crate::error::{Error, Result};
use crate::time::{Probability, Time};

/// Fit the empirical CDF with a polynomial in the execution time.
///
/// All orders from one up to (but excluding) `max_order` are tried and
/// the order with the least squared error is kept. The search stops at
/// the first order for which the least-squares system becomes singular.
#[derive(Debug, Clone, Copy)]
pub struct Polynomial {
    pub max_order: usize,
}

impl Polynomial {
    pub fn new(max_order: usize) -> Self {
        Polynomial { max_order }
    }
}

impl Default for Polynomial {
    fn default() -> Self {
        Polynomial::new(10)
    }
}

impl DistributionModel for Polynomial {
    fn name(&self) -> &'static str {
        "polynomial"
    }

    fn fit(&self, support: &[Time], cdf: &[Probability]) -> Result<Fit> {
        let (lower, upper) = match (support.first(), support.last()) {
            (Some(l), Some(u)) => (*l, *u),
            _ => return Err(Error::FitFailure { model: self.name() }),
        };
        let mut best: Option<Fit> = None;
        for order in 1..self.max_order {
            match polyfit(support, cdf, order, lower, upper) {
                Some(fit) => {
                    if best.as_ref().map_or(true, |b| fit.error() < b.error()) {
                        best = Some(fit);
                    }
                }
                None => break,
            }
        }
        best.ok_or(Error::FitFailure { model: self.name() })
    }

    fn cdf_at(&self, fit: &Fit, value: Time) -> Probability {
        evaluate(fit, value)
    }
}
