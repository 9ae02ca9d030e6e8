/*! Discretized models of job execution times

This module provides [DiscreteDistribution], the (support, cumulative
probability) table consumed by the [optimizer][crate::optimizer], and
[TailSums], the derived table of tail probabilities that all dynamic
programs share.

A distribution is usually built from a trace of observed execution
times with [DiscreteDistribution::from_samples], optionally resampled to
a target number of points with [DiscreteDistribution::resample], or
obtained from a fitted [DistributionModel][crate::fit::DistributionModel].
*/

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::time::{Probability, Time};

/// A discrete distribution of job execution times.
///
/// The support values are unique and strictly increasing. The
/// cumulative probabilities are bounded by `[0, 1]`, non-decreasing,
/// and the last one is exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteDistribution {
    support: Vec<Time>,
    cdf: Vec<Probability>,
}

impl DiscreteDistribution {
    /// Construct a distribution from a support and matching cumulative
    /// probabilities.
    ///
    /// Cumulative values outside of `[0, 1]` are clamped, any decrease
    /// is clamped to the preceding value, and the result is normalized
    /// by the last value. Malformed shapes (empty input, mismatched
    /// lengths, non-increasing support, non-finite numbers, or no
    /// probability mass at all) are rejected.
    pub fn new(support: Vec<Time>, cdf: Vec<Probability>) -> Result<Self> {
        if support.is_empty() {
            return Err(Error::invalid("a distribution needs at least one support value"));
        }
        if support.len() != cdf.len() {
            return Err(Error::invalid(format!(
                "{} support values but {} cumulative probabilities",
                support.len(),
                cdf.len()
            )));
        }
        if support.iter().chain(cdf.iter()).any(|x| !x.is_finite()) {
            return Err(Error::invalid("distribution contains non-finite values"));
        }
        if !support.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(Error::invalid("support values must be strictly increasing"));
        }

        let mut cdf = cdf;
        let mut previous: Probability = 0.0;
        for f in cdf.iter_mut() {
            *f = f.clamp(0.0, 1.0).max(previous);
            previous = *f;
        }
        if previous <= 0.0 {
            return Err(Error::invalid("distribution has no probability mass"));
        }
        // guard against drift from accumulating fractions
        for f in cdf.iter_mut() {
            *f /= previous;
        }

        Ok(DiscreteDistribution { support, cdf })
    }

    /// The degenerate distribution in which every job takes exactly `value`.
    pub fn point(value: Time) -> Self {
        DiscreteDistribution {
            support: vec![value],
            cdf: vec![1.0],
        }
    }

    pub fn support(&self) -> &[Time] {
        &self.support
    }

    pub fn cdf(&self) -> &[Probability] {
        &self.cdf
    }

    /// Number of support values.
    pub fn len(&self) -> usize {
        self.support.len()
    }

    /// Distributions are never empty; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    pub fn min_value(&self) -> Time {
        self.support[0]
    }

    pub fn max_value(&self) -> Time {
        self.support[self.support.len() - 1]
    }

    /// Probability mass at support index `i`, i.e., `F[i] - F[i-1]`.
    pub fn tail_mass(&self, i: usize) -> Probability {
        if i > 0 {
            self.cdf[i] - self.cdf[i - 1]
        } else {
            self.cdf[0]
        }
    }

    /// Compute the tail-probability table of this distribution.
    pub fn tail_sums(&self) -> TailSums {
        TailSums::new(self)
    }

    /// Restrict the distribution to the support values within
    /// `[lower, upper]` (each bound being optional).
    ///
    /// Probability mass below the first retained value is attributed
    /// to it; the retained table is renormalized so that it remains a
    /// proper distribution.
    pub fn restrict(&self, lower: Option<Time>, upper: Option<Time>) -> Result<Self> {
        let (support, cdf): (Vec<Time>, Vec<Probability>) = self
            .support
            .iter()
            .zip(self.cdf.iter())
            .filter(|(v, _)| lower.map_or(true, |l| **v >= l) && upper.map_or(true, |u| **v <= u))
            .map(|(v, f)| (*v, *f))
            .unzip();
        if support.is_empty() {
            return Err(Error::invalid(format!(
                "no support value within the bounds [{:?}, {:?}]",
                lower, upper
            )));
        }
        DiscreteDistribution::new(support, cdf)
    }
}

/// The tail-probability table of a [DiscreteDistribution].
///
/// `exceeding(i)` is the probability that a job runs longer than
/// `v[i-1]`, i.e., the sum of the probability mass at indices `i..n`;
/// `exceeding(n)` is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TailSums {
    sum_f: Vec<Probability>,
    sum_fv: Time,
}

impl TailSums {
    fn new(dist: &DiscreteDistribution) -> Self {
        let n = dist.len();
        let mut sum_f = vec![0.0; n + 1];
        for k in (0..n).rev() {
            sum_f[k] = dist.tail_mass(k) + sum_f[k + 1];
        }
        let sum_fv = (0..n).map(|i| dist.support[i] * dist.tail_mass(i)).sum();
        TailSums { sum_f, sum_fv }
    }

    /// Probability that the job is still running after `v[i-1]`.
    pub fn exceeding(&self, i: usize) -> Probability {
        self.sum_f[i]
    }

    /// The expected execution time restricted to the support.
    pub fn expected_value(&self) -> Time {
        self.sum_fv
    }

    /// The expected number of submissions implied by a sequence whose
    /// reservations end at the given support indices:
    /// `1 + P(X > v[j1]) + P(X > v[j2]) + ...`.
    pub fn expected_submissions(&self, breakpoints: &[usize]) -> f64 {
        1.0 + breakpoints
            .iter()
            .map(|j| self.sum_f[*j + 1])
            .sum::<f64>()
    }
}

mod empirical;

#[cfg(test)]
mod tests;
