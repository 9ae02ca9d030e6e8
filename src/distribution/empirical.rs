use itertools::Itertools;
use rand::Rng;

use super::DiscreteDistribution;
use crate::error::{Error, Result};
use crate::time::{Probability, Time};

// upper bound on refinement passes when upsampling
const MAX_INTERPOLATION_ROUNDS: usize = 16;

impl DiscreteDistribution {
    /// Build the empirical distribution of a trace of observed
    /// execution times.
    ///
    /// Duplicate observations are merged into one support value
    /// weighted by their frequency. If all observations are identical,
    /// the result is a single point with cumulative probability one.
    pub fn from_samples(samples: &[Time]) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::invalid("cannot build a distribution from an empty trace"));
        }
        if let Some(bad) = samples.iter().find(|x| !(x.is_finite() && **x > 0.0)) {
            return Err(Error::invalid(format!(
                "execution times must be positive and finite, found {}",
                bad
            )));
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let counted = sorted.into_iter().dedup_with_count().collect_vec();

        if counted.len() == 1 {
            return Ok(DiscreteDistribution::point(counted[0].1));
        }

        let total = samples.len() as f64;
        let mut seen = 0;
        let (support, cdf): (Vec<Time>, Vec<Probability>) = counted
            .into_iter()
            .map(|(count, value)| {
                seen += count;
                (value, seen as f64 / total)
            })
            .unzip();
        DiscreteDistribution::new(support, cdf)
    }

    /// Resample the distribution to exactly `points` support values.
    ///
    /// When shrinking, `points - 1` values are drawn without
    /// replacement and the maximum is always retained. When growing,
    /// adjacent pairs are drawn with replacement and new points are
    /// linearly interpolated (in both value and cumulative probability)
    /// strictly between them; all existing points are retained.
    /// Single-point distributions are returned unchanged since there is
    /// nothing to interpolate.
    pub fn resample<R: Rng + ?Sized>(&self, points: usize, rng: &mut R) -> Result<Self> {
        if points < 3 {
            return Err(Error::invalid(format!(
                "the discretization needs at least 3 points, got {}",
                points
            )));
        }
        let n = self.len();
        if n == 1 || points == n {
            return Ok(self.clone());
        }

        if points < n {
            let mut idx = rand::seq::index::sample(rng, n - 1, points - 1).into_vec();
            idx.sort_unstable();
            idx.push(n - 1);
            let support = idx.iter().map(|i| self.support[*i]).collect();
            let cdf = idx.iter().map(|i| self.cdf[*i]).collect();
            return DiscreteDistribution::new(support, cdf);
        }

        let mut pts = self
            .support
            .iter()
            .copied()
            .zip(self.cdf.iter().copied())
            .collect_vec();
        // pairs too close to be split in floating point yield nothing, so
        // the shortfall is drawn again over the refined table
        for _ in 0..MAX_INTERPOLATION_ROUNDS {
            if pts.len() == points {
                let (support, cdf) = pts.into_iter().unzip();
                return DiscreteDistribution::new(support, cdf);
            }
            pts = interpolate(&pts, points - pts.len(), rng);
        }
        Err(Error::invalid(format!(
            "cannot interpolate {} distinct support values",
            points
        )))
    }
}

/// Insert `count` points between randomly drawn adjacent pairs of `pts`.
///
/// Points are placed by linear interpolation of both value and
/// cumulative probability. Interpolated values that do not fall
/// strictly between their pair are dropped, so the result may be
/// shorter than requested but always keeps every existing point.
fn interpolate<R: Rng + ?Sized>(
    pts: &[(Time, Probability)],
    count: usize,
    rng: &mut R,
) -> Vec<(Time, Probability)> {
    let mut extra = vec![0usize; pts.len() - 1];
    for _ in 0..count {
        extra[rng.random_range(0..pts.len() - 1)] += 1;
    }

    let mut refined = Vec::with_capacity(pts.len() + count);
    for (((v0, f0), (v1, f1)), k) in pts.iter().tuple_windows().zip(extra) {
        refined.push((*v0, *f0));
        let dv = (v1 - v0) / (k + 1) as f64;
        let df = (f1 - f0) / (k + 1) as f64;
        for s in 1..=k {
            let v = v0 + s as f64 * dv;
            let last = refined[refined.len() - 1].0;
            if last < v && v < *v1 {
                refined.push((v, f0 + s as f64 * df));
            }
        }
    }
    refined.push(pts[pts.len() - 1]);
    refined
}
