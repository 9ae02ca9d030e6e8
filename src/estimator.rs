/*! End-to-end estimation of request sequences from historic traces

A [ResourceEstimator] bundles a trace of observed execution times with
[Parameters] that describe how the trace is turned into a distribution
and which recurrence is solved on it. All parameters are validated when
the estimator is built; the computations themselves fail only if a
submission budget cannot be met.
*/

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::cost::{CheckpointModel, CostModel};
use crate::distribution::DiscreteDistribution;
use crate::error::{Error, Result};
use crate::fit::{best_fit, DistributionModel, Parametric};
use crate::optimizer::{
    optimize, CheckpointStrategy, LimitMode, Options, Plan, SubmissionLimit, Variant,
};
use crate::time::{Cost, Duration, Time};
use crate::validate::average_cost;

/// Number of points at which a fitted model is sampled unless a
/// discretization is requested explicitly.
pub const DEFAULT_FIT_POINTS: usize = 500;

/// Tables smaller than this tend to yield poor sequences.
const SMALL_TABLE: usize = 100;

/// Traces with fewer runs than this are smoothed with the parametric
/// families unless models are chosen explicitly.
pub const SHORT_TRACE: usize = 100;

/// Configuration of a [ResourceEstimator].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub checkpoint_strategy: CheckpointStrategy,
    /// Resample the distribution to this many points (at least 3).
    pub discretization: Option<usize>,
    /// Cap on the number of submissions, interpreted per `limit_mode`.
    pub submission_limit: Option<f64>,
    pub limit_mode: LimitMode,
    /// Minimum gap between consecutive reservation end points.
    pub increment_floor: Duration,
    /// Drop execution times below this bound from the distribution.
    /// Negative values are ignored.
    pub lower_bound: Option<Time>,
    /// Drop execution times above this bound from the distribution. The
    /// resulting sequence still covers the longest observed run.
    /// Negative values are ignored.
    pub upper_bound: Option<Time>,
    /// Seed of the generator used for resampling.
    pub seed: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            checkpoint_strategy: CheckpointStrategy::Never,
            discretization: None,
            submission_limit: None,
            limit_mode: LimitMode::Threshold,
            increment_floor: 0.0,
            lower_bound: None,
            upper_bound: None,
            seed: 0,
        }
    }
}

impl Parameters {
    fn submission_limit(&self) -> Option<SubmissionLimit> {
        self.submission_limit.map(|limit| SubmissionLimit {
            limit,
            mode: self.limit_mode,
        })
    }

    /// The bounds that take effect, i.e., the non-negative ones.
    pub fn bounds(&self) -> (Option<Time>, Option<Time>) {
        let effective = |b: Option<Time>| b.filter(|v| *v >= 0.0);
        (effective(self.lower_bound), effective(self.upper_bound))
    }

    fn validate(&self) -> Result<()> {
        if let Some(points) = self.discretization {
            if points < 3 {
                return Err(Error::invalid(format!(
                    "the discretization needs at least 3 points, got {}",
                    points
                )));
            }
        }
        if let Some(limit) = self.submission_limit() {
            limit.validate()?;
        }
        if !(self.increment_floor.is_finite() && self.increment_floor >= 0.0) {
            return Err(Error::invalid(format!(
                "the increment floor must be non-negative, got {}",
                self.increment_floor
            )));
        }
        for bound in self.lower_bound.iter().chain(self.upper_bound.iter()) {
            if *bound < 0.0 {
                log::warn!("ignoring negative execution time bound {}", bound);
            }
        }
        if let (Some(lower), Some(upper)) = self.bounds() {
            if lower > upper {
                return Err(Error::invalid(format!(
                    "lower bound {} exceeds upper bound {}",
                    lower, upper
                )));
            }
        }
        Ok(())
    }
}

/// Computes request sequences for a job from a trace of its past
/// execution times.
pub struct ResourceEstimator {
    samples: Vec<Time>,
    empirical: DiscreteDistribution,
    params: Parameters,
    models: Option<Vec<Box<dyn DistributionModel>>>,
}

impl ResourceEstimator {
    /// Build an estimator, validating the trace and all parameters.
    ///
    /// Fails if the bounds leave no observed execution time.
    pub fn new(samples: Vec<Time>, params: Parameters) -> Result<Self> {
        params.validate()?;
        let empirical = DiscreteDistribution::from_samples(&samples)?;
        let (lower, upper) = params.bounds();
        empirical.restrict(lower, upper)?;
        Ok(ResourceEstimator {
            samples,
            empirical,
            params,
            models: None,
        })
    }

    /// Smooth the empirical distribution with the best of the given
    /// models instead of resampling it. An empty list disables
    /// smoothing, including the default for short traces.
    pub fn with_models(mut self, models: Vec<Box<dyn DistributionModel>>) -> Self {
        self.models = Some(models);
        self
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// The longest observed execution time.
    pub fn max_sample(&self) -> Time {
        self.empirical.max_value()
    }

    /// The distribution the optimizer works on.
    ///
    /// If the smoothed table has no point within the bounds, the
    /// empirical table is restricted instead.
    pub fn distribution(&self) -> Result<DiscreteDistribution> {
        let (lower, upper) = self.params.bounds();
        match self.smoothed()?.restrict(lower, upper) {
            Ok(dist) => Ok(dist),
            Err(e) => {
                log::warn!("{}; falling back to the empirical distribution", e);
                self.empirical.restrict(lower, upper)
            }
        }
    }

    fn smoothed(&self) -> Result<DiscreteDistribution> {
        let empirical = &self.empirical;
        if empirical.len() == 1 {
            return Ok(empirical.clone());
        }
        let defaults;
        let models = match &self.models {
            Some(models) => models,
            None if self.samples.len() < SHORT_TRACE => {
                defaults = Parametric::all();
                &defaults
            }
            None => return self.resampled(),
        };
        if !models.is_empty() {
            match best_fit(models, empirical.support(), empirical.cdf()) {
                Some((model, fit)) => {
                    log::debug!(
                        "smoothing {} samples with the {} model",
                        self.samples.len(),
                        model.name()
                    );
                    let points = self.params.discretization.unwrap_or(DEFAULT_FIT_POINTS);
                    match model.discretize(points, &fit) {
                        Ok(dist) => return Ok(dist),
                        Err(e) => log::warn!("discarding the {} model: {}", model.name(), e),
                    }
                }
                None => log::warn!("no model fits the trace; using the empirical distribution"),
            }
        }
        self.resampled()
    }

    fn resampled(&self) -> Result<DiscreteDistribution> {
        let empirical = &self.empirical;
        match self.params.discretization {
            Some(points) => {
                let mut rng = SmallRng::seed_from_u64(self.params.seed);
                empirical.resample(points, &mut rng)
            }
            None => Ok(empirical.clone()),
        }
    }

    /// Compute the optimal request sequence under the given cost and
    /// checkpoint models.
    pub fn compute_request_sequence<CM: CheckpointModel + ?Sized>(
        &self,
        cost: &CostModel,
        checkpoint: &CM,
    ) -> Result<Plan> {
        let dist = self.distribution()?;
        if dist.len() > 1 && dist.len() < SMALL_TABLE {
            log::warn!(
                "only {} points in the distribution; consider a finer discretization",
                dist.len()
            );
        }
        if self.params.checkpoint_strategy == CheckpointStrategy::Adaptive {
            log::warn!(
                "adaptive checkpointing is cubic in the number of points ({})",
                dist.len()
            );
        }
        let variant = Variant::select(
            self.params.checkpoint_strategy,
            self.params.submission_limit(),
        );
        let options = Options {
            increment_floor: self.params.increment_floor,
            upper_limit: Some(self.max_sample()),
        };
        optimize(&dist, cost, checkpoint, variant, &options)
    }

    /// Replay a plan against observed execution times: returns the
    /// average cost per job and the expected number of submissions.
    pub fn compute_sequence_cost(
        &self,
        plan: &Plan,
        durations: &[Duration],
        cost: &CostModel,
    ) -> Result<(Cost, f64)> {
        let avg = average_cost(&plan.sequence, durations, cost)?;
        Ok((avg, plan.expected_submissions))
    }
}
