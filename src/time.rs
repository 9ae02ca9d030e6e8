/// This library uses a continuous time model: job durations are
/// measured in arbitrary (but consistent) units such as seconds.
pub type Time = f64;

/// Syntactic sugar to give a hint that a time value denotes the
/// length of a reservation or a job's execution time.
pub type Duration = Time;

/// Syntactic sugar to give a hint that a value is a (cumulative)
/// probability in `[0, 1]`.
pub type Probability = f64;

/// Syntactic sugar to give a hint that a value is expressed in the
/// units of a [CostModel][crate::cost::CostModel].
pub type Cost = f64;
