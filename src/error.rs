use thiserror::Error;

/// Error type returned by the constructors and optimizers in this crate.
///
/// All input validation happens eagerly when models or estimators are
/// built; the dynamic programs themselves only fail with
/// [Error::InfeasiblePolicy].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Some input violates the documented preconditions.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A distribution model could not produce a usable fit.
    #[error("the {model} model could not fit the given distribution")]
    FitFailure { model: &'static str },

    /// No request sequence reaching full coverage exists within the
    /// given submission budget.
    #[error("no request sequence reaches full coverage within a budget of {budget}")]
    InfeasiblePolicy { budget: f64 },
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
