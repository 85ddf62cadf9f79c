//! Error types.
//!
//! [`SearchError`] covers everything that can stop a search before or during
//! the run. [`EstimatorError`] is what estimator implementations return; the
//! fitness evaluator absorbs it during search (see
//! [`WORST_FITNESS`](crate::fitness::WORST_FITNESS)).

use thiserror::Error;

/// Errors raised by the search itself.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A parameter domain or configuration value is malformed.
    #[error("invalid domain for parameter `{parameter}`: {reason}")]
    InvalidDomain { parameter: String, reason: String },

    /// The search configuration is inconsistent.
    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),

    /// A genome could not be mapped back to a configuration.
    ///
    /// Crossover and mutation never produce such a genome, so this signals
    /// an internal invariant violation.
    #[error("cannot decode genome slot `{parameter}`: {reason}")]
    Decode { parameter: String, reason: String },

    /// The estimator failed outside of the search loop (e.g. during refit).
    #[error("estimator error: {0}")]
    Estimator(#[from] EstimatorError),
}

impl SearchError {
    pub(crate) fn domain(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDomain {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// Errors reported by an [`Estimator`](crate::estimator::Estimator).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    /// The estimator rejected a parameter combination.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("fit failed: {0}")]
    Fit(String),

    #[error("score failed: {0}")]
    Score(String),

    /// The evaluation did not finish within the configured timeout.
    #[error("evaluation timed out after {0} ms")]
    Timeout(u128),
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_domain_names_parameter() {
        let err = SearchError::domain("max_depth", "empty option list");
        let msg = err.to_string();
        assert!(msg.contains("max_depth"));
        assert!(msg.contains("empty option list"));
    }

    #[test]
    fn test_estimator_error_converts() {
        let err: SearchError = EstimatorError::Fit("singular matrix".into()).into();
        assert!(matches!(err, SearchError::Estimator(EstimatorError::Fit(_))));
        assert!(err.to_string().contains("singular matrix"));
    }

    #[test]
    fn test_timeout_display() {
        let err = EstimatorError::Timeout(250);
        assert_eq!(err.to_string(), "evaluation timed out after 250 ms");
    }
}
