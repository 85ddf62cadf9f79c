//! Estimator and cross-validation collaborators.
//!
//! The search never trains models itself. It drives any type implementing
//! [`Estimator`] through the `set_params` → `fit` → `score` cycle, on the
//! train/validation splits handed out by a [`CrossValidator`].

use crate::error::EstimatorError;
use crate::space::Configuration;

/// The capability set required of a tunable model.
///
/// # Implementing
///
/// ```
/// use evogrid::estimator::Estimator;
/// use evogrid::error::EstimatorError;
/// use evogrid::space::Configuration;
///
/// #[derive(Clone, Default)]
/// struct MeanRegressor { shrink: f64, mean: f64 }
///
/// impl Estimator for MeanRegressor {
///     type Input = Vec<f64>;
///     type Target = Vec<f64>;
///
///     fn set_params(&mut self, config: &Configuration) -> Result<(), EstimatorError> {
///         self.shrink = config
///             .get("shrink")
///             .and_then(|v| v.as_float())
///             .ok_or_else(|| EstimatorError::InvalidParams("shrink".into()))?;
///         Ok(())
///     }
///
///     fn fit(&mut self, _x: &Vec<f64>, y: &Vec<f64>) -> Result<(), EstimatorError> {
///         self.mean = (1.0 - self.shrink) * y.iter().sum::<f64>() / y.len() as f64;
///         Ok(())
///     }
///
///     fn score(&self, _x: &Vec<f64>, y: &Vec<f64>) -> Result<f64, EstimatorError> {
///         let mse = y.iter().map(|t| (t - self.mean).powi(2)).sum::<f64>() / y.len() as f64;
///         Ok(-mse)
///     }
/// }
/// ```
pub trait Estimator {
    /// Feature data accepted by `fit` and `score`.
    type Input;

    /// Target data accepted by `fit` and `score`.
    type Target;

    /// Applies a hyperparameter configuration.
    fn set_params(&mut self, config: &Configuration) -> Result<(), EstimatorError>;

    /// Trains on the given data.
    fn fit(&mut self, x: &Self::Input, y: &Self::Target) -> Result<(), EstimatorError>;

    /// Scores the trained model on held-out data.
    ///
    /// The direction (higher or lower is better) is declared to the
    /// evaluator via [`ScoreDirection`](crate::fitness::ScoreDirection).
    fn score(&self, x: &Self::Input, y: &Self::Target) -> Result<f64, EstimatorError>;
}

/// One train/validation split.
#[derive(Debug, Clone)]
pub struct Split<X, Y> {
    pub train_x: X,
    pub train_y: Y,
    pub valid_x: X,
    pub valid_y: Y,
}

impl<X, Y> Split<X, Y> {
    pub fn new(train_x: X, train_y: Y, valid_x: X, valid_y: Y) -> Self {
        Self {
            train_x,
            train_y,
            valid_x,
            valid_y,
        }
    }
}

/// Supplier of cross-validation splits.
///
/// Called once per (uncached) fitness evaluation.
pub trait CrossValidator<X, Y>: Send + Sync {
    fn splits(&self) -> Vec<Split<X, Y>>;
}

/// Pre-built splits, handed out as-is on every call.
///
/// Use cheaply clonable data types (e.g. `Arc<[f64]>`) when splits are large.
#[derive(Debug, Clone)]
pub struct FixedFolds<X, Y> {
    folds: Vec<Split<X, Y>>,
}

impl<X, Y> FixedFolds<X, Y> {
    pub fn new(folds: Vec<Split<X, Y>>) -> Self {
        Self { folds }
    }

    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }
}

impl<X, Y> CrossValidator<X, Y> for FixedFolds<X, Y>
where
    X: Clone + Send + Sync,
    Y: Clone + Send + Sync,
{
    fn splits(&self) -> Vec<Split<X, Y>> {
        self.folds.clone()
    }
}

impl<X, Y, F> CrossValidator<X, Y> for F
where
    F: Fn() -> Vec<Split<X, Y>> + Send + Sync,
{
    fn splits(&self) -> Vec<Split<X, Y>> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_folds_repeat() {
        let folds = FixedFolds::new(vec![
            Split::new(vec![1.0], vec![2.0], vec![3.0], vec![4.0]),
            Split::new(vec![5.0], vec![6.0], vec![7.0], vec![8.0]),
        ]);
        assert_eq!(folds.len(), 2);
        let first = folds.splits();
        let second = folds.splits();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].valid_x, second[1].valid_x);
    }

    #[test]
    fn test_closure_validator() {
        let cv = || vec![Split::new(0u8, 1u8, 2u8, 3u8)];
        let splits = CrossValidator::splits(&cv);
        assert_eq!(splits[0].valid_y, 3);
    }
}
