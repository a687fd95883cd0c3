use crate::numerical::logistic_model::{partials, predict, PARAM_COUNT};
use nalgebra::DVector;
use std::fmt;

/// Errors of a single fitting run.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// Division by zero or a non-finite value during model or gradient evaluation.
    NumericDomain(String),
    /// No admissible step length was found within the line search budget.
    LineSearchFailure(usize),
    /// The proposed direction does not point downhill at the current point.
    NonDescentDirection(f64),
    /// The run inputs are malformed (wrong guess length, empty series, ...).
    InvalidConfiguration(String),
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FitError::NumericDomain(what) => {
                write!(f, "Numeric domain violation: {}", what)
            }
            FitError::LineSearchFailure(attempts) => {
                write!(
                    f,
                    "Line search found no admissible step after {} attempts",
                    attempts
                )
            }
            FitError::NonDescentDirection(slope) => {
                write!(
                    f,
                    "Search direction is not a descent direction, directional slope = {:.3e}",
                    slope
                )
            }
            FitError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for FitError {}

/// Objective interface shared by the line search and the optimization loop.
pub trait CostFunction {
    /// Loss value at theta.
    fn cost(&self, theta: &DVector<f64>) -> Result<f64, FitError>;
    /// Gradient vector at theta.
    fn gradient(&self, theta: &DVector<f64>) -> Result<DVector<f64>, FitError>;
}

/// Wrapper to use plain closures as objectives (tests and quick experiments).
pub struct ClosureObjective<F, G>
where
    F: Fn(&DVector<f64>) -> f64,
    G: Fn(&DVector<f64>) -> DVector<f64>,
{
    cost_fn: F,
    gradient_fn: G,
}

impl<F, G> ClosureObjective<F, G>
where
    F: Fn(&DVector<f64>) -> f64,
    G: Fn(&DVector<f64>) -> DVector<f64>,
{
    pub fn new(cost_fn: F, gradient_fn: G) -> Self {
        Self { cost_fn, gradient_fn }
    }
}

impl<F, G> CostFunction for ClosureObjective<F, G>
where
    F: Fn(&DVector<f64>) -> f64,
    G: Fn(&DVector<f64>) -> DVector<f64>,
{
    fn cost(&self, theta: &DVector<f64>) -> Result<f64, FitError> {
        Ok((self.cost_fn)(theta))
    }
    fn gradient(&self, theta: &DVector<f64>) -> Result<DVector<f64>, FitError> {
        Ok((self.gradient_fn)(theta))
    }
}

/// Quadratic loss of the logistic model over a fixed observation series.
///
/// Owns its copies of the position and observation vectors so that repeated
/// evaluations share no ambient state. The loss is the half mean squared
/// residual sum((predict - Y)^2) / (2N); the gradient follows the half sum
/// of squares convention, so its components are N times the derivatives of
/// the loss. The scale factor cancels everywhere a gradient is compared
/// against itself, which is the only way the solver uses it.
pub struct LogisticLoss {
    x_data: DVector<f64>,
    y_data: DVector<f64>,
}

impl LogisticLoss {
    pub fn new(x_data: DVector<f64>, y_data: DVector<f64>) -> Result<Self, FitError> {
        if y_data.is_empty() {
            return Err(FitError::InvalidConfiguration(
                "observation series is empty".to_string(),
            ));
        }
        if x_data.len() != y_data.len() {
            return Err(FitError::InvalidConfiguration(format!(
                "positions and observations must have the same length: {} vs {}",
                x_data.len(),
                y_data.len()
            )));
        }
        Ok(Self { x_data, y_data })
    }

    /// Observation series over the implicit positions 0, 1, .., N-1.
    pub fn from_series(y_data: DVector<f64>) -> Result<Self, FitError> {
        let n = y_data.len();
        let x_data = DVector::from_iterator(n, (0..n).map(|i| i as f64));
        Self::new(x_data, y_data)
    }

    pub fn len(&self) -> usize {
        self.y_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y_data.is_empty()
    }

    pub fn x_data(&self) -> &DVector<f64> {
        &self.x_data
    }

    pub fn y_data(&self) -> &DVector<f64> {
        &self.y_data
    }

    fn residual(&self, theta: &DVector<f64>) -> DVector<f64> {
        predict(theta, &self.x_data) - &self.y_data
    }

    /// The same quadratic loss after mapping predictions and observations
    /// back to raw units through a min-max scale with the given bounds.
    /// Useful for reporting the fit quality on the original data scale.
    pub fn unscaled_cost(&self, theta: &DVector<f64>, min: f64, max: f64) -> Result<f64, FitError> {
        let span = max - min;
        let predicted = predict(theta, &self.x_data);
        let n = self.y_data.len() as f64;
        let total = predicted
            .zip_map(&self.y_data, |p, y| {
                let diff = (p * span + min) - (y * span + min);
                diff * diff
            })
            .sum()
            / (2.0 * n);
        if !total.is_finite() {
            return Err(FitError::NumericDomain(format!(
                "unscaled loss is not finite at theta = {:?}",
                theta.as_slice()
            )));
        }
        Ok(total)
    }
}

impl CostFunction for LogisticLoss {
    fn cost(&self, theta: &DVector<f64>) -> Result<f64, FitError> {
        let residual = self.residual(theta);
        let n = self.y_data.len() as f64;
        let cost = residual.dot(&residual) / (2.0 * n);
        if !cost.is_finite() {
            return Err(FitError::NumericDomain(format!(
                "loss is not finite at theta = {:?}",
                theta.as_slice()
            )));
        }
        Ok(cost)
    }

    fn gradient(&self, theta: &DVector<f64>) -> Result<DVector<f64>, FitError> {
        let residual = self.residual(theta);
        let parts = partials(theta, &self.x_data);
        let mut g = DVector::zeros(PARAM_COUNT);
        for (k, part) in parts.iter().enumerate() {
            g[k] = residual.dot(part);
        }
        // the offset partial is identically 1, its component is the residual sum
        g[PARAM_COUNT - 1] = residual.sum();
        if g.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NumericDomain(format!(
                "gradient is not finite at theta = {:?}",
                theta.as_slice()
            )));
        }
        Ok(g)
    }
}
