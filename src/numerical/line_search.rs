use crate::numerical::objective::{CostFunction, FitError};
use log::warn;
use nalgebra::DVector;

const MIN_STEP: f64 = 1e-12;

/// Strong Wolfe line search along a descent direction.
///
/// The step convention follows the optimization loop: a trial step length
/// alpha evaluates the objective at `point - alpha * direction`, so the
/// directional slope `<g, d>` at the current point must be positive. In
/// terms of the scalar restriction phi(alpha) = f(point - alpha*d) the
/// search accepts the first alpha with
///
///   phi(alpha) <= phi(0) + c1 * alpha * phi'(0)      (sufficient decrease)
///   |phi'(alpha)| <= c2 * |phi'(0)|                  (curvature)
///
/// A bracketing phase starts from the unit step and doubles until it
/// encloses an admissible interval, then a zoom phase narrows the interval
/// by safeguarded quadratic interpolation. Trial points where the objective
/// is not finite are rejected and the interval shrinks around them. Running
/// out of either budget is a typed error, never a silent zero step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WolfeSearch {
    pub c1: f64,
    pub c2: f64,
    pub max_bracket_steps: usize,
    pub max_zoom_steps: usize,
}

impl Default for WolfeSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl WolfeSearch {
    pub fn new() -> Self {
        WolfeSearch {
            c1: 1e-4,
            c2: 0.9,
            max_bracket_steps: 20,
            max_zoom_steps: 30,
        }
    }

    /// Set the sufficient decrease constant.
    ///
    /// # Panics
    ///
    /// Panics if `c1` is not inside `(0, c2)`.
    #[must_use]
    pub fn with_c1(self, c1: f64) -> Self {
        assert!(c1 > 0.0 && c1 < self.c2, "c1 must be inside (0, c2)");
        Self { c1, ..self }
    }

    /// Set the curvature constant.
    ///
    /// # Panics
    ///
    /// Panics if `c2` is not inside `(c1, 1)`.
    #[must_use]
    pub fn with_c2(self, c2: f64) -> Self {
        assert!(c2 > self.c1 && c2 < 1.0, "c2 must be inside (c1, 1)");
        Self { c2, ..self }
    }

    /// Set the number of bracketing attempts.
    ///
    /// # Panics
    ///
    /// Panics if `steps` is zero.
    #[must_use]
    pub fn with_max_bracket_steps(self, steps: usize) -> Self {
        assert!(steps > 0, "at least one bracketing step is required");
        Self {
            max_bracket_steps: steps,
            ..self
        }
    }

    /// Set the number of zoom attempts.
    ///
    /// # Panics
    ///
    /// Panics if `steps` is zero.
    #[must_use]
    pub fn with_max_zoom_steps(self, steps: usize) -> Self {
        assert!(steps > 0, "at least one zoom step is required");
        Self {
            max_zoom_steps: steps,
            ..self
        }
    }

    /// Find a step length along `direction` from `point` satisfying the
    /// strong Wolfe conditions. `cost` and `gradient` are the objective
    /// state already evaluated at `point`.
    pub fn search<F: CostFunction>(
        &self,
        objective: &F,
        point: &DVector<f64>,
        cost: f64,
        gradient: &DVector<f64>,
        direction: &DVector<f64>,
    ) -> Result<StepResult, FitError> {
        let slope0 = gradient.dot(direction);
        if slope0 <= 0.0 {
            return Err(FitError::NonDescentDirection(slope0));
        }
        let phi0 = cost;
        let dphi0 = -slope0;

        let mut alpha_prev = 0.0;
        let mut phi_prev = phi0;
        let mut dphi_prev = dphi0;
        let mut alpha = 1.0;
        let mut evals = EvalCounter::default();

        for attempt in 0..self.max_bracket_steps {
            let trial = point - direction * alpha;
            let phi = match objective.cost(&trial) {
                Ok(v) if v.is_finite() => {
                    evals.func += 1;
                    v
                }
                Ok(_) | Err(FitError::NumericDomain(_)) => {
                    evals.func += 1;
                    warn!(
                        "line search rejected a non-finite trial at alpha = {:.3e}",
                        alpha
                    );
                    let shrunk = 0.5 * (alpha_prev + alpha);
                    if shrunk - alpha_prev < MIN_STEP {
                        return Err(FitError::LineSearchFailure(attempt + 1));
                    }
                    alpha = shrunk;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if phi > phi0 + self.c1 * alpha * dphi0 || (attempt > 0 && phi >= phi_prev) {
                return self.zoom(
                    objective, point, direction, phi0, dphi0, alpha_prev, alpha, phi_prev, phi,
                    dphi_prev, evals,
                );
            }

            evals.grad += 1;
            let grad_trial = match objective.gradient(&trial) {
                Ok(g) if g.iter().all(|v| v.is_finite()) => g,
                Ok(_) | Err(FitError::NumericDomain(_)) => {
                    warn!(
                        "line search rejected a non-finite gradient at alpha = {:.3e}",
                        alpha
                    );
                    let shrunk = 0.5 * (alpha_prev + alpha);
                    if shrunk - alpha_prev < MIN_STEP {
                        return Err(FitError::LineSearchFailure(attempt + 1));
                    }
                    alpha = shrunk;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let dphi = -grad_trial.dot(direction);

            if dphi.abs() <= -self.c2 * dphi0 {
                return Ok(StepResult {
                    alpha,
                    cost: phi,
                    gradient: grad_trial,
                    func_evals: evals.func,
                    grad_evals: evals.grad,
                });
            }
            if dphi >= 0.0 {
                return self.zoom(
                    objective, point, direction, phi0, dphi0, alpha, alpha_prev, phi, phi_prev,
                    dphi, evals,
                );
            }

            alpha_prev = alpha;
            phi_prev = phi;
            dphi_prev = dphi;
            alpha *= 2.0;
        }
        Err(FitError::LineSearchFailure(self.max_bracket_steps))
    }

    /// Narrow a bracket known to contain an admissible step. `alpha_lo`
    /// always carries the lowest objective value found so far that passes
    /// the sufficient decrease test; the endpoints need not be ordered.
    #[allow(clippy::too_many_arguments)]
    fn zoom<F: CostFunction>(
        &self,
        objective: &F,
        point: &DVector<f64>,
        direction: &DVector<f64>,
        phi0: f64,
        dphi0: f64,
        mut alpha_lo: f64,
        mut alpha_hi: f64,
        mut phi_lo: f64,
        mut phi_hi: f64,
        mut dphi_lo: f64,
        mut evals: EvalCounter,
    ) -> Result<StepResult, FitError> {
        for attempt in 0..self.max_zoom_steps {
            let width = alpha_hi - alpha_lo;
            if width.abs() < MIN_STEP {
                return Err(FitError::LineSearchFailure(attempt));
            }

            // quadratic model through phi_lo, dphi_lo and phi_hi, with a
            // bisection fallback whenever the minimizer is ill-conditioned
            // or falls too close to an endpoint
            let denom = 2.0 * (phi_hi - phi_lo - dphi_lo * width);
            let mut alpha = if denom.abs() > f64::EPSILON {
                alpha_lo - dphi_lo * width * width / denom
            } else {
                alpha_lo + 0.5 * width
            };
            let lo = alpha_lo.min(alpha_hi);
            let hi = alpha_lo.max(alpha_hi);
            let margin = 0.1 * (hi - lo);
            if !alpha.is_finite() || alpha < lo + margin || alpha > hi - margin {
                alpha = alpha_lo + 0.5 * width;
            }

            let trial = point - direction * alpha;
            evals.func += 1;
            let phi = match objective.cost(&trial) {
                Ok(v) if v.is_finite() => v,
                Ok(_) | Err(FitError::NumericDomain(_)) => {
                    warn!(
                        "zoom rejected a non-finite trial at alpha = {:.3e}",
                        alpha
                    );
                    f64::INFINITY
                }
                Err(e) => return Err(e),
            };

            if phi > phi0 + self.c1 * alpha * dphi0 || phi >= phi_lo {
                alpha_hi = alpha;
                phi_hi = phi;
            } else {
                evals.grad += 1;
                let grad_trial = match objective.gradient(&trial) {
                    Ok(g) if g.iter().all(|v| v.is_finite()) => g,
                    Ok(_) | Err(FitError::NumericDomain(_)) => {
                        alpha_hi = alpha;
                        phi_hi = phi;
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                let dphi = -grad_trial.dot(direction);
                if dphi.abs() <= -self.c2 * dphi0 {
                    return Ok(StepResult {
                        alpha,
                        cost: phi,
                        gradient: grad_trial,
                        func_evals: evals.func,
                        grad_evals: evals.grad,
                    });
                }
                if dphi * (alpha_hi - alpha_lo) >= 0.0 {
                    alpha_hi = alpha_lo;
                    phi_hi = phi_lo;
                }
                alpha_lo = alpha;
                phi_lo = phi;
                dphi_lo = dphi;
            }
        }
        Err(FitError::LineSearchFailure(self.max_zoom_steps))
    }
}

/// Accepted step together with the objective state at the new point, so the
/// caller never re-evaluates what the search has already computed.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub alpha: f64,
    pub cost: f64,
    pub gradient: DVector<f64>,
    pub func_evals: usize,
    pub grad_evals: usize,
}

#[derive(Copy, Clone, Debug, Default)]
struct EvalCounter {
    func: usize,
    grad: usize,
}

/////////////////////////////////////////TESTS////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::objective::ClosureObjective;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_step_on_a_quadratic_bowl() {
        // f(x) = 0.5*||x||^2, gradient x; with B = I the unit step lands
        // exactly on the minimizer
        let objective = ClosureObjective::new(
            |x: &DVector<f64>| 0.5 * x.dot(x),
            |x: &DVector<f64>| x.clone(),
        );
        let point = DVector::from_vec(vec![1.0, 1.0]);
        let gradient = point.clone();
        let direction = gradient.clone();
        let cost = 1.0;
        let step = WolfeSearch::new()
            .search(&objective, &point, cost, &gradient, &direction)
            .unwrap();
        assert_relative_eq!(step.alpha, 1.0, epsilon = 1e-12);
        assert_relative_eq!(step.cost, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zoom_finds_the_interior_minimizer() {
        // f(x) = (x - 3)^2 from x = 0 along d = f'(0) = -6; the exact
        // minimizer sits at alpha = 0.5 and one quadratic zoom step hits it
        let objective = ClosureObjective::new(
            |x: &DVector<f64>| (x[0] - 3.0) * (x[0] - 3.0),
            |x: &DVector<f64>| DVector::from_vec(vec![2.0 * (x[0] - 3.0)]),
        );
        let point = DVector::from_vec(vec![0.0]);
        let gradient = DVector::from_vec(vec![-6.0]);
        let direction = gradient.clone();
        let step = WolfeSearch::new()
            .search(&objective, &point, 9.0, &gradient, &direction)
            .unwrap();
        assert_relative_eq!(step.alpha, 0.5, epsilon = 1e-9);
        assert_relative_eq!(step.cost, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wolfe_conditions_hold_at_the_accepted_step() {
        // double well f(x) = x^4 - 2x^2 from x = 2.5, a case where the
        // bracket collapses through several zoom rounds
        let f = |x: &DVector<f64>| x[0].powi(4) - 2.0 * x[0] * x[0];
        let g = |x: &DVector<f64>| DVector::from_vec(vec![4.0 * x[0].powi(3) - 4.0 * x[0]]);
        let objective = ClosureObjective::new(f, g);
        let point = DVector::from_vec(vec![2.5]);
        let gradient = g(&point);
        let direction = gradient.clone();
        let cost = f(&point);
        let slope0 = gradient.dot(&direction);

        let search = WolfeSearch::new();
        let step = search
            .search(&objective, &point, cost, &gradient, &direction)
            .unwrap();
        println!("accepted alpha = {}, cost = {}", step.alpha, step.cost);

        let trial = &point - &direction * step.alpha;
        let armijo = f(&trial) <= cost - search.c1 * step.alpha * slope0;
        let curvature = g(&trial).dot(&direction).abs() <= search.c2 * slope0;
        assert!(armijo, "sufficient decrease must hold at the accepted step");
        assert!(curvature, "curvature must hold at the accepted step");
        assert!(step.alpha > 0.0);
    }

    #[test]
    fn test_reversed_direction_is_rejected() {
        let objective = ClosureObjective::new(
            |x: &DVector<f64>| 0.5 * x.dot(x),
            |x: &DVector<f64>| x.clone(),
        );
        let point = DVector::from_vec(vec![1.0, 1.0]);
        let gradient = point.clone();
        let direction = -gradient.clone();
        let result = WolfeSearch::new().search(&objective, &point, 1.0, &gradient, &direction);
        assert!(matches!(result, Err(FitError::NonDescentDirection(_))));
    }

    #[test]
    fn test_linear_descent_exhausts_the_bracket_budget() {
        // f(x) = -x decreases forever and never meets the curvature
        // condition, so the search must fail loudly instead of looping
        let objective = ClosureObjective::new(
            |x: &DVector<f64>| -x[0],
            |_x: &DVector<f64>| DVector::from_vec(vec![-1.0]),
        );
        let point = DVector::from_vec(vec![0.0]);
        let gradient = DVector::from_vec(vec![-1.0]);
        let direction = gradient.clone();
        let result = WolfeSearch::new().search(&objective, &point, 0.0, &gradient, &direction);
        assert_eq!(
            result.unwrap_err(),
            FitError::LineSearchFailure(WolfeSearch::new().max_bracket_steps)
        );
    }

    #[test]
    fn test_non_finite_region_shrinks_the_trial() {
        // the objective blows up past x = 4, the first trials land there
        // and must be rejected until the step is short enough
        let f = |x: &DVector<f64>| {
            if x[0] > 4.0 {
                f64::NAN
            } else {
                (x[0] - 3.0) * (x[0] - 3.0)
            }
        };
        let g = |x: &DVector<f64>| DVector::from_vec(vec![2.0 * (x[0] - 3.0)]);
        let objective = ClosureObjective::new(f, g);
        let point = DVector::from_vec(vec![0.0]);
        let gradient = g(&point);
        let direction = gradient.clone();
        let step = WolfeSearch::new()
            .search(&objective, &point, 9.0, &gradient, &direction)
            .unwrap();
        let landing = point[0] - direction[0] * step.alpha;
        assert!(landing <= 4.0, "accepted point must stay in the finite region");
        assert!(step.cost.is_finite());
    }

    #[test]
    fn test_tightened_bracket_budget_is_reported_in_the_failure() {
        let objective = ClosureObjective::new(
            |x: &DVector<f64>| -x[0],
            |_x: &DVector<f64>| DVector::from_vec(vec![-1.0]),
        );
        let point = DVector::from_vec(vec![0.0]);
        let gradient = DVector::from_vec(vec![-1.0]);
        let direction = gradient.clone();
        let search = WolfeSearch::new().with_max_bracket_steps(8);
        let result = search.search(&objective, &point, 0.0, &gradient, &direction);
        assert_eq!(result.unwrap_err(), FitError::LineSearchFailure(8));
    }

    #[test]
    fn test_builder_chain_composes_the_configuration() {
        let search = WolfeSearch::new()
            .with_c2(0.5)
            .with_c1(1e-3)
            .with_max_bracket_steps(10)
            .with_max_zoom_steps(12);
        assert_eq!(search.c1, 1e-3);
        assert_eq!(search.c2, 0.5);
        assert_eq!(search.max_bracket_steps, 10);
        assert_eq!(search.max_zoom_steps, 12);
    }

    #[test]
    #[should_panic(expected = "c1 must be inside (0, c2)")]
    fn test_c1_outside_the_admissible_range_panics() {
        let _ = WolfeSearch::new().with_c1(0.95);
    }

    #[test]
    #[should_panic(expected = "c2 must be inside (c1, 1)")]
    fn test_c2_outside_the_admissible_range_panics() {
        let _ = WolfeSearch::new().with_c2(1.5);
    }
}
