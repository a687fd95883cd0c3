//! Numerical core of the crate: the logistic growth model, its quadratic
//! loss and the BFGS machinery driving the fit.

/// BFGS solver for the six parameter logistic growth curve. Parameters
/// theta = [a, b, c, d, e, f] of the model a/(b + c*exp(-d*(x - e))) + f
/// are fitted to an observation series rescaled into [0, 1].
/// # Examples
/// ```
/// use RustedLogisticFit::numerical::BFGS::BFGS;
/// use nalgebra::DVector;
/// // observation series already rescaled into [0, 1]
/// let scaled = DVector::from_vec(vec![0.0, 0.12, 0.27, 0.5, 0.73, 0.88, 1.0]);
/// let mut solver = BFGS::new();
/// solver.set_data(scaled);
/// solver.set_solver_params(Some("off".to_string()), Some(500), Some(1e-10));
/// let report = solver.main_loop().unwrap();
/// println!(
///     "converged: {}, reason: {}, final loss: {:e}",
///     report.status.converged(),
///     report.status.reason(),
///     report.final_cost
/// );
/// ```
pub mod BFGS;
/// symmetric positive-definite inverse-Hessian carrier with the rank-two update
pub mod inverse_hessian;
/// strong Wolfe step length selection along a descent direction
pub mod line_search;
/// the logistic growth curve and its analytic partial derivatives
pub mod logistic_model;
/// quadratic loss, gradient and the error taxonomy of a fitting run
pub mod objective;
