use crate::numerical::inverse_hessian::InverseHessian;
use crate::numerical::line_search::WolfeSearch;
use crate::numerical::logistic_model::{predict, PARAM_COUNT};
use crate::numerical::objective::{CostFunction, FitError, LogisticLoss};
use log::{error, info, warn};
use nalgebra::DVector;
use simplelog::LevelFilter;
use simplelog::*;
use std::collections::HashMap;
use std::time::Instant;
use tabled::{builder::Builder, settings::Style};

/// Terminal state of a fitting run.
#[derive(Debug, Clone, PartialEq)]
pub enum FitStatus {
    /// The loss dropped below the configured epsilon threshold.
    Converged,
    /// The iteration budget ran out before the threshold was met.
    Exhausted,
    /// The run stopped on an unrecoverable numeric or line search error.
    Failed(String),
}

impl FitStatus {
    pub fn converged(&self) -> bool {
        matches!(self, FitStatus::Converged)
    }

    /// Human readable verdict of the run.
    pub fn reason(&self) -> String {
        match self {
            FitStatus::Converged => "loss below threshold".to_string(),
            FitStatus::Exhausted => "iteration budget reached".to_string(),
            FitStatus::Failed(why) => why.clone(),
        }
    }
}

/// Outcome of a fitting run with its evaluation counters.
#[derive(Debug, Clone)]
pub struct FitReport {
    pub status: FitStatus,
    pub iterations: usize,
    pub final_cost: f64,
    pub func_evals: usize,
    pub grad_evals: usize,
    pub skipped_updates: usize,
}

/// BFGS solver for the six parameter logistic growth curve
///
///   a / (b + c*exp(-d*(x - e))) + f
///
/// over an observation series rescaled into [0, 1]. Positions are the
/// implicit indices 0, 1, .., N-1. Each iteration takes the direction
/// d = B*g from the inverse-Hessian approximation, finds a strong Wolfe
/// step length along theta - alpha*d, then refreshes B with the rank-two
/// update. The loop stops when the loss falls below epsilon (checked at the
/// top of every iteration, so a large enough epsilon accepts the initial
/// guess without a single step), when the iteration budget runs out, or
/// when a numeric or line search failure makes further progress meaningless.
pub struct BFGS {
    /// observation series, already rescaled into [0, 1]
    pub y_data: DVector<f64>,
    /// starting parameters [a, b, c, d, e, f]
    pub initial_guess: Vec<f64>,
    /// iteration budget; zero is legal and returns the seeded history only
    pub max_iterations: usize,
    /// loss threshold for convergence; zero disables the check
    pub epsilon: f64,
    /// strong Wolfe step length selection
    pub search: WolfeSearch,
    /// logging level (off/none disables logging)
    pub loglevel: Option<String>,

    // fields below are filled by the solver
    pub i: usize,
    pub theta_history: Vec<DVector<f64>>,
    pub cost_history: Vec<f64>,
    pub result: Option<DVector<f64>>,
    pub report: Option<FitReport>,
    calc_statistics: HashMap<String, usize>,
}

impl Default for BFGS {
    fn default() -> Self {
        Self::new()
    }
}

impl BFGS {
    pub fn new() -> BFGS {
        BFGS {
            y_data: DVector::zeros(0),
            initial_guess: vec![1.0; PARAM_COUNT],
            max_iterations: 20000,
            epsilon: 0.0,
            search: WolfeSearch::new(),
            loglevel: Some("info".to_string()),
            i: 0,
            theta_history: Vec::new(),
            cost_history: Vec::new(),
            result: None,
            report: None,
            calc_statistics: HashMap::new(),
        }
    }

    /// Set the observation series the curve is fitted to. The series is
    /// expected in rescaled units, see dataio::rescale.
    pub fn set_data(&mut self, scaled: DVector<f64>) {
        self.y_data = scaled;
    }

    pub fn set_initial_guess(&mut self, guess: Vec<f64>) {
        self.initial_guess = guess;
    }

    /// Optional solver parameters in one call; None keeps the current value.
    pub fn set_solver_params(
        &mut self,
        loglevel: Option<String>,
        max_iterations: Option<usize>,
        epsilon: Option<f64>,
    ) {
        if let Some(level) = loglevel {
            assert!(
                level == "debug"
                    || level == "info"
                    || level == "warn"
                    || level == "error"
                    || level == "off"
                    || level == "none",
                "loglevel must be debug, info, warn, error or off"
            );
            self.loglevel = Some(level);
        }
        if let Some(max_iterations) = max_iterations {
            self.max_iterations = max_iterations;
        }
        if let Some(epsilon) = epsilon {
            assert!(epsilon >= 0.0, "epsilon should be a non-negative number.");
            self.epsilon = epsilon;
        }
    }

    /// Override the Wolfe constants of the step length selection. The pair
    /// is validated jointly, so constants below or above the defaults are
    /// both admissible as long as they are ordered.
    pub fn set_wolfe_constants(&mut self, c1: f64, c2: f64) {
        assert!(
            c1 > 0.0 && c1 < c2 && c2 < 1.0,
            "Wolfe constants should satisfy 0 < c1 < c2 < 1."
        );
        self.search.c1 = c1;
        self.search.c2 = c2;
    }

    fn validate(&self) -> Result<(), FitError> {
        if self.y_data.is_empty() {
            return Err(FitError::InvalidConfiguration(
                "observation series is empty".to_string(),
            ));
        }
        if self.initial_guess.len() != PARAM_COUNT {
            return Err(FitError::InvalidConfiguration(format!(
                "initial guess must have {} components, got {}",
                PARAM_COUNT,
                self.initial_guess.len()
            )));
        }
        Ok(())
    }

    /// Run the fit. Malformed inputs are returned as errors before any
    /// iteration happens; numeric and line search failures inside the loop
    /// end the run with a Failed status in the report and keep the history
    /// gathered so far.
    pub fn main_loop(&mut self) -> Result<FitReport, FitError> {
        self.validate()?;
        let objective = LogisticLoss::from_series(self.y_data.clone())?;

        let mut theta = DVector::from_vec(self.initial_guess.clone());
        let mut inv_hessian = InverseHessian::identity(PARAM_COUNT);

        self.i = 0;
        self.theta_history = Vec::with_capacity(self.max_iterations + 1);
        self.cost_history = Vec::with_capacity(self.max_iterations + 1);

        let mut func_evals = 1;
        let mut grad_evals = 1;
        let mut skipped_updates = 0;

        let seeded = objective
            .cost(&theta)
            .and_then(|cost| objective.gradient(&theta).map(|gradient| (cost, gradient)));
        let (mut cost, mut gradient) = match seeded {
            Ok(state) => state,
            Err(e) => {
                error!("evaluation failed at the initial guess: {}", e);
                let report = FitReport {
                    status: FitStatus::Failed(e.to_string()),
                    iterations: 0,
                    final_cost: f64::NAN,
                    func_evals,
                    grad_evals,
                    skipped_updates,
                };
                self.result = Some(theta);
                self.report = Some(report.clone());
                return Ok(report);
            }
        };

        self.theta_history.push(theta.clone());
        self.cost_history.push(cost);

        let mut status = FitStatus::Exhausted;
        while self.i < self.max_iterations {
            if self.epsilon > 0.0 && cost < self.epsilon {
                status = FitStatus::Converged;
                info!("converged at iteration {}, loss = {:e}", self.i, cost);
                break;
            }

            let direction = inv_hessian.direction(&gradient);
            let step = match self
                .search
                .search(&objective, &theta, cost, &gradient, &direction)
            {
                Ok(step) => step,
                Err(e) => {
                    error!("iteration {} aborted: {}", self.i, e);
                    status = FitStatus::Failed(e.to_string());
                    break;
                }
            };
            func_evals += step.func_evals;
            grad_evals += step.grad_evals;

            let theta_new = &theta - &direction * step.alpha;
            let s = &theta_new - &theta;
            let y = &step.gradient - &gradient;

            self.theta_history.push(theta_new.clone());
            self.cost_history.push(step.cost);

            if !inv_hessian.update(&s, &y) {
                skipped_updates += 1;
            }

            theta = theta_new;
            cost = step.cost;
            gradient = step.gradient;
            self.i += 1;
            info!(
                "iteration = {}, loss = {:e}, step length = {:.3e}",
                self.i, cost, step.alpha
            );
        }

        if let FitStatus::Exhausted = status {
            warn!(
                "iteration budget {} reached, final loss = {:e}",
                self.max_iterations, cost
            );
        }

        let report = FitReport {
            status,
            iterations: self.i,
            final_cost: cost,
            func_evals,
            grad_evals,
            skipped_updates,
        };
        self.result = Some(theta);
        self.report = Some(report.clone());
        Ok(report)
    }

    /// Wrapper around the main loop measuring elapsed time and gathering
    /// calculation statistics.
    pub fn solver(&mut self) -> Result<FitReport, FitError> {
        let begin = Instant::now();
        let res = self.main_loop();
        let elapsed = begin.elapsed();
        info!("fitting took {:.3} s", elapsed.as_secs_f64());
        self.calc_statistics
            .insert("time elapsed, ms".to_string(), elapsed.as_millis() as usize);
        self.calc_statistics
            .insert("length of data series".to_string(), self.y_data.len());
        if let Ok(report) = &res {
            self.calc_statistics
                .insert("number of iterations".to_string(), report.iterations);
            self.calc_statistics
                .insert("function evaluations".to_string(), report.func_evals);
            self.calc_statistics
                .insert("gradient evaluations".to_string(), report.grad_evals);
            self.calc_statistics
                .insert("skipped B updates".to_string(), report.skipped_updates);
        }
        self.calc_statistics();
        res
    }

    /// Run the fit with logging configured from the loglevel field.
    pub fn solve(&mut self) -> Result<FitReport, FitError> {
        let is_logging_disabled = self
            .loglevel
            .as_ref()
            .map(|level| level == "off" || level == "none")
            .unwrap_or(false);

        if is_logging_disabled {
            self.solver()
        } else {
            let log_option = if let Some(level) = self.loglevel.clone() {
                match level.as_str() {
                    "debug" => LevelFilter::Info,
                    "info" => LevelFilter::Info,
                    "warn" => LevelFilter::Warn,
                    "error" => LevelFilter::Error,
                    _ => panic!("loglevel must be debug, info, warn, error or off"),
                }
            } else {
                LevelFilter::Info
            };
            println!(" \n \n Fitting started with loglevel: {}", log_option);
            let logger_instance = CombinedLogger::init(vec![TermLogger::new(
                log_option,
                Config::default(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )]);
            match logger_instance {
                Ok(()) => {
                    let res = self.solver();
                    info!(" \n \n Fitting ended");
                    res
                }
                Err(_) => self.solver(),
            }
        }
    }

    pub fn get_result(&self) -> Option<DVector<f64>> {
        self.result.clone()
    }

    /// Model predictions at the fitted parameters over the data positions,
    /// still in rescaled units.
    pub fn fitted_curve(&self) -> Option<DVector<f64>> {
        self.result.as_ref().map(|theta| {
            let n = self.y_data.len();
            let x_data = DVector::from_iterator(n, (0..n).map(|i| i as f64));
            predict(theta, &x_data)
        })
    }

    fn calc_statistics(&self) {
        let stats = self.calc_statistics.clone();
        let mut table = Builder::from(stats).build();
        table.with(Style::modern_rounded());
        info!("\n \n CALC STATISTICS \n \n {}", table.to_string());
    }
}
