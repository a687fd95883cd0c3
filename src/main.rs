#![allow(non_snake_case)]
pub mod Utils;
pub mod dataio;
pub mod numerical;

use crate::Utils::logger::save_history_to_csv;
use crate::Utils::plots::{
    plot_cost_history, plot_cost_history_gnuplot, plot_fit, plot_fit_gnuplot,
};
use crate::dataio::daily_records::{read_daily_series, ANDAMENTO_PREFIX, POSITIVE_COLUMN};
use crate::dataio::rescale::MinMaxScale;
use crate::numerical::BFGS::BFGS;
use crate::numerical::objective::LogisticLoss;
use chrono::{Local, NaiveDate};
use std::path::Path;

// Fit the logistic growth curve a/(b + c*exp(-d*(x - e))) + f to the daily
// run of Italian national COVID-19 bulletins of spring 2020. The directory
// with the bulletins can be passed as the first argument, "gnuplot" as the
// second argument draws the charts with gnuplot instead of plotters.
fn main() {
    let data_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "COVID-19/dati-andamento-nazionale".to_string());
    let start = NaiveDate::from_ymd_opt(2020, 2, 24).unwrap();
    let end = NaiveDate::from_ymd_opt(2020, 3, 31).unwrap();

    let (dates, current) = match read_daily_series(
        Path::new(&data_dir),
        ANDAMENTO_PREFIX,
        start,
        end,
        POSITIVE_COLUMN,
    ) {
        Ok(series) => series,
        Err(e) => {
            eprintln!("failed to read the daily bulletins: {}", e);
            return;
        }
    };
    println!(
        "read {} daily records, {} .. {}",
        current.len(),
        dates[0],
        dates[dates.len() - 1]
    );

    let scale = match MinMaxScale::fit(&current) {
        Ok(scale) => scale,
        Err(e) => {
            eprintln!("cannot rescale the series: {}", e);
            return;
        }
    };
    let scaled = scale.scale(&current);

    let mut solver = BFGS::new();
    solver.set_data(scaled.clone());
    solver.set_solver_params(Some("info".to_string()), Some(20000), None);
    let report = match solver.solve() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("the fit could not be run: {}", e);
            return;
        }
    };
    let theta = solver.get_result().unwrap();

    let objective = LogisticLoss::from_series(scaled).unwrap();
    let raw_loss = objective
        .unscaled_cost(&theta, scale.min, scale.max)
        .unwrap_or(f64::NAN);

    println!("\n-------------------------------------------");
    println!("Results ({}):\n", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Number of iterations: {}", report.iterations);
    println!("Theta: {:?}", theta.as_slice());
    println!("Loss: {}", raw_loss);
    println!("Loss (rescaled data): {}", report.final_cost);
    println!(
        "Converged: {}, {}",
        report.status.converged(),
        report.status.reason()
    );

    // back to raw units for plotting
    let x_data = objective.x_data();
    let fitted = scale.unscale(&solver.fitted_curve().unwrap());
    let gnuplot_flag = std::env::args().nth(2).as_deref() == Some("gnuplot");
    if gnuplot_flag {
        plot_fit_gnuplot(
            x_data,
            &current,
            &fitted,
            "Logistic fit",
            "Days after 24th February",
            "Current positive cases",
            "logistic_fit.png",
        );
        plot_cost_history_gnuplot(&solver.cost_history, "cost_history.png");
    } else {
        plot_fit(
            x_data,
            &current,
            &fitted,
            "Logistic fit",
            "Days after 24th February",
            "Current positive cases",
            "logistic_fit.png",
        );
        plot_cost_history(&solver.cost_history, "cost_history.png");
    }
    save_history_to_csv(&solver.theta_history, &solver.cost_history, "fit_history.csv")
        .unwrap_or_else(|e| eprintln!("could not save the fit history: {}", e));
    println!("Terminated.");
}
