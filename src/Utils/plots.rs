use nalgebra::DVector;

pub fn plot_fit(
    x_data: &DVector<f64>,
    observed: &DVector<f64>,
    fitted: &DVector<f64>,
    title: &str,
    x_label: &str,
    y_label: &str,
    filename: &str,
) {
    use plotters::prelude::*;
    let x_min = x_data.min();
    let x_max = x_data.max();
    let y_min = observed.min().min(fitted.min());
    let y_max = observed.max().max(fitted.max());
    let root_area = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root_area.fill(&WHITE).unwrap();

    // Create a chart builder
    let mut chart = ChartBuilder::on(&root_area)
        .caption(title, ("sans-serif", 50))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(30)
        .build_cartesian_2d(x_min * 0.95..x_max * 1.05, y_min * 0.95..y_max * 1.05)
        .unwrap();

    // Configure the mesh
    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()
        .unwrap();

    // Observations as points, the fitted curve as a line
    let points: Vec<(f64, f64)> = x_data
        .iter()
        .zip(observed.iter())
        .map(|(&x, &y)| (x, y))
        .collect();
    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, RGBColor(255, 165, 0).filled())),
        )
        .unwrap()
        .label("observed")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, RGBColor(255, 165, 0).filled()));

    let curve: Vec<(f64, f64)> = x_data
        .iter()
        .zip(fitted.iter())
        .map(|(&x, &y)| (x, y))
        .collect();
    chart
        .draw_series(LineSeries::new(curve, &BLUE))
        .unwrap()
        .label("fitted")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    // Configure the legend
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .unwrap();
}

pub fn plot_cost_history(cost_history: &[f64], filename: &str) {
    use plotters::prelude::*;
    // a log axis only renders positive losses
    let series: Vec<(f64, f64)> = cost_history
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0.0)
        .map(|(i, &c)| (i as f64, c))
        .collect();
    if series.is_empty() {
        return;
    }
    let y_min = series.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = series.iter().map(|p| p.1).fold(0.0_f64, f64::max);
    let x_max = cost_history.len() as f64;
    let root_area = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root_area.fill(&WHITE).unwrap();

    let mut chart = ChartBuilder::on(&root_area)
        .caption("Cost history", ("sans-serif", 50))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..x_max, (y_min * 0.5..y_max * 2.0).log_scale())
        .unwrap();

    chart
        .configure_mesh()
        .x_desc("Iteration")
        .y_desc("Loss function value")
        .draw()
        .unwrap();

    chart
        .draw_series(LineSeries::new(series, &BLUE))
        .unwrap()
        .label("loss")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .unwrap();
}

use gnuplot::{AxesCommon, Caption, Color, Figure};
pub fn plot_fit_gnuplot(
    x_data: &DVector<f64>,
    observed: &DVector<f64>,
    fitted: &DVector<f64>,
    title: &str,
    x_label: &str,
    y_label: &str,
    filename: &str,
) {
    let mut fg = Figure::new();
    let obs: Vec<f64> = observed.iter().copied().collect();
    let fit: Vec<f64> = fitted.iter().copied().collect();

    fg.axes2d()
        .set_title(title, &[])
        .set_x_label(x_label, &[])
        .set_y_label(y_label, &[])
        .points(
            x_data.as_slice(),
            &obs,
            &[Caption("observed"), Color("orange".into())],
        )
        .lines(
            x_data.as_slice(),
            &fit,
            &[Caption("fitted"), Color("blue".into())],
        );

    // Save the plot to a file
    fg.save_to_png(filename, 800, 600).unwrap();
}

pub fn plot_cost_history_gnuplot(cost_history: &[f64], filename: &str) {
    let mut fg = Figure::new();
    let iterations: Vec<f64> = (0..cost_history.len()).map(|i| i as f64).collect();

    fg.axes2d()
        .set_title("Cost history", &[])
        .set_x_label("Iteration", &[])
        .set_y_label("Loss function value", &[])
        .set_y_log(Some(10.0))
        .lines(
            &iterations,
            cost_history,
            &[Caption("loss"), Color("blue".into())],
        );

    // Save the plot to a file
    fg.save_to_png(filename, 800, 600).unwrap();
}
