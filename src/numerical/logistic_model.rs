use nalgebra::DVector;

/// Number of model parameters [a, b, c, d, e, f].
pub const PARAM_COUNT: usize = 6;

/// Logistic growth curve with offset, evaluated elementwise over the
/// position vector:  a / (b + c*exp(-d*(x - e))) + f
pub fn predict(theta: &DVector<f64>, x_data: &DVector<f64>) -> DVector<f64> {
    let (a, b, c, d, e, f) = unpack(theta);
    x_data.map(|x| a / (b + c * (-d * (x - e)).exp()) + f)
}

/// Partial derivatives of the model with respect to a..e, one vector per
/// parameter. The partial with respect to the offset f is identically 1
/// and is left to the caller.
pub fn partials(theta: &DVector<f64>, x_data: &DVector<f64>) -> [DVector<f64>; 5] {
    let (a, b, c, d, e, _f) = unpack(theta);
    let d_a = x_data.map(|x| 1.0 / (b + c * (-d * (x - e)).exp()));
    let d_b = x_data.map(|x| -a / (b + c * (-d * (x - e)).exp()).powi(2));
    let d_c = x_data.map(|x| {
        let exp_pos = (d * (x - e)).exp();
        -a * exp_pos / (b * exp_pos + c).powi(2)
    });
    let d_d = x_data.map(|x| {
        let exp_pos = (d * (x - e)).exp();
        -a * c * (e - x) * exp_pos / (b * exp_pos + c).powi(2)
    });
    let d_e = x_data.map(|x| {
        let exp_pos = (d * (x - e)).exp();
        -a * c * d * exp_pos / (b * exp_pos + c).powi(2)
    });
    [d_a, d_b, d_c, d_d, d_e]
}

fn unpack(theta: &DVector<f64>) -> (f64, f64, f64, f64, f64, f64) {
    assert_eq!(
        theta.len(),
        PARAM_COUNT,
        "theta should have exactly {} components",
        PARAM_COUNT
    );
    (theta[0], theta[1], theta[2], theta[3], theta[4], theta[5])
}
