use log::warn;
use nalgebra::{DMatrix, DVector};

/// Inverse-Hessian approximation maintained by the BFGS update.
///
/// The matrix starts as the identity and stays symmetric positive-definite:
/// rank-two updates with a curvature `<y, s>` that is not safely above
/// floating point noise are skipped so definiteness is never lost, and the
/// matrix is symmetrized after every applied update to absorb drift.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseHessian {
    matrix: DMatrix<f64>,
}

impl InverseHessian {
    pub fn identity(size: usize) -> Self {
        Self {
            matrix: DMatrix::identity(size, size),
        }
    }

    /// Search direction `B * g` for the current gradient.
    pub fn direction(&self, gradient: &DVector<f64>) -> DVector<f64> {
        &self.matrix * gradient
    }

    /// Apply the rank-two update
    ///
    ///   B' = (I - rho*s*y^T) B (I - rho*y*s^T) + rho*s*s^T,   rho = 1/<y, s>
    ///
    /// from the parameter step `s` and gradient difference `y`. Returns
    /// false when the update was skipped because the curvature was zero,
    /// negative or indistinguishable from noise.
    pub fn update(&mut self, s: &DVector<f64>, y: &DVector<f64>) -> bool {
        let sy = y.dot(s);
        let floor = f64::EPSILON.sqrt() * s.norm() * y.norm();
        // the negated comparison also catches a NaN curvature
        if !(sy > floor) {
            warn!(
                "skipping the inverse-Hessian update, curvature <y, s> = {:.3e}",
                sy
            );
            return false;
        }
        let n = self.matrix.nrows();
        let rho = 1.0 / sy;
        let identity = DMatrix::<f64>::identity(n, n);
        let left = &identity - (s * y.transpose()) * rho;
        let right = &identity - (y * s.transpose()) * rho;
        self.matrix = &left * &self.matrix * &right + (s * s.transpose()) * rho;
        for i in 0..n {
            for j in (i + 1)..n {
                let mean = 0.5 * (self.matrix[(i, j)] + self.matrix[(j, i)]);
                self.matrix[(i, j)] = mean;
                self.matrix[(j, i)] = mean;
            }
        }
        true
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

/////////////////////////////////////////TESTS////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_maps_the_gradient_to_itself() {
        let b = InverseHessian::identity(6);
        let g = DVector::from_vec(vec![1.0, -2.0, 3.0, 0.5, -0.5, 2.0]);
        assert_eq!(b.direction(&g), g);
    }

    #[test]
    fn test_update_preserves_symmetry() {
        let mut b = InverseHessian::identity(4);
        let s = DVector::from_vec(vec![0.3, -0.1, 0.7, 0.2]);
        let y = DVector::from_vec(vec![0.5, 0.1, 0.4, -0.05]);
        assert!(b.update(&s, &y));
        let m = b.matrix();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(m[(i, j)], m[(j, i)]);
            }
        }
    }

    #[test]
    fn test_update_preserves_positive_definiteness() {
        let mut b = InverseHessian::identity(3);
        let s = DVector::from_vec(vec![1.0, 0.2, -0.4]);
        let y = DVector::from_vec(vec![0.8, 0.3, -0.1]);
        assert!(b.update(&s, &y));
        assert!(
            b.matrix().clone().cholesky().is_some(),
            "updated matrix must stay positive definite"
        );
    }

    #[test]
    fn test_non_positive_curvature_is_skipped() {
        let mut b = InverseHessian::identity(3);
        let before = b.clone();
        let s = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        let y = DVector::from_vec(vec![-1.0, 0.0, 0.0]);
        assert!(!b.update(&s, &y), "negative curvature must be skipped");
        assert_eq!(b, before);
        let y = DVector::zeros(3);
        assert!(!b.update(&s, &y), "zero curvature must be skipped");
        assert_eq!(b, before);
    }

    #[test]
    fn test_unit_secant_pair_keeps_the_identity() {
        // with s = y = e1 and B = I the update reproduces the identity
        let mut b = InverseHessian::identity(3);
        let e1 = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        assert!(b.update(&e1, &e1));
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(b.matrix()[(i, j)], expected, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_secant_equation_holds_after_the_update() {
        // B' y = s is the defining property of the BFGS inverse update
        let mut b = InverseHessian::identity(4);
        let s = DVector::from_vec(vec![0.2, -0.3, 0.5, 0.1]);
        let y = DVector::from_vec(vec![0.4, -0.2, 0.3, 0.2]);
        assert!(b.update(&s, &y));
        let mapped = b.matrix() * &y;
        for i in 0..4 {
            assert_relative_eq!(mapped[i], s[i], epsilon = 1e-12);
        }
    }
}
