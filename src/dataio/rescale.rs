use crate::dataio::daily_records::DataError;
use nalgebra::DVector;

/// Min-max bounds learned from a raw observation series.
///
/// The optimizer works on series mapped into [0, 1]; the learned bounds
/// travel with the fit so predictions can be mapped back to raw units for
/// reporting and plotting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScale {
    pub min: f64,
    pub max: f64,
}

impl MinMaxScale {
    /// Learn the bounds of a series. An empty or constant series carries
    /// no scale and is rejected.
    pub fn fit(series: &DVector<f64>) -> Result<Self, DataError> {
        if series.is_empty() {
            return Err(DataError::EmptySeries);
        }
        let min = series.min();
        let max = series.max();
        // the negated comparison also rejects NaN bounds
        if !(max > min) {
            return Err(DataError::ConstantSeries);
        }
        Ok(Self { min, max })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Map a raw series into [0, 1].
    pub fn scale(&self, series: &DVector<f64>) -> DVector<f64> {
        let span = self.span();
        series.map(|v| (v - self.min) / span)
    }

    /// Map rescaled values back to raw units.
    pub fn unscale(&self, series: &DVector<f64>) -> DVector<f64> {
        let span = self.span();
        series.map(|v| v * span + self.min)
    }
}

/////////////////////////////////////////TESTS////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scaled_series_spans_the_unit_interval() {
        let raw = DVector::from_vec(vec![221.0, 311.0, 385.0, 588.0, 821.0]);
        let scale = MinMaxScale::fit(&raw).unwrap();
        let scaled = scale.scale(&raw);
        assert_eq!(scaled[0], 0.0);
        assert_eq!(scaled[scaled.len() - 1], 1.0);
        for v in scaled.iter() {
            assert!((0.0..=1.0).contains(v));
        }
    }

    #[test]
    fn test_unscale_inverts_scale() {
        let raw = DVector::from_vec(vec![100.0, 250.0, 900.0, 2600.0]);
        let scale = MinMaxScale::fit(&raw).unwrap();
        let roundtrip = scale.unscale(&scale.scale(&raw));
        for i in 0..raw.len() {
            assert_relative_eq!(roundtrip[i], raw[i], max_relative = 1e-12);
        }
    }

    #[test]
    fn test_span_matches_the_bounds() {
        let raw = DVector::from_vec(vec![100.0, 2600.0]);
        let scale = MinMaxScale::fit(&raw).unwrap();
        assert_eq!(scale.min, 100.0);
        assert_eq!(scale.max, 2600.0);
        assert_eq!(scale.span(), 2500.0);
    }

    #[test]
    fn test_empty_series_is_rejected() {
        let result = MinMaxScale::fit(&DVector::zeros(0));
        assert!(matches!(result, Err(DataError::EmptySeries)));
    }

    #[test]
    fn test_constant_series_is_rejected() {
        let raw = DVector::from_vec(vec![42.0, 42.0, 42.0]);
        let result = MinMaxScale::fit(&raw);
        assert!(matches!(result, Err(DataError::ConstantSeries)));
    }
}
