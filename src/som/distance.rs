//! Sample dissimilarity and neighborhood falloff.

use crate::error::{KohonenError, Result};

/// Euclidean distance between two equal-length vectors.
pub fn sample_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(KohonenError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(euclidean(a, b))
}

/// Euclidean distance without the length check; callers guarantee equal lengths.
#[inline]
pub(crate) fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Gaussian neighborhood falloff, `exp(-d^2 / (2 * sigma^2))`.
///
/// Returns 1.0 at distance 0 and decreases monotonically toward 0.
/// `sigma` must be positive.
#[inline]
pub fn neighborhood_weight(distance: f64, sigma: f64) -> f64 {
    debug_assert!(sigma > 0.0, "sigma must be positive");
    (-(distance * distance) / (2.0 * sigma * sigma)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_distance() {
        let dist = sample_distance(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap();
        assert!((dist - std::f64::consts::SQRT_2).abs() < 1e-10);
        assert_eq!(sample_distance(&[0.5, 0.5], &[0.5, 0.5]).unwrap(), 0.0);
    }

    #[test]
    fn test_sample_distance_length_mismatch() {
        let err = sample_distance(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            KohonenError::DimensionMismatch { expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn test_neighborhood_weight_shape() {
        assert_eq!(neighborhood_weight(0.0, 2.0), 1.0);

        let mut previous = 1.0;
        for step in 1..20 {
            let w = neighborhood_weight(step as f64 * 0.5, 2.0);
            assert!(w < previous);
            assert!(w > 0.0);
            previous = w;
        }
        assert!(neighborhood_weight(100.0, 1.0) < 1e-100);
    }

    #[test]
    fn test_neighborhood_weight_at_sigma() {
        let w = neighborhood_weight(3.0, 3.0);
        assert!((w - (-0.5f64).exp()).abs() < 1e-12);
    }
}
