//! Floating-point comparison of transformed coordinates.
//!
//! Two values are equal if their absolute difference is within the tolerance,
//! or failing that if their IEEE-754 bit patterns are identical.
//! The second rule lets NaN match NaN and infinity match the same infinity,
//! which ordinary numeric comparison would reject.
use std::fmt;

use crate::{
    ComparisonMode, DerivativeFailure, Matrix, Result, Tolerance, TransformFailure, VerifyError,
};

/// A floating-point ordinate value, in single or double precision.
pub trait Ordinate: Copy + fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// Whether this is a double-precision type.
    const DOUBLE: bool;

    fn to_f64(self) -> f64;

    fn to_f32(self) -> f32;
}

impl Ordinate for f32 {
    const DOUBLE: bool = false;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn to_f32(self) -> f32 {
        self
    }
}

impl Ordinate for f64 {
    const DOUBLE: bool = true;

    fn to_f64(self) -> f64 {
        self
    }

    fn to_f32(self) -> f32 {
        self as f32
    }
}

/// The absolute difference between two values if they do not match, `None` if they do.
///
/// If either value is single-precision, both values and the threshold
/// are compared in single precision.
/// Strict comparisons only accept identical bit patterns.
fn mismatch<E: Ordinate, A: Ordinate>(
    expected: E,
    actual: A,
    threshold: f64,
    strict: bool,
) -> Option<f64> {
    // `!(delta <= threshold)` rather than `delta > threshold` so that NaN fails
    if E::DOUBLE && A::DOUBLE {
        let (e, a) = (expected.to_f64(), actual.to_f64());
        let delta = (a - e).abs();
        let within = !strict && delta <= threshold;
        (!within && a.to_bits() != e.to_bits()).then_some(delta)
    } else {
        let (e, a) = (expected.to_f32(), actual.to_f32());
        let delta = (a - e).abs();
        let within = !strict && delta <= threshold as f32;
        (!within && a.to_bits() != e.to_bits()).then_some(f64::from(delta))
    }
}

/// Whether `actual` is equal to `expected` within `delta`,
/// or has an identical bit pattern.
pub fn ordinates_equal<E: Ordinate, A: Ordinate>(expected: E, actual: A, delta: f64) -> bool {
    mismatch(expected, actual, delta, false).is_none()
}

/// Compares runs of packed coordinates, reporting the first mismatch.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateComparison<'a> {
    message: &'a str,
    dimension: usize,
    mode: ComparisonMode,
    first_point: usize,
}

impl<'a> CoordinateComparison<'a> {
    /// `message` is reported on failure;
    /// `dimension` is the number of ordinates per point.
    pub fn new(message: &'a str, dimension: usize, mode: ComparisonMode) -> Self {
        Self {
            message,
            dimension,
            mode,
            first_point: 0,
        }
    }

    /// Offset added to the point indices reported in failures.
    pub fn starting_at(mut self, first_point: usize) -> Self {
        self.first_point = first_point;
        self
    }

    /// Assert that the first `n_points` points of `actual` match those of `expected`.
    pub fn assert_equal<E: Ordinate, A: Ordinate>(
        &self,
        expected: &[E],
        actual: &[A],
        n_points: usize,
        tolerance: &dyn Tolerance,
    ) -> Result<()> {
        let n_ordinates = n_points * self.dimension;
        if expected.len() < n_ordinates || actual.len() < n_ordinates {
            return Err(VerifyError::Structural(format!(
                "{}: cannot compare {} points of dimension {} from arrays of length {} and {}",
                self.message,
                n_points,
                self.dimension,
                expected.len(),
                actual.len()
            )));
        }
        let strict = self.mode == ComparisonMode::Strict;
        for (idx, (e, a)) in expected[..n_ordinates]
            .iter()
            .zip(actual[..n_ordinates].iter())
            .enumerate()
        {
            let ordinate = idx % self.dimension;
            let threshold = tolerance.threshold(e.to_f64(), ordinate, self.mode);
            if let Some(delta) = mismatch(*e, *a, threshold, strict) {
                let start = idx - ordinate;
                let end = start + self.dimension;
                return Err(TransformFailure::new(
                    self.message,
                    idx / self.dimension + self.first_point,
                    ordinate,
                    &expected[start..end],
                    &actual[start..end],
                    delta,
                )
                .into());
            }
        }
        Ok(())
    }
}

/// Assert that two matrices have the same shape and matching elements.
///
/// The tolerance is evaluated at the `actual` element,
/// which is usually more accurate than an estimated `expected` one.
pub fn assert_matrix_equals(
    message: &str,
    expected: &Matrix,
    actual: &Matrix,
    mode: ComparisonMode,
    tolerance: &dyn Tolerance,
) -> Result<()> {
    if expected.nrows() != actual.nrows() {
        return Err(VerifyError::DimensionMismatch {
            what: "matrix rows",
            expected: expected.nrows(),
            actual: actual.nrows(),
        });
    }
    if expected.ncols() != actual.ncols() {
        return Err(VerifyError::DimensionMismatch {
            what: "matrix columns",
            expected: expected.ncols(),
            actual: actual.ncols(),
        });
    }
    let strict = mode == ComparisonMode::Strict;
    for col in 0..expected.ncols() {
        for row in 0..expected.nrows() {
            let e = expected[(row, col)];
            let a = actual[(row, col)];
            let threshold = tolerance.threshold(a, row, mode);
            if let Some(delta) = mismatch(e, a, threshold, strict) {
                return Err(DerivativeFailure {
                    message: message.to_string(),
                    row,
                    column: col,
                    expected: e,
                    actual: a,
                    delta,
                    expected_matrix: expected.clone(),
                    actual_matrix: actual.clone(),
                }
                .into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_tolerance() {
        assert!(ordinates_equal(1.0_f64, 1.05, 0.1));
        assert!(!ordinates_equal(1.0_f64, 1.5, 0.1));
        assert!(ordinates_equal(1.0_f64, 1.0, 0.0));
    }

    #[test]
    fn nan_and_infinity_need_identical_bits() {
        assert!(ordinates_equal(f64::NAN, f64::NAN, 0.0));
        assert!(ordinates_equal(f64::INFINITY, f64::INFINITY, 0.0));
        assert!(!ordinates_equal(f64::INFINITY, f64::NEG_INFINITY, 1e300));
        assert!(!ordinates_equal(f64::NAN, 1.0, f64::MAX));
        assert!(!ordinates_equal(1.0, f64::NAN, f64::MAX));
        assert!(!ordinates_equal(f64::INFINITY, f64::MAX, f64::MAX));
        assert!(ordinates_equal(f32::NAN, f64::NAN, 0.0));
    }

    #[test]
    fn mixed_precision_compares_as_f32() {
        let v = 0.1_f32;
        assert!(ordinates_equal(v, 0.1_f64, 0.0));
        assert!(!ordinates_equal(f64::from(v), 0.1_f64, 0.0));
    }

    #[test]
    fn strict_distinguishes_signed_zero() {
        let cmp = CoordinateComparison::new("strict", 1, ComparisonMode::Strict);
        assert!(cmp.assert_equal(&[0.0_f64], &[-0.0_f64], 1, &1.0_f64).is_err());

        let cmp = CoordinateComparison::new("direct", 1, ComparisonMode::DirectTransform);
        assert!(cmp.assert_equal(&[0.0_f64], &[-0.0_f64], 1, &0.0_f64).is_ok());
    }

    #[test]
    fn reports_location() {
        let expected = [10.0_f64, 400.0, 20.0, 300.125];
        let actual = [10.0_f64, 400.0, 20.0, 300.0];
        let err = CoordinateComparison::new("error", 2, ComparisonMode::DirectTransform)
            .starting_at(5)
            .assert_equal(&expected, &actual, 2, &0.0_f64)
            .unwrap_err();
        let failure = err.transform_failure().unwrap();
        assert_eq!(failure.point_index, 6);
        assert_eq!(failure.ordinate_index, 1);
        assert_eq!(failure.delta, 0.125);
        assert_eq!(failure.expected_point, "(20, 300.125)");
    }

    #[test]
    fn short_arrays_are_structural() {
        let err = CoordinateComparison::new("short", 2, ComparisonMode::DirectTransform)
            .assert_equal(&[1.0_f64, 2.0], &[1.0_f64], 1, &0.0_f64)
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn matrix_mismatch() {
        let expected = Matrix::diagonal(&[1.0, 2.0]);
        let actual = Matrix::diagonal(&[1.0, 2.5]);
        let err = assert_matrix_equals("derivative", &expected, &actual, ComparisonMode::Derivative, &0.1_f64)
            .unwrap_err();
        let failure = err.derivative_failure().unwrap();
        assert_eq!((failure.row, failure.column), (1, 1));
        assert_eq!(failure.delta, 0.5);

        assert!(
            assert_matrix_equals("derivative", &expected, &actual, ComparisonMode::Derivative, &1.0_f64)
                .is_ok()
        );
        assert!(
            assert_matrix_equals(
                "shape",
                &expected,
                &Matrix::zeros(2, 3),
                ComparisonMode::Derivative,
                &1.0_f64
            )
            .unwrap_err()
            .is_structural()
        );
    }
}
