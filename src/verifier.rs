//! Conformance checks for [MathTransform] implementations.
//!
//! A [TransformVerifier] borrows the transform under test and checks that
//! every enabled batch calling convention agrees with the single-point
//! [MathTransform::transform_into], that transforms into overlapping buffers
//! give the same results as into disjoint ones, that the inverse transform
//! recovers the source coordinates, and that derivatives match finite differences.
//!
//! All checks are fail-fast: the first mismatch aborts the call.
use std::sync::Arc;

use log::{debug, trace};
use rand::RngCore;
use smallvec::{ToSmallVec, smallvec};

use crate::{
    Capabilities, ComparisonMode, CoordinateComparison, Matrix, MathTransform, Result, ShortVec,
    Tolerance, VerifyError, assert_matrix_equals, grid_points,
};

/// Number of points by which source and target regions are shifted
/// when testing transforms into overlapping buffers.
pub const POINTS_OFFSET: usize = 8;

/// Verifies a transform under test, according to its declared [Capabilities].
///
/// The default tolerance is 0, i.e. exact equality.
#[derive(Debug)]
pub struct TransformVerifier<'t, T: MathTransform + ?Sized> {
    transform: &'t T,
    capabilities: Capabilities,
    tolerance: Box<dyn Tolerance>,
    derivative_deltas: ShortVec<f64>,
}

impl<'t, T: MathTransform + ?Sized> TransformVerifier<'t, T> {
    pub fn new(transform: &'t T) -> Self {
        Self {
            transform,
            capabilities: Capabilities::default(),
            tolerance: Box::new(0.0_f64),
            derivative_deltas: ShortVec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_tolerance<Tol: Tolerance + 'static>(mut self, tolerance: Tol) -> Self {
        self.tolerance = Box::new(tolerance);
        self
    }

    /// Distances between the points used to estimate derivatives by finite differences,
    /// in source units, one per source dimension.
    /// If fewer deltas than source dimensions are given,
    /// the last one is used for the remaining dimensions.
    pub fn with_derivative_deltas(mut self, deltas: &[f64]) -> Self {
        self.derivative_deltas = deltas.to_smallvec();
        self
    }

    pub fn transform(&self) -> &T {
        self.transform
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn tolerance(&self) -> &dyn Tolerance {
        self.tolerance.as_ref()
    }

    /// Source and target dimensions of the transform, which must be positive.
    fn dimensions(&self) -> Result<(usize, usize)> {
        let source_ndim = self.transform.source_ndim();
        let target_ndim = self.transform.target_ndim();
        if source_ndim == 0 {
            return Err(VerifyError::Structural(
                "Source dimension must be positive".into(),
            ));
        }
        if target_ndim == 0 {
            return Err(VerifyError::Structural(
                "Target dimension must be positive".into(),
            ));
        }
        Ok((source_ndim, target_ndim))
    }

    /// Number of points in a packed array, which must be a whole number.
    fn count_points(len: usize, ndim: usize, what: &str) -> Result<usize> {
        if len % ndim != 0 {
            return Err(VerifyError::Structural(format!(
                "{what} dimension {ndim} is not a divisor of the array length {len}"
            )));
        }
        Ok(len / ndim)
    }

    fn require(enabled: bool, capability: &str) -> Result<()> {
        if enabled {
            Ok(())
        } else {
            Err(VerifyError::Structural(format!(
                "{capability} support is disabled"
            )))
        }
    }

    /// The inverse transform, checking that its dimensions mirror the forward transform's.
    fn checked_inverse(
        &self,
        source_ndim: usize,
        target_ndim: usize,
    ) -> Result<Arc<dyn MathTransform>> {
        let inverse = self.transform.invert().ok_or(VerifyError::NotInvertible)?;
        if inverse.source_ndim() != target_ndim {
            return Err(VerifyError::DimensionMismatch {
                what: "inverse transform source",
                expected: target_ndim,
                actual: inverse.source_ndim(),
            });
        }
        if inverse.target_ndim() != source_ndim {
            return Err(VerifyError::DimensionMismatch {
                what: "inverse transform target",
                expected: source_ndim,
                actual: inverse.target_ndim(),
            });
        }
        Ok(inverse)
    }

    /// Check that every enabled batch calling convention gives the same results
    /// as transforming the points one at a time.
    ///
    /// Returns the single-point results, which the other conventions were compared against.
    pub fn verify_consistency(&self, source_floats: &[f32]) -> Result<Vec<f32>> {
        let transform = self.transform;
        let tolerance = self.tolerance.as_ref();
        let caps = &self.capabilities;
        let (source_ndim, target_ndim) = self.dimensions()?;
        let n_pts = Self::count_points(source_floats.len(), source_ndim, "Source")?;

        let arena_len = source_ndim.max(target_ndim) * (n_pts + POINTS_OFFSET);
        let mut transformed = vec![f32::NAN; target_ndim * n_pts];
        let mut target_floats = vec![f32::NAN; arena_len];
        let mut target_doubles = vec![f64::NAN; arena_len];
        let source_doubles: Vec<f64> = source_floats.iter().map(|v| f64::from(*v)).collect();

        // The single-point transform is the reference and cannot be disabled.
        let mut target_pt: ShortVec<f64> = smallvec![f64::NAN; target_ndim];
        for (pt, out) in source_doubles
            .chunks_exact(source_ndim)
            .zip(transformed.chunks_exact_mut(target_ndim))
        {
            target_pt.fill(f64::NAN);
            transform.transform_into(pt, &mut target_pt);
            for (o, t) in out.iter_mut().zip(target_pt.iter()) {
                *o = *t as f32;
            }
        }
        trace!("Computed {n_pts} reference points");

        if caps.double_to_double {
            target_doubles.fill(f64::NAN);
            transform.transform_f64(&source_doubles, &mut target_doubles, n_pts);
            unchanged("transform_f64 modified a source coordinate.", source_ndim).assert_equal(
                source_floats,
                &source_doubles,
                n_pts,
                tolerance,
            )?;
            matches("transform_f64 error.", target_ndim).assert_equal(
                &transformed,
                &target_doubles,
                n_pts,
                tolerance,
            )?;
        } else {
            debug!("Skipping double to double transform: not supported");
        }

        if caps.float_to_float {
            target_floats.fill(f32::NAN);
            transform.transform_f32(source_floats, &mut target_floats, n_pts);
            unchanged("transform_f32 modified a source coordinate.", source_ndim).assert_equal(
                &source_doubles,
                source_floats,
                n_pts,
                tolerance,
            )?;
            matches("transform_f32 error.", target_ndim).assert_equal(
                &transformed,
                &target_floats,
                n_pts,
                tolerance,
            )?;
        } else {
            debug!("Skipping float to float transform: not supported");
        }

        if caps.double_to_float {
            target_floats.fill(f32::NAN);
            transform.transform_f64_to_f32(&source_doubles, &mut target_floats, n_pts);
            unchanged("transform_f64_to_f32 modified a source coordinate.", source_ndim).assert_equal(
                source_floats,
                &source_doubles,
                n_pts,
                tolerance,
            )?;
            matches("transform_f64_to_f32 error.", target_ndim).assert_equal(
                &transformed,
                &target_floats,
                n_pts,
                tolerance,
            )?;
        } else {
            debug!("Skipping double to float transform: not supported");
        }

        if caps.float_to_double {
            target_doubles.fill(f64::NAN);
            transform.transform_f32_to_f64(source_floats, &mut target_doubles, n_pts);
            unchanged("transform_f32_to_f64 modified a source coordinate.", source_ndim).assert_equal(
                &source_doubles,
                source_floats,
                n_pts,
                tolerance,
            )?;
            matches("transform_f32_to_f64 error.", target_ndim).assert_equal(
                &transformed,
                &target_doubles,
                n_pts,
                tolerance,
            )?;
        } else {
            debug!("Skipping float to double transform: not supported");
        }

        if caps.overlapping_arrays {
            for source_offset in (0..POINTS_OFFSET * source_ndim).step_by(source_ndim) {
                for target_offset in (0..POINTS_OFFSET * target_ndim).step_by(target_ndim) {
                    trace!(
                        "Overlapping transform from offset {source_offset} to {target_offset}"
                    );
                    let source_end = source_offset + source_floats.len();
                    target_floats[source_offset..source_end].copy_from_slice(source_floats);
                    target_doubles[source_offset..source_end].copy_from_slice(&source_doubles);
                    transform.transform_within_f32(
                        &mut target_floats,
                        source_offset,
                        target_offset,
                        n_pts,
                    );
                    transform.transform_within_f64(
                        &mut target_doubles,
                        source_offset,
                        target_offset,
                        n_pts,
                    );
                    let message = format!(
                        "transform_within_f32 error (source offset {source_offset}, target offset {target_offset})."
                    );
                    matches(&message, target_ndim).assert_equal(
                        &transformed,
                        &target_floats[target_offset..],
                        n_pts,
                        tolerance,
                    )?;
                    let message = format!(
                        "transform_within_f64 error (source offset {source_offset}, target offset {target_offset})."
                    );
                    matches(&message, target_ndim).assert_equal(
                        &transformed,
                        &target_doubles[target_offset..],
                        n_pts,
                        tolerance,
                    )?;
                }
            }
        } else {
            debug!("Skipping overlapping array transforms: not supported");
        }

        Ok(transformed)
    }

    /// Check that transforming each point and then inverse-transforming the result
    /// recovers the original point.
    pub fn verify_inverse(&self, coordinates: &[f64]) -> Result<()> {
        let tolerance = self.tolerance.as_ref();
        let (source_ndim, target_ndim) = self.dimensions()?;
        Self::require(self.capabilities.inverse, "Inverse transform")?;
        let inverse = self.checked_inverse(source_ndim, target_ndim)?;
        Self::count_points(coordinates.len(), source_ndim, "Source")?;

        let mut source: ShortVec<f64> = smallvec![f64::NAN; source_ndim];
        let mut target: ShortVec<f64> = smallvec![f64::NAN; target_ndim];
        let mut back: ShortVec<f64> = smallvec![f64::NAN; source_ndim];
        for (idx, pt) in coordinates.chunks_exact(source_ndim).enumerate() {
            source.copy_from_slice(pt);
            target.fill(f64::NAN);
            back.fill(f64::NAN);
            self.transform.transform_into(&source, &mut target);
            inverse.transform_into(&target, &mut back);
            CoordinateComparison::new(
                "Unexpected result of inverse transform.",
                source_ndim,
                ComparisonMode::InverseTransform,
            )
            .starting_at(idx)
            .assert_equal(&source, &back, 1, tolerance)?;
            CoordinateComparison::new(
                "Source coordinate has been modified.",
                source_ndim,
                ComparisonMode::Strict,
            )
            .starting_at(idx)
            .assert_equal(pt, &source, 1, tolerance)?;
        }
        Ok(())
    }

    /// Single-precision equivalent of [TransformVerifier::verify_inverse];
    /// the points are widened to double precision before being transformed.
    pub fn verify_inverse_f32(&self, coordinates: &[f32]) -> Result<()> {
        let source_doubles: Vec<f64> = coordinates.iter().map(|v| f64::from(*v)).collect();
        self.verify_inverse(&source_doubles)?;
        let source_ndim = self.transform.source_ndim();
        CoordinateComparison::new(
            "Unexpected change in source coordinates.",
            source_ndim,
            ComparisonMode::Strict,
        )
        .assert_equal(
            coordinates,
            &source_doubles,
            coordinates.len() / source_ndim,
            self.tolerance.as_ref(),
        )
    }

    /// Check the transform against known expected results.
    ///
    /// If the inverse capability is enabled,
    /// the expected points are also inverse-transformed and compared with the sources.
    pub fn verify_transform(&self, coordinates: &[f64], expected: &[f64]) -> Result<()> {
        let tolerance = self.tolerance.as_ref();
        let (source_ndim, target_ndim) = self.dimensions()?;
        let inverse = if self.capabilities.inverse {
            Some(self.checked_inverse(source_ndim, target_ndim)?)
        } else {
            debug!("Skipping inverse transform: not supported");
            None
        };
        let n_pts = Self::count_points(coordinates.len(), source_ndim, "Source")?;
        let n_expected = Self::count_points(expected.len(), target_ndim, "Target")?;
        if n_pts != n_expected {
            return Err(VerifyError::Structural(format!(
                "Mismatched number of points: {n_pts} source points but {n_expected} expected"
            )));
        }

        let mut source: ShortVec<f64> = smallvec![f64::NAN; source_ndim];
        let mut target: ShortVec<f64> = smallvec![f64::NAN; target_ndim];
        let mut back: ShortVec<f64> = smallvec![f64::NAN; source_ndim];
        for (idx, (pt, exp)) in coordinates
            .chunks_exact(source_ndim)
            .zip(expected.chunks_exact(target_ndim))
            .enumerate()
        {
            source.copy_from_slice(pt);
            target.fill(f64::NAN);
            self.transform.transform_into(&source, &mut target);
            CoordinateComparison::new(
                "Unexpected transform result.",
                target_ndim,
                ComparisonMode::DirectTransform,
            )
            .starting_at(idx)
            .assert_equal(exp, &target, 1, tolerance)?;
            CoordinateComparison::new(
                "Source coordinate has been modified.",
                source_ndim,
                ComparisonMode::Strict,
            )
            .starting_at(idx)
            .assert_equal(pt, &source, 1, tolerance)?;

            let Some(inverse) = inverse.as_ref() else {
                continue;
            };
            target.copy_from_slice(exp);
            back.fill(f64::NAN);
            inverse.transform_into(&target, &mut back);
            CoordinateComparison::new(
                "Unexpected result of inverse transform.",
                source_ndim,
                ComparisonMode::InverseTransform,
            )
            .starting_at(idx)
            .assert_equal(&source, &back, 1, tolerance)?;
            CoordinateComparison::new(
                "Target coordinate has been modified.",
                target_ndim,
                ComparisonMode::Strict,
            )
            .starting_at(idx)
            .assert_equal(exp, &target, 1, tolerance)?;
        }
        Ok(())
    }

    /// Compare the derivative at the given point with an estimate
    /// computed by central finite differences.
    pub fn verify_derivative(&self, point: &[f64]) -> Result<()> {
        Self::require(self.capabilities.derivative, "Derivative")?;
        let (source_ndim, target_ndim) = self.dimensions()?;
        let Some(last_delta) = self.derivative_deltas.last().copied() else {
            return Err(VerifyError::Structural(
                "Derivative deltas must be assigned a non-empty value".into(),
            ));
        };
        if point.len() != source_ndim {
            return Err(VerifyError::DimensionMismatch {
                what: "derivative point",
                expected: source_ndim,
                actual: point.len(),
            });
        }

        let matrix = self
            .transform
            .derivative(point)
            .ok_or(VerifyError::Unsupported("derivative"))?;
        if matrix.ncols() != source_ndim {
            return Err(VerifyError::DimensionMismatch {
                what: "derivative columns",
                expected: source_ndim,
                actual: matrix.ncols(),
            });
        }
        if matrix.nrows() != target_ndim {
            return Err(VerifyError::DimensionMismatch {
                what: "derivative rows",
                expected: target_ndim,
                actual: matrix.nrows(),
            });
        }

        let mut approx = Matrix::zeros(target_ndim, source_ndim);
        let mut s1: ShortVec<f64> = point.to_smallvec();
        let mut s2: ShortVec<f64> = point.to_smallvec();
        let mut t1: ShortVec<f64> = smallvec![f64::NAN; target_ndim];
        let mut t2: ShortVec<f64> = smallvec![f64::NAN; target_ndim];
        for i in 0..source_ndim {
            s1.copy_from_slice(point);
            s2.copy_from_slice(point);
            let delta = self
                .derivative_deltas
                .get(i)
                .copied()
                .unwrap_or(last_delta);
            s1[i] = point[i] - delta / 2.0;
            s2[i] = point[i] + delta / 2.0;
            self.transform.transform_into(&s1, &mut t1);
            self.transform.transform_into(&s2, &mut t2);
            for j in 0..target_ndim {
                approx[(j, i)] = (t2[j] - t1[j]) / delta;
            }
        }
        assert_matrix_equals(
            "Derivative error.",
            &approx,
            &matrix,
            ComparisonMode::Derivative,
            self.tolerance.as_ref(),
        )
    }

    /// Verify every enabled operation on a grid of points covering the given domain.
    ///
    /// See [grid_points] for how the points are generated.
    /// Runs [TransformVerifier::verify_consistency], then
    /// [TransformVerifier::verify_inverse_f32] and [TransformVerifier::verify_derivative]
    /// at every point if those capabilities are enabled.
    pub fn verify_in_domain(
        &self,
        min: &[f64],
        max: &[f64],
        num: &[usize],
        rng: Option<&mut dyn RngCore>,
    ) -> Result<()> {
        let (source_ndim, _) = self.dimensions()?;
        if min.len() != source_ndim {
            return Err(VerifyError::DimensionMismatch {
                what: "domain minimum ordinates",
                expected: source_ndim,
                actual: min.len(),
            });
        }
        let coordinates = grid_points(min, max, num, rng)?;
        debug!(
            "Verifying transform on {} points in domain",
            coordinates.len() / source_ndim
        );

        self.verify_consistency(&coordinates)?;
        if self.capabilities.inverse {
            self.verify_inverse_f32(&coordinates)?;
        } else {
            debug!("Skipping inverse transform: not supported");
        }
        if self.capabilities.derivative {
            let mut point: ShortVec<f64> = smallvec![f64::NAN; source_ndim];
            for pt in coordinates.chunks_exact(source_ndim) {
                for (p, c) in point.iter_mut().zip(pt.iter()) {
                    *p = f64::from(*c);
                }
                self.verify_derivative(&point)?;
            }
        } else {
            debug!("Skipping derivative: not supported");
        }
        Ok(())
    }
}

/// Comparison of source coordinates which must not have been modified.
fn unchanged(message: &str, source_ndim: usize) -> CoordinateComparison<'_> {
    CoordinateComparison::new(message, source_ndim, ComparisonMode::Strict)
}

/// Comparison of transformed coordinates against the single-point reference.
fn matches(message: &str, target_ndim: usize) -> CoordinateComparison<'_> {
    CoordinateComparison::new(message, target_ndim, ComparisonMode::DirectTransform)
}

/// An absolute tolerance, which must be zero or positive.
fn absolute_tolerance(epsilon: f64) -> Result<f64> {
    if epsilon >= 0.0 {
        Ok(epsilon)
    } else {
        Err(VerifyError::Structural(format!(
            "Tolerance must be non-negative, got {epsilon}"
        )))
    }
}

/// Check every batch calling convention of `transform` against its single-point transform,
/// using an absolute tolerance and all capabilities enabled.
///
/// Returns the single-point results.
pub fn verify_consistency<T: MathTransform + ?Sized>(
    transform: &T,
    source: &[f32],
    epsilon: f64,
) -> Result<Vec<f32>> {
    TransformVerifier::new(transform)
        .with_tolerance(absolute_tolerance(epsilon)?)
        .verify_consistency(source)
}

/// Check that the inverse of `transform` recovers the given points,
/// using an absolute tolerance.
pub fn verify_inversion<T: MathTransform + ?Sized>(
    transform: &T,
    coordinates: &[f64],
    epsilon: f64,
) -> Result<()> {
    TransformVerifier::new(transform)
        .with_tolerance(absolute_tolerance(epsilon)?)
        .verify_inverse(coordinates)
}

/// Single-precision equivalent of [verify_inversion].
pub fn verify_inversion_f32<T: MathTransform + ?Sized>(
    transform: &T,
    coordinates: &[f32],
    epsilon: f64,
) -> Result<()> {
    TransformVerifier::new(transform)
        .with_tolerance(absolute_tolerance(epsilon)?)
        .verify_inverse_f32(coordinates)
}
