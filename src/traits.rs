use std::sync::Arc;

use smallvec::smallvec;

use crate::{Matrix, ShortVec};

/// A mathematical mapping from `source_ndim`-dimensional coordinates
/// to `target_ndim`-dimensional coordinates.
///
/// Only [MathTransform::transform_into] is mandatory.
/// The batch methods work on points packed in flat, interleaved buffers
/// (`[x0, y0, x1, y1, ...]`); their trait default implementations simply
/// call [MathTransform::transform_into] in turn, and specific transforms may override them.
///
/// Implementations may not perform any bounds checks on the input,
/// and may panic if buffers of incorrect length are given.
pub trait MathTransform: std::fmt::Debug + Send + Sync {
    fn source_ndim(&self) -> usize;

    fn target_ndim(&self) -> usize;

    /// Transform a single point from the source space to the target space.
    /// Writes to a pre-allocated output buffer of length [MathTransform::target_ndim].
    fn transform_into(&self, pt: &[f64], buf: &mut [f64]);

    /// Transform the first `n_pts` points of `src` into `dst`.
    fn transform_f64(&self, src: &[f64], dst: &mut [f64], n_pts: usize) {
        let src_ndim = self.source_ndim();
        let tgt_ndim = self.target_ndim();
        for (pt, buf) in src
            .chunks_exact(src_ndim)
            .zip(dst.chunks_exact_mut(tgt_ndim))
            .take(n_pts)
        {
            self.transform_into(pt, buf);
        }
    }

    /// Single-precision equivalent of [MathTransform::transform_f64].
    fn transform_f32(&self, src: &[f32], dst: &mut [f32], n_pts: usize) {
        let src_ndim = self.source_ndim();
        let tgt_ndim = self.target_ndim();
        let mut in_pt: ShortVec<f64> = smallvec![f64::NAN; src_ndim];
        let mut out_pt: ShortVec<f64> = smallvec![f64::NAN; tgt_ndim];
        for (pt, buf) in src
            .chunks_exact(src_ndim)
            .zip(dst.chunks_exact_mut(tgt_ndim))
            .take(n_pts)
        {
            for (i, p) in in_pt.iter_mut().zip(pt.iter()) {
                *i = f64::from(*p);
            }
            self.transform_into(&in_pt, &mut out_pt);
            for (b, o) in buf.iter_mut().zip(out_pt.iter()) {
                *b = *o as f32;
            }
        }
    }

    /// Transform double-precision points into a single-precision buffer.
    fn transform_f64_to_f32(&self, src: &[f64], dst: &mut [f32], n_pts: usize) {
        let tgt_ndim = self.target_ndim();
        let mut out_pt: ShortVec<f64> = smallvec![f64::NAN; tgt_ndim];
        for (pt, buf) in src
            .chunks_exact(self.source_ndim())
            .zip(dst.chunks_exact_mut(tgt_ndim))
            .take(n_pts)
        {
            self.transform_into(pt, &mut out_pt);
            for (b, o) in buf.iter_mut().zip(out_pt.iter()) {
                *b = *o as f32;
            }
        }
    }

    /// Transform single-precision points into a double-precision buffer.
    fn transform_f32_to_f64(&self, src: &[f32], dst: &mut [f64], n_pts: usize) {
        let src_ndim = self.source_ndim();
        let mut in_pt: ShortVec<f64> = smallvec![f64::NAN; src_ndim];
        for (pt, buf) in src
            .chunks_exact(src_ndim)
            .zip(dst.chunks_exact_mut(self.target_ndim()))
            .take(n_pts)
        {
            for (i, p) in in_pt.iter_mut().zip(pt.iter()) {
                *i = f64::from(*p);
            }
            self.transform_into(&in_pt, buf);
        }
    }

    /// Transform `n_pts` points starting at `src_offset` in `buf`,
    /// writing the results starting at `dst_offset` in the same buffer.
    /// The source and destination regions may overlap.
    ///
    /// The trait default implementation copies the source region before transforming it;
    /// transforms which can work in place should override it.
    fn transform_within_f64(
        &self,
        buf: &mut [f64],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        let src_end = src_offset + n_pts * self.source_ndim();
        let src = buf[src_offset..src_end].to_vec();
        self.transform_f64(&src, &mut buf[dst_offset..], n_pts);
    }

    /// Single-precision equivalent of [MathTransform::transform_within_f64].
    fn transform_within_f32(
        &self,
        buf: &mut [f32],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        let src_end = src_offset + n_pts * self.source_ndim();
        let src = buf[src_offset..src_end].to_vec();
        self.transform_f32(&src, &mut buf[dst_offset..], n_pts);
    }

    /// Return the inverse transformation, if it exists.
    fn invert(&self) -> Option<Arc<dyn MathTransform>>;

    /// The Jacobian matrix at the given source point,
    /// with [MathTransform::target_ndim] rows and [MathTransform::source_ndim] columns.
    ///
    /// By default, derivatives are not supported.
    fn derivative(&self, _pt: &[f64]) -> Option<Matrix> {
        None
    }
}
