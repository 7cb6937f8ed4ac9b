use std::sync::Arc;

use crate::{Matrix, MathTransform};

/// A no-op transform which returns the input point as the output point.
///
/// Defined for one dimensionality.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity(usize);

impl Identity {
    pub fn new(ndim: usize) -> Self {
        Self(ndim)
    }
}

impl MathTransform for Identity {
    fn source_ndim(&self) -> usize {
        self.0
    }

    fn target_ndim(&self) -> usize {
        self.0
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        buf.copy_from_slice(pt);
    }

    fn transform_within_f64(
        &self,
        buf: &mut [f64],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        let len = n_pts * self.0;
        buf.copy_within(src_offset..src_offset + len, dst_offset);
    }

    fn transform_within_f32(
        &self,
        buf: &mut [f32],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        let len = n_pts * self.0;
        buf.copy_within(src_offset..src_offset + len, dst_offset);
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        Some(Arc::new(*self))
    }

    fn derivative(&self, _pt: &[f64]) -> Option<Matrix> {
        Some(Matrix::identity(self.0))
    }
}
