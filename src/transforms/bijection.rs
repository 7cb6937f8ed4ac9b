use std::sync::Arc;

use crate::{Matrix, MathTransform};

/// A transform with an explicitly given inverse.
///
/// Every operation delegates to `forward`; inverting swaps the two.
#[derive(Debug, Clone)]
pub struct Bijection {
    forward: Arc<dyn MathTransform>,
    reverse: Arc<dyn MathTransform>,
}

impl Bijection {
    pub fn try_new_arc(
        forward: Arc<dyn MathTransform>,
        reverse: Arc<dyn MathTransform>,
    ) -> Result<Self, String> {
        if forward.source_ndim() != reverse.target_ndim()
            || reverse.source_ndim() != forward.target_ndim()
        {
            return Err(
                "Forward and reverse transforms do not match source/ target dimensionality".into(),
            );
        }
        Ok(Self { forward, reverse })
    }

    pub fn try_new<T1: MathTransform + 'static, T2: MathTransform + 'static>(
        forward: T1,
        reverse: T2,
    ) -> Result<Self, String> {
        Self::try_new_arc(Arc::new(forward), Arc::new(reverse))
    }
}

impl MathTransform for Bijection {
    fn source_ndim(&self) -> usize {
        self.forward.source_ndim()
    }

    fn target_ndim(&self) -> usize {
        self.forward.target_ndim()
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        self.forward.transform_into(pt, buf);
    }

    fn transform_f64(&self, src: &[f64], dst: &mut [f64], n_pts: usize) {
        self.forward.transform_f64(src, dst, n_pts);
    }

    fn transform_f32(&self, src: &[f32], dst: &mut [f32], n_pts: usize) {
        self.forward.transform_f32(src, dst, n_pts);
    }

    fn transform_f64_to_f32(&self, src: &[f64], dst: &mut [f32], n_pts: usize) {
        self.forward.transform_f64_to_f32(src, dst, n_pts);
    }

    fn transform_f32_to_f64(&self, src: &[f32], dst: &mut [f64], n_pts: usize) {
        self.forward.transform_f32_to_f64(src, dst, n_pts);
    }

    fn transform_within_f64(
        &self,
        buf: &mut [f64],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        self.forward
            .transform_within_f64(buf, src_offset, dst_offset, n_pts);
    }

    fn transform_within_f32(
        &self,
        buf: &mut [f32],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        self.forward
            .transform_within_f32(buf, src_offset, dst_offset, n_pts);
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        Some(Arc::new(Self {
            forward: self.reverse.clone(),
            reverse: self.forward.clone(),
        }))
    }

    fn derivative(&self, pt: &[f64]) -> Option<Matrix> {
        self.forward.derivative(pt)
    }
}
