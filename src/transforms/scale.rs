use std::sync::Arc;

use smallvec::ToSmallVec;

use crate::{Matrix, MathTransform, ShortVec, map_within};

/// Multiply each coordinate value by a constant factor.
#[derive(Debug, Clone, PartialEq)]
pub struct Scale(ShortVec<f64>);

impl Scale {
    pub fn try_new(scale: &[f64]) -> Result<Self, String> {
        for s in scale.iter() {
            if s.is_subnormal() {
                return Err("Scale is subnormal".into());
            }
            if s.is_nan() {
                return Err("Scale is NaN".into());
            }
            if s.is_infinite() {
                return Err("Scale is infinite".into());
            }
            if *s == 0.0 {
                return Err("Scale is zero".into());
            }
        }
        Ok(Self(scale.to_smallvec()))
    }

    pub fn factors(&self) -> &[f64] {
        &self.0
    }
}

impl MathTransform for Scale {
    fn source_ndim(&self) -> usize {
        self.0.len()
    }

    fn target_ndim(&self) -> usize {
        self.0.len()
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        for ((o, p), s) in buf.iter_mut().zip(pt.iter()).zip(self.0.iter()) {
            *o = s * p;
        }
    }

    fn transform_within_f64(
        &self,
        buf: &mut [f64],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        map_within(buf, self.0.len(), src_offset, dst_offset, n_pts, |dim, v| {
            self.0[dim] * v
        });
    }

    fn transform_within_f32(
        &self,
        buf: &mut [f32],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        map_within(buf, self.0.len(), src_offset, dst_offset, n_pts, |dim, v| {
            (self.0[dim] * f64::from(v)) as f32
        });
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        Some(Arc::new(Scale(self.0.iter().map(|s| 1.0 / s).collect())))
    }

    fn derivative(&self, _pt: &[f64]) -> Option<Matrix> {
        Some(Matrix::diagonal(&self.0))
    }
}
