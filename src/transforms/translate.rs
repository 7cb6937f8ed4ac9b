use std::sync::Arc;

use smallvec::ToSmallVec;

use crate::{Matrix, MathTransform, ShortVec, map_within};

/// Translate each coordinate by adding a constant value.
#[derive(Debug, Clone)]
pub struct Translate(ShortVec<f64>);

impl Translate {
    pub fn try_new(translate: &[f64]) -> Result<Self, String> {
        for t in translate.iter() {
            if t.is_nan() {
                return Err("Translation is NaN".into());
            }
            if t.is_infinite() {
                return Err("Translation is infinite".into());
            }
        }
        Ok(Self(translate.to_smallvec()))
    }
}

impl MathTransform for Translate {
    fn source_ndim(&self) -> usize {
        self.0.len()
    }

    fn target_ndim(&self) -> usize {
        self.0.len()
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        for ((o, p), t) in buf.iter_mut().zip(pt.iter()).zip(self.0.iter()) {
            *o = t + p;
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
            self.0[dim] + v
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
            (self.0[dim] + f64::from(v)) as f32
        });
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        Some(Arc::new(Translate(self.0.iter().map(|t| -t).collect())))
    }

    fn derivative(&self, _pt: &[f64]) -> Option<Matrix> {
        Some(Matrix::identity(self.0.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::Translate;
    use crate::tests::{
        check_consistency, check_derivative, check_in_domain, check_inverse,
    };

    fn make_transform() -> Translate {
        Translate::try_new(&[1.0, 0.5, 2.0]).unwrap()
    }

    #[test]
    fn test_consistency() {
        check_consistency(make_transform());
    }

    #[test]
    fn test_inverse() {
        check_inverse(make_transform());
    }

    #[test]
    fn test_derivative() {
        check_derivative(make_transform());
    }

    #[test]
    fn test_in_domain() {
        check_in_domain(make_transform());
    }
}
