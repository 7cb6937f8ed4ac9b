use std::{collections::BTreeSet, sync::Arc};

use smallvec::ToSmallVec;

use crate::{Matrix, MathTransform, ShortVec};

/// Permute axes of the input point.
///
/// For an input point `p` and map axis vector `m`,
/// index `i` in the output point is given by `p[m[i]]`.
#[derive(Debug, Clone)]
pub struct MapAxis(ShortVec<usize>);

impl MapAxis {
    /// For an input point `p` and map axis vector `m`,
    /// index `i` in the output point is given by `p[m[i]]`.
    pub fn try_new(map: &[usize]) -> Result<Self, String> {
        let visited: BTreeSet<_> = map.iter().collect();
        if visited.len() != map.len() {
            return Err(
                "MapAxis: multiple input dimensions map to the same output dimension".into(),
            );
        }
        if visited.last().is_some_and(|mx| **mx != map.len() - 1) {
            return Err("MapAxis: not all output dimensions are addressed".into());
        }

        Ok(Self(map.to_smallvec()))
    }
}

impl MathTransform for MapAxis {
    fn source_ndim(&self) -> usize {
        self.0.len()
    }

    fn target_ndim(&self) -> usize {
        self.0.len()
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        for (o, m) in buf.iter_mut().zip(self.0.iter()) {
            *o = pt[*m]
        }
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        let mut inv_map = smallvec::smallvec![0; self.0.len()];
        for (out_idx, in_idx) in self.0.iter().enumerate() {
            inv_map[*in_idx] = out_idx;
        }
        Some(Arc::new(MapAxis(inv_map)))
    }

    fn derivative(&self, _pt: &[f64]) -> Option<Matrix> {
        let mut out = Matrix::zeros(self.0.len(), self.0.len());
        for (out_idx, in_idx) in self.0.iter().enumerate() {
            out[(out_idx, *in_idx)] = 1.0;
        }
        Some(out)
    }
}
