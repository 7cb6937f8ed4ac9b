use std::sync::Arc;

use smallvec::{ToSmallVec, smallvec};

use crate::{Matrix, MathTransform, ShortVec};

/// Apply a sequence of transforms in order.
#[derive(Debug, Clone)]
pub struct Sequence {
    transforms: Vec<Arc<dyn MathTransform>>,
    source_ndim: usize,
    target_ndim: usize,
    max_inner_ndim: usize,
}

impl Sequence {
    fn try_new(transforms: Vec<Arc<dyn MathTransform>>) -> Result<Self, String> {
        if transforms.len() < 2 {
            return Err("Sequence must have >= 2 transformations".into());
        }
        for (prev, next) in transforms.iter().zip(transforms.iter().skip(1)) {
            if prev.target_ndim() != next.source_ndim() {
                return Err(
                    "Sequence: transformation source dimensionality does not match previous target dimensionality".into(),
                );
            }
        }
        let max_inner_ndim = transforms
            .iter()
            .skip(1)
            .map(|t| t.source_ndim())
            .max()
            .unwrap_or(0);
        let source_ndim = transforms[0].source_ndim();
        let target_ndim = transforms[transforms.len() - 1].target_ndim();
        Ok(Self {
            transforms,
            source_ndim,
            target_ndim,
            max_inner_ndim,
        })
    }

    pub fn builder() -> SequenceBuilder {
        SequenceBuilder(vec![])
    }

    fn transform_into_inner(
        &self,
        pt: &[f64],
        out_buf: &mut [f64],
        mut buf0: ShortVec<f64>,
        mut buf1: ShortVec<f64>,
    ) -> (ShortVec<f64>, ShortVec<f64>) {
        let last_idx = self.transforms.len() - 1;
        for (idx, t) in self.transforms.iter().enumerate() {
            let source_ndim = t.source_ndim();
            let target_ndim = t.target_ndim();

            if idx == 0 {
                t.transform_into(pt, &mut buf1[..target_ndim]);
            } else if idx == last_idx {
                t.transform_into(&buf0[..source_ndim], out_buf);
            } else {
                t.transform_into(&buf0[..source_ndim], &mut buf1[..target_ndim]);
            }
            (buf0, buf1) = (buf1, buf0);
        }
        (buf0, buf1)
    }
}

impl MathTransform for Sequence {
    fn source_ndim(&self) -> usize {
        self.source_ndim
    }

    fn target_ndim(&self) -> usize {
        self.target_ndim
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        self.transform_into_inner(
            pt,
            buf,
            smallvec![f64::NAN; self.max_inner_ndim],
            smallvec![f64::NAN; self.max_inner_ndim],
        );
    }

    fn transform_f64(&self, src: &[f64], dst: &mut [f64], n_pts: usize) {
        let mut buf0: ShortVec<f64> = smallvec![f64::NAN; self.max_inner_ndim];
        let mut buf1: ShortVec<f64> = smallvec![f64::NAN; self.max_inner_ndim];

        for (pt, buf) in src
            .chunks_exact(self.source_ndim)
            .zip(dst.chunks_exact_mut(self.target_ndim))
            .take(n_pts)
        {
            (buf0, buf1) = self.transform_into_inner(pt, buf, buf0, buf1);
        }
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        let mut inv_transforms = Vec::with_capacity(self.transforms.len());
        for t in self.transforms.iter().rev() {
            inv_transforms.push(t.invert()?);
        }
        Some(Arc::new(Sequence::try_new(inv_transforms).ok()?))
    }

    /// Chain rule: the product of each step's derivative,
    /// evaluated at that step's source point.
    fn derivative(&self, pt: &[f64]) -> Option<Matrix> {
        let mut current: ShortVec<f64> = pt.to_smallvec();
        let mut next: ShortVec<f64> = ShortVec::new();
        let mut out: Option<Matrix> = None;
        for t in self.transforms.iter() {
            let step = t.derivative(&current)?;
            out = Some(match out {
                None => step,
                Some(prev) => step.try_mul(&prev).ok()?,
            });
            next.clear();
            next.resize(t.target_ndim(), f64::NAN);
            t.transform_into(&current, &mut next);
            std::mem::swap(&mut current, &mut next);
        }
        out
    }
}

#[derive(Debug, Default)]
pub struct SequenceBuilder(Vec<Arc<dyn MathTransform>>);

impl SequenceBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn add_arc(&mut self, t: Arc<dyn MathTransform>) -> Result<&mut Self, String> {
        if let Some(last_ndim) = self.0.last().map(|prev| prev.target_ndim()) {
            if t.source_ndim() != last_ndim {
                return Err("New transformation source dimensionality does not match previous target dimensionality".into());
            }
        }
        self.0.push(t);
        Ok(self)
    }

    pub fn add_transform<T: MathTransform + 'static>(&mut self, t: T) -> Result<&mut Self, String> {
        self.add_arc(Arc::new(t))
    }

    pub fn build(self) -> Result<Sequence, String> {
        Sequence::try_new(self.0)
    }
}
