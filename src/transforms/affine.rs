use std::sync::Arc;

use smallvec::ToSmallVec;

use crate::{Matrix, MathTransform, ShortVec};

#[derive(Debug, Clone)]
pub struct Affine {
    /// For a transform from N to M dimensions,
    /// this has M rows and N columns
    unaugmented: Matrix,
    translation: ShortVec<f64>,
}

impl Affine {
    pub fn try_new(unaugmented: Matrix, translation: &[f64]) -> Result<Self, String> {
        if unaugmented.nrows() != translation.len() {
            return Err(
                "Affine: dimension mismatch between unaugmented matrix and translation vector"
                    .to_string(),
            );
        }
        Ok(Self {
            unaugmented,
            translation: translation.to_smallvec(),
        })
    }

    /// Create an Affine transform from an augmented matrix,
    /// i.e. which includes the translation as the last column
    /// and a bottom row of [0, 0, ..., 1].
    pub fn try_from_augmented(augmented: &Matrix) -> Result<Self, String> {
        if augmented.nrows() < 2 || augmented.ncols() < 2 {
            return Err("Affine: augmented matrix must be at least 2x2".to_string());
        }
        let last_row = augmented.nrows() - 1;
        let last_col = augmented.ncols() - 1;
        for c in 0..=last_col {
            let expected = if c == last_col { 1.0 } else { 0.0 };
            if augmented[(last_row, c)] != expected {
                return Err("Affine: augmented matrix must have a bottom row of [0, ..., 0, 1]".to_string());
            }
        }
        Self::split_translation(augmented, last_row)
    }

    /// Create an Affine transform from a matrix which includes the translation as the last column,
    /// but does not have the augmented matrix's bottom row of [0, 0, ..., 1].
    pub fn try_from_translated(translated: &Matrix) -> Result<Self, String> {
        if translated.ncols() < 2 {
            return Err("Affine: translated matrix must have at least 2 columns".to_string());
        }
        Self::split_translation(translated, translated.nrows())
    }

    fn split_translation(matrix: &Matrix, nrows: usize) -> Result<Self, String> {
        let ncols = matrix.ncols() - 1;

        let mut unaugmented_data = Vec::with_capacity(nrows * ncols);
        let mut translation = ShortVec::with_capacity(nrows);

        for r in 0..nrows {
            for c in 0..ncols {
                unaugmented_data.push(matrix[(r, c)]);
            }
            translation.push(matrix[(r, ncols)]);
        }

        let unaugmented = Matrix::try_new(unaugmented_data, ncols)?;

        Ok(Self {
            unaugmented,
            translation,
        })
    }

    pub fn matrix(&self) -> &Matrix {
        &self.unaugmented
    }

    pub fn translation(&self) -> &[f64] {
        &self.translation
    }
}

impl MathTransform for Affine {
    fn source_ndim(&self) -> usize {
        self.unaugmented.ncols()
    }

    fn target_ndim(&self) -> usize {
        self.unaugmented.nrows()
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        self.unaugmented.matmul_into(pt, buf);
        for (o, t) in buf.iter_mut().zip(self.translation.iter()) {
            *o += t;
        }
    }

    /// Only square, non-singular affine transforms are invertible.
    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        let inverse = self.unaugmented.inverse().ok()?;
        let translation = inverse
            .matmul(&self.translation)
            .iter()
            .map(|t| -t)
            .collect();
        Some(Arc::new(Self {
            unaugmented: inverse,
            translation,
        }))
    }

    fn derivative(&self, _pt: &[f64]) -> Option<Matrix> {
        Some(self.unaugmented.clone())
    }
}
