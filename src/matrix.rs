use std::{
    fmt,
    ops::{Index, IndexMut},
};

use crate::ShortVec;

/// Dense matrix, used for Jacobians and the linear part of affine transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    /// Row-major / C-ordered matrix data.
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        self.get(index.0, index.1)
            .expect("index should be in bounds")
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        assert!(index.0 < self.nrows && index.1 < self.ncols, "index should be in bounds");
        &mut self.data[index.0 * self.ncols + index.1]
    }
}

impl Matrix {
    pub fn builder(row_vecs: bool) -> MatrixBuilder {
        MatrixBuilder::new(row_vecs)
    }

    /// Row-major/ C order data
    pub fn try_new(data: Vec<f64>, ncols: usize) -> Result<Self, String> {
        if ncols == 0 {
            return Err("Matrix must have at least one column".to_string());
        }
        if data.len() % ncols != 0 {
            return Err(format!(
                "Matrix data length {} is not divisible by ncols {}",
                data.len(),
                ncols
            ));
        }
        let nrows = data.len() / ncols;
        Ok(Self { data, nrows, ncols })
    }

    /// Column-major/ Fortran order data
    pub fn try_new_colmaj(data: Vec<f64>, nrows: usize) -> Result<Self, String> {
        if nrows == 0 {
            return Err("Matrix must have at least one row".to_string());
        }
        if data.len() % nrows != 0 {
            return Err(format!(
                "Matrix data length {} is not divisible by nrows {}",
                data.len(),
                nrows
            ));
        }
        let ncols = data.len() / nrows;
        let mut rowmaj = vec![0.0; data.len()];
        for (f_idx, val) in data.into_iter().enumerate() {
            let r = f_idx % nrows;
            let c = f_idx / nrows;
            rowmaj[r * ncols + c] = val;
        }
        Ok(Self {
            data: rowmaj,
            nrows,
            ncols,
        })
    }

    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    pub fn identity(ndim: usize) -> Self {
        let mut out = Self::zeros(ndim, ndim);
        for i in 0..ndim {
            out[(i, i)] = 1.0;
        }
        out
    }

    /// A square matrix with the given values on the diagonal.
    pub fn diagonal(values: &[f64]) -> Self {
        let mut out = Self::zeros(values.len(), values.len());
        for (i, v) in values.iter().enumerate() {
            out[(i, i)] = *v;
        }
        out
    }

    pub fn matmul(&self, coord: &[f64]) -> ShortVec<f64> {
        let mut result = smallvec::smallvec![f64::NAN; self.nrows];
        self.matmul_into(coord, &mut result);
        result
    }

    pub fn matmul_into(&self, coord: &[f64], buf: &mut [f64]) {
        buf.fill(0.0);
        for (idx, d) in self.data.iter().enumerate() {
            let r = idx / self.ncols;
            let c = idx % self.ncols;
            buf[r] += d * coord[c];
        }
    }

    /// Matrix product `self * other`.
    pub fn try_mul(&self, other: &Matrix) -> Result<Matrix, String> {
        if self.ncols != other.nrows {
            return Err(format!(
                "Matrix: cannot multiply {}x{} by {}x{}",
                self.nrows, self.ncols, other.nrows, other.ncols
            ));
        }
        let mut out = Matrix::zeros(self.nrows, other.ncols);
        for r in 0..self.nrows {
            for k in 0..self.ncols {
                let a = self[(r, k)];
                for c in 0..other.ncols {
                    out[(r, c)] += a * other[(k, c)];
                }
            }
        }
        Ok(out)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&f64> {
        if row >= self.nrows || col >= self.ncols {
            return None;
        }
        self.data.get(row * self.ncols + col)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }


    fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.ncols;
        &mut self.data[start..start + self.ncols]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.ncols {
            self.data.swap(a * self.ncols + c, b * self.ncols + c);
        }
    }

    /// Index of the row at or below `from` with the largest absolute value in `col`.
    fn pivot_row(&self, col: usize, from: usize) -> usize {
        (from..self.nrows)
            .max_by(|&a, &b| self[(a, col)].abs().total_cmp(&self[(b, col)].abs()))
            .unwrap_or(from)
    }


    /// Inverse by Gauss-Jordan elimination with partial pivoting.
    pub fn inverse(&self) -> Result<Matrix, String> {
        if !self.is_square() {
            return Err("Matrix: inverse only defined for square matrices".to_string());
        }
        let n = self.nrows;
        let mut work = self.clone();
        let mut inv = Matrix::identity(n);
        for col in 0..n {
            let pivot = work.pivot_row(col, col);
            let p = work[(pivot, col)];
            if p == 0.0 || !p.is_finite() {
                return Err("Matrix: singular matrix cannot be inverted".to_string());
            }
            work.swap_rows(pivot, col);
            inv.swap_rows(pivot, col);

            work.row_mut(col).iter_mut().for_each(|v| *v /= p);
            inv.row_mut(col).iter_mut().for_each(|v| *v /= p);

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = work[(r, col)];
                if factor == 0.0 {
                    continue;
                }
                for c in 0..n {
                    let w = work[(col, c)];
                    work[(r, c)] -= factor * w;
                    let i = inv[(col, c)];
                    inv[(r, c)] -= factor * i;
                }
            }
        }
        Ok(inv)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.nrows {
            if r != 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for c in 0..self.ncols {
                if c != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self[(r, c)])?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    row_vecs: bool,
    dim_len: Option<usize>,
    data: Vec<f64>,
}

impl MatrixBuilder {
    fn new(row_vecs: bool) -> Self {
        Self {
            row_vecs,
            dim_len: None,
            data: Default::default(),
        }
    }

    pub fn add_vec(&mut self, vec: &[f64]) -> Result<&mut Self, String> {
        if let Some(len) = self.dim_len {
            if len != vec.len() {
                return Err(format!(
                    "MatrixBuilder: inconsistent vector length {}, expected {}",
                    vec.len(),
                    len
                ));
            }
        } else {
            self.dim_len = Some(vec.len());
        }
        self.data.extend_from_slice(vec);
        Ok(self)
    }

    pub fn build(self) -> Result<Matrix, String> {
        let Some(dim_len) = self.dim_len else {
            return Err("MatrixBuilder: no vectors added".to_string());
        };
        if self.row_vecs {
            Matrix::try_new(self.data, dim_len)
        } else {
            Matrix::try_new_colmaj(self.data, dim_len)
        }
    }
}
