use smallvec::SmallVec;
#[cfg(test)]
mod tests;

pub mod transforms;
pub use transforms::{
    Affine, Bijection, Identity, MapAxis, Scale, Sequence, SequenceBuilder, Translate,
};

mod traits;
pub use traits::MathTransform;
mod matrix;
pub use matrix::{Matrix, MatrixBuilder};

mod capabilities;
pub use capabilities::Capabilities;
mod tolerance;
pub use tolerance::{ComparisonMode, PerMode, Relative, Tolerance};
mod compare;
pub use compare::{CoordinateComparison, Ordinate, assert_matrix_equals, ordinates_equal};
mod error;
pub use error::{DerivativeFailure, Result, TransformFailure, VerifyError};
mod domain;
pub use domain::grid_points;
mod verifier;
pub use verifier::{
    POINTS_OFFSET, TransformVerifier, verify_consistency, verify_inversion, verify_inversion_f32,
};

pub const COORD_SIZE: usize = 6;

/// A short vector type alias for convenience,
/// used for per-point scratch buffers.
type ShortVec<T> = SmallVec<[T; COORD_SIZE]>;

/// Apply an ordinate-wise function to `n_pts` points of `ndim` ordinates,
/// reading from `src_offset` and writing to `dst_offset` in the same buffer.
///
/// The function receives the ordinate index within its point and the source value.
/// The iteration direction is chosen so that no source value is overwritten before it is read.
pub(crate) fn map_within<T: Copy>(
    buf: &mut [T],
    ndim: usize,
    src_offset: usize,
    dst_offset: usize,
    n_pts: usize,
    f: impl Fn(usize, T) -> T,
) {
    let len = n_pts * ndim;
    if dst_offset <= src_offset {
        for i in 0..len {
            buf[dst_offset + i] = f(i % ndim, buf[src_offset + i]);
        }
    } else {
        for i in (0..len).rev() {
            buf[dst_offset + i] = f(i % ndim, buf[src_offset + i]);
        }
    }
}
