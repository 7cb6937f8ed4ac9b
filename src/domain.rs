use rand::{Rng, RngCore};

use crate::{Result, VerifyError};

/// Generate packed single-precision points on a regular grid.
///
/// Dimension `i` is split into `num[i]` cells of equal width between `min[i]` and `max[i]`,
/// and points are placed at the cell centres; the first dimension varies fastest.
/// If a random number generator is given, every ordinate is displaced by up to half a cell
/// and the points are shuffled.
pub fn grid_points(
    min: &[f64],
    max: &[f64],
    num: &[usize],
    mut rng: Option<&mut dyn RngCore>,
) -> Result<Vec<f32>> {
    let dimension = min.len();
    if dimension == 0 {
        return Err(VerifyError::Structural(
            "Grid must have at least one dimension".into(),
        ));
    }
    if max.len() != dimension {
        return Err(VerifyError::DimensionMismatch {
            what: "grid maximum ordinates",
            expected: dimension,
            actual: max.len(),
        });
    }
    if num.len() != dimension {
        return Err(VerifyError::DimensionMismatch {
            what: "grid number of ordinates",
            expected: dimension,
            actual: num.len(),
        });
    }
    let n_points = num
        .iter()
        .try_fold(1usize, |acc, n| acc.checked_mul(*n))
        .ok_or_else(|| VerifyError::Structural("Grid has too many points".into()))?;
    let n_ordinates = n_points
        .checked_mul(dimension)
        .ok_or_else(|| VerifyError::Structural("Grid has too many points".into()))?;

    let mut coords = vec![0.0f32; n_ordinates];
    let mut step = 1;
    for dim in 0..dimension {
        let n = num[dim];
        let delta = (max[dim] - min[dim]) / n as f64;
        let start = min[dim] + delta / 2.0;
        for (pt_idx, pt) in coords.chunks_exact_mut(dimension).enumerate() {
            let ordinate_idx = (pt_idx / step) % n;
            let mut ordinate = (ordinate_idx as f64 * delta + start) as f32;
            if let Some(r) = rng.as_deref_mut() {
                ordinate += (r.random::<f32>() - 0.5) * delta as f32;
            }
            pt[dim] = ordinate;
        }
        step *= n.max(1);
    }

    if let Some(r) = rng {
        for i in (0..n_points).rev() {
            let t = r.random_range(0..n_points);
            swap_points(&mut coords, dimension, i, t);
        }
    }
    Ok(coords)
}

fn swap_points(coords: &mut [f32], dimension: usize, a: usize, b: usize) {
    if a == b {
        return;
    }
    for k in 0..dimension {
        coords.swap(a * dimension + k, b * dimension + k);
    }
}

#[cfg(test)]
mod tests {
    use super::grid_points;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn regular_grid() {
        let pts = grid_points(&[0.0, 10.0], &[4.0, 20.0], &[2, 2], None).unwrap();
        #[rustfmt::skip]
        let expected = vec![
            1.0, 12.5,
            3.0, 12.5,
            1.0, 17.5,
            3.0, 17.5,
        ];
        assert_eq!(pts, expected);
    }

    #[test]
    fn jittered_grid_stays_in_domain() {
        let mut rng = StdRng::seed_from_u64(1991);
        let pts = grid_points(&[-10.0, 0.0], &[10.0, 5.0], &[5, 3], Some(&mut rng)).unwrap();
        assert_eq!(pts.len(), 30);
        for pt in pts.chunks_exact(2) {
            assert!((-10.0..=10.0).contains(&pt[0]));
            assert!((0.0..=5.0).contains(&pt[1]));
        }
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = grid_points(&[0.0, 0.0], &[1.0], &[2, 2], None).unwrap_err();
        assert!(err.is_structural());
        assert!(grid_points(&[], &[], &[], None).is_err());
    }

    #[test]
    fn empty_axis() {
        let pts = grid_points(&[0.0, 0.0], &[1.0, 1.0], &[0, 3], None).unwrap();
        assert!(pts.is_empty());
    }
}
