use std::{
    iter,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Capabilities, Identity, Matrix, MathTransform, PerMode, Scale, TransformVerifier,
};

pub const SMALL_NUMBER: f64 = 1e-10;
pub static COORDS_2D_256: LazyLock<Vec<f32>> = LazyLock::new(|| make_coords(256, 2));
pub static COORDS_3D_256: LazyLock<Vec<f32>> = LazyLock::new(|| make_coords(256, 3));

pub fn init_logger() {
    #[allow(unused_must_use)]
    env_logger::try_init();
}

/// Packed points with every ordinate in [-1000, 1000).
fn make_coords(n_pts: usize, ndim: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(1991);

    iter::repeat_with(|| rng.random::<f32>() * 2000.0 - 1000.0)
        .take(n_pts * ndim)
        .collect()
}

pub fn coords(ndim: usize) -> Vec<f32> {
    match ndim {
        2 => COORDS_2D_256.clone(),
        3 => COORDS_3D_256.clone(),
        _ => make_coords(256, ndim),
    }
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(1991)
}

/// Verifier with tolerances suited to well-conditioned transforms of the test coordinates.
pub fn verifier<T: MathTransform>(t: &T) -> TransformVerifier<'_, T> {
    TransformVerifier::new(t)
        .with_tolerance(PerMode {
            direct: SMALL_NUMBER,
            inverse: 1e-9,
            derivative: 1e-6,
        })
        .with_derivative_deltas(&[1.0])
}

/// Assert that every batch calling convention matches transforming points one by one.
pub fn check_consistency<T: MathTransform>(t: T) {
    init_logger();
    let coords = coords(t.source_ndim());
    let transformed = verifier(&t).verify_consistency(&coords).unwrap();
    assert_eq!(transformed.len(), t.target_ndim() * 256);
}

/// Assert that inverse-transforming transformed points recovers the originals.
pub fn check_inverse<T: MathTransform>(t: T) {
    init_logger();
    let coords = coords(t.source_ndim());
    verifier(&t).verify_inverse_f32(&coords).unwrap();
}

/// Assert that the derivative matches finite differences at a sample of points.
pub fn check_derivative<T: MathTransform>(t: T) {
    init_logger();
    let ndim = t.source_ndim();
    let coords = coords(ndim);
    let v = verifier(&t);
    for pt in coords.chunks_exact(ndim).take(16) {
        let pt: Vec<f64> = pt.iter().map(|c| f64::from(*c)).collect();
        v.verify_derivative(&pt).unwrap();
    }
}

/// Assert that every supported operation passes on a jittered grid.
pub fn check_in_domain<T: MathTransform>(t: T) {
    init_logger();
    let ndim = t.source_ndim();
    let capabilities = Capabilities {
        inverse: t.invert().is_some(),
        ..Default::default()
    };
    let mut rng = rng();
    verifier(&t)
        .with_capabilities(capabilities)
        .verify_in_domain(
            &vec![-1000.0; ndim],
            &vec![1000.0; ndim],
            &vec![4; ndim],
            Some(&mut rng),
        )
        .unwrap();
}

/// The non-overlapping batch calling conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batch {
    DoubleToDouble,
    FloatToFloat,
    DoubleToFloat,
    FloatToDouble,
}

/// How a [FaultyBatchScale] breaks its batch transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Add 500 to the middle ordinate of the output.
    Corrupt,
    /// Leave the destination untouched.
    Unwritten,
}

/// A scale with one broken batch calling convention.
#[derive(Debug)]
pub struct FaultyBatchScale {
    pub scale: Scale,
    pub batch: Batch,
    pub fault: Fault,
}

impl FaultyBatchScale {
    pub fn new(batch: Batch, fault: Fault) -> Self {
        Self {
            scale: Scale::try_new(&[10.0, 100.0]).unwrap(),
            batch,
            fault,
        }
    }

    /// Run the underlying scale's batch transform unless this convention is unwritten,
    /// then corrupt the output if required.
    fn run<T: Copy + std::ops::AddAssign + From<u16>>(
        &self,
        batch: Batch,
        dst: &mut [T],
        n_pts: usize,
        f: impl FnOnce(&mut [T]),
    ) {
        if batch != self.batch {
            f(dst);
            return;
        }
        match self.fault {
            Fault::Unwritten => (),
            Fault::Corrupt => {
                f(dst);
                let middle = n_pts * self.scale.target_ndim() / 2;
                if let Some(v) = dst.get_mut(middle) {
                    *v += T::from(500);
                }
            }
        }
    }
}

impl MathTransform for FaultyBatchScale {
    fn source_ndim(&self) -> usize {
        self.scale.source_ndim()
    }

    fn target_ndim(&self) -> usize {
        self.scale.target_ndim()
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        self.scale.transform_into(pt, buf);
    }

    fn transform_f64(&self, src: &[f64], dst: &mut [f64], n_pts: usize) {
        self.run(Batch::DoubleToDouble, dst, n_pts, |d| {
            self.scale.transform_f64(src, d, n_pts)
        });
    }

    fn transform_f32(&self, src: &[f32], dst: &mut [f32], n_pts: usize) {
        self.run(Batch::FloatToFloat, dst, n_pts, |d| {
            self.scale.transform_f32(src, d, n_pts)
        });
    }

    fn transform_f64_to_f32(&self, src: &[f64], dst: &mut [f32], n_pts: usize) {
        self.run(Batch::DoubleToFloat, dst, n_pts, |d| {
            self.scale.transform_f64_to_f32(src, d, n_pts)
        });
    }

    fn transform_f32_to_f64(&self, src: &[f32], dst: &mut [f64], n_pts: usize) {
        self.run(Batch::FloatToDouble, dst, n_pts, |d| {
            self.scale.transform_f32_to_f64(src, d, n_pts)
        });
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        self.scale.invert()
    }
}

/// A scale which transforms within a buffer front to back,
/// overwriting sources before they are read when the target follows the source.
#[derive(Debug)]
pub struct NaiveInPlaceScale(pub Scale);

impl NaiveInPlaceScale {
    fn apply<T: Copy>(
        &self,
        buf: &mut [T],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
        f: impl Fn(f64, T) -> T,
    ) {
        let factors = self.0.factors();
        let ndim = factors.len();
        for i in 0..n_pts * ndim {
            buf[dst_offset + i] = f(factors[i % ndim], buf[src_offset + i]);
        }
    }
}

impl MathTransform for NaiveInPlaceScale {
    fn source_ndim(&self) -> usize {
        self.0.source_ndim()
    }

    fn target_ndim(&self) -> usize {
        self.0.target_ndim()
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        self.0.transform_into(pt, buf);
    }

    fn transform_within_f64(
        &self,
        buf: &mut [f64],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        self.apply(buf, src_offset, dst_offset, n_pts, |s, v| s * v);
    }

    fn transform_within_f32(
        &self,
        buf: &mut [f32],
        src_offset: usize,
        dst_offset: usize,
        n_pts: usize,
    ) {
        self.apply(buf, src_offset, dst_offset, n_pts, |s, v| {
            (s * f64::from(v)) as f32
        });
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        self.0.invert()
    }
}

/// `(x, y) -> (x^2, xy)`, which has no inverse.
///
/// If `faulty_derivative`, the reported derivative of `x^2` is `x` instead of `2x`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Quadratic {
    pub faulty_derivative: bool,
}

impl MathTransform for Quadratic {
    fn source_ndim(&self) -> usize {
        2
    }

    fn target_ndim(&self) -> usize {
        2
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        buf[0] = pt[0] * pt[0];
        buf[1] = pt[0] * pt[1];
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        None
    }

    fn derivative(&self, pt: &[f64]) -> Option<Matrix> {
        let (x, y) = (pt[0], pt[1]);
        let dx = if self.faulty_derivative { x } else { 2.0 * x };
        Matrix::try_new(vec![dx, 0.0, y, x], 2).ok()
    }
}

/// A 2D identity whose inverse claims to be 3D.
#[derive(Debug, Default)]
pub struct MisdimensionedInverse;

impl MathTransform for MisdimensionedInverse {
    fn source_ndim(&self) -> usize {
        2
    }

    fn target_ndim(&self) -> usize {
        2
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        buf.copy_from_slice(pt);
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        Some(Arc::new(Identity::new(3)))
    }
}

/// A 2D identity which counts how many points it has transformed.
#[derive(Debug, Default)]
pub struct CountingIdentity {
    pub calls: AtomicUsize,
}

impl CountingIdentity {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl MathTransform for CountingIdentity {
    fn source_ndim(&self) -> usize {
        2
    }

    fn target_ndim(&self) -> usize {
        2
    }

    fn transform_into(&self, pt: &[f64], buf: &mut [f64]) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        buf.copy_from_slice(pt);
    }

    fn invert(&self) -> Option<Arc<dyn MathTransform>> {
        Some(Arc::new(Identity::new(2)))
    }
}
