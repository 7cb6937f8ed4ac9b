use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::hint::black_box;
use transform_conformance::{
    Affine, Identity, MapAxis, MathTransform, Matrix, Scale, Sequence, TransformVerifier,
    Translate,
};

fn coords(npoints: usize, ndim: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(1991);
    let mut pts = Vec::with_capacity(npoints * ndim);
    for _ in 0..npoints * ndim {
        pts.push(rng.random::<f32>() * 100.0);
    }
    pts
}

fn affine_matrix() -> Matrix {
    let mut builder = Matrix::builder(true);
    builder
        .add_vec(&[2.0, 0.5, 0.0, 20.0])
        .and_then(|b| b.add_vec(&[0.0, 1.0, -0.25, -3.0]))
        .and_then(|b| b.add_vec(&[0.125, 0.0, 4.0, 2.5]))
        .unwrap();
    builder.build().unwrap()
}

fn bench_verify<T: MathTransform>(c: &mut Criterion, name: &str, t: &T) {
    let coords = coords(1000, 3);
    let verifier = TransformVerifier::new(t).with_tolerance(1e-10);
    c.bench_function(&format!("{name}_consistency"), |b| {
        b.iter(|| black_box(verifier.verify_consistency(&coords).unwrap()))
    });
    let doubles: Vec<f64> = coords.iter().map(|c| f64::from(*c)).collect();
    c.bench_function(&format!("{name}_inverse"), |b| {
        b.iter(|| verifier.verify_inverse(black_box(&doubles)).unwrap())
    });
}

fn identity(c: &mut Criterion) {
    bench_verify(c, "identity", &Identity::new(3));
}

fn scale(c: &mut Criterion) {
    bench_verify(c, "scale", &Scale::try_new(&[2.0, 3.0, 4.0]).unwrap());
}

fn translate(c: &mut Criterion) {
    bench_verify(c, "translate", &Translate::try_new(&[2.0, 3.0, 4.0]).unwrap());
}

fn map_axis(c: &mut Criterion) {
    bench_verify(c, "map_axis", &MapAxis::try_new(&[2, 1, 0]).unwrap());
}

fn affine(c: &mut Criterion) {
    let affine = Affine::try_from_translated(&affine_matrix()).unwrap();
    bench_verify(c, "affine", &affine);
}

fn sequence(c: &mut Criterion) {
    let mut builder = Sequence::builder();
    builder
        .add_transform(Scale::try_new(&[2.0, 3.0, 4.0]).unwrap())
        .and_then(|b| b.add_transform(Translate::try_new(&[2.0, 3.0, 4.0]).unwrap()))
        .and_then(|b| b.add_transform(MapAxis::try_new(&[2, 1, 0]).unwrap()))
        .unwrap();
    bench_verify(c, "sequence", &builder.build().unwrap());
}

criterion_group!(
    benches, identity, scale, translate, map_axis, affine, sequence
);
criterion_main!(benches);
