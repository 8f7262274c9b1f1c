use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use modp::harness::{DifferentialHarness, HarnessConfig};
use modp::{Element, Field, FieldElement, KnownPrime, MontgomeryField, ReferenceField};
use num_bigint::{BigInt, BigUint};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::time::Duration;

const BENCH_PRIMES: [KnownPrime; 3] = [KnownPrime::Curve25519, KnownPrime::P384, KnownPrime::P521];

/// Generate a random element from `field_bytes` random bytes
fn random_element<F: Field>(field: &F, field_bytes: usize, rng: &mut ChaCha20Rng) -> Element<F> {
    let mut bytes = vec![0u8; field_bytes];
    rng.fill(&mut bytes[..]);
    field.element(&BigInt::from(BigUint::from_bytes_le(&bytes)))
}

fn bench_field_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("Field Addition");
    group.measurement_time(Duration::from_secs(5));
    let mut rng = ChaCha20Rng::seed_from_u64(1);

    for prime in BENCH_PRIMES {
        let reference = ReferenceField::new(prime.modulus().clone()).unwrap();
        let montgomery = MontgomeryField::new(prime.modulus().clone()).unwrap();
        let (ra, rb) = (
            random_element(&reference, prime.field_bytes(), &mut rng),
            random_element(&reference, prime.field_bytes(), &mut rng),
        );
        let ma = montgomery.element(&BigInt::from(ra.as_big_integer()));
        let mb = montgomery.element(&BigInt::from(rb.as_big_integer()));

        group.bench_with_input(BenchmarkId::new("reference", prime), &(ra, rb), |bench, (a, b)| {
            bench.iter(|| black_box(a.add(b)))
        });
        group.bench_with_input(BenchmarkId::new("montgomery", prime), &(ma, mb), |bench, (a, b)| {
            bench.iter(|| black_box(a.add(b)))
        });
    }

    group.finish();
}

fn bench_field_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("Field Multiplication");
    group.measurement_time(Duration::from_secs(5));
    let mut rng = ChaCha20Rng::seed_from_u64(2);

    for prime in BENCH_PRIMES {
        let reference = ReferenceField::new(prime.modulus().clone()).unwrap();
        let montgomery = MontgomeryField::new(prime.modulus().clone()).unwrap();
        let a = random_element(&reference, prime.field_bytes(), &mut rng);
        let b = random_element(&reference, prime.field_bytes(), &mut rng);
        let ma = montgomery.element(&BigInt::from(a.as_big_integer()));
        let mb = montgomery.element(&BigInt::from(b.as_big_integer()));

        group.bench_function(BenchmarkId::new("reference/multiply", prime), |bench| {
            bench.iter(|| black_box(a.multiply(&b)))
        });
        group.bench_function(BenchmarkId::new("montgomery/multiply", prime), |bench| {
            bench.iter(|| black_box(ma.multiply(&mb)))
        });

        // Squaring should beat general multiplication
        group.bench_function(BenchmarkId::new("reference/square", prime), |bench| {
            bench.iter(|| black_box(a.square()))
        });
        group.bench_function(BenchmarkId::new("montgomery/square", prime), |bench| {
            bench.iter(|| black_box(ma.square()))
        });

        let small = montgomery.small_value(486_662);
        let as_element = montgomery.element(&BigInt::from(486_662));
        group.bench_function(BenchmarkId::new("montgomery/small", prime), |bench| {
            let mut x = ma.mutable();
            bench.iter(|| {
                x.set_product_small(&small);
                black_box(&x);
            })
        });
        group.bench_function(BenchmarkId::new("montgomery/small_as_element", prime), |bench| {
            let mut x = ma.mutable();
            bench.iter(|| {
                x.set_product(&as_element);
                black_box(&x);
            })
        });
    }

    group.finish();
}

fn bench_lazy_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lazy Reduction");
    let prime = KnownPrime::P256;
    let montgomery = MontgomeryField::new(prime.modulus().clone()).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let terms: Vec<Element<MontgomeryField>> = (0..16)
        .map(|_| random_element(&montgomery, prime.field_bytes(), &mut rng))
        .collect();

    // Sum of 16 terms stays within the addition budget
    group.bench_function("sum_then_reduce", |bench| {
        bench.iter(|| {
            let mut acc = montgomery.zero().mutable();
            for term in &terms {
                acc.set_sum(term).unwrap();
            }
            acc.set_reduced();
            black_box(acc.as_big_integer())
        })
    });

    group.bench_function("reduce_every_step", |bench| {
        bench.iter(|| {
            let mut acc = montgomery.zero().mutable();
            for term in &terms {
                acc.set_sum(term).unwrap().set_reduced();
            }
            black_box(acc.as_big_integer())
        })
    });

    group.finish();
}

fn bench_harness(c: &mut Criterion) {
    let mut group = c.benchmark_group("Differential Harness");
    group.sample_size(10);

    let prime = KnownPrime::Curve25519;
    let field = MontgomeryField::new(prime.modulus().clone()).unwrap();
    let config = HarnessConfig::new(prime.field_bytes()).with_iterations(10);
    let harness = DifferentialHarness::new(field, config).unwrap();

    group.bench_function("curve25519/10_iterations", |bench| {
        bench.iter(|| black_box(harness.run().unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_field_add,
    bench_field_mul,
    bench_lazy_reduction,
    bench_harness,
);
criterion_main!(benches);
