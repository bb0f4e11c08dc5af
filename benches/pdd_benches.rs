use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdd::PddManager;

fn dense_sum(man: &PddManager, num_vars: usize) -> pdd::Pdd {
    let mut acc = man.zero();
    for i in 1..=num_vars {
        let vi = man.mk_var(i).unwrap();
        acc = acc.add(&vi).unwrap();
    }
    acc
}

fn add_benchmark(c: &mut Criterion) {
    let man = PddManager::new(32);
    let a = dense_sum(&man, 16);
    let b = dense_sum(&man, 32);
    c.bench_function("add 16-var sum with 32-var sum", |bench| {
        bench.iter(|| black_box(&a).add(black_box(&b)).unwrap())
    });
}

fn mul_benchmark(c: &mut Criterion) {
    let man = PddManager::new(16);
    let a = dense_sum(&man, 8);
    let b = dense_sum(&man, 16);
    c.bench_function("multiply 8-var sum by 16-var sum", |bench| {
        bench.iter(|| black_box(&a).mul(black_box(&b)).unwrap())
    });
}

fn reduce_benchmark(c: &mut Criterion) {
    let man = PddManager::new(8);
    let x1 = man.mk_var(1).unwrap();
    let x2 = man.mk_var(2).unwrap();
    let divisor = x1.mul(&x2).unwrap();
    let mut p = man.zero();
    for _ in 0..32 {
        p = p.add(&divisor).unwrap();
    }
    p = p.add(&x2).unwrap();
    c.bench_function("reduce repeated multiple against its own factor", |bench| {
        bench.iter(|| black_box(&p).reduce(black_box(&divisor)).unwrap())
    });
}

criterion_group!(pdd_benches, add_benchmark, mul_benchmark, reduce_benchmark);
criterion_main!(pdd_benches);
