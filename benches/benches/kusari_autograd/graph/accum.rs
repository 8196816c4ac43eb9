use criterion::{black_box, Criterion};
use kusari_autograd::{config, GradAccumPolicy, Variable};
use kusari_core::NdArray;

// Constants for benchmark data sizes
const SIZES: [(usize, &str); 2] = [(1000, "medium"), (10000, "large")];
const FAN_IN: usize = 16;

fn bench_fan_in(b: &mut criterion::Bencher, policy: GradAccumPolicy, size: usize) {
    let base_data: Vec<f32> = (0..size).map(|i| (i % 5) as f32 * 0.5 - 1.0).collect();

    b.iter(|| {
        let _guard = config::with_grad_accum_policy(policy);
        let x = Variable::new(NdArray::from_vec(base_data.clone(), &[size]).unwrap());
        let mut total = x.square().unwrap();
        for i in 1..FAN_IN {
            let branch = x.mul_scalar(i as f64).unwrap();
            total = total.add(&branch).unwrap();
        }
        let loss = total.sum().unwrap();
        loss.backward().unwrap();
        black_box(x.grad().unwrap())
    })
}

pub fn basic(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("graph/accum");
    group.warm_up_time(core::time::Duration::from_millis(500));
    group.measurement_time(core::time::Duration::from_secs(3));
    group.sample_size(50);

    for (size, label) in SIZES {
        group.bench_function(format!("eager/{}", label), |b| {
            bench_fan_in(b, GradAccumPolicy::Eager, size)
        });
        group.bench_function(format!("lazy/{}", label), |b| {
            bench_fan_in(b, GradAccumPolicy::Lazy, size)
        });
    }

    group.finish();
}
