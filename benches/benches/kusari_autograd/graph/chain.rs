use criterion::{black_box, Criterion};
use kusari_autograd::Variable;
use kusari_core::NdArray;

// Constants for benchmark data sizes
const SIZES: [(usize, &str); 3] = [(100, "small"), (1000, "medium"), (10000, "large")];
const DEPTHS: [(usize, &str); 2] = [(8, "shallow"), (64, "deep")];

fn bench_chain(b: &mut criterion::Bencher, size: usize, depth: usize) {
    let base_data: Vec<f32> = (0..size).map(|i| (i % 7) as f32 * 0.25).collect();

    b.iter(|| {
        let x = Variable::new(NdArray::from_vec(base_data.clone(), &[size]).unwrap());
        let mut y = x.clone();
        for _ in 0..depth {
            y = y.square().unwrap().add_scalar(1.0).unwrap();
        }
        let loss = y.sum().unwrap();
        loss.backward().unwrap();
        black_box(x.grad().unwrap())
    })
}

pub fn basic(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("graph/chain");
    group.warm_up_time(core::time::Duration::from_millis(500));
    group.measurement_time(core::time::Duration::from_secs(3));
    group.sample_size(50);

    for (size, size_label) in SIZES {
        for (depth, depth_label) in DEPTHS {
            group.bench_function(format!("forward_backward/{}/{}", size_label, depth_label), |b| {
                bench_chain(b, size, depth)
            });
        }
    }

    group.finish();
}
