mod graph;

use criterion::criterion_main;

criterion_main!(graph::benches);
