mod accum;
mod chain;

use criterion::criterion_group;

criterion_group!(benches, chain::basic, accum::basic);
