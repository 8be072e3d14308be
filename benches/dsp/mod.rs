//! Benchmarks for the envelope primitives and nodes.

mod envelope;

pub use envelope::{bench_env_node, bench_envelope};
