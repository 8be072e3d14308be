//! Benchmarks for the four-phase operator envelope.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use fm_envelope::dsp::{Envelope, EnvelopeParams, SampleRateCalibration, TimingMode};
use fm_envelope::graph::{EnvNode, GraphNode, RenderCtx};

use crate::BLOCK_SIZES;

const PARAMS: EnvelopeParams = EnvelopeParams::new([90, 45, 30, 60], [99, 80, 70, 0]);
const OUTPUT_LEVEL: i32 = 127 << 5;

fn envelope() -> Envelope {
    Envelope::new(
        Arc::new(SampleRateCalibration::for_sample_rate(48_000.0)),
        TimingMode::Accurate,
    )
}

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let n = size as u32;

        // Attack phase (ramping up); re-init keeps it from ever finishing
        let mut env = envelope();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.init(&PARAMS, OUTPUT_LEVEL, 0);
                black_box(env.getsample(&PARAMS, black_box(n), 0));
            })
        });

        // Sustain phase (holding steady)
        let mut env = envelope();
        env.init(&PARAMS, OUTPUT_LEVEL, 0);
        while env.position() < 3 {
            env.getsample(&PARAMS, 64, 0);
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| black_box(env.getsample(&PARAMS, black_box(n), 0)))
        });

        // Release phase (ramping down)
        let mut env = envelope();
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.init(&PARAMS, OUTPUT_LEVEL, 0);
                env.keydown(&PARAMS, false);
                black_box(env.getsample(&PARAMS, black_box(n), 0));
            })
        });
    }

    group.finish();
}

pub fn bench_env_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/envelope");
    let ctx = RenderCtx::new();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0i32; size];
        let mut node = EnvNode::new(
            Arc::new(SampleRateCalibration::new()),
            TimingMode::Fast,
            Arc::new(PARAMS),
            OUTPUT_LEVEL,
            0,
        );
        node.note_on();
        group.bench_with_input(BenchmarkId::new("render_block", size), &size, |b, _| {
            b.iter(|| node.render_block(black_box(&mut buffer), black_box(&ctx)))
        });
    }

    group.finish();
}
