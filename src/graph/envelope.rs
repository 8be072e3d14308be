use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    dsp::{Envelope, EnvelopeParams, SampleRateCalibration, TimingMode},
    graph::node::{GraphNode, RenderCtx},
};

/// One operator envelope bound to its patch data.
pub struct EnvNode {
    env: Envelope,
    params: Arc<EnvelopeParams>,
    output_level: i32,
    rate_scaling: i32,
}

impl EnvNode {
    pub fn new(
        calibration: Arc<SampleRateCalibration>,
        mode: TimingMode,
        params: Arc<EnvelopeParams>,
        output_level: i32,
        rate_scaling: i32,
    ) -> Self {
        Self {
            env: Envelope::new(calibration, mode),
            params,
            output_level,
            rate_scaling,
        }
    }

    /// Advance the whole block in one step and return the level at its end.
    ///
    /// Use this when the consumer only needs one amplitude per block.
    pub fn process_block(&mut self, len: usize, ctx: &RenderCtx) -> i32 {
        let n = u32::try_from(len).unwrap_or(u32::MAX);
        self.env.getsample(&self.params, n, ctx.extra_rate)
    }

    /// Swap in new patch data, re-targeting the sustain phase if held.
    pub fn set_params(&mut self, params: Arc<EnvelopeParams>) {
        self.params = params;
        self.env
            .update(&self.params, self.output_level, self.rate_scaling);
    }

    /// Live output level / rate scaling change for the held note.
    pub fn update(&mut self, output_level: i32, rate_scaling: i32) {
        self.output_level = output_level;
        self.rate_scaling = rate_scaling;
        self.env.update(&self.params, output_level, rate_scaling);
    }

    pub fn position(&self) -> u8 {
        self.env.position()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.env
    }

    pub fn set_timing_mode(&mut self, mode: TimingMode) {
        self.env.set_timing_mode(mode);
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [i32], ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample = self.env.getsample(&self.params, 1, ctx.extra_rate);
        }
    }

    fn note_on(&mut self) {
        self.env
            .init(&self.params, self.output_level, self.rate_scaling);
    }

    fn note_off(&mut self) {
        self.env.keydown(&self.params, false);
    }

    fn get_envelope_level(&self) -> Option<i32> {
        Some(self.env.level())
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}

#[cfg(feature = "rtrb")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeMessage {
    NoteOn,
    NoteOff,
    Update { output_level: i32, rate_scaling: i32 },
}

#[cfg(feature = "rtrb")]
pub struct EnvelopeHandle {
    tx: Producer<EnvelopeMessage>,
}

/// Envelope node driven from another thread through an [`EnvelopeHandle`].
#[cfg(feature = "rtrb")]
pub struct SharedEnvNode {
    node: EnvNode,
    rx: Consumer<EnvelopeMessage>,
}

#[cfg(feature = "rtrb")]
impl EnvelopeHandle {
    pub fn note_on(&mut self) {
        let _ = self.tx.push(EnvelopeMessage::NoteOn);
    }

    pub fn note_off(&mut self) {
        let _ = self.tx.push(EnvelopeMessage::NoteOff);
    }

    pub fn update(&mut self, output_level: i32, rate_scaling: i32) {
        let _ = self.tx.push(EnvelopeMessage::Update {
            output_level,
            rate_scaling,
        });
    }
}

#[cfg(feature = "rtrb")]
const ENVELOPE_QUEUE_SIZE: usize = 64;

#[cfg(feature = "rtrb")]
impl SharedEnvNode {
    pub fn new(node: EnvNode) -> (Self, EnvelopeHandle) {
        let (tx, rx) = RingBuffer::<EnvelopeMessage>::new(ENVELOPE_QUEUE_SIZE);

        let handle = EnvelopeHandle { tx };
        let node = Self { node, rx };

        (node, handle)
    }

    /// Drain pending control messages. Called at the start of every block.
    pub fn poll(&mut self) {
        while let Ok(msg) = self.rx.pop() {
            match msg {
                EnvelopeMessage::NoteOn => self.node.note_on(),
                EnvelopeMessage::NoteOff => self.node.note_off(),
                EnvelopeMessage::Update {
                    output_level,
                    rate_scaling,
                } => self.node.update(output_level, rate_scaling),
            }
        }
    }

    pub fn process_block(&mut self, len: usize, ctx: &RenderCtx) -> i32 {
        self.poll();
        self.node.process_block(len, ctx)
    }

    pub fn node(&self) -> &EnvNode {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut EnvNode {
        &mut self.node
    }

    /// Check if envelope is currently active (not Idle)
    pub fn is_active(&self) -> bool {
        self.node.is_active()
    }
}

#[cfg(feature = "rtrb")]
impl GraphNode for SharedEnvNode {
    fn render_block(&mut self, out: &mut [i32], ctx: &RenderCtx) {
        self.poll();
        self.node.render_block(out, ctx);
    }

    fn get_envelope_level(&self) -> Option<i32> {
        self.node.get_envelope_level()
    }

    fn is_active(&self) -> bool {
        self.node.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::level::target_level;

    const FULL_OUT: i32 = 127 << 5;

    fn node(mode: TimingMode) -> EnvNode {
        let params = EnvelopeParams::new([99, 40, 40, 60], [99, 50, 50, 0]);
        EnvNode::new(
            Arc::new(SampleRateCalibration::new()),
            mode,
            Arc::new(params),
            FULL_OUT,
            0,
        )
    }

    #[test]
    fn block_render_matches_single_steps() {
        let ctx = RenderCtx::new();
        let mut per_sample = node(TimingMode::Fast);
        let mut reference = node(TimingMode::Fast);
        per_sample.note_on();
        reference.note_on();

        let mut buffer = [0i32; 64];
        for _ in 0..50 {
            per_sample.render_block(&mut buffer, &ctx);
            for &value in buffer.iter() {
                assert_eq!(value, reference.process_block(1, &ctx));
            }
        }
    }

    #[test]
    fn batched_block_reaches_sustain() {
        let ctx = RenderCtx::new();
        let mut node = node(TimingMode::Fast);
        assert!(!node.is_active());
        node.note_on();
        assert!(node.is_active());

        for _ in 0..5_000 {
            node.process_block(64, &ctx);
        }
        assert_eq!(node.position(), 3);
        assert_eq!(node.get_envelope_level(), Some(target_level(50, FULL_OUT)));

        node.note_off();
        for _ in 0..5_000 {
            node.process_block(64, &ctx);
        }
        assert!(!node.is_active());
    }

    #[test]
    fn set_params_retargets_held_note() {
        let ctx = RenderCtx::new();
        let mut node = node(TimingMode::Fast);
        node.note_on();
        for _ in 0..5_000 {
            node.process_block(64, &ctx);
        }

        node.set_params(Arc::new(EnvelopeParams::new(
            [99, 40, 40, 60],
            [99, 50, 80, 0],
        )));
        assert_eq!(node.position(), 2);
        assert!(node.envelope().is_rising());
        assert_eq!(node.envelope().target_level(), target_level(80, FULL_OUT));
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn shared_node_applies_queued_messages() {
        let ctx = RenderCtx::new();
        let (mut shared, mut handle) = SharedEnvNode::new(node(TimingMode::Fast));

        handle.note_on();
        assert!(!shared.is_active());
        shared.process_block(64, &ctx);
        assert!(shared.is_active());

        let mut buffer = [0i32; 128];
        for _ in 0..3_000 {
            shared.render_block(&mut buffer, &ctx);
        }
        assert_eq!(shared.node().position(), 3);

        handle.update(100 << 5, 0);
        shared.poll();
        assert_eq!(shared.node().position(), 2);
        assert_eq!(
            shared.node().envelope().target_level(),
            target_level(50, 100 << 5)
        );

        handle.note_off();
        shared.poll();
        assert_eq!(shared.node().position(), 3);
        assert!(!shared.node().envelope().gate());
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn full_queue_drops_messages() {
        let (mut shared, mut handle) = SharedEnvNode::new(node(TimingMode::Fast));
        for _ in 0..ENVELOPE_QUEUE_SIZE + 10 {
            handle.note_off();
        }
        shared.poll();
        assert!(!shared.is_active());
    }
}
