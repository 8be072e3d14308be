use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dsp::{
    level::scale_output_level, Envelope, EnvelopeParams, SampleRateCalibration, TimingMode,
};

/// Operators per voice.
pub const OPERATORS: usize = 6;

/// Envelope-related settings of one operator, as stored in a patch.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorPatch {
    pub envelope: EnvelopeParams,
    /// 0..=99
    pub output_level: u8,
    /// Keyboard rate scaling depth, 0..=7
    pub rate_scaling_sensitivity: u8,
}

pub type VoicePatch = [OperatorPatch; OPERATORS];

/// Rate code offset for a note: higher keys run their envelopes faster.
pub fn scale_rate(note: u8, sensitivity: u8) -> i32 {
    let x = (note as i32 / 3 - 7).clamp(0, 31);
    (sensitivity as i32 * x) >> 3
}

/// Operator output level (0..=99) in envelope microsteps.
pub fn operator_output_level(level: u8) -> i32 {
    scale_output_level(level as i32).min(127) << 5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Key held
    Releasing, // Key released, envelopes in release phase
}

/// The envelopes of one sounding note, one per operator.
pub struct Voice {
    patch: Arc<VoicePatch>,
    envelopes: [Envelope; OPERATORS],
    note: u8,
    state: VoiceState,
    age: u64,
}

impl Voice {
    pub fn new(
        patch: Arc<VoicePatch>,
        calibration: Arc<SampleRateCalibration>,
        mode: TimingMode,
    ) -> Self {
        Self {
            patch,
            envelopes: std::array::from_fn(|_| Envelope::new(calibration.clone(), mode)),
            note: 0,
            state: VoiceState::Free,
            age: 0,
        }
    }

    pub fn start(&mut self, note: u8, age: u64) {
        self.note = note;
        self.state = VoiceState::Active;
        self.age = age;

        for (env, op) in self.envelopes.iter_mut().zip(self.patch.iter()) {
            env.init(
                &op.envelope,
                operator_output_level(op.output_level),
                scale_rate(note, op.rate_scaling_sensitivity),
            );
        }
    }

    /// Legato re-attack from the current levels.
    pub fn retrigger(&mut self) {
        if self.state == VoiceState::Free {
            return;
        }
        self.state = VoiceState::Active;
        for (env, op) in self.envelopes.iter_mut().zip(self.patch.iter()) {
            env.keydown(&op.envelope, true);
        }
    }

    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            for (env, op) in self.envelopes.iter_mut().zip(self.patch.iter()) {
                env.keydown(&op.envelope, false);
            }
        }
    }

    /// Apply an edited patch to the sounding note without restarting it.
    pub fn update_patch(&mut self, patch: Arc<VoicePatch>) {
        trace!(note = self.note, "voice patch updated");
        self.patch = patch;
        for (env, op) in self.envelopes.iter_mut().zip(self.patch.iter()) {
            env.update(
                &op.envelope,
                operator_output_level(op.output_level),
                scale_rate(self.note, op.rate_scaling_sensitivity),
            );
        }
    }

    /// Advance every operator by `n` samples and return their amplitudes.
    pub fn render(&mut self, n: u32, extra_rate: i32) -> [i32; OPERATORS] {
        let mut out = [0; OPERATORS];
        for ((env, op), sample) in self
            .envelopes
            .iter_mut()
            .zip(self.patch.iter())
            .zip(out.iter_mut())
        {
            *sample = env.getsample(&op.envelope, n, extra_rate);
        }

        // If voice is releasing and every envelope has finished, mark as free
        if self.state == VoiceState::Releasing && !self.envelopes.iter().any(Envelope::is_active) {
            self.free();
        }

        out
    }

    /// Continue `src`'s note in this slot without a discontinuity.
    pub fn steal_from(&mut self, src: &Voice) {
        trace!(note = src.note, age = src.age, "voice transferred");
        self.patch = src.patch.clone();
        self.note = src.note;
        self.state = src.state;
        self.age = src.age;
        for (dst, env) in self.envelopes.iter_mut().zip(src.envelopes.iter()) {
            dst.transfer(env);
        }
    }

    pub fn positions(&self) -> [u8; OPERATORS] {
        std::array::from_fn(|i| self.envelopes[i].position())
    }

    pub fn envelopes(&self) -> &[Envelope; OPERATORS] {
        &self.envelopes
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch() -> Arc<VoicePatch> {
        let mut patch = [OperatorPatch::default(); OPERATORS];
        for (i, op) in patch.iter_mut().enumerate() {
            op.envelope = EnvelopeParams::new([99, 50 + i as u8, 40, 70], [99, 80, 60, 0]);
            op.output_level = 99 - i as u8 * 10;
            op.rate_scaling_sensitivity = i as u8;
        }
        Arc::new(patch)
    }

    fn voice() -> Voice {
        Voice::new(patch(), Arc::new(SampleRateCalibration::new()), TimingMode::Fast)
    }

    #[test]
    fn rate_scaling_by_key() {
        assert_eq!(scale_rate(0, 7), 0);
        assert_eq!(scale_rate(21, 7), 0);
        assert_eq!(scale_rate(60, 0), 0);
        assert_eq!(scale_rate(60, 7), (7 * 13) >> 3);
        assert_eq!(scale_rate(127, 7), (7 * 31) >> 3);
    }

    #[test]
    fn output_level_in_microsteps() {
        assert_eq!(operator_output_level(99), 127 << 5);
        assert_eq!(operator_output_level(0), 0);
        assert_eq!(operator_output_level(19), 46 << 5);
    }

    #[test]
    fn lifecycle_frees_voice_after_release() {
        let mut voice = voice();
        assert!(voice.is_free());

        voice.start(60, 1);
        assert_eq!(voice.state(), VoiceState::Active);
        assert_eq!(voice.positions(), [0; OPERATORS]);

        for _ in 0..4_000 {
            voice.render(64, 0);
        }
        assert!(voice.positions().iter().all(|&p| p == 3));

        voice.release();
        assert_eq!(voice.state(), VoiceState::Releasing);
        for _ in 0..4_000 {
            voice.render(64, 0);
        }
        assert!(voice.is_free());
        assert_eq!(voice.positions(), [4; OPERATORS]);
    }

    #[test]
    fn stolen_voice_continues_seamlessly() {
        let mut original = voice();
        original.start(72, 9);
        for _ in 0..300 {
            original.render(64, 0);
        }

        let mut slot = voice();
        slot.steal_from(&original);
        assert_eq!(slot.note(), 72);
        assert_eq!(slot.age(), 9);

        for step in 0..3_000 {
            if step == 1_000 {
                original.release();
                slot.release();
            }
            assert_eq!(original.render(64, 0), slot.render(64, 0));
            assert_eq!(original.positions(), slot.positions());
        }
    }

    #[test]
    fn retrigger_reattacks_without_reset() {
        let mut voice = voice();
        voice.retrigger();
        assert!(voice.is_free());

        voice.start(60, 0);
        for _ in 0..100 {
            voice.render(64, 0);
        }
        voice.release();
        let levels = voice.render(64, 0);

        voice.retrigger();
        assert_eq!(voice.state(), VoiceState::Active);
        assert_eq!(voice.positions(), [0; OPERATORS]);
        for (env, level) in voice.envelopes().iter().zip(levels) {
            assert_eq!(env.level(), level);
        }
    }

    #[test]
    fn patch_update_keeps_levels() {
        let mut voice = voice();
        voice.start(60, 0);
        for _ in 0..4_000 {
            voice.render(64, 0);
        }
        let before: Vec<i32> = voice.envelopes().iter().map(|e| e.level()).collect();

        let mut edited = *patch();
        edited[0].envelope.levels[2] = 90;
        voice.update_patch(Arc::new(edited));

        let after: Vec<i32> = voice.envelopes().iter().map(|e| e.level()).collect();
        assert_eq!(before, after);
        assert_eq!(voice.positions(), [2; OPERATORS]);
        assert!(voice.envelopes()[0].is_rising());
    }
}
