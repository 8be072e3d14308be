use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    calibration::SampleRateCalibration,
    level,
    timing::{self, TimingMode},
};

/*
FM Operator Envelope
====================

Four-phase rate/level envelope as found on classic six-operator FM hardware.
Every phase has a RATE (how fast, 0..=99) and a LEVEL (where to, 0..=99).
There is no separate "sustain" knob: the envelope simply stops after phase 2
while the key is held, and phase 3 only runs once the key is released.

Vocabulary
----------

  level       Current amplitude in 16.16 fixed point, logarithmic domain.
              Each integer step above the 16-bit fraction is ~0.0235 dB.

  target      The level the current phase is moving towards.

  phase       0 attack, 1 decay 1, 2 decay 2, 3 release, 4 idle.

  rate code   Rate 0..=99 squeezed into 0..=63, plus keyboard rate scaling
              and any per-block modulation offset.

  increment   Per-sample level delta derived from the rate code.

  hold        (accurate timing only) samples left before a phase whose level
              does not move is allowed to finish.


The Shape
---------

  level
    L1 ┤   ╱╲
       │  ╱  ╲
    L2 ┤ ╱    ╲____________
       │╱                  ╲
    L4 ┼─────────────────────╲____
        R1  R2   R3 (held)   R4
        ^key on               ^key off

Phases chain automatically: when a phase reaches its target it immediately
enters the next one. Phase 3 is skipped over while the gate is held, which
is what makes L3 act as the sustain level.


Rate To Increment
-----------------

The rate code is an exponent with two bits of mantissa:

    increment = (4 + (qrate & 3)) << (2 + (qrate >> 2))

so every four rate codes double the slope. Rising phases are not linear: the
level first jumps to 1716 (everything below that is inaudible) and the step
is then multiplied by how far the level still is from the 17 << 24 ceiling.
That reproduces the hardware's fast-then-slow attack curve.


Batched Stepping
----------------

`getsample(n)` advances by `n` samples with one multiply, not a loop. The
delta is computed in 64 bits and clamped at the target, so a large block can
never overshoot. Only one phase transition can happen per call.
*/

/// Level the attack jumps to before ramping (integer part).
const JUMP_TARGET: i32 = 1716 << 16;

/// Ceiling used to bend the attack curve.
const ATTACK_CEILING: i32 = 17 << 24;

pub const MAX_RATE_CODE: i32 = 63;

/// Number of active phases.
pub const PHASES: usize = 4;

const ATTACK: u8 = 0;
const SUSTAIN: u8 = 2;
const RELEASE: u8 = 3;
const IDLE: u8 = 4;

/// Per-operator rate/level pairs, one per phase. Values are 0..=99.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvelopeParams {
    pub rates: [u8; PHASES],
    pub levels: [u8; PHASES],
}

impl EnvelopeParams {
    pub const fn new(rates: [u8; PHASES], levels: [u8; PHASES]) -> Self {
        Self { rates, levels }
    }
}

/// Named view of the phase index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    Attack,
    Decay1,
    Decay2,
    Release,
    Idle,
}

impl From<u8> for EnvelopePhase {
    fn from(position: u8) -> Self {
        match position {
            0 => EnvelopePhase::Attack,
            1 => EnvelopePhase::Decay1,
            2 => EnvelopePhase::Decay2,
            3 => EnvelopePhase::Release,
            _ => EnvelopePhase::Idle,
        }
    }
}

/// Quantised rate code for an unscaled rate plus offsets, clamped to 0..=63.
#[inline]
pub fn rate_code(rate: i32, rate_offset: i32) -> i32 {
    (((rate * 41) >> 6) + rate_offset).clamp(0, MAX_RATE_CODE)
}

/// Per-sample increment at the reference rate.
#[inline]
pub fn reference_increment(qrate: i32) -> i32 {
    (4 + (qrate & 3)) << (2 + (qrate >> 2))
}

#[derive(Debug, Clone)]
pub struct Envelope {
    calibration: Arc<SampleRateCalibration>,
    mode: TimingMode,

    // Voice inputs, kept for recomputation on phase changes
    output_level: i32,
    rate_scaling: i32,

    level: i32,
    target_level: i32,
    phase: u8,
    rising: bool,
    increment: i32,
    gate: bool,
    hold_count: i32,
}

impl Envelope {
    /// Idle envelope reading its sample rate from `calibration`.
    pub fn new(calibration: Arc<SampleRateCalibration>, mode: TimingMode) -> Self {
        Self {
            calibration,
            mode,
            output_level: 0,
            rate_scaling: 0,
            level: 0,
            target_level: 0,
            phase: IDLE,
            rising: false,
            increment: 0,
            gate: false,
            hold_count: 0,
        }
    }

    /// Start from silence with the gate held.
    ///
    /// `output_level` is the operator level in microsteps (`scaled << 5`),
    /// `rate_scaling` the keyboard rate offset for the note.
    pub fn init(&mut self, params: &EnvelopeParams, output_level: i32, rate_scaling: i32) {
        self.output_level = output_level;
        self.rate_scaling = rate_scaling;
        self.level = 0;
        self.gate = true;
        self.advance(params, ATTACK, 0);
    }

    /// Apply a gate transition. Repeating the current gate value does nothing.
    pub fn keydown(&mut self, params: &EnvelopeParams, gate: bool) {
        if self.gate != gate {
            self.gate = gate;
            self.advance(params, if gate { ATTACK } else { RELEASE }, 0);
        }
    }

    /// Advance by `n` samples and return the amplitude.
    pub fn getsample(&mut self, params: &EnvelopeParams, n: u32, extra_rate: i32) -> i32 {
        if n == 0 {
            return self.level;
        }

        if self.hold_count > 0 {
            let remaining = self.hold_count as i64 - n as i64;
            if remaining <= 0 {
                self.hold_count = 0;
                self.advance(params, self.phase + 1, extra_rate);
            } else {
                self.hold_count = remaining as i32;
            }
        }

        let stepping = self.phase < RELEASE || (self.phase == RELEASE && !self.gate);
        if !stepping || self.hold_count > 0 {
            return self.level;
        }

        if self.rising {
            if self.level < JUMP_TARGET {
                self.level = JUMP_TARGET;
            }
            let slope = ((ATTACK_CEILING - self.level) >> 24) as i64;
            let next = self.level as i64 + slope * self.increment as i64 * n as i64;
            if next >= self.target_level as i64 {
                self.level = self.target_level;
                self.advance(params, self.phase + 1, extra_rate);
            } else {
                self.level = next as i32;
            }
        } else {
            let next = self.level as i64 - self.increment as i64 * n as i64;
            if next <= self.target_level as i64 {
                self.level = self.target_level;
                self.advance(params, self.phase + 1, extra_rate);
            } else {
                self.level = next as i32;
            }
        }

        self.level
    }

    /// Re-target the sustain phase after a live parameter change.
    ///
    /// The level is left where it is so the timbre glides to the new values.
    pub fn update(&mut self, params: &EnvelopeParams, output_level: i32, rate_scaling: i32) {
        self.output_level = output_level;
        self.rate_scaling = rate_scaling;
        if self.gate {
            self.advance(params, SUSTAIN, 0);
        }
    }

    /// Take over the running state of `src` (voice stealing).
    ///
    /// The calibration handle is not copied.
    pub fn transfer(&mut self, src: &Envelope) {
        self.mode = src.mode;
        self.output_level = src.output_level;
        self.rate_scaling = src.rate_scaling;
        self.level = src.level;
        self.target_level = src.target_level;
        self.rising = src.rising;
        self.phase = src.phase;
        self.gate = src.gate;
        self.hold_count = src.hold_count;
        self.increment = src.increment;
    }

    fn advance(&mut self, params: &EnvelopeParams, new_phase: u8, extra_rate: i32) {
        self.phase = new_phase;
        if self.phase >= IDLE {
            return;
        }

        let ix = self.phase as usize;
        let phase_level = params.levels[ix] as i32;
        let rate = params.rates[ix] as i32;
        let rate_offset = self.rate_scaling + extra_rate;

        self.target_level = level::target_level(phase_level, self.output_level);
        self.rising = self.target_level > self.level;

        let zero_attack = self.phase == ATTACK && phase_level == 0;
        self.hold_count = match self.mode {
            TimingMode::Accurate if self.target_level == self.level || zero_attack => {
                timing::hold_samples(&self.calibration, rate, rate_offset, zero_attack)
            }
            _ => 0,
        };

        let qrate = rate_code(rate, rate_offset);
        self.increment = self.calibration.scale(reference_increment(qrate));
    }

    /// Phase index, 0..=4.
    #[inline]
    pub fn position(&self) -> u8 {
        self.phase
    }

    pub fn phase(&self) -> EnvelopePhase {
        EnvelopePhase::from(self.phase)
    }

    #[inline]
    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn target_level(&self) -> i32 {
        self.target_level
    }

    pub fn increment(&self) -> i32 {
        self.increment
    }

    pub fn hold_count(&self) -> i32 {
        self.hold_count
    }

    pub fn is_rising(&self) -> bool {
        self.rising
    }

    pub fn gate(&self) -> bool {
        self.gate
    }

    /// True until the envelope has finished its release.
    pub fn is_active(&self) -> bool {
        self.phase < IDLE
    }

    pub fn timing_mode(&self) -> TimingMode {
        self.mode
    }

    /// Takes effect on the next phase change.
    pub fn set_timing_mode(&mut self, mode: TimingMode) {
        self.mode = mode;
    }

    pub fn calibration(&self) -> &Arc<SampleRateCalibration> {
        &self.calibration
    }
}
