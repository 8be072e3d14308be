//! Timing strategies for phases in which the level does not move.
//!
//! In [`TimingMode::Fast`] such a phase completes on the next step. The
//! original hardware instead sits on the level for a duration that depends
//! only on the rate; [`TimingMode::Accurate`] reproduces that with a table of
//! measured hold times.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::calibration::SampleRateCalibration;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimingMode {
    /// Static phases resolve immediately.
    #[default]
    Fast,
    /// Static phases hold for the measured hardware duration.
    Accurate,
}

/// Measured hold durations in 44.1 kHz samples, indexed by rate (0..=76).
///
/// Gathered on two TF1 modules; rates above 76 are extrapolated.
pub const STATIC_HOLD_SAMPLES: [i32; 77] = [
    1764000, 1764000, 1411200, 1411200, 1190700, 1014300, 992250, 882000, 705600, 705600, 584325,
    507150, 502740, 441000, 418950, 352800, 308700, 286650, 253575, 220500, 220500, 176400, 145530,
    145530, 125685, 110250, 110250, 88200, 88200, 74970, 61740, 61740, 55125, 48510, 44100, 37485,
    31311, 30870, 27562, 27562, 22050, 18522, 17640, 15435, 14112, 13230, 11025, 9261, 9261, 7717,
    6615, 6615, 5512, 5512, 4410, 3969, 3969, 3439, 2866, 2690, 2249, 1984, 1896, 1808, 1411, 1367,
    1234, 1146, 926, 837, 837, 705, 573, 573, 529, 441, 441,
];

const MAX_STATIC_RATE: i32 = 99;

/// Zero-level attacks settle this many times faster than the table says.
const ZERO_ATTACK_DIVISOR: i32 = 20;

/// Hold duration at the reference rate for an unscaled rate (0..=99) plus
/// the keyboard and modulation rate offsets.
pub fn reference_hold_samples(rate: i32, rate_offset: i32, zero_attack: bool) -> i32 {
    let static_rate = (rate + rate_offset).clamp(0, MAX_STATIC_RATE);

    match STATIC_HOLD_SAMPLES.get(static_rate as usize) {
        Some(&samples) if zero_attack => samples / ZERO_ATTACK_DIVISOR,
        Some(&samples) => samples,
        None => 20 * (MAX_STATIC_RATE - static_rate),
    }
}

/// Hold duration at the engine rate.
#[inline]
pub fn hold_samples(
    calibration: &SampleRateCalibration,
    rate: i32,
    rate_offset: i32,
    zero_attack: bool,
) -> i32 {
    calibration.scale(reference_hold_samples(rate, rate_offset, zero_attack))
}
