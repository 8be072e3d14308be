//! Sample-rate calibration shared by every envelope.
//!
//! All timing constants are measured at 44.1 kHz. The calibration holds a
//! 8.24 fixed-point multiplier that rescales them to the engine rate. It is
//! written from the control thread when the rate changes and read by each
//! envelope whenever it enters a new phase.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, warn};

/// Rate at which all envelope constants were measured.
pub const REFERENCE_SAMPLE_RATE: f64 = 44_100.0;

/// Number of fractional bits in the multiplier.
pub const MULTIPLIER_BITS: u32 = 24;

const UNITY: u32 = 1 << MULTIPLIER_BITS;

#[derive(Debug)]
pub struct SampleRateCalibration {
    multiplier: AtomicU32,
}

impl SampleRateCalibration {
    /// Calibration for the reference rate (multiplier of exactly 1.0).
    pub fn new() -> Self {
        Self {
            multiplier: AtomicU32::new(UNITY),
        }
    }

    pub fn for_sample_rate(sample_rate: f64) -> Self {
        let calibration = Self::new();
        calibration.set_sample_rate(sample_rate);
        calibration
    }

    /// Recompute the multiplier for a new engine rate.
    ///
    /// Must not run while envelopes sharing this calibration are being
    /// advanced; the render path is expected to be paused around a rate change.
    pub fn set_sample_rate(&self, sample_rate: f64) {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            warn!(sample_rate, "ignoring invalid sample rate");
            return;
        }

        let multiplier = multiplier_for(sample_rate);
        self.multiplier.store(multiplier, Ordering::Relaxed);
        debug!(sample_rate, multiplier, "envelope calibration updated");
    }

    #[inline]
    pub fn multiplier(&self) -> u32 {
        self.multiplier.load(Ordering::Relaxed)
    }

    /// Rescale a reference-rate quantity to the engine rate.
    #[inline]
    pub fn scale(&self, value: i32) -> i32 {
        ((value as i64 * self.multiplier() as i64) >> MULTIPLIER_BITS) as i32
    }
}

impl Default for SampleRateCalibration {
    fn default() -> Self {
        Self::new()
    }
}

fn multiplier_for(sample_rate: f64) -> u32 {
    // `as` saturates for absurdly low rates
    ((REFERENCE_SAMPLE_RATE / sample_rate) * UNITY as f64) as u32
}
