use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{SampleRateCalibration, TimingMode};

/// Engine-wide envelope settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub timing: TimingMode,
}

impl EngineConfig {
    pub fn new(sample_rate: f32, timing: TimingMode) -> Self {
        Self {
            sample_rate,
            timing,
        }
    }

    /// Calibration to share between every envelope of the engine.
    pub fn calibration(&self) -> Arc<SampleRateCalibration> {
        Arc::new(SampleRateCalibration::for_sample_rate(
            self.sample_rate as f64,
        ))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            timing: TimingMode::Fast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_reference_rate() {
        let config = EngineConfig::default();
        assert_eq!(config.timing, TimingMode::Fast);
        assert_eq!(config.calibration().multiplier(), 1 << 24);
    }

    #[test]
    fn calibration_follows_sample_rate() {
        let config = EngineConfig::new(88_200.0, TimingMode::Accurate);
        assert_eq!(config.calibration().multiplier(), 1 << 23);
    }
}
