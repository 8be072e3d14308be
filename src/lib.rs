pub mod config; // Engine-wide settings
pub mod dsp;
pub mod graph; // Block rendering and realtime control
pub mod synth; // Voice-level envelope bundles

pub use config::EngineConfig;
pub use dsp::{Envelope, EnvelopeParams, EnvelopePhase, SampleRateCalibration, TimingMode};
