//! Low-level envelope primitives used by the graph and voice layers.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They stay focused on the fixed-point
//! math so the layers above can handle note events and block orchestration.

/// Sample-rate calibration shared by every envelope.
pub mod calibration;
/// Four-phase rate/level operator envelope.
pub mod envelope;
/// Output level law and target blending.
pub mod level;
/// Hold timing for static phases.
pub mod timing;

pub use calibration::SampleRateCalibration;
pub use envelope::{Envelope, EnvelopeParams, EnvelopePhase};
pub use timing::TimingMode;
