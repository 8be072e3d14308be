// Purpose: the boundary between voice management and the operator envelopes
// Allocation policy lives with the caller; a voice only knows how to start,
// release, render and hand its state over to another slot.

pub mod voice;

pub use voice::{OperatorPatch, Voice, VoicePatch, VoiceState, OPERATORS};
