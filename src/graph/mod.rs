//! Block-rendering wrappers around the envelope primitives.
//!
//! Graph nodes pair an envelope with its patch data and turn note events into
//! gate transitions. The `rtrb`-backed shared node lets a control thread drive
//! an envelope owned by the audio thread without locks.

/// Envelope node and its lock-free control handle.
pub mod envelope;
/// Core traits shared by all graph nodes.
pub mod node;

pub use envelope::EnvNode;
#[cfg(feature = "rtrb")]
pub use envelope::{EnvelopeHandle, EnvelopeMessage, SharedEnvNode};
pub use node::{GraphNode, RenderCtx};
