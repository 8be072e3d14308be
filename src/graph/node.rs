/// Context passed to graph nodes during rendering
///
/// Contains per-block modulation applied on top of the patch:
/// - extra_rate: offset added to every rate code computed during the block
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderCtx {
    pub extra_rate: i32,
}

impl RenderCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with a rate modulation offset
    pub fn with_extra_rate(extra_rate: i32) -> Self {
        Self { extra_rate }
    }
}

/// Core trait for envelope-producing graph nodes
///
/// Output is the fixed-point amplitude consumed by the operator stage.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [i32], ctx: &RenderCtx);

    /// Triggered when a note starts
    ///
    /// Default implementation does nothing (passthrough nodes).
    fn note_on(&mut self) {
        // Default: do nothing
    }

    /// Triggered when a note is released
    ///
    /// Default implementation does nothing (passthrough nodes).
    fn note_off(&mut self) {
        // Default: do nothing
    }

    fn get_envelope_level(&self) -> Option<i32> {
        None
    }

    /// Check if this node is still producing sound
    ///
    /// Used by voice management to know when a voice can be freed.
    fn is_active(&self) -> bool {
        true
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [i32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn note_on(&mut self) {
        (**self).note_on()
    }

    fn note_off(&mut self) {
        (**self).note_off()
    }

    fn get_envelope_level(&self) -> Option<i32> {
        (**self).get_envelope_level()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
