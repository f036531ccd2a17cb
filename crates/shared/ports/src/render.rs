use kairos_core::{RenderMode, RenderPayload, StepSnapshot};

/// Rendering boundary.
///
/// The renderer keeps its own copy of whatever it last produced, so
/// control-mode render requests can be answered after an episode ended.
pub trait Renderer: Send {
    /// Whether plot generation is enabled for this session.
    fn enabled(&self) -> bool;

    /// Modes this renderer supports.
    fn modes(&self) -> Vec<RenderMode>;

    /// Produce frames for the requested modes from the given backed-up
    /// step. `transmit` is false for renderings kept by the renderer only
    /// (the early-stop pass), true when the payload goes out on the wire.
    fn render(
        &mut self,
        modes: &[RenderMode],
        step: Option<&StepSnapshot>,
        transmit: bool,
    ) -> RenderPayload;
}
