use crate::coords::Viewport;
use crate::error::Result;
use crate::pipeline::CommandBuffer;
use crate::shader::ShaderIntrospector;

/// Execution layer driven by the [`EngineController`](super::EngineController).
///
/// Per frame the controller calls [`execute`](Self::execute) at most once,
/// then [`end_frame`](Self::end_frame) exactly once.
pub trait Renderer: ShaderIntrospector {
    /// Runs one frame's commands in order.
    fn execute(&mut self, commands: &CommandBuffer) -> Result<()>;

    /// A new rendering surface exists; every GPU object from the previous one is invalid.
    fn on_surface_created(&mut self) -> Result<()>;

    fn on_surface_changed(&mut self, viewport: Viewport);

    /// Finishes the frame: presents and flips every swapchain.
    fn end_frame(&mut self) -> Result<()>;

    /// Releases every GPU object.
    fn close(&mut self);
}
