use winit::event::WindowEvent;

use crate::asset::AssetProvider;
use crate::device::WgpuBackend;
use crate::engine::EngineController;
use crate::error::EngineError;
use crate::gpu::GpuRenderer;

/// Engine driving a window's surface.
pub type HostEngine<'w> = EngineController<GpuRenderer<WgpuBackend<'w>>>;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// What a windowed host supplies to the runtime.
pub trait HostApp {
    /// Asset provider the engine loads shaders and textures through.
    fn assets(&mut self) -> AssetProvider;

    /// Registers plugins and data providers before setup.
    fn configure(&mut self, engine: &mut HostEngine<'_>) -> anyhow::Result<()>;

    /// Called after setup or a frame failed; the engine is already torn down.
    fn on_engine_error(&mut self, err: &EngineError) -> AppControl {
        let _ = err;
        AppControl::Exit
    }

    /// Called for window events before the runtime handles them.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }
}
