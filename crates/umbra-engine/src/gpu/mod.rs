//! Backend-agnostic GPU object management and command execution.
//!
//! Scene descriptors are resolved to backend objects through content-keyed
//! caches. Every object is tagged with the [`SurfaceGeneration`] it was created
//! under; surface recreation bumps the generation and empties all caches.

mod backend;
mod cache;
mod framebuffer;
mod geometry;
mod handle;
mod renderer;
mod swapchain;
mod texture;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{CompiledProgram, GpuBackend, PassTarget, ProgramError, ProgramStage, BLIT_TEXTURE};
pub use cache::ObjectCache;
pub use framebuffer::FramebufferCache;
pub use geometry::GeometryCache;
pub use handle::{
    FramebufferHandle, GeometryHandle, ProgramHandle, RawHandle, SurfaceGeneration, Tagged,
    TextureHandle,
};
pub use renderer::GpuRenderer;
pub use swapchain::SwapchainManager;
pub use texture::TextureCache;
