use rustc_hash::FxHashMap;

use crate::coords::Viewport;
use crate::error::{EngineError, Result};
use crate::scene::{FrameSwapchain, FramebufferDesc, Image2D, RenderTargetImage};

use super::{
    FramebufferCache, FramebufferHandle, GpuBackend, SurfaceGeneration, TextureCache,
    TextureHandle,
};

/// The two render targets behind one swapchain name.
#[derive(Debug, Clone)]
struct PingPong {
    ping: RenderTargetImage,
    pong: RenderTargetImage,
    read_is_ping: bool,
    size: Viewport,
    generation: SurfaceGeneration,
}

impl PingPong {
    fn new(name: &str, size: Viewport, generation: SurfaceGeneration) -> Result<Self> {
        Ok(Self {
            ping: RenderTargetImage::new(format!("{name}_ping"), size.width, size.height)?,
            pong: RenderTargetImage::new(format!("{name}_pong"), size.width, size.height)?,
            read_is_ping: true,
            size,
            generation,
        })
    }

    fn read(&self) -> &RenderTargetImage {
        if self.read_is_ping { &self.ping } else { &self.pong }
    }

    fn write(&self) -> &RenderTargetImage {
        if self.read_is_ping { &self.pong } else { &self.ping }
    }
}

/// Ping-pong feedback buffers keyed by swapchain name.
///
/// Each frame renders into the *write* half and samples the *read* half, which
/// holds what was written the frame before. [`swap_all`](Self::swap_all) flips
/// the roles and must run exactly once per frame, after every pass executed.
#[derive(Default)]
pub struct SwapchainManager {
    pairs: FxHashMap<FrameSwapchain, PingPong>,
}

impl SwapchainManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pair for `swapchain`, (re)creating both halves when it is
    /// missing, sized differently, or from an older surface generation.
    fn pair(
        &mut self,
        swapchain: &FrameSwapchain,
        size: Viewport,
        generation: SurfaceGeneration,
    ) -> Result<&PingPong> {
        let fresh = self
            .pairs
            .get(swapchain)
            .is_some_and(|p| p.size == size && p.generation == generation);

        if !fresh {
            log::debug!(
                "creating or resizing resources for swapchain '{}' ({}x{})",
                swapchain.name(),
                size.width,
                size.height
            );
            let pair = PingPong::new(swapchain.name(), size, generation)?;
            self.pairs.insert(swapchain.clone(), pair);
        }

        self.pairs.get(swapchain).ok_or_else(|| {
            EngineError::Backend(format!("swapchain '{}' vanished", swapchain.name()))
        })
    }

    /// Image written during the previous frame.
    pub fn read_image(
        &mut self,
        swapchain: &FrameSwapchain,
        size: Viewport,
        generation: SurfaceGeneration,
    ) -> Result<RenderTargetImage> {
        Ok(self.pair(swapchain, size, generation)?.read().clone())
    }

    /// Image being written this frame.
    pub fn write_image(
        &mut self,
        swapchain: &FrameSwapchain,
        size: Viewport,
        generation: SurfaceGeneration,
    ) -> Result<RenderTargetImage> {
        Ok(self.pair(swapchain, size, generation)?.write().clone())
    }

    pub fn read_texture<B: GpuBackend + ?Sized>(
        &mut self,
        swapchain: &FrameSwapchain,
        size: Viewport,
        generation: SurfaceGeneration,
        textures: &mut TextureCache,
        backend: &mut B,
    ) -> Result<TextureHandle> {
        let image = self.read_image(swapchain, size, generation)?;
        textures.resolve(&Image2D::RenderTarget(image), generation, backend)
    }

    pub fn write_texture<B: GpuBackend + ?Sized>(
        &mut self,
        swapchain: &FrameSwapchain,
        size: Viewport,
        generation: SurfaceGeneration,
        textures: &mut TextureCache,
        backend: &mut B,
    ) -> Result<TextureHandle> {
        let image = self.write_image(swapchain, size, generation)?;
        textures.resolve(&Image2D::RenderTarget(image), generation, backend)
    }

    pub fn write_framebuffer<B: GpuBackend + ?Sized>(
        &mut self,
        swapchain: &FrameSwapchain,
        size: Viewport,
        generation: SurfaceGeneration,
        textures: &mut TextureCache,
        framebuffers: &mut FramebufferCache,
        backend: &mut B,
    ) -> Result<FramebufferHandle> {
        let image = self.write_image(swapchain, size, generation)?;
        framebuffers.resolve(&FramebufferDesc::single(image), generation, textures, backend)
    }

    /// Flips read/write on every pair.
    pub fn swap_all(&mut self) {
        for pair in self.pairs.values_mut() {
            pair.read_is_ping = !pair.read_is_ping;
        }
    }

    /// Forgets every pair; their textures live in the texture cache and are
    /// dropped with it.
    pub fn destroy(&mut self) -> usize {
        let count = self.pairs.len();
        self.pairs.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}
