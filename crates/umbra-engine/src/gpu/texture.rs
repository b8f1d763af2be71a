use crate::error::Result;
use crate::scene::Image2D;

use super::{GpuBackend, ObjectCache, SurfaceGeneration, TextureHandle};

/// Textures keyed by image descriptor.
///
/// Render-target images used as framebuffer attachments are resolved through
/// this cache too, so sampling and rendering share one texture.
pub struct TextureCache {
    cache: ObjectCache<Image2D, TextureHandle>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self {
            cache: ObjectCache::new("texture"),
        }
    }

    pub fn resolve<B: GpuBackend + ?Sized>(
        &mut self,
        image: &Image2D,
        generation: SurfaceGeneration,
        backend: &mut B,
    ) -> Result<TextureHandle> {
        self.cache
            .resolve_or_create(image, generation, |img| {
                Ok(TextureHandle::new(backend.create_texture(img)?, generation))
            })
            .copied()
    }

    pub fn get(&self, image: &Image2D, generation: SurfaceGeneration) -> Option<TextureHandle> {
        self.cache.get(image, generation).copied()
    }

    pub fn destroy(&mut self) -> usize {
        self.cache.destroy()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}
