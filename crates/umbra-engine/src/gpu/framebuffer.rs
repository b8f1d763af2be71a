use crate::error::{EngineError, Result};
use crate::scene::{FramebufferDesc, Image2D};

use super::{FramebufferHandle, GpuBackend, ObjectCache, SurfaceGeneration, TextureCache};

/// Offscreen framebuffers keyed by their attachment list.
pub struct FramebufferCache {
    cache: ObjectCache<FramebufferDesc, FramebufferHandle>,
}

impl FramebufferCache {
    pub fn new() -> Self {
        Self {
            cache: ObjectCache::new("framebuffer"),
        }
    }

    /// Resolves `desc`, creating its attachments through `textures` first.
    ///
    /// Fails with [`EngineError::IncompleteFramebuffer`] when the descriptor has
    /// no attachments or the attachments differ in size.
    pub fn resolve<B: GpuBackend + ?Sized>(
        &mut self,
        desc: &FramebufferDesc,
        generation: SurfaceGeneration,
        textures: &mut TextureCache,
        backend: &mut B,
    ) -> Result<FramebufferHandle> {
        self.cache
            .resolve_or_create(desc, generation, |desc| {
                check_complete(desc)?;

                let attachments = desc
                    .attachments()
                    .iter()
                    .map(|rt| {
                        textures
                            .resolve(&Image2D::RenderTarget(rt.clone()), generation, backend)
                            .map(|t| t.raw())
                    })
                    .collect::<Result<Vec<_>>>()?;

                let raw = backend.create_framebuffer(desc, &attachments)?;
                Ok(FramebufferHandle::new(raw, generation))
            })
            .copied()
    }

    pub fn destroy(&mut self) -> usize {
        self.cache.destroy()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for FramebufferCache {
    fn default() -> Self {
        Self::new()
    }
}

fn check_complete(desc: &FramebufferDesc) -> Result<()> {
    let Some(size) = desc.size() else {
        return Err(EngineError::IncompleteFramebuffer {
            width: 0,
            height: 0,
            reason: "no color attachments".to_string(),
        });
    };

    if let Some(odd) = desc.attachments().iter().find(|rt| rt.size() != size) {
        return Err(EngineError::IncompleteFramebuffer {
            width: size.width,
            height: size.height,
            reason: format!(
                "attachment '{}' is {}x{}",
                odd.name(),
                odd.width(),
                odd.height()
            ),
        });
    }

    Ok(())
}
