use std::sync::Arc;

use crate::coords::Viewport;

use super::{Image2D, RenderTargetImage};

/// Stable logical name of a persistent ping-pong resource pair.
///
/// The name is the identity; the engine maps it to backend resources on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameSwapchain {
    name: Arc<str>,
}

impl FrameSwapchain {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Where a pass renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The presentation surface.
    Screen,
    /// A named offscreen image.
    Image(RenderTargetImage),
    /// The *write* half of a swapchain, sized to the render-target viewport.
    Swapchain(FrameSwapchain),
}

/// Where a sampler reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureSource {
    Image(Image2D),
    /// The *read* half of a swapchain (the previous frame).
    Swapchain(FrameSwapchain),
}

/// Framebuffer made of one or more equally sized color attachments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferDesc {
    attachments: Vec<RenderTargetImage>,
}

impl FramebufferDesc {
    pub fn new(attachments: Vec<RenderTargetImage>) -> Self {
        Self { attachments }
    }

    pub fn single(attachment: RenderTargetImage) -> Self {
        Self::new(vec![attachment])
    }

    #[inline]
    pub fn attachments(&self) -> &[RenderTargetImage] {
        &self.attachments
    }

    /// Size of the first attachment, if any.
    pub fn size(&self) -> Option<Viewport> {
        self.attachments.first().map(RenderTargetImage::size)
    }
}
