use crate::data::{keys, ConstantProvider};
use crate::engine::{EngineContext, Plugin};
use crate::error::Result;
use crate::scene::{FrameSwapchain, RenderTarget, TextureSource};

/// Publishes one feedback swapchain through [`keys::BACKBUFFER_TEXTURE`]
/// (last frame, for sampling) and [`keys::BACKBUFFER_TARGET`] (this frame,
/// for rendering).
#[derive(Debug, Clone)]
pub struct BackbufferPlugin {
    swapchain: FrameSwapchain,
}

impl BackbufferPlugin {
    pub const DEFAULT_NAME: &'static str = "default_backbuffer";

    pub fn new() -> Self {
        Self::named(Self::DEFAULT_NAME)
    }

    pub fn named(name: &str) -> Self {
        Self {
            swapchain: FrameSwapchain::new(name),
        }
    }

    pub fn swapchain(&self) -> &FrameSwapchain {
        &self.swapchain
    }
}

impl Default for BackbufferPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for BackbufferPlugin {
    fn on_setup(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        let texture = TextureSource::Swapchain(self.swapchain.clone());
        let target = RenderTarget::Swapchain(self.swapchain.clone());

        ctx.register_provider(&keys::BACKBUFFER_TEXTURE, move || {
            ConstantProvider::new(texture.clone())
        });
        ctx.register_provider(&keys::BACKBUFFER_TARGET, move || {
            ConstantProvider::new(target.clone())
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::engine;

    #[test]
    fn both_halves_name_the_same_swapchain() {
        let mut engine = engine(&[]);
        engine.register_plugin(BackbufferPlugin::new());
        engine.setup().unwrap();

        let swapchain = FrameSwapchain::new(BackbufferPlugin::DEFAULT_NAME);
        assert_eq!(
            engine.data_mut().get(&keys::BACKBUFFER_TEXTURE),
            Some(TextureSource::Swapchain(swapchain.clone()))
        );
        assert_eq!(
            engine.data_mut().get(&keys::BACKBUFFER_TARGET),
            Some(RenderTarget::Swapchain(swapchain))
        );
    }
}
