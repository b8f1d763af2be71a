use std::collections::BTreeSet;
use std::sync::Arc;

use crate::asset::{AssetRef, ShaderAsset, TextureAsset};
use crate::data::keys;
use crate::engine::{EngineContext, Plugin};
use crate::error::Result;
use crate::pipeline::GpuCommand;
use crate::scene::{
    DrawCall, FrameSwapchain, Image2D, Material, Pass, RenderTarget, TextureSource, Uniform,
};
use crate::shader::parse_sampler_hints;
use crate::uniform::UniformBinder;

/// Uniform name that opts a shader into the feedback backbuffer.
pub const BACKBUFFER_UNIFORM: &str = "backbuffer";

/// Swapchain a reduced-quality shader renders into before the blit.
pub const OFFSCREEN_SWAPCHAIN: &str = "shader_runner_offscreen";

struct Prepared {
    material: Material,
    binder: UniformBinder,
    active: BTreeSet<String>,
    feedback: bool,
}

/// Renders one fragment shader over the whole screen every frame.
///
/// Setup loads the shader, introspects its active uniforms, binds the stock
/// data keys to them and loads every texture named by a sampler hint. A
/// shader that samples `backbuffer` is rendered into the backbuffer
/// swapchain and then blitted to the screen, so it can read its own
/// previous frame.
///
/// When the render-target resolution is below the physical one (quality
/// under 1), the shader is drawn at render-target size into
/// [`OFFSCREEN_SWAPCHAIN`] and blitted up, so `resolution` always matches
/// the pass it is drawn in.
pub struct ShaderRunnerPlugin {
    source: AssetRef,
    offscreen: FrameSwapchain,
    prepared: Option<Prepared>,
}

impl ShaderRunnerPlugin {
    pub fn new(source: AssetRef) -> Self {
        Self {
            source,
            offscreen: FrameSwapchain::new(OFFSCREEN_SWAPCHAIN),
            prepared: None,
        }
    }

    /// Active uniforms of the loaded shader; empty before setup.
    pub fn active_uniforms(&self) -> BTreeSet<String> {
        self.prepared
            .as_ref()
            .map(|p| p.active.clone())
            .unwrap_or_default()
    }
}

impl Plugin for ShaderRunnerPlugin {
    fn on_setup(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        let shader: Arc<ShaderAsset> = ctx.load(&self.source)?;
        let metadata = ctx.introspect(&shader)?;
        let mut material = Material::new(Arc::clone(&shader));

        let feedback = metadata.is_active(BACKBUFFER_UNIFORM);
        let mut binder = UniformBinder::builder().extend(ctx.default_bindings());
        if feedback {
            binder = binder.bind(BACKBUFFER_UNIFORM, keys::BACKBUFFER_TEXTURE, Uniform::Sampler2D);
            if ctx.get(&keys::BACKBUFFER_TARGET).is_none() {
                log::warn!("shader samples '{BACKBUFFER_UNIFORM}' but no backbuffer is registered");
            }
        }

        for hint in parse_sampler_hints(shader.fragment_source(), &metadata.active_uniforms) {
            if hint.name == BACKBUFFER_UNIFORM {
                continue;
            }
            let texture: Arc<TextureAsset> = ctx.load(&hint.source)?;
            let image = Image2D::from_asset(texture, hint.parameters);
            material.set_uniform(hint.name, TextureSource::Image(image));
        }

        log::info!(
            "shader ready: {} active uniform(s){}",
            metadata.active_uniforms.len(),
            if feedback { ", with feedback" } else { "" }
        );

        self.prepared = Some(Prepared {
            material,
            binder: binder.build(),
            active: metadata.active_uniforms,
            feedback,
        });
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        let Some(prepared) = self.prepared.as_mut() else {
            return Ok(());
        };

        prepared
            .binder
            .apply(ctx.data(), &prepared.active, &mut prepared.material);
        let draw = DrawCall::fullscreen(prepared.material.clone());

        let feedback = if prepared.feedback {
            ctx.get(&keys::BACKBUFFER_TARGET)
        } else {
            None
        };
        let target = match feedback {
            Some(target) => target,
            None if is_downscaled(ctx) => RenderTarget::Swapchain(self.offscreen.clone()),
            None => RenderTarget::Screen,
        };

        let src = match &target {
            RenderTarget::Swapchain(swapchain) => Some(TextureSource::Swapchain(swapchain.clone())),
            RenderTarget::Image(image) => Some(TextureSource::Image(image.clone().into())),
            RenderTarget::Screen => None,
        };
        ctx.submit(&[Pass::single(target, draw)]);
        if let Some(src) = src {
            ctx.push_command(GpuCommand::Blit {
                src,
                dst: RenderTarget::Screen,
            });
        }
        Ok(())
    }

    fn on_teardown(&mut self, _ctx: &mut EngineContext<'_>) -> Result<()> {
        self.prepared = None;
        Ok(())
    }
}

/// Whether render targets are smaller than the physical surface.
fn is_downscaled(ctx: &mut EngineContext<'_>) -> bool {
    match (
        ctx.get(&keys::PHYSICAL_VIEWPORT_RESOLUTION),
        ctx.get(&keys::RENDER_TARGET_RESOLUTION),
    ) {
        (Some(physical), Some(target)) => physical != target,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::engine::EngineConfig;
    use crate::plugins::testing::{engine, engine_with, png};
    use crate::shader::UniformLocation;
    use crate::plugins::{BackbufferPlugin, TimePlugin};

    fn runner() -> ShaderRunnerPlugin {
        ShaderRunnerPlugin::new(AssetRef::alias("main"))
    }

    // ── plain shaders ─────────────────────────────────────────────────────

    #[test]
    fn draws_one_fullscreen_pass_to_screen() {
        let mut engine = engine(&[("main", b"time resolution".as_slice())]);
        engine.register_plugin(TimePlugin::new());
        engine.register_plugin(runner());
        engine.set_viewport(64, 32);
        engine.setup().unwrap();
        engine.renderer_mut().backend_mut().clear_calls();

        engine.render_frame().unwrap();

        let backend = engine.renderer().backend();
        assert_eq!(backend.count("begin_pass"), 1);
        assert!(backend.calls().contains(&"begin_pass screen 64x32 clear=false".to_string()));
        assert_eq!(backend.count("set_uniform"), 2);
        assert!(backend.calls().contains(&"draw 4 0 TriangleStrip".to_string()));
    }

    #[test]
    fn reduced_quality_renders_at_target_size_then_blits() {
        let shader = b"resolution".as_slice();
        let mut engine = engine_with(&[("main", shader)], EngineConfig::with_quality(0.5));
        engine.register_plugin(runner());
        engine.set_viewport(64, 32);
        engine.setup().unwrap();
        engine.renderer_mut().backend_mut().clear_calls();

        engine.render_frame().unwrap();

        let backend = engine.renderer().backend();
        let passes: Vec<&String> = backend
            .calls()
            .iter()
            .filter(|c| c.starts_with("begin_pass"))
            .collect();
        assert_eq!(passes.len(), 2);
        assert!(passes[0].starts_with("begin_pass fb#"));
        assert!(passes[0].ends_with(" 32x16 clear=false"));
        assert_eq!(passes[1], "begin_pass screen 64x32 clear=false");
        assert_eq!(
            backend.last_uniform(UniformLocation(0)),
            Some(&Uniform::Vec2([32.0, 16.0]))
        );
    }

    #[test]
    fn full_quality_binds_the_screen_resolution() {
        let mut engine = engine(&[("main", b"resolution".as_slice())]);
        engine.register_plugin(runner());
        engine.set_viewport(64, 32);
        engine.setup().unwrap();

        engine.render_frame().unwrap();

        let backend = engine.renderer().backend();
        assert_eq!(backend.count("begin_pass"), 1);
        assert_eq!(
            backend.last_uniform(UniformLocation(0)),
            Some(&Uniform::Vec2([64.0, 32.0]))
        );
    }

    #[test]
    fn missing_shader_fails_setup() {
        let mut engine = engine(&[]);
        engine.register_plugin(runner());

        let err = engine.setup().unwrap_err();
        assert!(matches!(err, EngineError::AssetLoad { .. }));
        assert_eq!(engine.last_error(), Some(&err));
    }

    // ── textures ──────────────────────────────────────────────────────────

    #[test]
    fn sampler_hints_load_textures() {
        let shader = b"noise\nuniform sampler2D noise; /// src:tex/noise.png;min:n;s:r".as_slice();
        let image = png(2, 2);
        let mut engine = engine(&[("main", shader), ("tex/noise.png", &image)]);
        engine.register_plugin(runner());
        engine.setup().unwrap();

        engine.render_frame().unwrap();

        let backend = engine.renderer().backend();
        assert!(backend.calls().iter().any(|c| c.starts_with("create_texture asset 2x2")));
        assert_eq!(backend.count("bind_texture"), 1);
    }

    // ── feedback ──────────────────────────────────────────────────────────

    #[test]
    fn backbuffer_shaders_render_offscreen_then_blit() {
        let mut engine = engine(&[("main", b"backbuffer time".as_slice())]);
        engine.register_plugin(BackbufferPlugin::new());
        engine.register_plugin(runner());
        engine.set_viewport(10, 10);
        engine.setup().unwrap();
        engine.renderer_mut().backend_mut().clear_calls();

        engine.render_frame().unwrap();

        let backend = engine.renderer().backend();
        let passes: Vec<&String> = backend
            .calls()
            .iter()
            .filter(|c| c.starts_with("begin_pass"))
            .collect();
        assert_eq!(passes.len(), 2);
        assert!(passes[0].starts_with("begin_pass fb#"));
        assert_eq!(passes[1], "begin_pass screen 10x10 clear=false");
        // The shader samples last frame's half of the swapchain.
        assert_eq!(backend.count("bind_texture"), 2);
        assert_eq!(engine.plugins().active_len(), 2);
    }

    #[test]
    fn backbuffer_without_provider_falls_back_to_screen() {
        let mut engine = engine(&[("main", b"backbuffer".as_slice())]);
        engine.register_plugin(runner());
        engine.setup().unwrap();
        engine.renderer_mut().backend_mut().clear_calls();

        engine.render_frame().unwrap();

        let backend = engine.renderer().backend();
        assert_eq!(backend.count("begin_pass"), 1);
        assert_eq!(backend.count("bind_texture"), 0);
    }
}
