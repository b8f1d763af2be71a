use std::sync::Arc;

use crate::asset::ShaderAsset;
use crate::coords::Viewport;
use crate::engine::{EngineConfig, Renderer};
use crate::error::{EngineError, Result};
use crate::pipeline::{CommandBuffer, GpuCommand};
use crate::scene::{
    ClearColor, FramebufferDesc, Geometry, Image2D, Material, Primitive, RenderTarget,
    TextureSource, Uniform, ViewportRect,
};
use crate::shader::{Program, ShaderCache, ShaderIntrospector, ShaderMetadata};

use super::{
    FramebufferCache, FramebufferHandle, GeometryCache, GeometryHandle, GpuBackend, PassTarget,
    ProgramHandle, SurfaceGeneration, SwapchainManager, Tagged, TextureCache, TextureHandle,
    BLIT_TEXTURE,
};

/// What is bound inside the open pass.
#[derive(Default)]
struct PassState {
    open: bool,
    program: Option<Arc<Program>>,
    geometry: Option<GeometryHandle>,
}

/// Executes command buffers on a [`GpuBackend`].
///
/// Owns every GPU object cache. Screen passes cover the physical surface;
/// swapchain passes render at the quality-scaled render-target size; image
/// passes at the image size. Redundant program and geometry binds inside one
/// pass are skipped.
pub struct GpuRenderer<B: GpuBackend> {
    backend: B,
    quality: f32,
    generation: SurfaceGeneration,
    surface: Viewport,

    geometries: GeometryCache,
    textures: TextureCache,
    framebuffers: FramebufferCache,
    swapchains: SwapchainManager,
    shaders: ShaderCache,
    blit: ShaderAsset,

    pass: PassState,
    frame_open: bool,
}

impl<B: GpuBackend> GpuRenderer<B> {
    pub fn new(backend: B, config: &EngineConfig) -> Self {
        let blit = backend.blit_shader();
        Self {
            backend,
            quality: config.effective_quality(),
            generation: SurfaceGeneration::default(),
            surface: Viewport::default(),
            geometries: GeometryCache::new(),
            textures: TextureCache::new(),
            framebuffers: FramebufferCache::new(),
            swapchains: SwapchainManager::new(),
            shaders: ShaderCache::new(),
            blit,
            pass: PassState::default(),
            frame_open: false,
        }
    }

    // ── accessors ───────────────────────────────────────────────────────

    #[inline]
    pub fn generation(&self) -> SurfaceGeneration {
        self.generation
    }

    #[inline]
    pub fn surface(&self) -> Viewport {
        self.surface
    }

    /// Surface size scaled by the quality factor; the size of every swapchain.
    pub fn render_target_viewport(&self) -> Viewport {
        self.surface.scaled(self.quality)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Whether `handle` belongs to the current surface.
    pub fn is_current<H: Tagged + ?Sized>(&self, handle: &H) -> bool {
        handle.generation() == self.generation
    }

    /// Total number of cached GPU objects across all caches.
    pub fn cached_objects(&self) -> usize {
        self.geometries.len()
            + self.textures.len()
            + self.framebuffers.len()
            + self.shaders.len()
            + self.swapchains.len()
    }

    // ── resolution ──────────────────────────────────────────────────────

    /// Compiles (or fetches) the program for `shader`.
    pub fn program(&mut self, shader: &ShaderAsset) -> Result<Arc<Program>> {
        let program = Arc::clone(self.shaders.get(shader, self.generation, &mut self.backend)?);
        self.ensure_current(&program.handle(), ProgramHandle::KIND)?;
        Ok(program)
    }

    /// Creates (or fetches) the texture for `image`.
    pub fn texture(&mut self, image: &Image2D) -> Result<TextureHandle> {
        let handle = self
            .textures
            .resolve(image, self.generation, &mut self.backend)?;
        self.ensure_current(&handle, TextureHandle::KIND)?;
        Ok(handle)
    }

    fn ensure_current<H: Tagged>(&self, handle: &H, kind: &'static str) -> Result<()> {
        if self.is_current(handle) {
            Ok(())
        } else {
            Err(EngineError::StaleHandle { kind })
        }
    }

    fn geometry(&mut self, geometry: &Geometry) -> Result<GeometryHandle> {
        let handle = self
            .geometries
            .resolve(geometry, self.generation, &mut self.backend)?;
        self.ensure_current(&handle, GeometryHandle::KIND)?;
        Ok(handle)
    }

    /// Texture a sampler reads: a swapchain yields its *read* half.
    fn sampled_texture(&mut self, source: &TextureSource) -> Result<TextureHandle> {
        match source {
            TextureSource::Image(image) => self.texture(image),
            TextureSource::Swapchain(swapchain) => {
                let size = self.render_target_viewport();
                let handle = self.swapchains.read_texture(
                    swapchain,
                    size,
                    self.generation,
                    &mut self.textures,
                    &mut self.backend,
                )?;
                self.ensure_current(&handle, TextureHandle::KIND)?;
                Ok(handle)
            }
        }
    }

    fn resolve_target(&mut self, target: &RenderTarget) -> Result<(PassTarget, Viewport)> {
        let (framebuffer, size) = match target {
            RenderTarget::Screen => return Ok((PassTarget::Screen, self.surface)),
            RenderTarget::Image(image) => {
                let fb = self.framebuffers.resolve(
                    &FramebufferDesc::single(image.clone()),
                    self.generation,
                    &mut self.textures,
                    &mut self.backend,
                )?;
                (fb, image.size())
            }
            RenderTarget::Swapchain(swapchain) => {
                let size = self.render_target_viewport();
                let fb = self.swapchains.write_framebuffer(
                    swapchain,
                    size,
                    self.generation,
                    &mut self.textures,
                    &mut self.framebuffers,
                    &mut self.backend,
                )?;
                (fb, size)
            }
        };

        self.ensure_current(&framebuffer, FramebufferHandle::KIND)?;
        Ok((PassTarget::Framebuffer(framebuffer.raw()), size))
    }

    // ── execution ───────────────────────────────────────────────────────

    fn require_pass(&self, command: &GpuCommand) -> Result<()> {
        if self.pass.open {
            Ok(())
        } else {
            Err(EngineError::InvalidState(format!(
                "{} outside of a pass",
                command.name()
            )))
        }
    }

    fn execute_command(&mut self, command: &GpuCommand) -> Result<()> {
        match command {
            GpuCommand::BeginPass {
                target,
                clear,
                viewport,
            } => self.begin_pass(target, *clear, *viewport),

            GpuCommand::EndPass => {
                self.require_pass(command)?;
                self.backend.end_pass()?;
                self.pass = PassState::default();
                Ok(())
            }

            GpuCommand::BindProgram(material) => {
                self.require_pass(command)?;
                self.bind_program(material)
            }

            GpuCommand::SetUniforms(material) => {
                self.require_pass(command)?;
                let Some(program) = self.pass.program.clone() else {
                    log::warn!("SetUniforms without a bound program; skipped");
                    return Ok(());
                };
                self.upload_uniforms(&program, material)
            }

            GpuCommand::BindGeometry(geometry) => {
                self.require_pass(command)?;
                let handle = self.geometry(geometry)?;
                if self.pass.geometry != Some(handle) {
                    self.backend.bind_geometry(handle.raw())?;
                    self.pass.geometry = Some(handle);
                }
                Ok(())
            }

            GpuCommand::Draw {
                vertex_count,
                first_vertex,
                primitive,
            } => {
                self.require_pass(command)?;
                if self.pass.program.is_none() {
                    return Err(EngineError::InvalidState(
                        "Draw without a bound program".to_string(),
                    ));
                }
                self.backend.draw(*vertex_count, *first_vertex, *primitive)
            }

            GpuCommand::Blit { src, dst } => {
                if self.pass.open {
                    return Err(EngineError::InvalidState(
                        "Blit inside an open pass".to_string(),
                    ));
                }
                self.blit(src, dst)
            }
        }
    }

    fn begin_pass(
        &mut self,
        target: &RenderTarget,
        clear: Option<ClearColor>,
        viewport: Option<ViewportRect>,
    ) -> Result<()> {
        if self.pass.open {
            return Err(EngineError::InvalidState(
                "BeginPass while another pass is open".to_string(),
            ));
        }

        let (target, size) = self.resolve_target(target)?;
        let rect = viewport.unwrap_or_else(|| full_rect(size));
        self.backend.begin_pass(target, rect, clear)?;
        self.pass = PassState {
            open: true,
            ..PassState::default()
        };
        Ok(())
    }

    fn bind_program(&mut self, material: &Material) -> Result<()> {
        let program = self.program(material.shader())?;
        let bound = self
            .pass
            .program
            .as_ref()
            .is_some_and(|p| p.handle() == program.handle());

        if !bound {
            self.backend.use_program(program.handle().raw())?;
            self.pass.program = Some(program);
        }
        Ok(())
    }

    /// Sets every active uniform of `material`; samplers take consecutive
    /// texture units in uniform-name order, starting at 0.
    fn upload_uniforms(&mut self, program: &Program, material: &Material) -> Result<()> {
        let mut unit = 0;
        for (name, value) in material.uniforms() {
            let location = program.locate(name);
            if !location.is_found() {
                continue;
            }

            match value {
                Uniform::Sampler2D(source) => {
                    let texture = self.sampled_texture(source)?;
                    self.backend.bind_texture(location, unit, texture.raw())?;
                    unit += 1;
                }
                other => self.backend.set_uniform(location, other)?,
            }
        }
        Ok(())
    }

    /// Full-screen copy of `src` onto `dst`. A swapchain source yields its
    /// *write* half, the image rendered earlier this frame.
    fn blit(&mut self, src: &TextureSource, dst: &RenderTarget) -> Result<()> {
        let texture = match src {
            TextureSource::Image(image) => self.texture(image)?,
            TextureSource::Swapchain(swapchain) => {
                let size = self.render_target_viewport();
                let handle = self.swapchains.write_texture(
                    swapchain,
                    size,
                    self.generation,
                    &mut self.textures,
                    &mut self.backend,
                )?;
                self.ensure_current(&handle, TextureHandle::KIND)?;
                handle
            }
        };

        let blit = self.blit.clone();
        let program = self.program(&blit)?;
        let quad_geometry = Geometry::fullscreen_quad();
        let quad = self.geometry(&quad_geometry)?;
        let (target, size) = self.resolve_target(dst)?;

        self.backend.begin_pass(target, full_rect(size), None)?;
        self.backend.use_program(program.handle().raw())?;
        self.backend
            .bind_texture(program.locate(BLIT_TEXTURE), 0, texture.raw())?;
        self.backend.bind_geometry(quad.raw())?;
        self.backend
            .draw(quad_geometry.vertex_count(), 0, Primitive::TriangleStrip)?;
        self.backend.end_pass()
    }

    /// Drops every cached object; returns how many there were.
    fn destroy_caches(&mut self) -> usize {
        self.geometries.destroy()
            + self.textures.destroy()
            + self.framebuffers.destroy()
            + self.shaders.destroy()
            + self.swapchains.destroy()
    }

    fn reset_frame_state(&mut self) {
        self.pass = PassState::default();
        self.frame_open = false;
    }
}

fn full_rect(size: Viewport) -> ViewportRect {
    ViewportRect::new(0, 0, size.width, size.height)
}

impl<B: GpuBackend> ShaderIntrospector for GpuRenderer<B> {
    fn introspect(&mut self, shader: &ShaderAsset) -> Result<ShaderMetadata> {
        Ok(self.program(shader)?.metadata())
    }
}

impl<B: GpuBackend> Renderer for GpuRenderer<B> {
    fn execute(&mut self, commands: &CommandBuffer) -> Result<()> {
        if !self.frame_open {
            self.backend.begin_frame()?;
            self.frame_open = true;
        }

        for command in commands {
            self.execute_command(command)?;
        }

        if self.pass.open {
            return Err(EngineError::InvalidState(
                "command buffer ended inside an open pass".to_string(),
            ));
        }
        Ok(())
    }

    fn on_surface_created(&mut self) -> Result<()> {
        self.generation = self.generation.next();
        let dropped = self.destroy_caches();
        self.backend.release_all();
        self.reset_frame_state();
        log::info!(
            "surface created ({}); dropped {dropped} cached GPU objects",
            self.generation
        );
        Ok(())
    }

    fn on_surface_changed(&mut self, viewport: Viewport) {
        log::debug!("surface resized to {}x{}", viewport.width, viewport.height);
        self.surface = viewport;
        self.backend.resize(viewport);
    }

    fn end_frame(&mut self) -> Result<()> {
        let result = if self.frame_open {
            self.frame_open = false;
            self.backend.end_frame()
        } else {
            Ok(())
        };
        self.swapchains.swap_all();
        result
    }

    fn close(&mut self) {
        let dropped = self.destroy_caches();
        self.backend.release_all();
        self.reset_frame_state();
        log::debug!("renderer closed; dropped {dropped} cached GPU objects");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::TextureAsset;
    use crate::gpu::testing::RecordingBackend;
    use crate::pipeline::PassCompiler;
    use crate::scene::{DrawCall, FrameSwapchain, Pass, RenderTargetImage, TextureParameters};

    fn renderer() -> GpuRenderer<RecordingBackend> {
        let mut r = GpuRenderer::new(RecordingBackend::new(), &EngineConfig::with_quality(0.5));
        r.on_surface_created().unwrap();
        r.on_surface_changed(Viewport::new(100, 50));
        r.backend_mut().clear_calls();
        r
    }

    fn material(fragment: &str) -> Material {
        Material::new(Arc::new(ShaderAsset::new("vs", fragment)))
    }

    fn frame(r: &mut GpuRenderer<RecordingBackend>, passes: &[Pass]) {
        r.execute(&PassCompiler.compile(passes)).unwrap();
        r.end_frame().unwrap();
    }

    fn asset_image() -> Image2D {
        let asset = TextureAsset::new(1, 1, vec![255, 0, 0, 255]).unwrap();
        Image2D::from_asset(Arc::new(asset), TextureParameters::DEFAULT)
    }

    // ── command execution ─────────────────────────────────────────────────

    #[test]
    fn screen_pass_executes_in_order() {
        let mut r = renderer();
        let mat = material("time").with_uniform("time", 1.0_f32);
        let pass = Pass::single(RenderTarget::Screen, DrawCall::fullscreen(mat))
            .with_clear(ClearColor::BLACK);

        frame(&mut r, &[pass]);

        assert_eq!(
            r.backend().frame_calls(),
            [
                "begin_frame",
                "begin_pass screen 100x50 clear=true",
                "use_program #1",
                "set_uniform 0 float",
                "bind_geometry #2",
                "draw 4 0 TriangleStrip",
                "end_pass",
                "end_frame",
            ]
        );
    }

    #[test]
    fn inactive_uniforms_are_skipped_and_samplers_take_units() {
        let mut r = renderer();
        let mat = material("a noise feedback")
            .with_uniform("a", 2.0_f32)
            .with_uniform("missing", 3.0_f32)
            .with_uniform("noise", TextureSource::Image(asset_image()))
            .with_uniform(
                "feedback",
                TextureSource::Swapchain(FrameSwapchain::new("bb")),
            );

        frame(&mut r, &[Pass::single(RenderTarget::Screen, DrawCall::fullscreen(mat))]);

        let calls = r.backend().frame_calls();
        assert_eq!(r.backend().count("set_uniform"), 1);
        assert!(calls.contains(&"set_uniform 0 float"));
        let binds: Vec<&str> = calls
            .iter()
            .copied()
            .filter(|c| c.starts_with("bind_texture"))
            .collect();
        assert_eq!(binds.len(), 2);
        assert!(binds[0].starts_with("bind_texture 2 unit0"));
        assert!(binds[1].starts_with("bind_texture 1 unit1"));
    }

    #[test]
    fn redundant_binds_are_elided_within_a_pass() {
        let mut r = renderer();
        let mat = material("time").with_uniform("time", 1.0_f32);
        let draw = DrawCall::fullscreen(mat);
        let pass = Pass::new(RenderTarget::Screen)
            .with_draw(draw.clone())
            .with_draw(draw.clone());

        frame(&mut r, &[pass.clone(), pass]);

        let backend = r.backend();
        assert_eq!(backend.count("use_program"), 2);
        assert_eq!(backend.count("bind_geometry"), 2);
        assert_eq!(backend.count("set_uniform"), 4);
        assert_eq!(backend.count("draw"), 4);
    }

    #[test]
    fn set_uniforms_without_program_is_skipped() {
        let mut r = renderer();
        let commands: CommandBuffer = [
            GpuCommand::BeginPass {
                target: RenderTarget::Screen,
                clear: None,
                viewport: None,
            },
            GpuCommand::SetUniforms(material("time").with_uniform("time", 1.0_f32)),
            GpuCommand::EndPass,
        ]
        .into_iter()
        .collect();

        r.execute(&commands).unwrap();
        assert_eq!(r.backend().count("set_uniform"), 0);
    }

    #[test]
    fn misplaced_commands_are_rejected() {
        let mut r = renderer();
        let draw: CommandBuffer = [GpuCommand::Draw {
            vertex_count: 3,
            first_vertex: 0,
            primitive: Primitive::Triangles,
        }]
        .into_iter()
        .collect();
        assert!(matches!(r.execute(&draw), Err(EngineError::InvalidState(_))));

        let mut r = renderer();
        let unterminated: CommandBuffer = [GpuCommand::BeginPass {
            target: RenderTarget::Screen,
            clear: None,
            viewport: None,
        }]
        .into_iter()
        .collect();
        assert!(matches!(r.execute(&unterminated), Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn explicit_viewport_overrides_target_size() {
        let mut r = renderer();
        let rt = RenderTargetImage::new("offscreen", 64, 64).unwrap();
        let pass = Pass::new(RenderTarget::Image(rt)).with_viewport(ViewportRect::new(0, 0, 32, 16));

        frame(&mut r, &[pass]);
        assert!(r.backend().calls().iter().any(|c| c.starts_with("begin_pass fb#") && c.contains("32x16")));
    }

    // ── swapchains ────────────────────────────────────────────────────────

    #[test]
    fn swapchain_pass_renders_at_quality_scaled_size() {
        let mut r = renderer();
        let pass = Pass::new(RenderTarget::Swapchain(FrameSwapchain::new("bb")));

        frame(&mut r, &[pass]);

        let calls = r.backend().calls();
        assert!(calls.iter().any(|c| c.starts_with("create_texture bb_pong 50x25")));
        assert!(calls.iter().any(|c| c.starts_with("begin_pass fb#") && c.contains("50x25")));
    }

    #[test]
    fn blit_from_swapchain_samples_this_frames_write_texture() {
        let mut r = renderer();
        let bb = FrameSwapchain::new("bb");
        let mut commands = PassCompiler.compile(&[Pass::new(RenderTarget::Swapchain(bb.clone()))]);
        commands.push(GpuCommand::Blit {
            src: TextureSource::Swapchain(bb),
            dst: RenderTarget::Screen,
        });

        r.execute(&commands).unwrap();

        let calls = r.backend().calls();
        let fb = calls
            .iter()
            .find(|c| c.starts_with("create_framebuffer"))
            .unwrap();
        let written = &fb[fb.find('[').unwrap() + 1..fb.find(']').unwrap()];
        assert!(calls.contains(&format!("bind_texture 0 unit0 #{written}")));
        assert!(calls.contains(&"draw 4 0 TriangleStrip".to_string()));
    }

    #[test]
    fn blit_inside_a_pass_is_rejected() {
        let mut r = renderer();
        let commands: CommandBuffer = [
            GpuCommand::BeginPass {
                target: RenderTarget::Screen,
                clear: None,
                viewport: None,
            },
            GpuCommand::Blit {
                src: TextureSource::Image(asset_image()),
                dst: RenderTarget::Screen,
            },
        ]
        .into_iter()
        .collect();

        assert!(matches!(r.execute(&commands), Err(EngineError::InvalidState(_))));
    }

    // ── caching and surface lifetime ──────────────────────────────────────

    #[test]
    fn repeated_resolution_returns_the_same_handle() {
        let mut r = renderer();
        let a = r.texture(&asset_image()).unwrap();
        let b = r.texture(&asset_image()).unwrap();

        assert_eq!(a, b);
        assert_eq!(r.backend().count("create_texture"), 1);
    }

    #[test]
    fn surface_recreated_twice_invalidates_every_handle() {
        let mut r = renderer();
        let shader = ShaderAsset::new("vs", "time");
        let texture = r.texture(&asset_image()).unwrap();
        let program = r.program(&shader).unwrap();
        frame(
            &mut r,
            &[Pass::new(RenderTarget::Swapchain(FrameSwapchain::new("bb")))],
        );
        assert!(r.cached_objects() > 0);

        r.on_surface_created().unwrap();
        r.on_surface_created().unwrap();

        assert_eq!(r.cached_objects(), 0);
        assert!(!r.is_current(&texture));
        assert!(!r.is_current(&*program));
        assert_eq!(r.backend().count("release_all"), 2);

        let recreated = r.texture(&asset_image()).unwrap();
        assert_ne!(recreated, texture);
        assert!(r.is_current(&recreated));
    }

    #[test]
    fn introspection_reports_active_uniforms() {
        let mut r = renderer();
        let meta = r.introspect(&ShaderAsset::new("vs", "time resolution")).unwrap();
        assert!(meta.is_active("time"));
        assert!(meta.is_active("resolution"));
        assert!(!meta.is_active("touch"));
    }

    #[test]
    fn close_releases_everything() {
        let mut r = renderer();
        r.texture(&asset_image()).unwrap();
        r.close();
        assert_eq!(r.cached_objects(), 0);
        assert_eq!(r.backend().count("release_all"), 1);
    }
}
