use rustc_hash::FxHashMap;

use crate::asset::ShaderAsset;
use crate::coords::Viewport;
use crate::error::Result;
use crate::scene::{ClearColor, FramebufferDesc, Geometry, Image2D, Primitive, Uniform, ViewportRect};
use crate::shader::UniformLocation;

use super::RawHandle;

/// Render destination of a pass, resolved to backend objects.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PassTarget {
    Screen,
    Framebuffer(RawHandle),
}

/// Stage a program build failed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProgramStage {
    Vertex,
    Fragment,
    Link,
}

/// Raw compiler failure: the stage plus its info log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramError {
    pub stage: ProgramStage,
    pub log: String,
}

/// Result of a successful program build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledProgram {
    pub handle: RawHandle,
    /// Active uniforms as reported by the backend, possibly with array suffixes.
    pub uniforms: FxHashMap<String, UniformLocation>,
}

/// Graphics API seam driven by [`GpuRenderer`](super::GpuRenderer).
///
/// Object creation is called only on cache misses. Per-frame calls arrive in
/// command order: `begin_frame`, then any number of
/// `begin_pass .. end_pass` groups, then `end_frame`.
pub trait GpuBackend {
    // ── objects ─────────────────────────────────────────────────────────
    fn create_geometry(&mut self, geometry: &Geometry) -> Result<RawHandle>;

    fn create_texture(&mut self, image: &Image2D) -> Result<RawHandle>;

    /// `attachments` are the texture handles backing each color attachment, in order.
    fn create_framebuffer(
        &mut self,
        desc: &FramebufferDesc,
        attachments: &[RawHandle],
    ) -> Result<RawHandle>;

    fn compile_program(&mut self, shader: &ShaderAsset) -> std::result::Result<CompiledProgram, ProgramError>;

    /// Destroys every object created so far.
    fn release_all(&mut self);

    /// Source of the program used for `Blit`; it samples a texture uniform named [`BLIT_TEXTURE`].
    fn blit_shader(&self) -> ShaderAsset;

    // ── surface ─────────────────────────────────────────────────────────
    fn resize(&mut self, surface: Viewport);

    // ── frame ───────────────────────────────────────────────────────────
    fn begin_frame(&mut self) -> Result<()>;

    fn begin_pass(
        &mut self,
        target: PassTarget,
        viewport: ViewportRect,
        clear: Option<ClearColor>,
    ) -> Result<()>;

    fn use_program(&mut self, program: RawHandle) -> Result<()>;

    /// Sets a non-sampler uniform of the current program.
    fn set_uniform(&mut self, location: UniformLocation, value: &Uniform) -> Result<()>;

    /// Binds `texture` to texture unit `unit` and points the sampler at `location` to it.
    fn bind_texture(&mut self, location: UniformLocation, unit: u32, texture: RawHandle) -> Result<()>;

    fn bind_geometry(&mut self, geometry: RawHandle) -> Result<()>;

    fn draw(&mut self, vertex_count: u32, first_vertex: u32, primitive: Primitive) -> Result<()>;

    fn end_pass(&mut self) -> Result<()>;

    /// Submits the frame's work and presents the surface if it was rendered to.
    fn end_frame(&mut self) -> Result<()>;
}

/// Texture uniform name every blit program samples from.
pub const BLIT_TEXTURE: &str = "tex";
