//! GPU-free [`GpuBackend`] that records every call.

use rustc_hash::FxHashMap;

use crate::asset::ShaderAsset;
use crate::coords::Viewport;
use crate::error::Result;
use crate::scene::{ClearColor, FramebufferDesc, Geometry, Image2D, Primitive, Uniform, ViewportRect};
use crate::shader::UniformLocation;

use super::{CompiledProgram, GpuBackend, PassTarget, ProgramError, ProgramStage, RawHandle};

/// Each whitespace-separated token of a fragment source becomes an active
/// uniform, located at its token index. The blit program's fragment source is
/// therefore just `tex`.
pub(crate) struct RecordingBackend {
    calls: Vec<String>,
    uniforms: Vec<(UniformLocation, Uniform)>,
    next_id: RawHandle,
    compile_failure: Option<ProgramError>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            uniforms: Vec::new(),
            next_id: 1,
            compile_failure: None,
        }
    }

    pub fn fail_compile(&mut self, stage: ProgramStage, log: &str) {
        self.compile_failure = Some(ProgramError {
            stage,
            log: log.to_string(),
        });
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Recorded calls minus object creation.
    pub fn frame_calls(&self) -> Vec<&str> {
        self.calls
            .iter()
            .map(String::as_str)
            .filter(|c| !c.starts_with("create_") && !c.starts_with("compile_"))
            .collect()
    }

    /// Number of calls whose first word is `name`.
    pub fn count(&self, name: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(name))
            .count()
    }

    /// Most recent value set at `location`.
    pub fn last_uniform(&self, location: UniformLocation) -> Option<&Uniform> {
        self.uniforms
            .iter()
            .rev()
            .find(|(loc, _)| *loc == location)
            .map(|(_, value)| value)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
        self.uniforms.clear();
    }

    fn id(&mut self) -> RawHandle {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GpuBackend for RecordingBackend {
    fn create_geometry(&mut self, geometry: &Geometry) -> Result<RawHandle> {
        let id = self.id();
        self.calls
            .push(format!("create_geometry {} #{id}", geometry.vertex_count()));
        Ok(id)
    }

    fn create_texture(&mut self, image: &Image2D) -> Result<RawHandle> {
        let id = self.id();
        let name = match image {
            Image2D::RenderTarget(rt) => rt.name().to_string(),
            Image2D::FromAsset { .. } => "asset".to_string(),
        };
        let size = image.size();
        self.calls
            .push(format!("create_texture {name} {}x{} #{id}", size.width, size.height));
        Ok(id)
    }

    fn create_framebuffer(&mut self, _desc: &FramebufferDesc, attachments: &[RawHandle]) -> Result<RawHandle> {
        let id = self.id();
        self.calls
            .push(format!("create_framebuffer {attachments:?} #{id}"));
        Ok(id)
    }

    fn compile_program(&mut self, shader: &ShaderAsset) -> std::result::Result<CompiledProgram, ProgramError> {
        if let Some(err) = self.compile_failure.clone() {
            return Err(err);
        }

        let id = self.id();
        self.calls.push(format!("compile_program #{id}"));
        let uniforms: FxHashMap<String, UniformLocation> = shader
            .fragment_source()
            .split_whitespace()
            .enumerate()
            .map(|(i, name)| (name.to_string(), UniformLocation(i as i32)))
            .collect();
        Ok(CompiledProgram {
            handle: id,
            uniforms,
        })
    }

    fn release_all(&mut self) {
        self.calls.push("release_all".to_string());
    }

    fn blit_shader(&self) -> ShaderAsset {
        ShaderAsset::new("blit-vs", super::BLIT_TEXTURE)
    }

    fn resize(&mut self, surface: Viewport) {
        self.calls
            .push(format!("resize {}x{}", surface.width, surface.height));
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.calls.push("begin_frame".to_string());
        Ok(())
    }

    fn begin_pass(&mut self, target: PassTarget, viewport: ViewportRect, clear: Option<ClearColor>) -> Result<()> {
        let target = match target {
            PassTarget::Screen => "screen".to_string(),
            PassTarget::Framebuffer(fb) => format!("fb#{fb}"),
        };
        self.calls.push(format!(
            "begin_pass {target} {}x{} clear={}",
            viewport.width,
            viewport.height,
            clear.is_some()
        ));
        Ok(())
    }

    fn use_program(&mut self, program: RawHandle) -> Result<()> {
        self.calls.push(format!("use_program #{program}"));
        Ok(())
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &Uniform) -> Result<()> {
        self.calls
            .push(format!("set_uniform {} {}", location.0, value.kind()));
        self.uniforms.push((location, value.clone()));
        Ok(())
    }

    fn bind_texture(&mut self, location: UniformLocation, unit: u32, texture: RawHandle) -> Result<()> {
        self.calls
            .push(format!("bind_texture {} unit{unit} #{texture}", location.0));
        Ok(())
    }

    fn bind_geometry(&mut self, geometry: RawHandle) -> Result<()> {
        self.calls.push(format!("bind_geometry #{geometry}"));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32, primitive: Primitive) -> Result<()> {
        self.calls
            .push(format!("draw {vertex_count} {first_vertex} {primitive:?}"));
        Ok(())
    }

    fn end_pass(&mut self) -> Result<()> {
        self.calls.push("end_pass".to_string());
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.calls.push("end_frame".to_string());
        Ok(())
    }
}
