use std::borrow::Cow;
use std::ops::Range;

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::asset::ShaderAsset;
use crate::coords::Viewport;
use crate::error::{EngineError, Result};
use crate::gpu::{CompiledProgram, GpuBackend, PassTarget, ProgramError, ProgramStage, RawHandle};
use crate::scene::{
    ClearColor, FramebufferDesc, Geometry, Image2D, MagFilter, MinFilter, Primitive, TextureFormat,
    TextureParameters, Uniform, ViewportRect, Wrap,
};
use crate::shader::UniformLocation;

use super::wgsl::{self, Reflection, SlotKind};
use super::Gpu;

/// Interleaved `x, y, u, v` floats.
const VERTEX_ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: (Geometry::FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

// ── objects ───────────────────────────────────────────────────────────────

struct TextureObject {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampling: TextureParameters,
}

struct FramebufferObject {
    attachments: Vec<RawHandle>,
}

/// A linked program plus the uniform state it retains between draws.
struct ProgramObject {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    bind_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    reflection: Reflection,
    /// Current contents of each uniform buffer.
    buffers: Vec<Vec<u8>>,
    /// Texture bound to each slot; only texture slots are ever set.
    textures: Vec<Option<RawHandle>>,
}

enum Object {
    Geometry(wgpu::Buffer),
    Texture(TextureObject),
    Framebuffer(FramebufferObject),
    Program(ProgramObject),
}

impl Object {
    fn kind(&self) -> &'static str {
        match self {
            Self::Geometry(_) => "geometry",
            Self::Texture(_) => "texture",
            Self::Framebuffer(_) => "framebuffer",
            Self::Program(_) => "program",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: RawHandle,
    formats: Vec<wgpu::TextureFormat>,
    topology: wgpu::PrimitiveTopology,
}

// ── frame recording ───────────────────────────────────────────────────────

struct RecordedDraw {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertices: wgpu::Buffer,
    range: Range<u32>,
}

struct RecordedPass {
    target: PassTarget,
    formats: Vec<wgpu::TextureFormat>,
    size: Viewport,
    viewport: ViewportRect,
    clear: Option<ClearColor>,
    draws: Vec<RecordedDraw>,
}

struct Frame {
    encoder: wgpu::CommandEncoder,
    surface: Option<(wgpu::SurfaceTexture, wgpu::TextureView)>,
    /// Acquisition was attempted and yielded nothing presentable.
    surface_skipped: bool,
}

/// [`GpuBackend`] over a wgpu device.
///
/// Draws are recorded while a pass is open and encoded into the frame's
/// command encoder at `end_pass`. The surface texture is acquired on the first
/// screen pass of a frame and presented by `end_frame`.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    objects: FxHashMap<RawHandle, Object>,
    next_handle: RawHandle,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,
    samplers: FxHashMap<TextureParameters, wgpu::Sampler>,
    /// Bound to texture slots nothing was assigned to.
    fallback: TextureObject,
    frame: Option<Frame>,
    pass: Option<RecordedPass>,
    program: Option<RawHandle>,
    geometry: Option<RawHandle>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        let fallback = upload_texture(
            &gpu,
            "umbra fallback texture",
            Viewport::new(1, 1),
            wgpu::TextureFormat::Rgba8Unorm,
            &[255, 255, 255, 255],
            TextureParameters::DEFAULT,
        );

        Self {
            gpu,
            objects: FxHashMap::default(),
            next_handle: 1,
            pipelines: FxHashMap::default(),
            samplers: FxHashMap::default(),
            fallback,
            frame: None,
            pass: None,
            program: None,
            geometry: None,
        }
    }

    #[inline]
    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    /// Number of live backend objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn insert(&mut self, object: Object) -> RawHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.objects.insert(handle, object);
        handle
    }

    fn missing(handle: RawHandle, expected: &str) -> EngineError {
        EngineError::Backend(format!("no {expected} with handle #{handle}"))
    }

    fn texture(&self, handle: RawHandle) -> Result<&TextureObject> {
        match self.objects.get(&handle) {
            Some(Object::Texture(t)) => Ok(t),
            _ => Err(Self::missing(handle, "texture")),
        }
    }

    fn program(&self, handle: RawHandle) -> Result<&ProgramObject> {
        match self.objects.get(&handle) {
            Some(Object::Program(p)) => Ok(p),
            _ => Err(Self::missing(handle, "program")),
        }
    }

    fn current_program_mut(&mut self) -> Result<&mut ProgramObject> {
        let handle = self
            .program
            .ok_or_else(|| EngineError::InvalidState("no program in use".to_string()))?;
        match self.objects.get_mut(&handle) {
            Some(Object::Program(p)) => Ok(p),
            _ => Err(Self::missing(handle, "program")),
        }
    }

    fn sampler(&mut self, params: TextureParameters) -> wgpu::Sampler {
        let device = self.gpu.device();
        self.samplers
            .entry(params)
            .or_insert_with(|| create_sampler(device, params))
            .clone()
    }

    fn pipeline(&mut self, key: PipelineKey) -> Result<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.pipelines.get(&key) {
            return Ok(pipeline.clone());
        }

        let program = self.program(key.program)?;
        let targets: Vec<Option<wgpu::ColorTargetState>> = key
            .formats
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let pipeline = self
            .gpu
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("umbra program pipeline"),
                layout: Some(&program.layout),
                vertex: wgpu::VertexState {
                    module: &program.vertex,
                    entry_point: Some(wgsl::VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment,
                    entry_point: Some(wgsl::FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &targets,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: key.topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!(
            "created pipeline for program #{} ({:?}, {:?})",
            key.program,
            key.formats,
            key.topology
        );
        self.pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Snapshot of the current program's uniform state as a bind group.
    fn bind_group(&mut self, handle: RawHandle) -> Result<wgpu::BindGroup> {
        let program = self.program(handle)?;
        let device = self.gpu.device();

        let buffers: Vec<wgpu::Buffer> = program
            .buffers
            .iter()
            .map(|contents| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("umbra uniforms"),
                    contents,
                    usage: wgpu::BufferUsages::UNIFORM,
                })
            })
            .collect();

        let mut views: Vec<(u32, &TextureObject)> = Vec::new();
        for (slot, bound) in program.reflection.slots.iter().zip(&program.textures) {
            if let SlotKind::Texture { binding } = slot.kind {
                let texture = match bound {
                    Some(handle) => self.texture(*handle)?,
                    None => &self.fallback,
                };
                views.push((binding, texture));
            }
        }

        let sampler_params: Vec<(u32, TextureParameters)> = program
            .reflection
            .samplers
            .iter()
            .map(|s| {
                let params = s
                    .texture
                    .and_then(|slot| program.textures.get(slot).copied().flatten())
                    .and_then(|handle| self.texture(handle).ok())
                    .map_or(TextureParameters::DEFAULT, |t| t.sampling);
                (s.binding, params)
            })
            .collect();

        let mut entries: Vec<wgpu::BindGroupEntry> = Vec::new();
        for (layout, buffer) in program.reflection.buffers.iter().zip(&buffers) {
            entries.push(wgpu::BindGroupEntry {
                binding: layout.binding,
                resource: buffer.as_entire_binding(),
            });
        }
        for (binding, texture) in &views {
            entries.push(wgpu::BindGroupEntry {
                binding: *binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
        }

        let samplers: Vec<(u32, wgpu::Sampler)> = sampler_params
            .into_iter()
            .map(|(binding, params)| {
                let sampler = self
                    .samplers
                    .get(&params)
                    .cloned()
                    .unwrap_or_else(|| create_sampler(device, params));
                (binding, sampler)
            })
            .collect();
        for (binding, sampler) in &samplers {
            entries.push(wgpu::BindGroupEntry {
                binding: *binding,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("umbra draw bind group"),
            layout: &program.bind_layout,
            entries: &entries,
        }))
    }

    /// Ensures every sampler the current program needs is cached.
    fn warm_samplers(&mut self, handle: RawHandle) -> Result<()> {
        let program = self.program(handle)?;
        let params: Vec<TextureParameters> = program
            .reflection
            .samplers
            .iter()
            .map(|s| {
                s.texture
                    .and_then(|slot| program.textures.get(slot).copied().flatten())
                    .and_then(|handle| self.texture(handle).ok())
                    .map_or(TextureParameters::DEFAULT, |t| t.sampling)
            })
            .collect();
        for p in params {
            self.sampler(p);
        }
        Ok(())
    }

    fn color_views(&mut self, target: PassTarget) -> Result<Option<Vec<wgpu::TextureView>>> {
        match target {
            PassTarget::Framebuffer(fb) => {
                let Some(Object::Framebuffer(framebuffer)) = self.objects.get(&fb) else {
                    return Err(Self::missing(fb, "framebuffer"));
                };
                let views = framebuffer
                    .attachments
                    .iter()
                    .map(|&h| self.texture(h).map(|t| t.view.clone()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(views))
            }
            PassTarget::Screen => {
                let frame = self
                    .frame
                    .as_mut()
                    .ok_or_else(|| EngineError::InvalidState("no frame in progress".to_string()))?;

                if frame.surface.is_none() && !frame.surface_skipped {
                    match self
                        .gpu
                        .acquire()
                        .map_err(|e| EngineError::Backend(format!("{e:#}")))?
                    {
                        Some(texture) => {
                            let view = texture
                                .texture
                                .create_view(&wgpu::TextureViewDescriptor::default());
                            frame.surface = Some((texture, view));
                        }
                        None => frame.surface_skipped = true,
                    }
                }

                Ok(frame.surface.as_ref().map(|(_, view)| vec![view.clone()]))
            }
        }
    }
}

impl GpuBackend for WgpuBackend<'_> {
    fn create_geometry(&mut self, geometry: &Geometry) -> Result<RawHandle> {
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("umbra geometry"),
                contents: bytemuck::cast_slice(geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(self.insert(Object::Geometry(buffer)))
    }

    fn create_texture(&mut self, image: &Image2D) -> Result<RawHandle> {
        let format = texture_format(image.format());
        let texture = match image {
            Image2D::FromAsset { asset, sampling, .. } => upload_texture(
                &self.gpu,
                "umbra asset texture",
                image.size(),
                format,
                asset.pixels(),
                *sampling,
            ),
            Image2D::RenderTarget(rt) => {
                let texture = self.gpu.device().create_texture(&wgpu::TextureDescriptor {
                    label: Some(rt.name()),
                    size: extent(rt.size()),
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                TextureObject {
                    texture,
                    view,
                    sampling: rt.sampling(),
                }
            }
        };
        Ok(self.insert(Object::Texture(texture)))
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc, attachments: &[RawHandle]) -> Result<RawHandle> {
        let size = desc.size().unwrap_or_default();
        let incomplete = |reason: String| EngineError::IncompleteFramebuffer {
            width: size.width,
            height: size.height,
            reason,
        };

        if attachments.is_empty() {
            return Err(incomplete("no color attachments".to_string()));
        }
        for &handle in attachments {
            let texture = self.texture(handle).map_err(|e| incomplete(e.to_string()))?;
            let actual = Viewport::new(texture.texture.width(), texture.texture.height());
            if actual != size {
                return Err(incomplete(format!(
                    "attachment #{handle} is {}x{}",
                    actual.width, actual.height
                )));
            }
        }

        Ok(self.insert(Object::Framebuffer(FramebufferObject {
            attachments: attachments.to_vec(),
        })))
    }

    fn compile_program(&mut self, shader: &ShaderAsset) -> std::result::Result<CompiledProgram, ProgramError> {
        let vertex = wgsl::parse_stage(shader.vertex_source(), ProgramStage::Vertex, wgsl::VERTEX_ENTRY)?;
        let fragment = wgsl::parse_stage(
            shader.fragment_source(),
            ProgramStage::Fragment,
            wgsl::FRAGMENT_ENTRY,
        )?;
        wgsl::link(&vertex, &fragment)?;
        let reflection = wgsl::reflect(&fragment)?;

        let device = self.gpu.device();
        let mut layout_entries: Vec<wgpu::BindGroupLayoutEntry> = Vec::new();
        for buffer in &reflection.buffers {
            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: buffer.binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }
        for slot in &reflection.slots {
            if let SlotKind::Texture { binding } = slot.kind {
                layout_entries.push(wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                });
            }
        }
        for sampler in &reflection.samplers {
            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: sampler.binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("umbra program bgl"),
            entries: &layout_entries,
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("umbra program layout"),
            bind_group_layouts: &[&bind_layout],
            immediate_size: 0,
        });

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("umbra vertex stage"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(shader.vertex_source().to_string())),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("umbra fragment stage"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(shader.fragment_source().to_string())),
        });

        let uniforms = reflection
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.name.clone(), UniformLocation(i as i32)))
            .collect();
        let buffers = reflection
            .buffers
            .iter()
            .map(|b| vec![0u8; b.size as usize])
            .collect();
        let textures = vec![None; reflection.slots.len()];

        let handle = self.insert(Object::Program(ProgramObject {
            vertex: vertex_module,
            fragment: fragment_module,
            bind_layout,
            layout,
            reflection,
            buffers,
            textures,
        }));

        Ok(CompiledProgram { handle, uniforms })
    }

    fn release_all(&mut self) {
        log::debug!("releasing {} backend objects", self.objects.len());
        self.objects.clear();
        self.pipelines.clear();
        self.pass = None;
        self.program = None;
        self.geometry = None;
    }

    fn blit_shader(&self) -> ShaderAsset {
        ShaderAsset::new(wgsl::FULLSCREEN_VERTEX, wgsl::BLIT_FRAGMENT)
    }

    fn resize(&mut self, surface: Viewport) {
        self.gpu
            .resize(winit::dpi::PhysicalSize::new(surface.width, surface.height));
    }

    fn begin_frame(&mut self) -> Result<()> {
        if self.frame.is_some() {
            return Err(EngineError::InvalidState("frame already in progress".to_string()));
        }

        let encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("umbra frame encoder"),
            });
        self.frame = Some(Frame {
            encoder,
            surface: None,
            surface_skipped: false,
        });
        Ok(())
    }

    fn begin_pass(&mut self, target: PassTarget, viewport: ViewportRect, clear: Option<ClearColor>) -> Result<()> {
        if self.frame.is_none() {
            return Err(EngineError::InvalidState("pass begun outside a frame".to_string()));
        }
        if self.pass.is_some() {
            return Err(EngineError::InvalidState("pass already open".to_string()));
        }

        let (formats, size) = match target {
            PassTarget::Screen => {
                let size = self.gpu.size();
                (
                    vec![self.gpu.surface_format()],
                    Viewport::new(size.width, size.height),
                )
            }
            PassTarget::Framebuffer(fb) => {
                let Some(Object::Framebuffer(framebuffer)) = self.objects.get(&fb) else {
                    return Err(Self::missing(fb, "framebuffer"));
                };
                let mut formats = Vec::with_capacity(framebuffer.attachments.len());
                let mut size = Viewport::default();
                for &handle in &framebuffer.attachments {
                    let texture = self.texture(handle)?;
                    formats.push(texture.texture.format());
                    size = Viewport::new(texture.texture.width(), texture.texture.height());
                }
                (formats, size)
            }
        };

        self.pass = Some(RecordedPass {
            target,
            formats,
            size,
            viewport,
            clear,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn use_program(&mut self, program: RawHandle) -> Result<()> {
        self.program(program)?;
        self.program = Some(program);
        Ok(())
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &Uniform) -> Result<()> {
        let program = self.current_program_mut()?;
        let Some(slot) = location.index().and_then(|i| program.reflection.slots.get(i)) else {
            return Ok(());
        };

        match &slot.kind {
            SlotKind::Value(value_slot) => {
                let Some(buffer) = program.buffers.get_mut(value_slot.buffer) else {
                    return Ok(());
                };
                let start = (value_slot.offset as usize).min(buffer.len());
                let end = (start + value_slot.shape.size() as usize).min(buffer.len());
                if !wgsl::encode(value, value_slot.shape, &mut buffer[start..end]) {
                    log::debug!("'{}' expects a value, got a {}", slot.name, value.kind());
                }
            }
            SlotKind::Texture { .. } => {
                log::debug!("'{}' is a texture; ignoring {} value", slot.name, value.kind());
            }
        }
        Ok(())
    }

    fn bind_texture(&mut self, location: UniformLocation, _unit: u32, texture: RawHandle) -> Result<()> {
        self.texture(texture)?;
        let program = self.current_program_mut()?;
        let Some(index) = location.index() else {
            return Ok(());
        };
        match program.reflection.slots.get(index).map(|s| &s.kind) {
            Some(SlotKind::Texture { .. }) => program.textures[index] = Some(texture),
            Some(SlotKind::Value(_)) => {
                log::debug!("'{}' is not a texture", program.reflection.slots[index].name);
            }
            None => {}
        }
        Ok(())
    }

    fn bind_geometry(&mut self, geometry: RawHandle) -> Result<()> {
        match self.objects.get(&geometry) {
            Some(Object::Geometry(_)) => {
                self.geometry = Some(geometry);
                Ok(())
            }
            Some(other) => Err(EngineError::Backend(format!(
                "handle #{geometry} is a {}, not geometry",
                other.kind()
            ))),
            None => Err(Self::missing(geometry, "geometry")),
        }
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32, primitive: Primitive) -> Result<()> {
        let topology = topology(primitive)?;
        let range = vertex_range(first_vertex, vertex_count)?;
        let program = self
            .program
            .ok_or_else(|| EngineError::InvalidState("draw without a program".to_string()))?;
        let geometry = self
            .geometry
            .ok_or_else(|| EngineError::InvalidState("draw without geometry".to_string()))?;
        let formats = self
            .pass
            .as_ref()
            .map(|p| p.formats.clone())
            .ok_or_else(|| EngineError::InvalidState("draw outside a pass".to_string()))?;

        let pipeline = self.pipeline(PipelineKey {
            program,
            formats,
            topology,
        })?;
        self.warm_samplers(program)?;
        let bind_group = self.bind_group(program)?;
        let Some(Object::Geometry(vertices)) = self.objects.get(&geometry) else {
            return Err(Self::missing(geometry, "geometry"));
        };
        let vertices = vertices.clone();

        if let Some(pass) = self.pass.as_mut() {
            pass.draws.push(RecordedDraw {
                pipeline,
                bind_group,
                vertices,
                range,
            });
        }
        Ok(())
    }

    fn end_pass(&mut self) -> Result<()> {
        let pass = self
            .pass
            .take()
            .ok_or_else(|| EngineError::InvalidState("no pass to end".to_string()))?;

        let Some(views) = self.color_views(pass.target)? else {
            log::debug!("surface unavailable; dropping screen pass");
            return Ok(());
        };
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| EngineError::InvalidState("no frame in progress".to_string()))?;

        let load = match pass.clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(c.r),
                g: f64::from(c.g),
                b: f64::from(c.b),
                a: f64::from(c.a),
            }),
            None => wgpu::LoadOp::Load,
        };
        let attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = views
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("umbra pass"),
            color_attachments: &attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some((x, y, w, h)) = clip_viewport(pass.viewport, pass.size) else {
            return Ok(());
        };
        rpass.set_viewport(x, y, w, h, 0.0, 1.0);

        for draw in &pass.draws {
            rpass.set_pipeline(&draw.pipeline);
            rpass.set_bind_group(0, &draw.bind_group, &[]);
            rpass.set_vertex_buffer(0, draw.vertices.slice(..));
            rpass.draw(draw.range.clone(), 0..1);
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        self.pass = None;
        self.gpu.submit(frame.encoder);
        if let Some((texture, view)) = frame.surface {
            drop(view);
            texture.present();
        }
        Ok(())
    }
}

// ── conversions ───────────────────────────────────────────────────────────

fn extent(size: Viewport) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Srgb8Alpha8 => wgpu::TextureFormat::Rgba8UnormSrgb,
    }
}

fn vertex_range(first_vertex: u32, vertex_count: u32) -> Result<Range<u32>> {
    let end = first_vertex.checked_add(vertex_count).ok_or_else(|| {
        EngineError::InvalidState(format!(
            "draw of {vertex_count} vertices from {first_vertex} overflows the vertex index"
        ))
    })?;
    Ok(first_vertex..end)
}

fn topology(primitive: Primitive) -> Result<wgpu::PrimitiveTopology> {
    Ok(match primitive {
        Primitive::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Primitive::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Primitive::Lines => wgpu::PrimitiveTopology::LineList,
        Primitive::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        Primitive::Points => wgpu::PrimitiveTopology::PointList,
        Primitive::TriangleFan => {
            return Err(EngineError::Unsupported("triangle fans".to_string()));
        }
    })
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// (min, mipmap) filters of a minification mode.
fn min_filters(filter: MinFilter) -> (wgpu::FilterMode, wgpu::MipmapFilterMode) {
    use wgpu::{FilterMode as F, MipmapFilterMode as M};
    match filter {
        MinFilter::Nearest | MinFilter::NearestMipmapNearest => (F::Nearest, M::Nearest),
        MinFilter::Linear | MinFilter::LinearMipmapNearest => (F::Linear, M::Nearest),
        MinFilter::NearestMipmapLinear => (F::Nearest, M::Linear),
        MinFilter::LinearMipmapLinear => (F::Linear, M::Linear),
    }
}

fn create_sampler(device: &wgpu::Device, params: TextureParameters) -> wgpu::Sampler {
    let (min_filter, mipmap_filter) = min_filters(params.min_filter);
    let mag_filter = match params.mag_filter {
        MagFilter::Nearest => wgpu::FilterMode::Nearest,
        MagFilter::Linear => wgpu::FilterMode::Linear,
    };

    let all_linear = min_filter == wgpu::FilterMode::Linear
        && mag_filter == wgpu::FilterMode::Linear
        && mipmap_filter == wgpu::MipmapFilterMode::Linear;
    let anisotropy_clamp = match params.anisotropy {
        Some(level) if all_linear => level.clamp(1, 16),
        Some(level) => {
            log::debug!("anisotropy {level} needs trilinear filtering; ignored");
            1
        }
        None => 1,
    };

    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("umbra sampler"),
        address_mode_u: address_mode(params.wrap_s),
        address_mode_v: address_mode(params.wrap_t),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter,
        min_filter,
        mipmap_filter,
        anisotropy_clamp,
        ..Default::default()
    })
}

fn upload_texture(
    gpu: &Gpu<'_>,
    label: &str,
    size: Viewport,
    format: wgpu::TextureFormat,
    pixels: &[u8],
    sampling: TextureParameters,
) -> TextureObject {
    if sampling.mipmaps || sampling.min_filter.uses_mipmaps() {
        log::debug!("mipmaps are not generated; sampling level 0 only");
    }

    let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(size),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    gpu.queue().write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        extent(size),
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    TextureObject {
        texture,
        view,
        sampling,
    }
}

/// Converts a bottom-left-origin rect to wgpu's top-left origin, clipped to
/// the target. `None` when nothing remains.
fn clip_viewport(rect: ViewportRect, target: Viewport) -> Option<(f32, f32, f32, f32)> {
    let left = i64::from(rect.x).max(0);
    let right = (i64::from(rect.x) + i64::from(rect.width)).min(i64::from(target.width));
    let bottom = i64::from(rect.y).max(0);
    let top = (i64::from(rect.y) + i64::from(rect.height)).min(i64::from(target.height));
    if right <= left || top <= bottom {
        return None;
    }

    let y = i64::from(target.height) - top;
    Some((left as f32, y as f32, (right - left) as f32, (top - bottom) as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── viewport ──────────────────────────────────────────────────────────

    #[test]
    fn full_rect_maps_to_full_target() {
        let rect = ViewportRect {
            x: 0,
            y: 0,
            width: 100,
            height: 50,
        };
        assert_eq!(clip_viewport(rect, Viewport::new(100, 50)), Some((0.0, 0.0, 100.0, 50.0)));
    }

    #[test]
    fn bottom_left_origin_is_flipped_and_clipped() {
        let rect = ViewportRect {
            x: -10,
            y: 10,
            width: 40,
            height: 100,
        };
        // Columns 0..30, rows 10..50 from the bottom of a 100x50 target.
        assert_eq!(clip_viewport(rect, Viewport::new(100, 50)), Some((0.0, 0.0, 30.0, 40.0)));

        let offscreen = ViewportRect {
            x: 200,
            y: 0,
            width: 10,
            height: 10,
        };
        assert_eq!(clip_viewport(offscreen, Viewport::new(100, 50)), None);
    }

    // ── conversions ───────────────────────────────────────────────────────

    #[test]
    fn triangle_fans_are_unsupported() {
        assert!(matches!(topology(Primitive::TriangleFan), Err(EngineError::Unsupported(_))));
        assert_eq!(
            topology(Primitive::TriangleStrip).unwrap(),
            wgpu::PrimitiveTopology::TriangleStrip
        );
    }

    #[test]
    fn vertex_ranges_reject_index_overflow() {
        assert_eq!(vertex_range(4, 4).unwrap(), 4..8);
        assert_eq!(vertex_range(0, u32::MAX).unwrap(), 0..u32::MAX);
        assert!(matches!(vertex_range(u32::MAX, 1), Err(EngineError::InvalidState(_))));
        assert!(matches!(vertex_range(2, u32::MAX - 1), Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn min_filter_splits_into_min_and_mipmap_modes() {
        assert_eq!(
            min_filters(MinFilter::NearestMipmapLinear),
            (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Linear)
        );
        assert_eq!(
            min_filters(MinFilter::Linear),
            (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Nearest)
        );
        assert_eq!(texture_format(TextureFormat::Srgb8Alpha8), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(address_mode(Wrap::MirroredRepeat), wgpu::AddressMode::MirrorRepeat);
    }
}
