//! WGSL front end: parsing, validation, interface checks and uniform reflection.
//!
//! Programs are a vertex module exposing [`VERTEX_ENTRY`] and a fragment module
//! exposing [`FRAGMENT_ENTRY`]. All resources live in bind group 0. A program's
//! uniforms are the members of its `var<uniform>` blocks (or the block itself
//! when it is not a struct) plus its `texture_2d<f32>` globals; a texture named
//! `noise` pairs with a sampler named `noise_sampler`.
//!
//! Diagnostics are rendered as `ERROR: 0:<line>: <message>` lines.

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

use crate::gpu::{ProgramError, ProgramStage};
use crate::scene::Uniform;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Vertex stage paired with every fragment program.
///
/// Consumes the interleaved `x, y, u, v` layout and forwards `uv` at location 0.
pub const FULLSCREEN_VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}
"#;

/// Copies `tex` to the target. Texture rows run top to bottom while quad `uv`
/// grows upwards, hence the flip.
pub const BLIT_FRAGMENT: &str = r#"
@group(0) @binding(0) var tex: texture_2d<f32>;
@group(0) @binding(1) var tex_sampler: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(tex, tex_sampler, vec2<f32>(uv.x, 1.0 - uv.y));
}
"#;

/// Bytes between matrix columns in a uniform buffer.
const fn column_stride(rows: u8) -> u32 {
    if rows == 2 { 8 } else { 16 }
}

// ── parsing ───────────────────────────────────────────────────────────────

/// A parsed and validated shader module.
pub(crate) struct Stage {
    pub module: naga::Module,
    pub info: ModuleInfo,
    entry: usize,
}

impl Stage {
    fn entry_point(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry]
    }

    /// Whether the entry point reads or writes `global`.
    fn uses(&self, global: naga::Handle<naga::GlobalVariable>) -> bool {
        !self.info.get_entry_point(self.entry)[global].is_empty()
    }
}

fn diagnostic(line: Option<u32>, message: &str) -> String {
    match line {
        Some(line) => format!("ERROR: 0:{line}: {message}"),
        None => message.to_string(),
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

/// Parses and validates `source`, requiring an entry point named `entry` of
/// the stage's kind.
pub(crate) fn parse_stage(source: &str, stage: ProgramStage, entry: &str) -> Result<Stage, ProgramError> {
    let fail = |log: String| ProgramError { stage, log };

    let module = naga::front::wgsl::parse_str(source).map_err(|err| {
        let line = err.location(source).map(|loc| loc.line_number);
        fail(diagnostic(line, err.message()))
    })?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|err| {
            let line = err.location(source).map(|loc| loc.line_number);
            fail(diagnostic(line, &error_chain(err.as_inner())))
        })?;

    let kind = match stage {
        ProgramStage::Vertex => naga::ShaderStage::Vertex,
        _ => naga::ShaderStage::Fragment,
    };
    let entry = module
        .entry_points
        .iter()
        .position(|ep| ep.name == entry && ep.stage == kind)
        .ok_or_else(|| fail(format!("missing {kind:?} entry point '{entry}'")))?;

    Ok(Stage { module, info, entry })
}

// ── linking ───────────────────────────────────────────────────────────────

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(*location),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

/// Checks that every fragment input is produced by the vertex stage and that
/// the vertex stage binds no resources.
pub(crate) fn link(vertex: &Stage, fragment: &Stage) -> Result<(), ProgramError> {
    let fail = |log: String| ProgramError {
        stage: ProgramStage::Link,
        log,
    };

    let mut outputs = Vec::new();
    if let Some(result) = &vertex.entry_point().function.result {
        collect_locations(&vertex.module, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut inputs = Vec::new();
    for arg in &fragment.entry_point().function.arguments {
        collect_locations(&fragment.module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    if let Some(missing) = inputs.iter().find(|loc| !outputs.contains(loc)) {
        return Err(fail(format!(
            "fragment input at location {missing} is not written by the vertex stage"
        )));
    }

    let vertex_resources = vertex
        .module
        .global_variables
        .iter()
        .any(|(handle, var)| var.binding.is_some() && vertex.uses(handle));
    if vertex_resources {
        return Err(fail("the vertex stage cannot bind resources".to_string()));
    }

    Ok(())
}

// ── reflection ────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ScalarKind {
    Float,
    Sint,
    Uint,
    Bool,
}

/// Scalar, vector (`columns == 1`) or matrix layout of a value uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Shape {
    pub columns: u8,
    pub rows: u8,
    pub scalar: ScalarKind,
}

impl Shape {
    fn of(inner: &naga::TypeInner) -> Option<Self> {
        let (columns, rows, scalar) = match inner {
            naga::TypeInner::Scalar(scalar) => (1, 1, *scalar),
            naga::TypeInner::Vector { size, scalar } => (1, *size as u8, *scalar),
            naga::TypeInner::Matrix {
                columns,
                rows,
                scalar,
            } => (*columns as u8, *rows as u8, *scalar),
            _ => return None,
        };
        let scalar = match scalar.kind {
            naga::ScalarKind::Float if scalar.width == 4 => ScalarKind::Float,
            naga::ScalarKind::Sint => ScalarKind::Sint,
            naga::ScalarKind::Uint => ScalarKind::Uint,
            naga::ScalarKind::Bool => ScalarKind::Bool,
            _ => return None,
        };
        Some(Self {
            columns,
            rows,
            scalar,
        })
    }

    /// Bytes the value occupies, including column padding.
    pub fn size(self) -> u32 {
        if self.columns == 1 {
            u32::from(self.rows) * 4
        } else {
            u32::from(self.columns) * column_stride(self.rows)
        }
    }
}

/// A non-texture uniform: a range of one uniform buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValueSlot {
    pub buffer: usize,
    pub offset: u32,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SlotKind {
    Value(ValueSlot),
    Texture { binding: u32 },
}

/// One active uniform; its index in [`Reflection::slots`] is its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub name: String,
    pub kind: SlotKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BufferBinding {
    pub binding: u32,
    /// Allocation size, rounded up to 16 bytes.
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SamplerBinding {
    pub binding: u32,
    /// Slot of the texture this sampler follows, if its name pairs with one.
    pub texture: Option<usize>,
}

/// Resources and uniform layout of a fragment stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Reflection {
    pub slots: Vec<Slot>,
    pub buffers: Vec<BufferBinding>,
    pub samplers: Vec<SamplerBinding>,
}

impl Reflection {
    pub fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }
}

/// Reflects the resources the fragment entry point actually uses.
///
/// Fails (as a link error) on resources outside group 0 or of unsupported types.
pub(crate) fn reflect(stage: &Stage) -> Result<Reflection, ProgramError> {
    let fail = |log: String| ProgramError {
        stage: ProgramStage::Link,
        log,
    };
    let module = &stage.module;
    let mut out = Reflection::default();
    let mut samplers: Vec<(String, u32)> = Vec::new();

    for (handle, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        if !stage.uses(handle) {
            continue;
        }

        let name = var.name.clone().unwrap_or_default();
        if binding.group != 0 {
            return Err(fail(format!(
                "'{name}' is in bind group {}; only group 0 is supported",
                binding.group
            )));
        }

        let inner = &module.types[var.ty].inner;
        match (var.space, inner) {
            (naga::AddressSpace::Uniform, naga::TypeInner::Struct { members, span }) => {
                let buffer = out.buffers.len();
                out.buffers.push(BufferBinding {
                    binding: binding.binding,
                    size: span.next_multiple_of(16),
                });
                for member in members {
                    let member_name = member.name.clone().unwrap_or_default();
                    match Shape::of(&module.types[member.ty].inner) {
                        Some(shape) => out.slots.push(Slot {
                            name: member_name,
                            kind: SlotKind::Value(ValueSlot {
                                buffer,
                                offset: member.offset,
                                shape,
                            }),
                        }),
                        None => log::debug!("uniform member '{member_name}' has an unsupported type"),
                    }
                }
            }
            (naga::AddressSpace::Uniform, inner) => {
                let shape = Shape::of(inner)
                    .ok_or_else(|| fail(format!("uniform '{name}' has an unsupported type")))?;
                let buffer = out.buffers.len();
                out.buffers.push(BufferBinding {
                    binding: binding.binding,
                    size: shape.size().next_multiple_of(16),
                });
                out.slots.push(Slot {
                    name,
                    kind: SlotKind::Value(ValueSlot {
                        buffer,
                        offset: 0,
                        shape,
                    }),
                });
            }
            (
                naga::AddressSpace::Handle,
                naga::TypeInner::Image {
                    dim: naga::ImageDimension::D2,
                    arrayed: false,
                    class: naga::ImageClass::Sampled { multi: false, .. },
                },
            ) => out.slots.push(Slot {
                name,
                kind: SlotKind::Texture {
                    binding: binding.binding,
                },
            }),
            (naga::AddressSpace::Handle, naga::TypeInner::Sampler { comparison: false }) => {
                samplers.push((name, binding.binding));
            }
            _ => {
                return Err(fail(format!(
                    "resource '{name}' has an unsupported type; expected a uniform block, texture_2d<f32> or sampler"
                )));
            }
        }
    }

    for (name, binding) in samplers {
        let texture = name
            .strip_suffix("_sampler")
            .and_then(|base| out.position(base))
            .filter(|&i| matches!(out.slots[i].kind, SlotKind::Texture { .. }));
        out.samplers.push(SamplerBinding { binding, texture });
    }

    Ok(out)
}

// ── encoding ──────────────────────────────────────────────────────────────

/// Writes `value` into `out` (the slot's bytes) following `shape`.
///
/// Components are converted to the slot's scalar type; components the slot
/// has no room for are dropped. Returns `false` for sampler values.
pub(crate) fn encode(value: &Uniform, shape: Shape, out: &mut [u8]) -> bool {
    let (components, value_rows): (&[f32], usize) = match value {
        Uniform::Float(v) => (std::slice::from_ref(v), 1),
        Uniform::Vec2(v) => (v, 2),
        Uniform::Vec3(v) => (v, 3),
        Uniform::Vec4(v) => (v, 4),
        Uniform::Mat2(v) => (v, 2),
        Uniform::Mat3(v) => (v, 3),
        Uniform::Mat4(v) => (v, 4),
        Uniform::Int(v) => {
            write_scalar(*v as f32, Some(*v), shape.scalar, out, 0);
            return true;
        }
        Uniform::Sampler2D(_) => return false,
    };

    let stride = column_stride(shape.rows) as usize;
    for column in 0..usize::from(shape.columns) {
        for row in 0..usize::from(shape.rows) {
            let Some(&component) = components.get(column * value_rows + row) else {
                continue;
            };
            if shape.columns > 1 && row >= value_rows {
                continue;
            }
            write_scalar(component, None, shape.scalar, out, column * stride + row * 4);
        }
    }
    true
}

fn write_scalar(value: f32, exact: Option<i32>, kind: ScalarKind, out: &mut [u8], at: usize) {
    let bytes = match kind {
        ScalarKind::Float => value.to_le_bytes(),
        ScalarKind::Sint => exact.unwrap_or(value as i32).to_le_bytes(),
        ScalarKind::Uint => (exact.map_or(value as u32, |v| v.max(0) as u32)).to_le_bytes(),
        ScalarKind::Bool => u32::from(value != 0.0).to_le_bytes(),
    };
    if let Some(dst) = out.get_mut(at..at + 4) {
        dst.copy_from_slice(&bytes);
    }
}
