use crate::scene::{
    ClearColor, Geometry, Material, Primitive, RenderTarget, TextureSource, ViewportRect,
};

/// One backend-agnostic instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    BeginPass {
        target: RenderTarget,
        clear: Option<ClearColor>,
        viewport: Option<ViewportRect>,
    },
    EndPass,
    /// Makes the material's program current.
    BindProgram(Material),
    /// Uploads the material's uniform values to the current program.
    SetUniforms(Material),
    BindGeometry(Geometry),
    Draw {
        vertex_count: u32,
        first_vertex: u32,
        primitive: Primitive,
    },
    /// Copies `src` onto `dst` with a full-screen draw.
    Blit {
        src: TextureSource,
        dst: RenderTarget,
    },
}

impl GpuCommand {
    /// Short variant name used in logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginPass { .. } => "BeginPass",
            Self::EndPass => "EndPass",
            Self::BindProgram(_) => "BindProgram",
            Self::SetUniforms(_) => "SetUniforms",
            Self::BindGeometry(_) => "BindGeometry",
            Self::Draw { .. } => "Draw",
            Self::Blit { .. } => "Blit",
        }
    }
}

/// Ordered list of commands for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBuffer {
    commands: Vec<GpuCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, command: GpuCommand) {
        self.commands.push(command);
    }

    /// Appends every command of `other`, preserving order.
    pub fn append(&mut self, other: CommandBuffer) {
        self.commands.extend(other.commands);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GpuCommand> {
        self.commands.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[GpuCommand] {
        &self.commands
    }
}

impl<'a> IntoIterator for &'a CommandBuffer {
    type Item = &'a GpuCommand;
    type IntoIter = std::slice::Iter<'a, GpuCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl FromIterator<GpuCommand> for CommandBuffer {
    fn from_iter<I: IntoIterator<Item = GpuCommand>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}
