use crate::scene::Pass;

use super::{CommandBuffer, GpuCommand};

/// Lowers passes into commands.
///
/// Per pass the output is `BeginPass`, then `BindProgram`, `SetUniforms`,
/// `BindGeometry`, `Draw` for every draw call in order, then `EndPass`. The
/// compiler neither deduplicates nor reorders; redundant-bind elision belongs
/// to the execution layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassCompiler;

impl PassCompiler {
    /// Commands emitted per pass besides its draws.
    pub const COMMANDS_PER_PASS: usize = 2;
    /// Commands emitted per draw call.
    pub const COMMANDS_PER_DRAW: usize = 4;

    pub fn compile(&self, passes: &[Pass]) -> CommandBuffer {
        let mut out = CommandBuffer::new();
        for pass in passes {
            self.compile_pass(pass, &mut out);
        }
        out
    }

    pub fn compile_pass(&self, pass: &Pass, out: &mut CommandBuffer) {
        out.push(GpuCommand::BeginPass {
            target: pass.target.clone(),
            clear: pass.clear,
            viewport: pass.viewport,
        });

        for draw in &pass.draws {
            out.push(GpuCommand::BindProgram(draw.material.clone()));
            out.push(GpuCommand::SetUniforms(draw.material.clone()));
            out.push(GpuCommand::BindGeometry(draw.geometry.clone()));
            out.push(GpuCommand::Draw {
                vertex_count: draw.geometry.vertex_count(),
                first_vertex: 0,
                primitive: draw.primitive,
            });
        }

        out.push(GpuCommand::EndPass);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::asset::ShaderAsset;
    use crate::scene::{
        ClearColor, DrawCall, FrameSwapchain, Material, Primitive, RenderTarget, ViewportRect,
    };

    fn material(tag: &str) -> Material {
        Material::new(Arc::new(ShaderAsset::new("vs", tag))).with_uniform("time", 1.0f32)
    }

    fn pass(target: RenderTarget, draws: usize) -> Pass {
        (0..draws).fold(Pass::new(target), |p, i| {
            p.with_draw(DrawCall::fullscreen(material(&format!("fs{i}"))))
        })
    }

    #[test]
    fn command_count_is_two_per_pass_plus_four_per_draw() {
        for n in 0..4 {
            for m in 0..4 {
                let passes: Vec<Pass> = (0..n).map(|_| pass(RenderTarget::Screen, m)).collect();
                let buffer = PassCompiler.compile(&passes);
                assert_eq!(
                    buffer.len(),
                    n * (PassCompiler::COMMANDS_PER_PASS + PassCompiler::COMMANDS_PER_DRAW * m),
                    "N={n} M={m}"
                );
            }
        }
    }

    #[test]
    fn emission_order_is_fixed() {
        let passes = vec![
            pass(RenderTarget::Swapchain(FrameSwapchain::new("bb")), 2),
            pass(RenderTarget::Screen, 1),
        ];
        let names: Vec<&str> = PassCompiler
            .compile(&passes)
            .iter()
            .map(GpuCommand::name)
            .collect();

        assert_eq!(
            names,
            [
                "BeginPass",
                "BindProgram", "SetUniforms", "BindGeometry", "Draw",
                "BindProgram", "SetUniforms", "BindGeometry", "Draw",
                "EndPass",
                "BeginPass",
                "BindProgram", "SetUniforms", "BindGeometry", "Draw",
                "EndPass",
            ]
        );
    }

    #[test]
    fn begin_pass_carries_target_clear_and_viewport() {
        let p = Pass::new(RenderTarget::Screen)
            .with_clear(ClearColor::BLACK)
            .with_viewport(ViewportRect::new(0, 0, 16, 9));
        let buffer = PassCompiler.compile(&[p]);

        assert_eq!(
            buffer.as_slice()[0],
            GpuCommand::BeginPass {
                target: RenderTarget::Screen,
                clear: Some(ClearColor::BLACK),
                viewport: Some(ViewportRect::new(0, 0, 16, 9)),
            }
        );
        assert_eq!(buffer.as_slice()[1], GpuCommand::EndPass);
    }

    #[test]
    fn draw_uses_geometry_vertex_count_and_primitive() {
        let buffer = PassCompiler.compile(&[pass(RenderTarget::Screen, 1)]);
        assert_eq!(
            buffer.as_slice()[4],
            GpuCommand::Draw {
                vertex_count: 4,
                first_vertex: 0,
                primitive: Primitive::TriangleStrip,
            }
        );
        match &buffer.as_slice()[1] {
            GpuCommand::BindProgram(m) => assert_eq!(m.shader().fragment_source(), "fs0"),
            other => panic!("expected BindProgram, got {other:?}"),
        }
    }
}
