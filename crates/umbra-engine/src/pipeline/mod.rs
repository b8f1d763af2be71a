//! Lowering of declarative passes into a flat command buffer.
//!
//! [`GpuCommand`] is the contract between plugins and the execution layer: it
//! carries value descriptors only, never backend handles.

mod command;
mod compiler;

pub use command::{CommandBuffer, GpuCommand};
pub use compiler::PassCompiler;
