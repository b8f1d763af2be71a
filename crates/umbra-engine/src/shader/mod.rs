//! Shader compilation cache, introspection and diagnostics.
//!
//! Programs are compiled once per distinct source pair and cached together with
//! their active-uniform locations. Compiler output is structured into
//! [`SourceLocation`](crate::error::SourceLocation)s by [`parse_info_log`].

mod cache;
mod diagnostics;
mod introspect;
mod sampler_hints;

pub use cache::{Program, ShaderCache, UniformLocation};
pub use diagnostics::parse_info_log;
pub use introspect::{ShaderIntrospector, ShaderMetadata};
pub use sampler_hints::{parse_sampler_hints, SamplerHint};
