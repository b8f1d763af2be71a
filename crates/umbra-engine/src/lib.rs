//! Umbra: a plugin-driven engine for real-time fragment shaders.
//!
//! Plugins publish values through the [`data`] registry, bind them to shader
//! uniforms and submit [`scene`] passes. The [`pipeline`] compiles passes into
//! flat GPU commands, and [`gpu::GpuRenderer`] executes them against a
//! [`gpu::GpuBackend`] while caching every GPU object per surface.
//!
//! [`device`] provides the `wgpu` backend and [`window`] a `winit` host for it.

pub mod asset;
pub mod coords;
pub mod data;
pub mod device;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod logging;
pub mod pipeline;
pub mod plugins;
pub mod scene;
pub mod shader;
pub mod uniform;
pub mod window;

pub use error::{EngineError, Result};
