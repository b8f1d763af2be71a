//! wgpu execution backend.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface
//! - compiling WGSL programs and reflecting their uniforms
//! - executing [`GpuBackend`](crate::gpu::GpuBackend) calls through [`WgpuBackend`]

mod backend;
mod context;
mod error;
mod init;
mod surface;
pub mod wgsl;

pub use backend::WgpuBackend;
pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use init::GpuInit;
