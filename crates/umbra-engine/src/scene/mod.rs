//! Immutable scene descriptors.
//!
//! Every type here is a value: equality is structural, never identity, so two
//! descriptors built independently from the same data resolve to the same GPU
//! object. None of them carries a backend handle.

mod geometry;
mod image;
mod pass;
mod target;
mod uniform;

pub use geometry::Geometry;
pub use image::{
    Image2D, MagFilter, MinFilter, RenderTargetImage, TextureFormat, TextureParameters, Wrap,
};
pub use pass::{ClearColor, DrawCall, Pass, Primitive, ViewportRect};
pub use target::{FrameSwapchain, FramebufferDesc, RenderTarget, TextureSource};
pub use uniform::{Material, Uniform};
