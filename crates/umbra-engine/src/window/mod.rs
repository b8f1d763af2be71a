//! Windowed host.
//!
//! Owns the `winit` event loop and a single window, and drives an engine bound
//! to the window's surface.

mod app;
mod runtime;

pub use app::{AppControl, HostApp, HostEngine};
pub use runtime::{Runtime, RuntimeConfig};
