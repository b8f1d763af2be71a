//! Frame lifecycle orchestration.
//!
//! [`EngineController`] owns the data registry, the asset provider, the
//! per-frame command buffer and a [`Renderer`], and drives registered
//! [`Plugin`]s through setup, the per-frame hooks and teardown.

mod config;
mod context;
mod controller;
mod plugin;
mod renderer;

pub use config::EngineConfig;
pub use context::EngineContext;
pub use controller::{EngineController, EngineState};
pub use plugin::{Plugin, PluginManager};
pub use renderer::Renderer;
