//! Stock plugins.
//!
//! [`ShaderRunnerPlugin`] draws a single fragment shader; the rest publish the
//! data keys its uniforms are bound to.

mod backbuffer;
mod shader_runner;
mod signals;
mod time;

#[cfg(test)]
pub(crate) mod testing;

pub use backbuffer::BackbufferPlugin;
pub use shader_runner::{ShaderRunnerPlugin, BACKBUFFER_UNIFORM};
pub use signals::{
    DeviceStatePlugin, DeviceStateSignals, InteractionPlugin, InteractionSignals, SensorPlugin,
    SensorSignals,
};
pub use time::TimePlugin;
