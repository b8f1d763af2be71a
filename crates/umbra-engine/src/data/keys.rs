//! Well-known data keys shared by the stock plugins and the default uniform bindings.

use crate::coords::Viewport;
use crate::scene::{RenderTarget, TextureSource};

use super::DataKey;

// ── engine ────────────────────────────────────────────────────────────────

/// Surface size in physical pixels.
pub const PHYSICAL_VIEWPORT_RESOLUTION: DataKey<Viewport> =
    DataKey::new("engine.viewport.physicalResolution");

/// Surface size scaled by the configured quality factor.
pub const RENDER_TARGET_RESOLUTION: DataKey<Viewport> =
    DataKey::new("engine.viewport.renderTargetResolution");

// ── system ────────────────────────────────────────────────────────────────

/// Seconds since the time provider was started.
pub const TIME: DataKey<f32> = DataKey::new("system.time");
pub const IS_NIGHT_MODE: DataKey<bool> = DataKey::new("system.isNightMode");
/// Battery charge in `0.0..=1.0`.
pub const BATTERY_LEVEL: DataKey<f32> = DataKey::new("system.batteryLevel");
pub const POWER_CONNECTED: DataKey<bool> = DataKey::new("system.powerConnected");
pub const BATTERY_IS_CHARGING: DataKey<bool> = DataKey::new("system.batteryIsCharging");

// ── sensors ───────────────────────────────────────────────────────────────

/// Column-major 4x4 device rotation matrix.
pub const ROTATION_MATRIX: DataKey<[f32; 16]> = DataKey::new("sensor.rotationMatrix");
pub const GRAVITY: DataKey<[f32; 3]> = DataKey::new("sensor.gravity");
pub const GEOMAGNETIC: DataKey<[f32; 3]> = DataKey::new("sensor.geomagnetic");
pub const INCLINATION_MATRIX: DataKey<[f32; 16]> = DataKey::new("sensor.inclinationMatrix");
pub const ROTATION_VECTOR: DataKey<[f32; 3]> = DataKey::new("sensor.rotationVector");

// ── interaction ───────────────────────────────────────────────────────────

/// Last pointer/touch position in physical pixels.
pub const TOUCH_POSITION: DataKey<[f32; 2]> = DataKey::new("interaction.touchPosition");
/// Host-provided scroll offset in `0.0..=1.0` per axis.
pub const WALLPAPER_OFFSET: DataKey<[f32; 2]> = DataKey::new("interaction.wallpaperOffset");

// ── backbuffer ────────────────────────────────────────────────────────────

/// Texture holding the previous frame of the backbuffer swapchain.
pub const BACKBUFFER_TEXTURE: DataKey<TextureSource> = DataKey::new("backbuffer.texture");
/// Render target writing the current frame of the backbuffer swapchain.
pub const BACKBUFFER_TARGET: DataKey<RenderTarget> = DataKey::new("backbuffer.target");
