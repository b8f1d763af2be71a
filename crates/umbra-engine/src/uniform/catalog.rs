use crate::coords::Viewport;
use crate::data::keys;
use crate::scene::Uniform;

use super::UniformBinder;

fn flag(v: bool) -> Uniform {
    Uniform::Int(i32::from(v))
}

/// Bindings for every uniform name the stock plugins feed.
///
/// | uniform             | key                                 | type  |
/// |---------------------|-------------------------------------|-------|
/// | `resolution`        | render-target resolution            | vec2  |
/// | `time`              | `system.time`                       | float |
/// | `nightMode`         | `system.isNightMode`                | int   |
/// | `batteryLevel`      | `system.batteryLevel`               | float |
/// | `powerConnected`    | `system.powerConnected`             | int   |
/// | `isCharging`        | `system.batteryIsCharging`          | int   |
/// | `touch`             | `interaction.touchPosition`         | vec2  |
/// | `offset`            | `interaction.wallpaperOffset`       | vec2  |
/// | `rotationMatrix`    | `sensor.rotationMatrix`             | mat4  |
/// | `gravity`           | `sensor.gravity`                    | vec3  |
/// | `geomagnetic`       | `sensor.geomagnetic`                | vec3  |
/// | `inclinationMatrix` | `sensor.inclinationMatrix`          | mat4  |
pub fn default_bindings() -> UniformBinder {
    UniformBinder::builder()
        .bind("resolution", keys::RENDER_TARGET_RESOLUTION, |v: Viewport| {
            Uniform::Vec2(v.as_vec2())
        })
        .bind("time", keys::TIME, Uniform::Float)
        .bind("nightMode", keys::IS_NIGHT_MODE, flag)
        .bind("batteryLevel", keys::BATTERY_LEVEL, Uniform::Float)
        .bind("powerConnected", keys::POWER_CONNECTED, flag)
        .bind("isCharging", keys::BATTERY_IS_CHARGING, flag)
        .bind("touch", keys::TOUCH_POSITION, Uniform::Vec2)
        .bind("offset", keys::WALLPAPER_OFFSET, Uniform::Vec2)
        .bind("rotationMatrix", keys::ROTATION_MATRIX, Uniform::Mat4)
        .bind("gravity", keys::GRAVITY, Uniform::Vec3)
        .bind("geomagnetic", keys::GEOMAGNETIC, Uniform::Vec3)
        .bind("inclinationMatrix", keys::INCLINATION_MATRIX, Uniform::Mat4)
        .build()
}
