//! Plugins fed by values published from other threads.
//!
//! Each plugin owns a bundle of [`SignalCell`]s. Hosts clone the bundle, hand
//! it to whatever produces the samples (an input handler, a sensor thread, a
//! battery monitor), and the plugin exposes the latest values as data keys.

use crate::data::{keys, DataKey, SignalCell, SignalProvider};
use crate::engine::{EngineContext, Plugin};
use crate::error::Result;

fn register_signal<T: Clone + 'static>(ctx: &mut EngineContext<'_>, key: &DataKey<T>, cell: &SignalCell<T>) {
    let cell = cell.clone();
    ctx.register_provider(key, move || SignalProvider::new(cell.clone()));
}

// ── interaction ───────────────────────────────────────────────────────────

/// Pointer and scroll state.
#[derive(Debug, Clone, Default)]
pub struct InteractionSignals {
    /// Pointer position in physical pixels, origin bottom-left.
    pub touch: SignalCell<[f32; 2]>,
    pub offset: SignalCell<[f32; 2]>,
}

/// Publishes [`keys::TOUCH_POSITION`] and [`keys::WALLPAPER_OFFSET`].
#[derive(Debug, Default)]
pub struct InteractionPlugin {
    signals: InteractionSignals,
}

impl InteractionPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signals(signals: InteractionSignals) -> Self {
        Self { signals }
    }

    pub fn signals(&self) -> InteractionSignals {
        self.signals.clone()
    }
}

impl Plugin for InteractionPlugin {
    fn on_setup(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        register_signal(ctx, &keys::TOUCH_POSITION, &self.signals.touch);
        register_signal(ctx, &keys::WALLPAPER_OFFSET, &self.signals.offset);
        Ok(())
    }
}

// ── device state ──────────────────────────────────────────────────────────

/// Power and appearance state.
#[derive(Debug, Clone, Default)]
pub struct DeviceStateSignals {
    pub night_mode: SignalCell<bool>,
    /// Charge in `0.0..=1.0`.
    pub battery_level: SignalCell<f32>,
    pub power_connected: SignalCell<bool>,
    pub charging: SignalCell<bool>,
}

/// Publishes the `system.*` device keys.
#[derive(Debug, Default)]
pub struct DeviceStatePlugin {
    signals: DeviceStateSignals,
}

impl DeviceStatePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signals(signals: DeviceStateSignals) -> Self {
        Self { signals }
    }

    pub fn signals(&self) -> DeviceStateSignals {
        self.signals.clone()
    }
}

impl Plugin for DeviceStatePlugin {
    fn on_setup(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        register_signal(ctx, &keys::IS_NIGHT_MODE, &self.signals.night_mode);
        register_signal(ctx, &keys::BATTERY_LEVEL, &self.signals.battery_level);
        register_signal(ctx, &keys::POWER_CONNECTED, &self.signals.power_connected);
        register_signal(ctx, &keys::BATTERY_IS_CHARGING, &self.signals.charging);
        Ok(())
    }
}

// ── sensors ───────────────────────────────────────────────────────────────

/// Motion sensor samples. Matrices are column-major.
#[derive(Debug, Clone, Default)]
pub struct SensorSignals {
    pub rotation_matrix: SignalCell<[f32; 16]>,
    pub inclination_matrix: SignalCell<[f32; 16]>,
    pub gravity: SignalCell<[f32; 3]>,
    pub geomagnetic: SignalCell<[f32; 3]>,
    pub rotation_vector: SignalCell<[f32; 3]>,
}

/// Publishes the `sensor.*` keys.
#[derive(Debug, Default)]
pub struct SensorPlugin {
    signals: SensorSignals,
}

impl SensorPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signals(signals: SensorSignals) -> Self {
        Self { signals }
    }

    pub fn signals(&self) -> SensorSignals {
        self.signals.clone()
    }
}

impl Plugin for SensorPlugin {
    fn on_setup(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        register_signal(ctx, &keys::ROTATION_MATRIX, &self.signals.rotation_matrix);
        register_signal(ctx, &keys::INCLINATION_MATRIX, &self.signals.inclination_matrix);
        register_signal(ctx, &keys::GRAVITY, &self.signals.gravity);
        register_signal(ctx, &keys::GEOMAGNETIC, &self.signals.geomagnetic);
        register_signal(ctx, &keys::ROTATION_VECTOR, &self.signals.rotation_vector);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::engine;

    #[test]
    fn interaction_values_follow_the_cells() {
        let plugin = InteractionPlugin::new();
        let signals = plugin.signals();
        let mut engine = engine(&[]);
        engine.register_plugin(plugin);
        engine.setup().unwrap();

        assert_eq!(engine.data_mut().get(&keys::TOUCH_POSITION), None);

        signals.touch.publish([3.0, 4.0]);
        engine.render_frame().unwrap();
        assert_eq!(engine.data_mut().get(&keys::TOUCH_POSITION), Some([3.0, 4.0]));
    }

    #[test]
    fn device_state_published_from_another_thread() {
        let plugin = DeviceStatePlugin::new();
        let signals = plugin.signals();
        let mut engine = engine(&[]);
        engine.register_plugin(plugin);
        engine.setup().unwrap();

        std::thread::spawn(move || {
            signals.battery_level.publish(0.5);
            signals.night_mode.publish(true);
        })
        .join()
        .unwrap();

        engine.render_frame().unwrap();
        assert_eq!(engine.data_mut().get(&keys::BATTERY_LEVEL), Some(0.5));
        assert_eq!(engine.data_mut().get(&keys::IS_NIGHT_MODE), Some(true));
        assert_eq!(engine.data_mut().get(&keys::POWER_CONNECTED), None);
    }

    #[test]
    fn sensor_keys_are_registered() {
        let signals = SensorSignals::default();
        signals.gravity.publish([0.0, -9.81, 0.0]);
        let mut engine = engine(&[]);
        engine.register_plugin(SensorPlugin::with_signals(signals));
        engine.setup().unwrap();

        assert!(engine.data_mut().contains(&keys::ROTATION_VECTOR));
        assert_eq!(engine.data_mut().get(&keys::GRAVITY), Some([0.0, -9.81, 0.0]));
    }
}
