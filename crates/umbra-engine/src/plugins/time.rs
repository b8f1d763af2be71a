use crate::data::{keys, TimeProvider};
use crate::engine::{EngineContext, Plugin};
use crate::error::Result;

/// Publishes [`keys::TIME`]: seconds since the key was first read.
#[derive(Debug, Default)]
pub struct TimePlugin;

impl TimePlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for TimePlugin {
    fn on_setup(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        ctx.register_provider(&keys::TIME, TimeProvider::new);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::engine;

    #[test]
    fn time_is_available_after_setup() {
        let mut engine = engine(&[]);
        engine.register_plugin(TimePlugin::new());
        engine.setup().unwrap();

        let t = engine.data_mut().get(&keys::TIME);
        assert!(t.is_some_and(|t| t >= 0.0));
    }
}
