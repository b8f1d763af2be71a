use std::any::type_name;

use crate::error::Result;

use super::EngineContext;

/// Unit of engine behaviour driven through the frame lifecycle.
///
/// `on_setup` runs exactly once, before any other hook on the same plugin.
/// Every hook defaults to doing nothing.
pub trait Plugin {
    /// Name used in logs.
    fn name(&self) -> &str {
        let full = type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn on_setup(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    fn on_pre_render(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// May emit commands through [`EngineContext::submit`].
    fn on_render(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    fn on_post_render(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    fn on_teardown(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }
}

pub(crate) type PendingPlugins = Vec<Box<dyn Plugin>>;

/// Pending and active plugin queues.
///
/// Plugins registered at any point, including from inside a hook, wait in the
/// pending queue until the next promotion.
#[derive(Default)]
pub struct PluginManager {
    pending: PendingPlugins,
    active: Vec<Box<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.pending.push(plugin);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Moves every pending plugin to the active queue, calling `setup` on each.
    ///
    /// Plugins registered by another plugin's `setup` are promoted in the same call.
    pub(crate) fn promote<F>(&mut self, mut setup: F) -> Result<()>
    where
        F: FnMut(&mut dyn Plugin, &mut PendingPlugins) -> Result<()>,
    {
        while !self.pending.is_empty() {
            for mut plugin in std::mem::take(&mut self.pending) {
                log::debug!("activating plugin '{}'", plugin.name());
                let result = setup(plugin.as_mut(), &mut self.pending);
                self.active.push(plugin);
                result?;
            }
        }
        Ok(())
    }

    /// Calls `hook` on every active plugin in registration order, stopping at the first error.
    pub(crate) fn for_each_active<F>(&mut self, mut hook: F) -> Result<()>
    where
        F: FnMut(&mut dyn Plugin, &mut PendingPlugins) -> Result<()>,
    {
        for plugin in &mut self.active {
            hook(plugin.as_mut(), &mut self.pending)?;
        }
        Ok(())
    }

    /// Calls `hook` on every active plugin, logging failures instead of stopping.
    pub(crate) fn for_each_active_lenient<F>(&mut self, mut hook: F)
    where
        F: FnMut(&mut dyn Plugin, &mut PendingPlugins) -> Result<()>,
    {
        for plugin in &mut self.active {
            if let Err(err) = hook(plugin.as_mut(), &mut self.pending) {
                log::error!("plugin '{}' failed during teardown: {err}", plugin.name());
            }
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.active.clear();
    }
}
