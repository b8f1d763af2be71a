use std::sync::Arc;

use crate::asset::{AssetProvider, AssetRef, ShaderAsset};
use crate::data::{DataKey, DataProvider, DataRegistry};
use crate::error::Result;
use crate::pipeline::{CommandBuffer, GpuCommand, PassCompiler};
use crate::scene::Pass;
use crate::shader::{ShaderIntrospector, ShaderMetadata};
use crate::uniform::{default_bindings, UniformBinder};

use super::plugin::{PendingPlugins, Plugin};

/// Engine services handed to every plugin hook.
pub struct EngineContext<'a> {
    data: &'a mut DataRegistry,
    assets: &'a mut AssetProvider,
    commands: &'a mut CommandBuffer,
    introspector: &'a mut dyn ShaderIntrospector,
    pending: &'a mut PendingPlugins,
}

impl<'a> EngineContext<'a> {
    pub(crate) fn new(
        data: &'a mut DataRegistry,
        assets: &'a mut AssetProvider,
        commands: &'a mut CommandBuffer,
        introspector: &'a mut dyn ShaderIntrospector,
        pending: &'a mut PendingPlugins,
    ) -> Self {
        Self {
            data,
            assets,
            commands,
            introspector,
            pending,
        }
    }

    // ── data ────────────────────────────────────────────────────────────

    /// Current value of `key`; `None` when no provider is registered or it has no value yet.
    pub fn get<T: Clone + 'static>(&mut self, key: &DataKey<T>) -> Option<T> {
        self.data.get(key)
    }

    /// See [`DataRegistry::register`].
    pub fn register_provider<T, P, F>(&mut self, key: &DataKey<T>, factory: F) -> bool
    where
        T: 'static,
        P: DataProvider<T> + 'static,
        F: Fn() -> P + 'static,
    {
        self.data.register(key, factory)
    }

    pub fn data(&mut self) -> &mut DataRegistry {
        self.data
    }

    // ── assets ──────────────────────────────────────────────────────────

    pub fn load<A: Send + Sync + 'static>(&mut self, asset: &AssetRef) -> Result<Arc<A>> {
        self.assets.load(asset)
    }

    pub fn assets(&mut self) -> &mut AssetProvider {
        self.assets
    }

    // ── shaders ─────────────────────────────────────────────────────────

    pub fn introspect(&mut self, shader: &ShaderAsset) -> Result<ShaderMetadata> {
        self.introspector.introspect(shader)
    }

    /// The stock uniform bindings.
    pub fn default_bindings(&self) -> UniformBinder {
        default_bindings()
    }

    // ── commands ────────────────────────────────────────────────────────

    /// Compiles `passes` and appends them to this frame's commands.
    pub fn submit(&mut self, passes: &[Pass]) {
        self.commands.append(PassCompiler.compile(passes));
    }

    pub fn push_command(&mut self, command: GpuCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &CommandBuffer {
        self.commands
    }

    // ── plugins ─────────────────────────────────────────────────────────

    /// Queues `plugin`; it becomes active at the start of the next frame.
    pub fn register_plugin(&mut self, plugin: impl Plugin + 'static) {
        self.pending.push(Box::new(plugin));
    }
}
