use crate::asset::AssetProvider;
use crate::coords::Viewport;
use crate::data::{keys, DataRegistry, SignalCell, SignalProvider};
use crate::error::{EngineError, Result};
use crate::pipeline::CommandBuffer;

use super::plugin::{Plugin, PluginManager};
use super::{EngineConfig, EngineContext, Renderer};

/// Lifecycle state of an [`EngineController`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Active,
    ShuttingDown,
}

type ErrorListener = Box<dyn FnMut(&EngineError)>;

/// Drives plugins, data providers and the renderer through the frame lifecycle.
///
/// A frame runs, in order: frame-cache invalidation, promotion of pending
/// plugins (`on_setup`), `on_pre_render`, command reset, `on_render`,
/// [`Renderer::execute`], [`Renderer::end_frame`], `on_post_render`.
///
/// Any error during setup or a frame is logged, recorded as
/// [`last_error`](Self::last_error), passed to the error listener, and tears
/// the engine down. There is no automatic retry.
pub struct EngineController<R: Renderer> {
    config: EngineConfig,
    state: EngineState,
    plugins: PluginManager,
    data: DataRegistry,
    assets: AssetProvider,
    commands: CommandBuffer,
    renderer: R,
    physical_viewport: SignalCell<Viewport>,
    last_error: Option<EngineError>,
    error_listener: Option<ErrorListener>,
}

impl<R: Renderer> EngineController<R> {
    pub fn new(renderer: R, assets: AssetProvider, config: EngineConfig) -> Self {
        let physical_viewport = SignalCell::empty();
        let quality = config.effective_quality();
        let mut data = DataRegistry::new();

        let cell = physical_viewport.clone();
        data.register(&keys::PHYSICAL_VIEWPORT_RESOLUTION, move || {
            SignalProvider::new(cell.clone())
        });
        let cell = physical_viewport.clone();
        data.register(&keys::RENDER_TARGET_RESOLUTION, move || {
            SignalProvider::mapped(cell.clone(), move |v: Viewport| v.scaled(quality))
        });

        Self {
            config,
            state: EngineState::Uninitialized,
            plugins: PluginManager::new(),
            data,
            assets,
            commands: CommandBuffer::new(),
            renderer,
            physical_viewport,
            last_error: None,
            error_listener: None,
        }
    }

    // ── registration ────────────────────────────────────────────────────

    /// Queues `plugin`; it is set up by the next [`setup`](Self::setup) or frame.
    pub fn register_plugin(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.register(Box::new(plugin));
    }

    /// Registers data-provider factories; takes effect immediately.
    pub fn data_mut(&mut self) -> &mut DataRegistry {
        &mut self.data
    }

    /// Registers asset loaders; takes effect immediately.
    pub fn assets_mut(&mut self) -> &mut AssetProvider {
        &mut self.assets
    }

    /// Called with the recorded error whenever setup or a frame fails.
    pub fn on_error(&mut self, listener: impl FnMut(&EngineError) + 'static) {
        self.error_listener = Some(Box::new(listener));
    }

    // ── lifecycle ───────────────────────────────────────────────────────

    /// Prepares a fresh surface and sets up every pending plugin.
    pub fn setup(&mut self) -> Result<()> {
        if self.state != EngineState::Uninitialized {
            return Err(EngineError::InvalidState(format!(
                "setup called while {:?}",
                self.state
            )));
        }

        self.state = EngineState::Active;
        self.last_error = None;
        log::info!(
            "engine setup: {} plugin(s), quality {}",
            self.plugins.pending_len(),
            self.config.effective_quality()
        );

        let result = match self.renderer.on_surface_created() {
            Ok(()) => self.promote_pending(),
            Err(err) => Err(err),
        };
        result.map_err(|err| self.fail(err))
    }

    /// Publishes the new physical surface size and forwards it to the renderer.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        self.physical_viewport.publish(viewport);
        self.renderer.on_surface_changed(viewport);
    }

    pub fn render_frame(&mut self) -> Result<()> {
        if self.state != EngineState::Active {
            return Err(EngineError::InvalidState(format!(
                "render_frame called while {:?}",
                self.state
            )));
        }

        self.run_frame().map_err(|err| self.fail(err))
    }

    /// Tears down every active plugin, stops all data providers and releases
    /// GPU objects. Does nothing when not set up.
    pub fn shutdown(&mut self) {
        if self.state != EngineState::Active {
            return;
        }

        self.state = EngineState::ShuttingDown;
        let Self {
            plugins,
            data,
            assets,
            commands,
            renderer,
            ..
        } = self;
        plugins.for_each_active_lenient(|plugin, pending| {
            let mut ctx = EngineContext::new(&mut *data, &mut *assets, &mut *commands, &mut *renderer, pending);
            plugin.on_teardown(&mut ctx)
        });

        self.plugins.clear();
        self.commands.clear();
        self.data.stop_all();
        self.renderer.close();
        self.state = EngineState::Uninitialized;
        log::info!("engine shut down");
    }

    // ── accessors ───────────────────────────────────────────────────────

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The failure that last tore the engine down, cleared by the next `setup`.
    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    // ── internals ───────────────────────────────────────────────────────

    fn run_frame(&mut self) -> Result<()> {
        self.data.invalidate_frame_cache();
        self.promote_pending()?;

        self.dispatch(|plugin, ctx| plugin.on_pre_render(ctx))?;

        self.commands.clear();
        self.dispatch(|plugin, ctx| plugin.on_render(ctx))?;

        if !self.commands.is_empty() {
            self.renderer.execute(&self.commands)?;
        }
        self.renderer.end_frame()?;

        self.dispatch(|plugin, ctx| plugin.on_post_render(ctx))
    }

    fn promote_pending(&mut self) -> Result<()> {
        let Self {
            plugins,
            data,
            assets,
            commands,
            renderer,
            ..
        } = self;
        plugins.promote(|plugin, pending| {
            let mut ctx = EngineContext::new(&mut *data, &mut *assets, &mut *commands, &mut *renderer, pending);
            plugin.on_setup(&mut ctx)
        })
    }

    fn dispatch<F>(&mut self, mut hook: F) -> Result<()>
    where
        F: FnMut(&mut dyn Plugin, &mut EngineContext<'_>) -> Result<()>,
    {
        let Self {
            plugins,
            data,
            assets,
            commands,
            renderer,
            ..
        } = self;
        plugins.for_each_active(|plugin, pending| {
            let mut ctx = EngineContext::new(&mut *data, &mut *assets, &mut *commands, &mut *renderer, pending);
            hook(plugin, &mut ctx)
        })
    }

    /// Records `err`, notifies the listener, tears down, and hands `err` back.
    fn fail(&mut self, err: EngineError) -> EngineError {
        match err.shader_diagnostics() {
            Some(diag) => log::error!("engine failure: {err}\n{}", diag.details),
            None => log::error!("engine failure: {err}"),
        }

        self.last_error = Some(err.clone());
        if let Some(listener) = self.error_listener.as_mut() {
            listener(&err);
        }
        self.shutdown();
        err
    }
}
