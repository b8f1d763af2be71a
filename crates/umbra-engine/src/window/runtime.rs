use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuInit, WgpuBackend};
use crate::engine::{EngineConfig, EngineController, EngineState};
use crate::error::EngineError;
use crate::gpu::GpuRenderer;
use crate::plugins::{InteractionPlugin, InteractionSignals};

use super::app::{AppControl, HostApp, HostEngine};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "umbra".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the windowed host.
///
/// Opens one window, binds an engine to its surface and renders continuously
/// until the window closes or the app asks to exit. Pointer motion is
/// published as the touch position.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, engine: EngineConfig, app: A) -> Result<()>
    where
        A: HostApp + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = HostState::new(config, gpu_init, engine, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[not_covariant]
    engine: HostEngine<'this>,
}

struct HostState<A: HostApp> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    engine_config: EngineConfig,
    app: A,
    signals: InteractionSignals,

    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A: HostApp> HostState<A> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, engine_config: EngineConfig, app: A) -> Self {
        Self {
            config,
            gpu_init,
            engine_config,
            app,
            signals: InteractionSignals::default(),
            entry: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let (app, signals) = (&mut self.app, &self.signals);
        let gpu_init = self.gpu_init.clone();
        let engine_config = self.engine_config;

        let entry = WindowEntryTryBuilder {
            window,
            engine_builder: |window: &Window| {
                build_engine(window, gpu_init, engine_config, signals, app)
            },
        }
        .try_build()?;

        self.entry = Some(entry);
        Ok(())
    }

    /// Runs setup and publishes the initial surface size.
    fn start_engine(&mut self) -> Option<EngineError> {
        let entry = self.entry.as_mut()?;
        entry.with_mut(|fields| {
            let size = fields.window.inner_size();
            let result = fields.engine.setup();
            fields.engine.set_viewport(size.width, size.height);
            result.err()
        })
    }

    fn render(&mut self) -> Option<EngineError> {
        let entry = self.entry.as_mut()?;
        entry.with_engine_mut(|engine| {
            if engine.state() != EngineState::Active {
                return None;
            }
            engine.render_frame().err()
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(entry) = self.entry.as_mut() {
            entry.with_engine_mut(|engine| engine.set_viewport(size.width, size.height));
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn report(&mut self, event_loop: &ActiveEventLoop, err: EngineError) {
        if self.app.on_engine_error(&err) == AppControl::Exit {
            self.failure = Some(err.into());
            self.request_exit(event_loop);
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut entry) = self.entry.take() {
            entry.with_engine_mut(|engine| engine.shutdown());
        }
    }
}

fn build_engine<'w, A: HostApp>(
    window: &'w Window,
    gpu_init: GpuInit,
    config: EngineConfig,
    signals: &InteractionSignals,
    app: &mut A,
) -> Result<HostEngine<'w>> {
    let gpu = pollster::block_on(Gpu::new(window, gpu_init))
        .context("GPU initialization failed for window")?;
    let renderer = GpuRenderer::new(WgpuBackend::new(gpu), &config);

    let mut engine = EngineController::new(renderer, app.assets(), config);
    engine.register_plugin(InteractionPlugin::with_signals(signals.clone()));
    app.configure(&mut engine).context("failed to configure engine")?;
    Ok(engine)
}

impl<A: HostApp> ApplicationHandler for HostState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.failure = Some(e);
            self.request_exit(event_loop);
            return;
        }

        if let Some(err) = self.start_engine() {
            self.report(event_loop, err);
        }

        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; time-driven shaders change every frame.
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.shutdown();
            self.request_exit(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => self.resize(*new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(entry) = self.entry.as_ref() {
                    let height = entry.with_window(|w| w.inner_size().height);
                    self.signals.touch.publish(touch_position(*position, height));
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(err) = self.render() {
                    self.report(event_loop, err);
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Window position (top-left origin) to physical pixels with a bottom-left origin.
fn touch_position(position: PhysicalPosition<f64>, height: u32) -> [f32; 2] {
    [position.x as f32, height as f32 - position.y as f32]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_origin_is_bottom_left() {
        assert_eq!(touch_position(PhysicalPosition::new(10.0, 0.0), 200), [10.0, 200.0]);
        assert_eq!(touch_position(PhysicalPosition::new(0.0, 150.0), 200), [0.0, 50.0]);
    }

    #[test]
    fn default_window_is_titled() {
        let config = RuntimeConfig::default();
        assert_eq!(config.title, "umbra");
        assert_eq!(config.initial_size, LogicalSize::new(1280.0, 720.0));
    }
}
