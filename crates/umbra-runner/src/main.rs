use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use winit::dpi::LogicalSize;

use umbra_engine::asset::{
    AssetProvider, AssetRef, AssetStreamProvider, AssetUri, FileStreamProvider, ImageTextureLoader,
    MemoryStreamProvider, ShaderAssetLoader,
};
use umbra_engine::device::{wgsl, GpuInit};
use umbra_engine::engine::EngineConfig;
use umbra_engine::logging::{init_logging, LoggingConfig};
use umbra_engine::plugins::{
    BackbufferPlugin, DeviceStatePlugin, SensorPlugin, ShaderRunnerPlugin, TimePlugin,
};
use umbra_engine::window::{HostApp, HostEngine, Runtime, RuntimeConfig};

const BUILTIN_SCHEME: &str = "builtin";
const DEFAULT_SHADER: &str = "builtin://default.wgsl";

#[derive(Parser, Debug)]
#[command(name = "umbra", version, about = "Run a WGSL fragment shader in a window")]
struct Cli {
    /// Fragment shader to run; defaults to the bundled one.
    shader: Option<PathBuf>,

    /// Directory textures and shaders are resolved against.
    /// Defaults to the shader's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Offscreen resolution relative to the window, in (0, 1].
    #[arg(long, default_value_t = 1.0)]
    quality: f32,

    /// Render as fast as possible instead of pacing to the display.
    #[arg(long)]
    no_vsync: bool,

    /// Prefer the integrated GPU.
    #[arg(long)]
    low_power: bool,

    /// Log filter, e.g. `debug` or `umbra_engine=trace`.
    #[arg(long)]
    log: Option<String>,

    /// Window title.
    #[arg(long, default_value = "umbra")]
    title: String,
}

/// Serves `builtin://` from memory and everything else from disk.
struct RunnerStreams {
    builtin: MemoryStreamProvider,
    files: FileStreamProvider,
}

impl AssetStreamProvider for RunnerStreams {
    fn open_stream(&self, uri: &AssetUri) -> io::Result<Box<dyn Read>> {
        match uri.scheme() {
            Some(BUILTIN_SCHEME) => self.builtin.open_stream(uri),
            _ => self.files.open_stream(uri),
        }
    }
}

struct ShaderApp {
    root: PathBuf,
    shader: AssetRef,
}

impl ShaderApp {
    fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let Some(path) = cli.shader.as_deref() else {
            let root = cli.assets.clone().unwrap_or_else(|| PathBuf::from("."));
            return Ok(Self {
                root,
                shader: AssetRef::location(DEFAULT_SHADER),
            });
        };

        let root = match &cli.assets {
            Some(root) => root.clone(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let relative = path
            .strip_prefix(&root)
            .ok()
            .or_else(|| path.file_name().map(Path::new))
            .with_context(|| format!("'{}' is not a shader file", path.display()))?;

        Ok(Self {
            root,
            shader: AssetRef::alias(relative.to_string_lossy()),
        })
    }
}

impl HostApp for ShaderApp {
    fn assets(&mut self) -> AssetProvider {
        let streams = RunnerStreams {
            builtin: MemoryStreamProvider::new()
                .with(DEFAULT_SHADER, include_bytes!("../shaders/default.wgsl").as_slice()),
            files: FileStreamProvider::new(self.root.clone()),
        };

        let mut assets = AssetProvider::new(streams);
        assets.register_loader(ShaderAssetLoader::with_vertex_source(wgsl::FULLSCREEN_VERTEX));
        assets.register_loader(ImageTextureLoader);
        assets
    }

    fn configure(&mut self, engine: &mut HostEngine<'_>) -> anyhow::Result<()> {
        engine.register_plugin(TimePlugin::new());
        engine.register_plugin(BackbufferPlugin::new());
        engine.register_plugin(DeviceStatePlugin::new());
        engine.register_plugin(SensorPlugin::new());
        engine.register_plugin(ShaderRunnerPlugin::new(self.shader.clone()));
        log::info!("running {:?} from '{}'", self.shader, self.root.display());
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging = match &cli.log {
        Some(filter) => LoggingConfig::default().with_filter(filter.clone()),
        None => LoggingConfig::default(),
    };
    init_logging(logging);

    let app = ShaderApp::from_cli(&cli)?;
    let window = RuntimeConfig {
        title: cli.title.clone(),
        initial_size: LogicalSize::new(960.0, 540.0),
    };

    let mut gpu = GpuInit::default().with_vsync(!cli.no_vsync);
    if cli.low_power {
        gpu = gpu.low_power();
    }

    Runtime::run(window, gpu, EngineConfig::with_quality(cli.quality), app)
}
