//! Engine harness over [`RecordingBackend`] and in-memory assets.

use std::io::Cursor;

use crate::asset::{AssetProvider, ImageTextureLoader, MemoryStreamProvider, ShaderAssetLoader};
use crate::engine::{EngineConfig, EngineController};
use crate::gpu::testing::RecordingBackend;
use crate::gpu::GpuRenderer;

pub(crate) type TestEngine = EngineController<GpuRenderer<RecordingBackend>>;

/// Engine whose assets are `files`; shaders get the vertex source `vs`.
pub(crate) fn engine(files: &[(&str, &[u8])]) -> TestEngine {
    engine_with(files, EngineConfig::default())
}

/// [`engine`] with an explicit configuration.
pub(crate) fn engine_with(files: &[(&str, &[u8])], config: EngineConfig) -> TestEngine {
    let streams = files
        .iter()
        .fold(MemoryStreamProvider::new(), |streams, (uri, bytes)| {
            streams.with(*uri, bytes.to_vec())
        });
    let mut assets = AssetProvider::new(streams);
    assets.register_loader(ShaderAssetLoader::with_vertex_source("vs"));
    assets.register_loader(ImageTextureLoader);

    let renderer = GpuRenderer::new(RecordingBackend::new(), &config);
    EngineController::new(renderer, assets, config)
}

/// Encoded PNG of a `width` x `height` opaque white image.
pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}
