use std::io::Read;
use std::sync::Arc;

use crate::error::{EngineError, Result};

use super::{AssetLoader, ShaderAsset, TextureAsset};

/// Loads a fragment source and pairs it with a generated vertex stage.
pub struct ShaderAssetLoader {
    vertex: Box<dyn Fn(&str) -> String>,
}

impl ShaderAssetLoader {
    /// `vertex` derives the vertex source from the fragment source.
    pub fn new<F>(vertex: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        Self {
            vertex: Box::new(vertex),
        }
    }

    /// Pairs every fragment source with the same vertex source.
    pub fn with_vertex_source(vertex_source: impl Into<Arc<str>>) -> Self {
        let source: Arc<str> = vertex_source.into();
        Self::new(move |_| source.to_string())
    }
}

impl AssetLoader<ShaderAsset> for ShaderAssetLoader {
    fn load(&self, stream: &mut dyn Read) -> Result<ShaderAsset> {
        let mut fragment = String::new();
        stream
            .read_to_string(&mut fragment)
            .map_err(|e| EngineError::asset_load("<shader>", e))?;
        let vertex = (self.vertex)(&fragment);
        Ok(ShaderAsset::new(vertex, fragment))
    }
}

/// Decodes PNG/JPEG/BMP/GIF streams into RGBA8 pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageTextureLoader;

impl AssetLoader<TextureAsset> for ImageTextureLoader {
    fn load(&self, stream: &mut dyn Read) -> Result<TextureAsset> {
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| EngineError::asset_load("<texture>", e))?;

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| EngineError::asset_load("<texture>", e))?
            .to_rgba8();

        let (width, height) = decoded.dimensions();
        TextureAsset::new(width, height, decoded.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn shader_loader_derives_vertex_from_fragment() {
        let loader = ShaderAssetLoader::new(|frag| format!("// for {} bytes", frag.len()));
        let asset = loader.load(&mut Cursor::new("abcd")).unwrap();
        assert_eq!(asset.fragment_source(), "abcd");
        assert_eq!(asset.vertex_source(), "// for 4 bytes");
    }

    #[test]
    fn image_loader_decodes_png() {
        let mut png = Vec::new();
        image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255])
            .unwrap()
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let asset = ImageTextureLoader.load(&mut Cursor::new(png)).unwrap();
        assert_eq!((asset.width(), asset.height()), (2, 1));
        assert_eq!(asset.pixels(), &[255, 0, 0, 255, 0, 255, 0, 255]);
    }

    #[test]
    fn image_loader_reports_garbage() {
        let err = ImageTextureLoader
            .load(&mut Cursor::new(b"not an image".to_vec()))
            .unwrap_err();
        assert!(matches!(err, EngineError::AssetLoad { .. }));
    }
}
