use std::sync::Arc;

use crate::asset::TextureAsset;
use crate::coords::Viewport;
use crate::error::{EngineError, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl MinFilter {
    /// Whether sampling reads between mip levels or selects one.
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MagFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

/// Storage format of a GPU image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    #[default]
    Rgba8,
    Srgb8Alpha8,
}

/// Sampling state attached to an image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureParameters {
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
    pub mipmaps: bool,
    /// Maximum anisotropy; `None` leaves the backend default.
    pub anisotropy: Option<u16>,
    pub srgb: bool,
}

impl TextureParameters {
    pub const DEFAULT: Self = Self {
        min_filter: MinFilter::Linear,
        mag_filter: MagFilter::Linear,
        wrap_s: Wrap::ClampToEdge,
        wrap_t: Wrap::ClampToEdge,
        mipmaps: false,
        anisotropy: None,
        srgb: false,
    };
}

impl Default for TextureParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Offscreen image that can be rendered into and sampled from.
///
/// Dimensions are strictly positive; construction rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderTargetImage {
    name: Arc<str>,
    width: u32,
    height: u32,
    format: TextureFormat,
    sampling: TextureParameters,
}

impl RenderTargetImage {
    pub fn new(name: impl Into<Arc<str>>, width: u32, height: u32) -> Result<Self> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDescriptor(format!(
                "render target '{name}' must have positive dimensions, got {width}x{height}"
            )));
        }

        Ok(Self {
            name,
            width,
            height,
            format: TextureFormat::Rgba8,
            sampling: TextureParameters::DEFAULT,
        })
    }

    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_sampling(mut self, sampling: TextureParameters) -> Self {
        self.sampling = sampling;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    #[inline]
    pub fn sampling(&self) -> TextureParameters {
        self.sampling
    }
}

/// A 2D image: either decoded pixels from an asset or an offscreen render target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Image2D {
    FromAsset {
        asset: Arc<TextureAsset>,
        format: TextureFormat,
        sampling: TextureParameters,
    },
    RenderTarget(RenderTargetImage),
}

impl Image2D {
    pub fn from_asset(asset: Arc<TextureAsset>, sampling: TextureParameters) -> Self {
        let format = if sampling.srgb {
            TextureFormat::Srgb8Alpha8
        } else {
            TextureFormat::Rgba8
        };
        Self::FromAsset {
            asset,
            format,
            sampling,
        }
    }

    pub fn size(&self) -> Viewport {
        match self {
            Self::FromAsset { asset, .. } => Viewport::new(asset.width(), asset.height()),
            Self::RenderTarget(rt) => rt.size(),
        }
    }

    pub fn format(&self) -> TextureFormat {
        match self {
            Self::FromAsset { format, .. } => *format,
            Self::RenderTarget(rt) => rt.format(),
        }
    }

    pub fn sampling(&self) -> TextureParameters {
        match self {
            Self::FromAsset { sampling, .. } => *sampling,
            Self::RenderTarget(rt) => rt.sampling(),
        }
    }
}

impl From<RenderTargetImage> for Image2D {
    fn from(rt: RenderTargetImage) -> Self {
        Self::RenderTarget(rt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_target_rejects_zero_dimensions() {
        assert!(RenderTargetImage::new("rt", 0, 10).is_err());
        assert!(RenderTargetImage::new("rt", 10, 0).is_err());
        assert!(RenderTargetImage::new("rt", 1, 1).is_ok());
    }

    #[test]
    fn render_targets_compare_structurally() {
        let a = RenderTargetImage::new("bb", 64, 32).unwrap();
        let b = RenderTargetImage::new(String::from("bb"), 64, 32).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_format(TextureFormat::Srgb8Alpha8));
    }

    #[test]
    fn srgb_sampling_selects_srgb_format() {
        let asset = Arc::new(TextureAsset::new(1, 1, vec![0, 0, 0, 255]).unwrap());
        let params = TextureParameters {
            srgb: true,
            ..TextureParameters::DEFAULT
        };
        let image = Image2D::from_asset(asset, params);
        assert_eq!(image.format(), TextureFormat::Srgb8Alpha8);
        assert_eq!(image.size(), Viewport::new(1, 1));
    }

    #[test]
    fn mipmap_filters_are_classified() {
        assert!(!MinFilter::Linear.uses_mipmaps());
        assert!(MinFilter::LinearMipmapLinear.uses_mipmaps());
    }
}
