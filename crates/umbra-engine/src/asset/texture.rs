use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use crate::error::{EngineError, Result};

/// Decoded RGBA8 pixels, rows top to bottom.
///
/// Hashing uses a content fingerprint computed once at construction, so the
/// asset can key the texture cache without rehashing the pixels on every lookup.
#[derive(Clone)]
pub struct TextureAsset {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
    fingerprint: u64,
}

impl TextureAsset {
    pub const BYTES_PER_PIXEL: usize = 4;

    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Result<Self> {
        let pixels = pixels.into();
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(EngineError::InvalidDescriptor(format!(
                "texture {width}x{height} needs {expected} bytes of RGBA8, got {}",
                pixels.len()
            )));
        }

        let mut hasher = DefaultHasher::new();
        pixels.hash(&mut hasher);

        Ok(Self {
            width,
            height,
            fingerprint: hasher.finish(),
            pixels,
        })
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
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl PartialEq for TextureAsset {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.fingerprint == other.fingerprint
            && (Arc::ptr_eq(&self.pixels, &other.pixels) || self.pixels == other.pixels)
    }
}

impl Eq for TextureAsset {}

impl Hash for TextureAsset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        self.height.hash(state);
        self.fingerprint.hash(state);
    }
}

impl std::fmt::Debug for TextureAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureAsset")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_pixel_count() {
        assert!(TextureAsset::new(2, 2, vec![0u8; 15]).is_err());
        assert!(TextureAsset::new(0, 2, Vec::<u8>::new()).is_err());
    }

    #[test]
    fn equal_pixels_are_equal_assets() {
        let a = TextureAsset::new(1, 2, vec![1u8, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let b = TextureAsset::new(1, 2, vec![1u8, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let c = TextureAsset::new(2, 1, vec![1u8, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
