//! Content-addressed asset loading.
//!
//! Assets are requested through an [`AssetRef`]; aliases are resolved to a
//! concrete [`AssetUri`] by the configured [`AssetLocator`], and the URI is the
//! cache key. The first request for a URI pays the load cost; later requests
//! return the cached `Arc`.

mod loaders;
mod provider;
mod reference;
mod shader;
mod stream;
mod texture;

pub use loaders::{ImageTextureLoader, ShaderAssetLoader};
pub use provider::{AssetLoader, AssetProvider};
pub use reference::{AssetLocator, AssetRef, AssetUri, IdentityLocator};
pub use shader::ShaderAsset;
pub use stream::{AssetStreamProvider, FileStreamProvider, MemoryStreamProvider};
pub use texture::TextureAsset;
