use std::any::{type_name, Any, TypeId};
use std::io::Read;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{EngineError, Result};

use super::{AssetLocator, AssetRef, AssetStreamProvider, AssetUri, IdentityLocator};

/// Decodes one asset type from a byte stream.
pub trait AssetLoader<A> {
    fn load(&self, stream: &mut dyn Read) -> Result<A>;
}

type BoxedLoader<A> = Box<dyn AssetLoader<A>>;

/// Loader registry plus the engine-lifetime asset cache.
pub struct AssetProvider {
    locator: Box<dyn AssetLocator>,
    streams: Box<dyn AssetStreamProvider>,
    loaders: FxHashMap<TypeId, Box<dyn Any>>,
    cache: FxHashMap<AssetUri, Arc<dyn Any + Send + Sync>>,
}

impl AssetProvider {
    pub fn new(streams: impl AssetStreamProvider + 'static) -> Self {
        Self {
            locator: Box::new(IdentityLocator),
            streams: Box::new(streams),
            loaders: FxHashMap::default(),
            cache: FxHashMap::default(),
        }
    }

    pub fn with_locator(mut self, locator: impl AssetLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    /// Registers the loader for asset type `A`, replacing any previous one.
    pub fn register_loader<A, L>(&mut self, loader: L)
    where
        A: 'static,
        L: AssetLoader<A> + 'static,
    {
        let boxed: BoxedLoader<A> = Box::new(loader);
        self.loaders.insert(TypeId::of::<A>(), Box::new(boxed));
    }

    /// Resolves `asset` to its cache key.
    pub fn resolve<A: 'static>(&self, asset: &AssetRef) -> AssetUri {
        match asset {
            AssetRef::Alias(name) => self.locator.identify(name, short_type_name::<A>()),
            AssetRef::Location(uri) => uri.clone(),
        }
    }

    /// Loads (or returns the cached) asset of type `A`.
    ///
    /// Fails when no loader is registered for `A`, when the URI is already
    /// cached under another type, or when the stream cannot be opened or decoded.
    pub fn load<A>(&mut self, asset: &AssetRef) -> Result<Arc<A>>
    where
        A: Send + Sync + 'static,
    {
        let uri = self.resolve::<A>(asset);

        if let Some(cached) = self.cache.get(&uri) {
            return Arc::clone(cached)
                .downcast::<A>()
                .map_err(|_| EngineError::AssetTypeMismatch {
                    identifier: uri.to_string(),
                    expected: short_type_name::<A>(),
                });
        }

        let loader = self
            .loaders
            .get(&TypeId::of::<A>())
            .and_then(|l| l.downcast_ref::<BoxedLoader<A>>())
            .ok_or(EngineError::MissingLoader {
                asset_type: short_type_name::<A>(),
            })?;

        let mut stream = self
            .streams
            .open_stream(&uri)
            .map_err(|e| EngineError::asset_load(uri.as_str(), e))?;

        let loaded = loader.load(&mut stream).map_err(|e| match e {
            EngineError::AssetLoad { message, .. } => EngineError::AssetLoad {
                identifier: uri.to_string(),
                message,
            },
            other => other,
        })?;

        log::debug!("loaded {} from '{uri}'", short_type_name::<A>());
        let loaded = Arc::new(loaded);
        self.cache
            .insert(uri, Arc::clone(&loaded) as Arc<dyn Any + Send + Sync>);
        Ok(loaded)
    }

    /// Whether `asset` is already cached (under any type).
    pub fn is_cached<A: 'static>(&self, asset: &AssetRef) -> bool {
        self.cache.contains_key(&self.resolve::<A>(asset))
    }
}

fn short_type_name<A>() -> &'static str {
    let full = type_name::<A>();
    full.rsplit("::").next().unwrap_or(full)
}
