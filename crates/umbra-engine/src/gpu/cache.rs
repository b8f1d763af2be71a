use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::{EngineError, Result};

use super::{SurfaceGeneration, Tagged};

/// Map from a value descriptor to a lazily created, generation-tagged GPU object.
///
/// - identical descriptors resolve to the same object within one generation
/// - an entry from an older generation counts as a miss and is recreated
/// - there is no per-entry eviction; [`destroy`](Self::destroy) drops everything
pub struct ObjectCache<K, H> {
    label: &'static str,
    entries: FxHashMap<K, H>,
}

impl<K, H> ObjectCache<K, H>
where
    K: Eq + Hash + Clone,
    H: Tagged,
{
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: FxHashMap::default(),
        }
    }

    /// Returns the object for `key`, creating it on a miss.
    ///
    /// `create` runs at most once per key and generation; a failed creation
    /// leaves the cache untouched.
    pub fn resolve_or_create<F>(
        &mut self,
        key: &K,
        generation: SurfaceGeneration,
        create: F,
    ) -> Result<&H>
    where
        F: FnOnce(&K) -> Result<H>,
    {
        let hit = self
            .entries
            .get(key)
            .is_some_and(|h| h.generation() == generation);

        if !hit {
            let created = create(key)?;
            log::debug!("{} cache miss; created object under {generation}", self.label);
            self.entries.insert(key.clone(), created);
        }

        self.entries
            .get(key)
            .ok_or_else(|| EngineError::Backend(format!("{} cache lost an entry", self.label)))
    }

    /// Looks up `key` without creating; stale entries are reported as absent.
    pub fn get(&self, key: &K, generation: SurfaceGeneration) -> Option<&H> {
        self.entries
            .get(key)
            .filter(|h| h.generation() == generation)
    }

    /// Drops every entry and returns how many there were.
    pub fn destroy(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &H> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::TextureHandle;

    fn r#gen(n: u64) -> SurfaceGeneration {
        (0..n).fold(SurfaceGeneration::default(), |g, _| g.next())
    }

    #[test]
    fn repeated_resolution_returns_same_handle() {
        let mut cache: ObjectCache<&str, TextureHandle> = ObjectCache::new("test");
        let mut created = 0;

        let mut resolve = |cache: &mut ObjectCache<&str, TextureHandle>| {
            *cache
                .resolve_or_create(&"a", r#gen(0), |_| {
                    created += 1;
                    Ok(TextureHandle::new(created, r#gen(0)))
                })
                .unwrap()
        };

        let first = resolve(&mut cache);
        let second = resolve(&mut cache);
        assert_eq!(first, second);
        assert_eq!(created, 1);
    }

    #[test]
    fn stale_generation_is_a_miss() {
        let mut cache: ObjectCache<&str, TextureHandle> = ObjectCache::new("test");
        let old = *cache
            .resolve_or_create(&"a", r#gen(0), |_| Ok(TextureHandle::new(1, r#gen(0))))
            .unwrap();
        assert!(cache.get(&"a", r#gen(1)).is_none());

        let new = *cache
            .resolve_or_create(&"a", r#gen(1), |_| Ok(TextureHandle::new(2, r#gen(1))))
            .unwrap();
        assert_ne!(old, new);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_creation_leaves_cache_empty() {
        let mut cache: ObjectCache<&str, TextureHandle> = ObjectCache::new("test");
        let err = cache
            .resolve_or_create(&"a", r#gen(0), |_| Err(EngineError::Backend("boom".into())))
            .unwrap_err();
        assert_eq!(err, EngineError::Backend("boom".into()));
        assert!(cache.is_empty());
    }

    #[test]
    fn destroy_drops_everything() {
        let mut cache: ObjectCache<u32, TextureHandle> = ObjectCache::new("test");
        for k in 0..3 {
            cache
                .resolve_or_create(&k, r#gen(0), |k| Ok(TextureHandle::new(*k as u64, r#gen(0))))
                .unwrap();
        }
        assert_eq!(cache.destroy(), 3);
        assert!(cache.is_empty());
    }
}
