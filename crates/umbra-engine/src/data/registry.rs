use std::any::Any;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{DataKey, DataProvider, ErasedKey};

type Factory<T> = Box<dyn Fn() -> Box<dyn DataProvider<T>>>;

/// Active provider with its value type erased, so shutdown can stop every
/// provider without knowing `T`.
trait ActiveProvider {
    fn stop(&mut self);
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Active<T: 'static>(Box<dyn DataProvider<T>>);

impl<T: 'static> ActiveProvider for Active<T> {
    fn stop(&mut self) {
        self.0.stop();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry of data-provider factories, active providers and the per-frame value cache.
///
/// - registration is cheap: only the factory is stored
/// - the provider is created and started on the first read of its key
/// - within one frame every key is read from its provider at most once
#[derive(Default)]
pub struct DataRegistry {
    factories: FxHashMap<ErasedKey, Box<dyn Any>>,
    active: FxHashMap<ErasedKey, Box<dyn ActiveProvider>>,
    frame_cache: FxHashMap<ErasedKey, Box<dyn Any>>,
    reported_missing: FxHashSet<ErasedKey>,
}

impl DataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider factory for `key`.
    ///
    /// The first registration for a key stays in effect; later ones are
    /// ignored with a warning. Returns whether this registration was accepted.
    pub fn register<T, P, F>(&mut self, key: &DataKey<T>, factory: F) -> bool
    where
        T: 'static,
        P: DataProvider<T> + 'static,
        F: Fn() -> P + 'static,
    {
        let erased = key.erased();
        if self.factories.contains_key(&erased) {
            log::warn!(
                "data provider for '{}' ({}) already registered; keeping the first one",
                erased.name(),
                erased.type_name()
            );
            return false;
        }

        let factory: Factory<T> = Box::new(move || Box::new(factory()));
        self.reported_missing.remove(&erased);
        self.factories.insert(erased, Box::new(factory));
        true
    }

    /// Returns whether a factory is registered for `key`.
    pub fn contains<T: 'static>(&self, key: &DataKey<T>) -> bool {
        self.factories.contains_key(&key.erased())
    }

    /// Returns whether the provider behind `key` has been activated.
    pub fn is_active<T: 'static>(&self, key: &DataKey<T>) -> bool {
        self.active.contains_key(&key.erased())
    }

    /// Reads the current value for `key`.
    ///
    /// `None` when no provider is registered or the provider has no value
    /// yet; neither case is an error.
    pub fn get<T: Clone + 'static>(&mut self, key: &DataKey<T>) -> Option<T> {
        let erased = key.erased();

        if let Some(cached) = self.frame_cache.get(&erased) {
            return cached.downcast_ref::<T>().cloned();
        }

        let value = self.activate::<T>(&erased)?.value()?;
        self.frame_cache.insert(erased, Box::new(value.clone()));
        Some(value)
    }

    /// Clears the per-frame cache. Called once at the start of every frame.
    pub fn invalidate_frame_cache(&mut self) {
        self.frame_cache.clear();
    }

    /// Stops every active provider and forgets them; factories stay registered.
    pub fn stop_all(&mut self) {
        for provider in self.active.values_mut() {
            provider.stop();
        }
        let stopped = self.active.len();
        self.active.clear();
        self.frame_cache.clear();
        if stopped > 0 {
            log::debug!("stopped {stopped} data providers");
        }
    }

    fn activate<T: 'static>(&mut self, erased: &ErasedKey) -> Option<&mut dyn DataProvider<T>> {
        if !self.active.contains_key(erased) {
            let Some(factory) = self
                .factories
                .get(erased)
                .and_then(|f| f.downcast_ref::<Factory<T>>())
            else {
                if self.reported_missing.insert(erased.clone()) {
                    log::warn!("no data provider registered for key '{}'", erased.name());
                }
                return None;
            };

            let mut provider = factory();
            provider.start();
            log::debug!("activated data provider '{}'", erased.name());
            self.active
                .insert(erased.clone(), Box::new(Active::<T>(provider)));
        }

        self.active
            .get_mut(erased)
            .and_then(|p| p.as_any_mut().downcast_mut::<Active<T>>())
            .map(|p| p.0.as_mut() as &mut dyn DataProvider<T>)
    }
}
