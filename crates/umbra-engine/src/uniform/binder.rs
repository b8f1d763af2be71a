use std::collections::BTreeSet;

use crate::data::{DataKey, DataRegistry};
use crate::scene::{Material, Uniform};

type Read = Box<dyn Fn(&mut DataRegistry) -> Option<Uniform>>;

struct Binding {
    name: String,
    read: Read,
}

/// Ordered list of `uniform name -> data key -> mapper` bindings.
///
/// [`apply`](Self::apply) only touches uniforms the compiled shader reports as
/// active, so a shader receives exactly what it declares.
#[derive(Default)]
pub struct UniformBinder {
    bindings: Vec<Binding>,
}

impl UniformBinder {
    pub fn builder() -> UniformBinderBuilder {
        UniformBinderBuilder::default()
    }

    /// Writes every active, available binding into `material`.
    ///
    /// Bindings whose uniform is inactive or whose provider has no value are
    /// skipped. Returns the number of uniforms written.
    pub fn apply(
        &self,
        data: &mut DataRegistry,
        active: &BTreeSet<String>,
        material: &mut Material,
    ) -> usize {
        let mut written = 0;
        for binding in &self.bindings {
            if !active.contains(&binding.name) {
                continue;
            }
            if let Some(value) = (binding.read)(data) {
                material.set_uniform(binding.name.as_str(), value);
                written += 1;
            }
        }
        written
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Default)]
pub struct UniformBinderBuilder {
    bindings: Vec<Binding>,
}

impl UniformBinderBuilder {
    pub fn bind<T, F>(mut self, name: impl Into<String>, key: DataKey<T>, mapper: F) -> Self
    where
        T: Clone + 'static,
        F: Fn(T) -> Uniform + 'static,
    {
        self.bindings.push(Binding {
            name: name.into(),
            read: Box::new(move |data| data.get(&key).map(&mapper)),
        });
        self
    }

    /// Appends every binding of `other` after the current ones.
    pub fn extend(mut self, other: UniformBinder) -> Self {
        self.bindings.extend(other.bindings);
        self
    }

    pub fn build(self) -> UniformBinder {
        UniformBinder {
            bindings: self.bindings,
        }
    }
}
