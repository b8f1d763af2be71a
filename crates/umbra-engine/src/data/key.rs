use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed identifier for a data source.
///
/// Two keys are the same source iff both the name and the value type match;
/// `DataKey<f32>::new("x")` and `DataKey<bool>::new("x")` never collide.
pub struct DataKey<T> {
    name: Cow<'static, str>,
    _value: PhantomData<fn() -> T>,
}

impl<T> DataKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _value: PhantomData,
        }
    }

    /// Creates a key from a runtime string (e.g. a name read from shader source).
    pub fn owned(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _value: PhantomData,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: 'static> DataKey<T> {
    pub(crate) fn erased(&self) -> ErasedKey {
        ErasedKey {
            name: self.name.clone(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

impl<T> Clone for DataKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> PartialEq for DataKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for DataKey<T> {}

impl<T> Hash for DataKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for DataKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataKey<{}>({:?})", type_name::<T>(), self.name)
    }
}

/// Type-erased key used inside the registry maps.
#[derive(Debug, Clone)]
pub(crate) struct ErasedKey {
    name: Cow<'static, str>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ErasedKey {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ErasedKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for ErasedKey {}

impl Hash for ErasedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.type_id.hash(state);
    }
}
