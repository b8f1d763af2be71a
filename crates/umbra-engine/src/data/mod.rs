//! Type-safe per-frame data sources.
//!
//! A [`DataKey<T>`] is the only legal lookup token into the [`DataRegistry`];
//! the registry activates the backing [`DataProvider<T>`] on first read and
//! serves every further read in the same frame from a transient cache.
//!
//! Values produced on other threads (sensors, system state) are published
//! through a [`SignalCell`] and sampled synchronously by a [`SignalProvider`].

mod key;
pub mod keys;
mod provider;
mod registry;
mod signal;

pub use key::DataKey;
pub use provider::{ConstantProvider, DataProvider, SignalProvider, TimeProvider};
pub use registry::DataRegistry;
pub use signal::SignalCell;

pub(crate) use key::ErasedKey;
