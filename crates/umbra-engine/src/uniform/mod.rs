//! Declarative uniform bindings fed by data providers.

mod binder;
mod catalog;

pub use binder::{UniformBinder, UniformBinderBuilder};
pub use catalog::default_bindings;
