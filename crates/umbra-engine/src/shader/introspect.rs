use std::collections::BTreeSet;

use crate::asset::ShaderAsset;
use crate::error::Result;

/// What a compiled program exposes to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderMetadata {
    /// Uniform names retained by the compiler, array suffixes stripped.
    pub active_uniforms: BTreeSet<String>,
}

impl ShaderMetadata {
    pub fn is_active(&self, name: &str) -> bool {
        self.active_uniforms.contains(name)
    }
}

/// Compiles (or fetches) a shader and reports its active uniforms.
///
/// Used by plugins during setup to decide which optional uniforms and
/// samplers to populate before the first draw.
pub trait ShaderIntrospector {
    fn introspect(&mut self, shader: &ShaderAsset) -> Result<ShaderMetadata>;
}
