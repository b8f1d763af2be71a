use std::sync::Arc;

/// Vertex + fragment source pair.
///
/// Compared by content: two assets with the same sources share one compiled program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderAsset {
    vertex_source: Arc<str>,
    fragment_source: Arc<str>,
}

impl ShaderAsset {
    pub fn new(vertex_source: impl Into<Arc<str>>, fragment_source: impl Into<Arc<str>>) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
        }
    }

    #[inline]
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    #[inline]
    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }
}
