use crate::error::Result;
use crate::scene::Geometry;

use super::{GeometryHandle, GpuBackend, ObjectCache, SurfaceGeneration};

/// Vertex buffers keyed by geometry content.
pub struct GeometryCache {
    cache: ObjectCache<Geometry, GeometryHandle>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self {
            cache: ObjectCache::new("geometry"),
        }
    }

    pub fn resolve<B: GpuBackend + ?Sized>(
        &mut self,
        geometry: &Geometry,
        generation: SurfaceGeneration,
        backend: &mut B,
    ) -> Result<GeometryHandle> {
        self.cache
            .resolve_or_create(geometry, generation, |g| {
                Ok(GeometryHandle::new(backend.create_geometry(g)?, generation))
            })
            .copied()
    }

    pub fn destroy(&mut self) -> usize {
        self.cache.destroy()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new()
    }
}
