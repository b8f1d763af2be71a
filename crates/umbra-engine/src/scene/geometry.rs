use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Interleaved 2D vertex data: `x, y, u, v` per vertex.
///
/// Equality and hashing compare the float bit patterns, so the type can key
/// the geometry cache.
#[derive(Debug, Clone)]
pub struct Geometry {
    vertices: Arc<[f32]>,
    vertex_count: u32,
}

impl Geometry {
    /// Floats per vertex (position xy + texcoord uv).
    pub const FLOATS_PER_VERTEX: usize = 4;

    pub fn new(vertices: impl Into<Arc<[f32]>>, vertex_count: u32) -> Self {
        Self {
            vertices: vertices.into(),
            vertex_count,
        }
    }

    /// Four-vertex quad covering clip space, drawn as a triangle strip.
    pub fn fullscreen_quad() -> Self {
        #[rustfmt::skip]
        const QUAD: [f32; 16] = [
            -1.0,  1.0, 0.0, 1.0,
            -1.0, -1.0, 0.0, 0.0,
             1.0,  1.0, 1.0, 1.0,
             1.0, -1.0, 1.0, 0.0,
        ];
        Self::new(QUAD.as_slice(), 4)
    }

    #[inline]
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.vertex_count == other.vertex_count
            && (Arc::ptr_eq(&self.vertices, &other.vertices)
                || (self.vertices.len() == other.vertices.len()
                    && self
                        .vertices
                        .iter()
                        .zip(other.vertices.iter())
                        .all(|(a, b)| a.to_bits() == b.to_bits())))
    }
}

impl Eq for Geometry {}

impl Hash for Geometry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vertex_count.hash(state);
        self.vertices.len().hash(state);
        for v in self.vertices.iter() {
            v.to_bits().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independently_built_quads_are_equal() {
        let a = Geometry::fullscreen_quad();
        let b = Geometry::new(a.vertices().to_vec(), 4);
        assert_eq!(a, b);
    }

    #[test]
    fn vertex_count_participates_in_equality() {
        let a = Geometry::new(vec![0.0; 8], 2);
        let b = Geometry::new(vec![0.0; 8], 1);
        assert_ne!(a, b);
    }

    #[test]
    fn quad_has_four_interleaved_vertices() {
        let quad = Geometry::fullscreen_quad();
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.vertices().len(), 4 * Geometry::FLOATS_PER_VERTEX);
    }
}
