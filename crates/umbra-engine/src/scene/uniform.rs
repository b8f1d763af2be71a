use std::collections::BTreeMap;
use std::sync::Arc;

use crate::asset::ShaderAsset;

use super::TextureSource;

/// Value bound to one shader uniform.
///
/// Matrices are column-major.
#[derive(Debug, Clone, PartialEq)]
pub enum Uniform {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
    Int(i32),
    Sampler2D(TextureSource),
}

impl Uniform {
    /// Short type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat2(_) => "mat2",
            Self::Mat3(_) => "mat3",
            Self::Mat4(_) => "mat4",
            Self::Int(_) => "int",
            Self::Sampler2D(_) => "sampler2D",
        }
    }
}

impl From<f32> for Uniform {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<[f32; 2]> for Uniform {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f32; 3]> for Uniform {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f32; 4]> for Uniform {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<[f32; 16]> for Uniform {
    fn from(v: [f32; 16]) -> Self {
        Self::Mat4(v)
    }
}

impl From<i32> for Uniform {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<TextureSource> for Uniform {
    fn from(v: TextureSource) -> Self {
        Self::Sampler2D(v)
    }
}

/// A shader plus the uniform values it is drawn with.
///
/// Uniforms are kept sorted by name so texture-unit assignment is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    shader: Arc<ShaderAsset>,
    uniforms: BTreeMap<String, Uniform>,
}

impl Material {
    pub fn new(shader: Arc<ShaderAsset>) -> Self {
        Self {
            shader,
            uniforms: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn shader(&self) -> &Arc<ShaderAsset> {
        &self.shader
    }

    pub fn set_uniform(&mut self, name: impl Into<String>, value: impl Into<Uniform>) {
        self.uniforms.insert(name.into(), value.into());
    }

    pub fn with_uniform(mut self, name: impl Into<String>, value: impl Into<Uniform>) -> Self {
        self.set_uniform(name, value);
        self
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    #[inline]
    pub fn uniforms(&self) -> &BTreeMap<String, Uniform> {
        &self.uniforms
    }
}
