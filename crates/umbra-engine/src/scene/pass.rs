use super::{Geometry, Material, RenderTarget};

/// Primitive topology of a draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
    TriangleFan,
    Lines,
    LineStrip,
    Points,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Pixel rectangle inside a render target.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ViewportRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ViewportRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One geometry + material + topology triple.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub geometry: Geometry,
    pub material: Material,
    pub primitive: Primitive,
}

impl DrawCall {
    pub fn new(geometry: Geometry, material: Material, primitive: Primitive) -> Self {
        Self {
            geometry,
            material,
            primitive,
        }
    }

    /// Full-screen quad drawn as a triangle strip.
    pub fn fullscreen(material: Material) -> Self {
        Self::new(Geometry::fullscreen_quad(), material, Primitive::TriangleStrip)
    }
}

/// One render target plus the ordered draws rendered into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub target: RenderTarget,
    pub clear: Option<ClearColor>,
    pub viewport: Option<ViewportRect>,
    pub draws: Vec<DrawCall>,
}

impl Pass {
    pub fn new(target: RenderTarget) -> Self {
        Self {
            target,
            clear: None,
            viewport: None,
            draws: Vec::new(),
        }
    }

    /// Pass with a single draw and no clear.
    pub fn single(target: RenderTarget, draw: DrawCall) -> Self {
        Self::new(target).with_draw(draw)
    }

    pub fn with_clear(mut self, clear: ClearColor) -> Self {
        self.clear = Some(clear);
        self
    }

    pub fn with_viewport(mut self, viewport: ViewportRect) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn with_draw(mut self, draw: DrawCall) -> Self {
        self.draws.push(draw);
        self
    }
}
