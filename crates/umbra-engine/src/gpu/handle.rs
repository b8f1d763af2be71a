use std::fmt;

/// Counter identifying one lifetime of the rendering surface.
///
/// Bumped on every surface (re)creation. Handles remember the generation they
/// were created under; a handle from an older generation is never used.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceGeneration(u64);

impl SurfaceGeneration {
    #[inline]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// Backend-assigned object id. Only meaningful to the backend that produced it.
pub type RawHandle = u64;

/// Anything stored in an object cache that is tied to a surface generation.
pub trait Tagged {
    fn generation(&self) -> SurfaceGeneration;
}

impl<T: Tagged> Tagged for std::sync::Arc<T> {
    fn generation(&self) -> SurfaceGeneration {
        (**self).generation()
    }
}

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            raw: RawHandle,
            generation: SurfaceGeneration,
        }

        impl $name {
            pub const KIND: &'static str = $kind;

            #[inline]
            pub(crate) const fn new(raw: RawHandle, generation: SurfaceGeneration) -> Self {
                Self { raw, generation }
            }

            #[inline]
            pub fn raw(self) -> RawHandle {
                self.raw
            }
        }

        impl Tagged for $name {
            #[inline]
            fn generation(&self) -> SurfaceGeneration {
                self.generation
            }
        }
    };
}

gpu_handle!(
    /// Vertex buffer created from a [`Geometry`](crate::scene::Geometry).
    GeometryHandle,
    "geometry"
);
gpu_handle!(
    /// Texture created from an [`Image2D`](crate::scene::Image2D).
    TextureHandle,
    "texture"
);
gpu_handle!(
    /// Offscreen framebuffer.
    FramebufferHandle,
    "framebuffer"
);
gpu_handle!(
    /// Linked shader program.
    ProgramHandle,
    "program"
);
