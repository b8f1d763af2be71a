/// Surface or render-target size in physical pixels.
///
/// Supplied once per surface-size change and consumed by swapchain and
/// backbuffer sizing logic.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Scales both axes by `factor`, never going below one pixel.
    ///
    /// Used to derive the offscreen render-target resolution from the physical
    /// surface size and the configured quality factor.
    pub fn scaled(self, factor: f32) -> Self {
        let scale = |v: u32| ((v as f32 * factor) as u32).max(1);
        Self {
            width: scale(self.width),
            height: scale(self.height),
        }
    }

    /// Returns `[width, height]` as floats, the layout shaders expect for `resolution`.
    #[inline]
    pub fn as_vec2(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── scaled ────────────────────────────────────────────────────────────

    #[test]
    fn scaled_full_quality_is_identity() {
        assert_eq!(Viewport::new(640, 480).scaled(1.0), Viewport::new(640, 480));
    }

    #[test]
    fn scaled_truncates_towards_zero() {
        assert_eq!(Viewport::new(641, 481).scaled(0.5), Viewport::new(320, 240));
    }

    #[test]
    fn scaled_never_collapses_below_one_pixel() {
        assert_eq!(Viewport::new(3, 1).scaled(0.1), Viewport::new(1, 1));
        assert_eq!(Viewport::new(0, 0).scaled(1.0), Viewport::new(1, 1));
    }

    // ── validity ──────────────────────────────────────────────────────────

    #[test]
    fn zero_sized_viewport_is_invalid() {
        assert!(!Viewport::new(0, 10).is_valid());
        assert!(Viewport::new(1, 1).is_valid());
    }

    #[test]
    fn as_vec2_converts_both_axes() {
        assert_eq!(Viewport::new(800, 600).as_vec2(), [800.0, 600.0]);
    }
}
