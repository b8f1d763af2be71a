/// Engine-wide settings fixed at construction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EngineConfig {
    /// Render-target resolution relative to the physical surface, in `(0, 1]`.
    pub quality: f32,
}

impl EngineConfig {
    pub fn with_quality(quality: f32) -> Self {
        Self { quality }
    }

    /// Quality clamped into `(0, 1]`; non-positive or NaN values mean full resolution.
    pub fn effective_quality(&self) -> f32 {
        if self.quality > 0.0 {
            self.quality.min(1.0)
        } else {
            1.0
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { quality: 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_is_clamped() {
        assert_eq!(EngineConfig::with_quality(0.5).effective_quality(), 0.5);
        assert_eq!(EngineConfig::with_quality(3.0).effective_quality(), 1.0);
        assert_eq!(EngineConfig::with_quality(0.0).effective_quality(), 1.0);
        assert_eq!(EngineConfig::with_quality(-2.0).effective_quality(), 1.0);
        assert_eq!(EngineConfig::with_quality(f32::NAN).effective_quality(), 1.0);
    }
}
