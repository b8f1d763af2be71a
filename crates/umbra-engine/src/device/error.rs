use wgpu::SurfaceError;

/// What the frame loop does when the surface texture cannot be acquired.
///
/// Only `Fatal` reaches the engine as an error; the other actions drop screen
/// output for this frame and offscreen passes still run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface is stale (lost or outdated) and must be configured again.
    Reconfigure,
    /// Transient; try again next frame.
    SkipFrame,
    Fatal,
}

impl SurfaceErrorAction {
    pub fn for_error(err: &SurfaceError) -> Self {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => Self::Reconfigure,
            SurfaceError::OutOfMemory => Self::Fatal,
            SurfaceError::Timeout | SurfaceError::Other => Self::SkipFrame,
        }
    }

    pub fn is_fatal(self) -> bool {
        self == Self::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_surfaces_are_reconfigured() {
        assert_eq!(SurfaceErrorAction::for_error(&SurfaceError::Lost), SurfaceErrorAction::Reconfigure);
        assert_eq!(
            SurfaceErrorAction::for_error(&SurfaceError::Outdated),
            SurfaceErrorAction::Reconfigure
        );
    }

    #[test]
    fn only_out_of_memory_is_fatal() {
        assert!(SurfaceErrorAction::for_error(&SurfaceError::OutOfMemory).is_fatal());
        assert!(!SurfaceErrorAction::for_error(&SurfaceError::Timeout).is_fatal());
        assert!(!SurfaceErrorAction::for_error(&SurfaceError::Other).is_fatal());
    }
}
