/// How the window's GPU context is created.
///
/// Offscreen render targets and swapchains are always RGBA8; these settings
/// only shape the adapter request and the presented surface.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Present through an sRGB surface so blitted output is gamma-encoded.
    pub prefer_srgb: bool,

    /// Pace frames to the display. Off renders as fast as the adapter allows,
    /// which is useful when profiling a shader.
    pub vsync: bool,

    pub power_preference: wgpu::PowerPreference,

    pub backends: wgpu::Backends,

    /// Requested surface alpha mode; unsupported modes fall back to the first
    /// one the surface reports.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Frames the surface may queue ahead. A hint.
    pub max_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            vsync: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            backends: wgpu::Backends::all(),
            alpha_mode: None,
            max_frame_latency: 2,
        }
    }
}

impl GpuInit {
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Prefers the integrated adapter on hybrid systems.
    pub fn low_power(mut self) -> Self {
        self.power_preference = wgpu::PowerPreference::LowPower;
        self
    }

    /// Present mode for the surface; the `Auto*` modes always resolve to one
    /// the surface supports.
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }

    /// Device limits: portable downlevel defaults, raised to the adapter's
    /// texture sizes so window-sized render targets fit.
    pub fn required_limits(&self, adapter: &wgpu::Limits) -> wgpu::Limits {
        wgpu::Limits::downlevel_defaults().using_resolution(adapter.clone())
    }
}
