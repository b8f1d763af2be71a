//! Surface size types shared by the orchestrator, swapchains and backends.
//!
//! All sizes are physical pixels; the engine never deals in logical (DPI-scaled) units.

mod viewport;

pub use viewport::Viewport;
