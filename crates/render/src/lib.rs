//! Rendering adapter: the renderer-agnostic interface plus the two entry
//! points that drive it, the frame loop and the resize handler.
//!
//! # Invariants
//! - Renderers read the stage; they never mutate it.
//! - One render per tick, at most one pending tick request.
//! - A failed render ends the loop: nothing is rescheduled.

mod driver;
mod renderer;
mod resize;

pub use driver::{DriverState, FrameDriver, RefreshScheduler};
pub use renderer::{DebugTextRenderer, Renderer};
pub use resize::ResizeHandler;

pub fn crate_info() -> &'static str {
    "shadowstage-render v0.1.0"
}
