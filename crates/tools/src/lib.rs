//! Developer tooling: debug panel slider bindings and the stage inspector.
//!
//! # Invariants
//! - Panel writes are clamped to the slider range and snapped to its step.
//! - The inspector is read-only.

pub mod inspector;
pub mod panel;

pub use inspector::{StageInspector, StageSummary};
pub use panel::{DebugPanel, SceneParam, SliderBinding};

pub fn crate_info() -> &'static str {
    "shadowstage-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
