use crate::renderer::Renderer;
use shadowstage_kernel::{Stage, ViewportError, ViewportEvent, ViewportState};

/// Applies viewport-size-change notifications to the stage and renderer.
///
/// No debouncing: every notification is applied as delivered. Applying the
/// same notification twice leaves the same state as applying it once.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResizeHandler;

impl ResizeHandler {
    /// Update viewport state, camera aspect and the renderer buffer.
    ///
    /// A degenerate notification is rejected before anything changes.
    pub fn handle<R: Renderer + ?Sized>(
        stage: &mut Stage,
        renderer: &mut R,
        event: &ViewportEvent,
    ) -> Result<ViewportState, ViewportError> {
        let viewport = ViewportState::from_event(event)?;
        stage.viewport = viewport;

        stage.camera.aspect = viewport.aspect();
        stage.camera.update_projection_matrix();

        renderer.set_size(viewport.width, viewport.height);
        renderer.set_pixel_ratio(viewport.pixel_ratio);

        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            pixel_ratio = viewport.pixel_ratio,
            "viewport resized"
        );
        Ok(viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::DebugTextRenderer;
    use glam::Mat4;
    use shadowstage_kernel::{AnimationClock, ManualTime, ScenePreset};

    fn stage() -> Stage {
        Stage::with_clock(
            ScenePreset::Realtime.build(),
            ViewportState::default(),
            AnimationClock::with_source(ManualTime::new()),
        )
    }

    fn event(width: f64, height: f64, dpr: f64) -> ViewportEvent {
        ViewportEvent {
            width,
            height,
            device_pixel_ratio: dpr,
        }
    }

    #[test]
    fn resize_updates_aspect_and_buffer() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();

        ResizeHandler::handle(&mut stage, &mut renderer, &event(800.0, 600.0, 1.0)).unwrap();
        assert!((stage.camera.aspect - 1.333).abs() < 1e-3);
        assert_eq!(renderer.size(), (800.0, 600.0));

        ResizeHandler::handle(&mut stage, &mut renderer, &event(1920.0, 1080.0, 1.0)).unwrap();
        assert!((stage.camera.aspect - 1.778).abs() < 1e-3);
        assert_eq!(renderer.size(), (1920.0, 1080.0));
        assert_eq!(stage.viewport.width, 1920.0);
        assert_eq!(stage.viewport.height, 1080.0);
    }

    #[test]
    fn projection_tracks_aspect() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        ResizeHandler::handle(&mut stage, &mut renderer, &event(500.0, 1000.0, 1.0)).unwrap();

        let expected = Mat4::perspective_rh(
            stage.camera.fov.to_radians(),
            0.5,
            stage.camera.near,
            stage.camera.far,
        );
        assert_eq!(stage.camera.projection_matrix(), expected);
    }

    #[test]
    fn device_ratio_four_clamps_to_three() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        let viewport =
            ResizeHandler::handle(&mut stage, &mut renderer, &event(800.0, 600.0, 4.0)).unwrap();
        assert_eq!(viewport.pixel_ratio, 3.0);
        assert_eq!(renderer.pixel_ratio(), 3.0);
    }

    #[test]
    fn repeated_resize_is_idempotent() {
        let mut once = stage();
        let mut once_renderer = DebugTextRenderer::new();
        ResizeHandler::handle(&mut once, &mut once_renderer, &event(1024.0, 768.0, 2.0)).unwrap();

        let mut twice = stage();
        let mut twice_renderer = DebugTextRenderer::new();
        for _ in 0..2 {
            ResizeHandler::handle(&mut twice, &mut twice_renderer, &event(1024.0, 768.0, 2.0))
                .unwrap();
        }

        assert_eq!(once.viewport, twice.viewport);
        assert_eq!(once.camera.aspect, twice.camera.aspect);
        assert_eq!(
            once.camera.projection_matrix(),
            twice.camera.projection_matrix()
        );
        assert_eq!(once_renderer.size(), twice_renderer.size());
        assert_eq!(once_renderer.pixel_ratio(), twice_renderer.pixel_ratio());
    }

    #[test]
    fn pixel_ratio_never_exceeds_cap() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        for dpr in [0.5, 1.0, 2.0, 2.999, 3.0, 3.5, 8.0, 1e9] {
            ResizeHandler::handle(&mut stage, &mut renderer, &event(640.0, 480.0, dpr)).unwrap();
            assert!(stage.viewport.pixel_ratio <= 3.0);
        }
    }

    #[test]
    fn degenerate_resize_leaves_state_untouched() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        ResizeHandler::handle(&mut stage, &mut renderer, &event(800.0, 600.0, 1.0)).unwrap();

        let err = ResizeHandler::handle(&mut stage, &mut renderer, &event(0.0, 0.0, 1.0));
        assert!(err.is_err());
        assert_eq!(stage.viewport.width, 800.0);
        assert_eq!(renderer.size(), (800.0, 600.0));
    }
}
