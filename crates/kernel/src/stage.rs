use crate::animation::AnimatedFrame;
use crate::camera::PerspectiveCamera;
use crate::clock::AnimationClock;
use crate::scene::{MeshRole, SceneConfig};
use crate::viewport::ViewportState;

/// Everything a frame or a resize touches, owned in one place.
///
/// Constructed once at startup and kept for the lifetime of the process.
#[derive(Debug)]
pub struct Stage {
    pub scene: SceneConfig,
    pub camera: PerspectiveCamera,
    pub viewport: ViewportState,
    pub clock: AnimationClock,
    animated: Option<AnimatedFrame>,
    last_elapsed: f64,
}

impl Stage {
    pub fn new(scene: SceneConfig, viewport: ViewportState) -> Self {
        Self::with_clock(scene, viewport, AnimationClock::new())
    }

    pub fn with_clock(scene: SceneConfig, viewport: ViewportState, clock: AnimationClock) -> Self {
        let cfg = scene.camera;
        let mut camera = PerspectiveCamera::new(cfg.fov, viewport.aspect(), cfg.near, cfg.far);
        camera.position = cfg.position;
        tracing::debug!(
            scene = %scene.name,
            meshes = scene.meshes.len(),
            "stage constructed"
        );

        let mut stage = Self {
            scene,
            camera,
            viewport,
            clock,
            animated: None,
            last_elapsed: 0.0,
        };
        stage.animate(0.0);
        stage
    }

    /// Place animated meshes for the given clock reading.
    ///
    /// Returns `None` when the scene has no animation.
    pub fn animate(&mut self, elapsed: f64) -> Option<AnimatedFrame> {
        self.last_elapsed = elapsed;
        let config = self.scene.animation?;
        let frame = AnimatedFrame::evaluate(&config.orbit, &config.fade, elapsed);

        for mesh in &mut self.scene.meshes {
            match mesh.role {
                MeshRole::Animated => mesh.transform.position = frame.position,
                MeshRole::ShadowProxy => {
                    mesh.transform.position.x = frame.position.x;
                    mesh.transform.position.z = frame.position.z;
                }
                MeshRole::Solid => {}
            }
        }

        self.animated = Some(frame);
        Some(frame)
    }

    /// Most recent animated pose, if the scene animates.
    pub fn animated(&self) -> Option<AnimatedFrame> {
        self.animated
    }

    /// Clock reading passed to the most recent [`animate`](Self::animate).
    pub fn last_elapsed(&self) -> f64 {
        self.last_elapsed
    }

    /// Opacity the shadow proxy should be drawn with.
    pub fn shadow_opacity(&self) -> f32 {
        self.animated.map_or(0.0, |f| f.shadow_opacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTime;
    use crate::scene::ScenePreset;
    use glam::Vec3;
    use std::f64::consts::FRAC_PI_2;

    fn stage(preset: ScenePreset) -> Stage {
        Stage::with_clock(
            preset.build(),
            ViewportState::default(),
            AnimationClock::with_source(ManualTime::new()),
        )
    }

    #[test]
    fn camera_follows_scene_and_viewport() {
        let stage = stage(ScenePreset::Realtime);
        assert_eq!(stage.camera.fov, 75.0);
        assert_eq!(stage.camera.position, Vec3::new(0.0, 0.0, 3.0));
        assert!((stage.camera.aspect - 1280.0 / 720.0).abs() < 1e-6);
    }

    #[test]
    fn static_scene_does_not_animate() {
        let mut stage = stage(ScenePreset::Realtime);
        assert!(stage.animate(1.0).is_none());
        assert!(stage.animated().is_none());
        assert_eq!(stage.shadow_opacity(), 0.0);
    }

    #[test]
    fn last_elapsed_follows_animate_not_the_clock() {
        let time = ManualTime::new();
        let mut stage = Stage::with_clock(
            ScenePreset::Baked.build(),
            ViewportState::default(),
            AnimationClock::with_source(time.clone()),
        );
        time.advance_secs(3.0);
        assert_eq!(stage.last_elapsed(), 0.0);

        stage.animate(stage.clock.elapsed());
        assert!((stage.last_elapsed() - 3.0).abs() < 1e-9);

        let mut still = Stage::new(ScenePreset::Realtime.build(), ViewportState::default());
        still.animate(1.5);
        assert_eq!(still.last_elapsed(), 1.5);
    }

    #[test]
    fn initial_pose_is_evaluated_at_zero() {
        let stage = stage(ScenePreset::Baked);
        let frame = stage.animated().unwrap();
        assert_eq!(frame.position, Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(stage.shadow_opacity(), 0.3);
    }

    #[test]
    fn proxy_tracks_sphere_on_floor() {
        let mut stage = stage(ScenePreset::Baked);
        let frame = stage.animate(FRAC_PI_2).unwrap();

        let ball = stage
            .scene
            .meshes_with_role(MeshRole::Animated)
            .next()
            .unwrap();
        assert_eq!(ball.transform.position, frame.position);

        let decal = stage
            .scene
            .meshes_with_role(MeshRole::ShadowProxy)
            .next()
            .unwrap();
        assert_eq!(decal.transform.position.x, frame.position.x);
        assert_eq!(decal.transform.position.z, frame.position.z);
        assert!((decal.transform.position.y - -0.49).abs() < 1e-6);
        assert!(stage.shadow_opacity() < 1e-6);
    }
}
