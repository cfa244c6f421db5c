use shadowstage_kernel::Stage;

/// Read-only queries against the stage for the debug panel and CLI.
pub struct StageInspector;

impl StageInspector {
    /// Produce a summary of the stage. `frames` comes from the frame driver.
    pub fn summary(stage: &Stage, frames: u64) -> StageSummary {
        let animated = stage.animated();
        StageSummary {
            scene: stage.scene.name.clone(),
            frames,
            elapsed: stage.last_elapsed(),
            pose: animated.map(|f| f.position.to_array()),
            shadow_opacity: animated.map(|f| f.shadow_opacity),
            camera: stage.camera.position.to_array(),
            viewport: [stage.viewport.width, stage.viewport.height],
            pixel_ratio: stage.viewport.pixel_ratio,
        }
    }
}

/// Summary of stage state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub scene: String,
    pub frames: u64,
    pub elapsed: f64,
    pub pose: Option<[f32; 3]>,
    pub shadow_opacity: Option<f32>,
    pub camera: [f32; 3],
    pub viewport: [f64; 2],
    pub pixel_ratio: f64,
}

impl std::fmt::Display for StageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Stage: scene={} frames={} elapsed={:.2}s viewport={}x{}@{}",
            self.scene,
            self.frames,
            self.elapsed,
            self.viewport[0],
            self.viewport[1],
            self.pixel_ratio
        )?;
        if let (Some(p), Some(opacity)) = (self.pose, self.shadow_opacity) {
            write!(
                f,
                " pose=({:.2}, {:.2}, {:.2}) shadow={:.3}",
                p[0], p[1], p[2], opacity
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowstage_kernel::{AnimationClock, ManualTime, ScenePreset, ViewportState};

    fn stage(preset: ScenePreset, time: &ManualTime) -> Stage {
        Stage::with_clock(
            preset.build(),
            ViewportState::default(),
            AnimationClock::with_source(time.clone()),
        )
    }

    #[test]
    fn summary_static_scene() {
        let time = ManualTime::new();
        let stage = stage(ScenePreset::Realtime, &time);
        let summary = StageInspector::summary(&stage, 0);
        assert_eq!(summary.scene, "realtime");
        assert_eq!(summary.pose, None);
        assert_eq!(summary.viewport, [1280.0, 720.0]);
        assert_eq!(summary.camera, [0.0, 0.0, 3.0]);
    }

    #[test]
    fn summary_animated_scene() {
        let time = ManualTime::new();
        let mut stage = stage(ScenePreset::Baked, &time);
        time.advance_secs(2.0);

        // Elapsed matches the pose on display, not the live clock.
        let summary = StageInspector::summary(&stage, 12);
        assert_eq!(summary.frames, 12);
        assert_eq!(summary.elapsed, 0.0);
        assert_eq!(summary.pose, Some([1.5, 0.0, 0.0]));
        assert_eq!(summary.shadow_opacity, Some(0.3));

        let frame = stage.animate(stage.clock.elapsed()).unwrap();
        let summary = StageInspector::summary(&stage, 13);
        assert!((summary.elapsed - 2.0).abs() < 1e-9);
        assert_eq!(summary.pose, Some(frame.position.to_array()));
        assert_eq!(summary.shadow_opacity, Some(frame.shadow_opacity));
    }

    #[test]
    fn summary_display() {
        let time = ManualTime::new();
        let stage = stage(ScenePreset::Baked, &time);
        let s = format!("{}", StageInspector::summary(&stage, 3));
        assert!(s.contains("scene=baked"));
        assert!(s.contains("frames=3"));
        assert!(s.contains("shadow=0.300"));
    }
}
