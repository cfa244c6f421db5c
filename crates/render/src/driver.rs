use crate::renderer::Renderer;
use shadowstage_input::CameraControls;
use shadowstage_kernel::Stage;

/// Host hook that runs the next tick on the next display refresh.
pub trait RefreshScheduler {
    fn request_tick(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Before the first tick.
    Idle,
    /// Self-rescheduling loop.
    Running,
}

/// The render loop.
///
/// Every tick updates the camera controls, reads the clock, re-poses the
/// animated meshes, renders once, then asks the host for the next tick.
/// There is no stopped state; the loop ends when the host stops delivering
/// ticks.
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    pending: bool,
    frames: u64,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            state: DriverState::Idle,
            pending: false,
            frames: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Whether a tick has been requested from the host and not yet run.
    pub fn has_pending_tick(&self) -> bool {
        self.pending
    }

    /// Run the first tick, entering the running state.
    ///
    /// Only the first call has an effect on the state; later calls behave
    /// like [`tick`](Self::tick).
    pub fn start<C, R, S>(
        &mut self,
        stage: &mut Stage,
        controls: &mut C,
        renderer: &mut R,
        scheduler: &mut S,
    ) -> Result<R::Output, R::Error>
    where
        C: CameraControls + ?Sized,
        R: Renderer + ?Sized,
        S: RefreshScheduler + ?Sized,
    {
        if self.state == DriverState::Idle {
            tracing::info!(scene = %stage.scene.name, "render loop starting");
        }
        self.tick(stage, controls, renderer, scheduler)
    }

    /// Run one tick. A render error is returned as-is and no further tick
    /// is requested.
    pub fn tick<C, R, S>(
        &mut self,
        stage: &mut Stage,
        controls: &mut C,
        renderer: &mut R,
        scheduler: &mut S,
    ) -> Result<R::Output, R::Error>
    where
        C: CameraControls + ?Sized,
        R: Renderer + ?Sized,
        S: RefreshScheduler + ?Sized,
    {
        self.state = DriverState::Running;
        self.pending = false;

        controls.update(&mut stage.camera);
        let elapsed = stage.clock.elapsed();
        stage.animate(elapsed);

        let output = renderer.render(stage)?;
        self.frames += 1;

        scheduler.request_tick();
        self.pending = true;
        tracing::trace!(frame = self.frames, elapsed, "tick");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::DebugTextRenderer;
    use shadowstage_input::OrbitControls;
    use shadowstage_kernel::{
        AnimationClock, ManualTime, PerspectiveCamera, ScenePreset, ViewportState,
    };
    use std::cell::RefCell;
    use std::f64::consts::FRAC_PI_2;
    use std::rc::Rc;

    #[derive(Default)]
    struct CountingScheduler {
        requests: usize,
    }

    impl RefreshScheduler for CountingScheduler {
        fn request_tick(&mut self) {
            self.requests += 1;
        }
    }

    /// Records the order in which the loop touches its collaborators.
    #[derive(Clone, Default)]
    struct Journal(Rc<RefCell<Vec<&'static str>>>);

    impl Journal {
        fn push(&self, entry: &'static str) {
            self.0.borrow_mut().push(entry);
        }

        fn entries(&self) -> Vec<&'static str> {
            self.0.borrow().clone()
        }
    }

    struct JournalControls(Journal);

    impl CameraControls for JournalControls {
        fn update(&mut self, _camera: &mut PerspectiveCamera) -> bool {
            self.0.push("controls");
            false
        }
    }

    struct JournalScheduler(Journal);

    impl RefreshScheduler for JournalScheduler {
        fn request_tick(&mut self) {
            self.0.push("schedule");
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("device lost")]
    struct DeviceLost;

    struct FailingRenderer {
        journal: Journal,
        fail: bool,
    }

    impl Renderer for FailingRenderer {
        type Output = f32;
        type Error = DeviceLost;

        fn render(&mut self, stage: &Stage) -> Result<f32, DeviceLost> {
            self.journal.push("render");
            if self.fail {
                return Err(DeviceLost);
            }
            Ok(stage.shadow_opacity())
        }

        fn set_size(&mut self, _width: f64, _height: f64) {}

        fn set_pixel_ratio(&mut self, _ratio: f64) {}
    }

    fn stage(preset: ScenePreset, time: &ManualTime) -> Stage {
        Stage::with_clock(
            preset.build(),
            ViewportState::default(),
            AnimationClock::with_source(time.clone()),
        )
    }

    #[test]
    fn start_enters_running() {
        let time = ManualTime::new();
        let mut stage = stage(ScenePreset::Realtime, &time);
        let mut driver = FrameDriver::new();
        assert_eq!(driver.state(), DriverState::Idle);

        let mut scheduler = CountingScheduler::default();
        driver
            .start(
                &mut stage,
                &mut OrbitControls::default(),
                &mut DebugTextRenderer::new(),
                &mut scheduler,
            )
            .unwrap();

        assert_eq!(driver.state(), DriverState::Running);
        assert_eq!(driver.frames(), 1);
        assert_eq!(scheduler.requests, 1);
        assert!(driver.has_pending_tick());
    }

    #[test]
    fn tick_steps_run_in_order() {
        let time = ManualTime::new();
        let mut stage = stage(ScenePreset::Baked, &time);
        let journal = Journal::default();
        let mut renderer = FailingRenderer {
            journal: journal.clone(),
            fail: false,
        };

        FrameDriver::new()
            .start(
                &mut stage,
                &mut JournalControls(journal.clone()),
                &mut renderer,
                &mut JournalScheduler(journal.clone()),
            )
            .unwrap();

        assert_eq!(journal.entries(), ["controls", "render", "schedule"]);
    }

    #[test]
    fn one_render_and_one_request_per_tick() {
        let time = ManualTime::new();
        let mut stage = stage(ScenePreset::Realtime, &time);
        let mut driver = FrameDriver::new();
        let mut controls = OrbitControls::default().with_damping(0.05);
        let mut renderer = DebugTextRenderer::new();
        let mut scheduler = CountingScheduler::default();

        driver
            .start(&mut stage, &mut controls, &mut renderer, &mut scheduler)
            .unwrap();
        for _ in 0..9 {
            time.advance_secs(1.0 / 60.0);
            driver
                .tick(&mut stage, &mut controls, &mut renderer, &mut scheduler)
                .unwrap();
        }

        assert_eq!(driver.frames(), 10);
        assert_eq!(renderer.frames_rendered(), 10);
        assert_eq!(scheduler.requests, 10);
    }

    #[test]
    fn tick_poses_from_clock() {
        let time = ManualTime::new();
        let mut stage = stage(ScenePreset::Baked, &time);
        let mut driver = FrameDriver::new();
        let mut renderer = FailingRenderer {
            journal: Journal::default(),
            fail: false,
        };
        let mut scheduler = CountingScheduler::default();
        let mut controls = OrbitControls::default();

        let opacity = driver
            .start(&mut stage, &mut controls, &mut renderer, &mut scheduler)
            .unwrap();
        assert_eq!(opacity, 0.3);

        time.advance_secs(FRAC_PI_2);
        let opacity = driver
            .tick(&mut stage, &mut controls, &mut renderer, &mut scheduler)
            .unwrap();
        assert!(opacity.abs() < 1e-6);
        let pose = stage.animated().unwrap().position;
        assert!((pose.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn failed_render_schedules_nothing() {
        let time = ManualTime::new();
        let mut stage = stage(ScenePreset::Realtime, &time);
        let journal = Journal::default();
        let mut renderer = FailingRenderer {
            journal: journal.clone(),
            fail: true,
        };
        let mut driver = FrameDriver::new();

        let result = driver.start(
            &mut stage,
            &mut JournalControls(journal.clone()),
            &mut renderer,
            &mut JournalScheduler(journal.clone()),
        );

        assert!(result.is_err());
        assert_eq!(driver.frames(), 0);
        assert!(!driver.has_pending_tick());
        assert_eq!(journal.entries(), ["controls", "render"]);
    }

    #[test]
    fn failure_after_running_consumes_the_pending_tick() {
        let time = ManualTime::new();
        let mut stage = stage(ScenePreset::Realtime, &time);
        let journal = Journal::default();
        let mut renderer = FailingRenderer {
            journal: journal.clone(),
            fail: false,
        };
        let mut controls = JournalControls(journal.clone());
        let mut scheduler = JournalScheduler(journal.clone());
        let mut driver = FrameDriver::new();

        driver
            .start(&mut stage, &mut controls, &mut renderer, &mut scheduler)
            .unwrap();
        assert!(driver.has_pending_tick());

        renderer.fail = true;
        assert!(driver
            .tick(&mut stage, &mut controls, &mut renderer, &mut scheduler)
            .is_err());
        assert!(!driver.has_pending_tick());
        assert_eq!(driver.frames(), 1);
        assert_eq!(
            journal.entries(),
            ["controls", "render", "schedule", "controls", "render"]
        );
    }
}
