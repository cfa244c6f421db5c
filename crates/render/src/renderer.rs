use shadowstage_kernel::{MeshRole, Stage};
use std::convert::Infallible;
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the stage and produces one frame per call. Output
/// buffer size is given in logical pixels; the drawing buffer is that size
/// multiplied by the pixel ratio.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;
    type Error: std::error::Error;

    /// Render one frame of the stage through its camera.
    fn render(&mut self, stage: &Stage) -> Result<Self::Output, Self::Error>;

    /// Resize the output buffer, in logical pixels.
    fn set_size(&mut self, width: f64, height: f64);

    fn set_pixel_ratio(&mut self, ratio: f64);
}

/// Text renderer for headless runs.
///
/// Produces a human-readable description of each frame. Useful for CLI
/// output, logging, and testing the frame loop without a GPU.
#[derive(Debug, Clone)]
pub struct DebugTextRenderer {
    width: f64,
    height: f64,
    pixel_ratio: f64,
    frames: u64,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
            frames: 0,
        }
    }
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical output size.
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;
    type Error = Infallible;

    fn render(&mut self, stage: &Stage) -> Result<String, Infallible> {
        self.frames += 1;
        let mut out = String::new();
        let cam = &stage.camera;
        let scene = &stage.scene;

        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "=== frame {} ({}) {}x{} @{:.2} ===",
            self.frames, scene.name, self.width, self.height, self.pixel_ratio
        );
        let _ = writeln!(
            out,
            "camera: pos=({:.2}, {:.2}, {:.2}) aspect={:.3}",
            cam.position.x, cam.position.y, cam.position.z, cam.aspect
        );
        let _ = writeln!(
            out,
            "lights: ambient={:.3} directional={:.3} at ({:.3}, {:.3}, {:.3})",
            scene.ambient.intensity,
            scene.directional.intensity,
            scene.directional.position.x,
            scene.directional.position.y,
            scene.directional.position.z
        );
        for mesh in &scene.meshes {
            let p = mesh.transform.position;
            let _ = write!(out, "  {} pos=({:.3}, {:.3}, {:.3})", mesh.name, p.x, p.y, p.z);
            if mesh.role == MeshRole::ShadowProxy {
                let _ = write!(out, " opacity={:.3}", stage.shadow_opacity());
            }
            out.push('\n');
        }
        Ok(out)
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }
}
