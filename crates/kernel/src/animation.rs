use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Circular path with a bouncing height, evaluated from elapsed time alone.
///
/// `x = r·cos(t)`, `z = r·sin(t)`, `y = |sin(bounce·t)|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BounceOrbit {
    pub radius: f32,
    pub bounce_rate: f32,
}

impl Default for BounceOrbit {
    fn default() -> Self {
        Self {
            radius: 1.5,
            bounce_rate: 3.0,
        }
    }
}

impl BounceOrbit {
    pub fn pose_at(&self, elapsed: f64) -> Vec3 {
        let radius = f64::from(self.radius);
        Vec3::new(
            (radius * elapsed.cos()) as f32,
            (f64::from(self.bounce_rate) * elapsed).sin().abs() as f32,
            (radius * elapsed.sin()) as f32,
        )
    }
}

/// Opacity of the shadow proxy beneath an object at height `y`.
///
/// Fully visible (`max_opacity`) on the floor, gone at height 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowFade {
    pub max_opacity: f32,
}

impl Default for ShadowFade {
    fn default() -> Self {
        Self { max_opacity: 0.3 }
    }
}

impl ShadowFade {
    pub fn opacity_at(&self, height: f32) -> f32 {
        ((1.0 - height) * self.max_opacity).clamp(0.0, self.max_opacity)
    }
}

/// Pose and proxy opacity for one clock reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatedFrame {
    pub position: Vec3,
    pub shadow_opacity: f32,
}

impl AnimatedFrame {
    pub fn evaluate(orbit: &BounceOrbit, fade: &ShadowFade, elapsed: f64) -> Self {
        let position = orbit.pose_at(elapsed);
        Self {
            position,
            shadow_opacity: fade.opacity_at(position.y),
        }
    }
}
