use crate::action::ControlAction;
use glam::{Vec2, Vec3};
use shadowstage_kernel::PerspectiveCamera;
use std::f32::consts::{PI, TAU};

const EPS: f32 = 1e-6;
/// Closest the polar angle may get to either pole.
const POLE_MARGIN: f32 = 1e-3;

/// Anything that moves the camera once per frame.
pub trait CameraControls {
    /// Apply pending input to the camera. Returns whether it moved.
    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool;
}

/// Orbit camera around a target: drag to rotate, secondary drag to pan,
/// wheel to dolly.
///
/// With damping enabled, each [`update`](CameraControls::update) applies a
/// `damping_factor` fraction of the accumulated motion and keeps the rest,
/// so the camera eases out after input stops.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_damping(mut self, factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = factor;
        self
    }

    /// Accumulate an action. Nothing moves until the next update.
    pub fn apply(&mut self, action: ControlAction, camera: &PerspectiveCamera, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        match action {
            ControlAction::Rotate(delta) => {
                self.delta_theta -= TAU * delta.x / height * self.rotate_speed;
                self.delta_phi -= TAU * delta.y / height * self.rotate_speed;
            }
            ControlAction::Pan(delta) => self.pan(delta, camera, height),
            ControlAction::Zoom(steps) => {
                self.scale *= 0.95_f32.powf(self.zoom_speed * steps);
            }
        }
    }

    fn pan(&mut self, delta: Vec2, camera: &PerspectiveCamera, height: f32) {
        let offset = camera.position - self.target;
        // World units covered by one pixel at the target's depth.
        let distance = offset.length() * (camera.fov.to_radians() * 0.5).tan();
        let per_pixel = 2.0 * distance / height * self.pan_speed;

        let view = camera.view_matrix().inverse();
        let right = view.x_axis.truncate();
        let up = view.y_axis.truncate();
        self.pan_offset += -right * delta.x * per_pixel + up * delta.y * per_pixel;
    }

    /// Whether any motion is still pending.
    pub fn is_settled(&self) -> bool {
        self.delta_theta.abs() < EPS
            && self.delta_phi.abs() < EPS
            && (self.scale - 1.0).abs() < EPS
            && self.pan_offset.length_squared() < EPS
    }
}

impl CameraControls for OrbitControls {
    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, 0.0)
        };

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        theta += self.delta_theta * step;
        phi = (phi + self.delta_phi * step).clamp(POLE_MARGIN, PI - POLE_MARGIN);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * step;

        let sin_phi = phi.sin();
        let new_position = self.target
            + Vec3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );

        let moved = (new_position - camera.position).length_squared() > EPS
            || (camera.target - self.target).length_squared() > EPS;
        camera.position = new_position;
        camera.target = self.target;

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        if moved {
            tracing::trace!(
                x = camera.position.x,
                y = camera.position.y,
                z = camera.position.z,
                "orbit camera moved"
            );
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::default()
    }

    #[test]
    fn idle_update_keeps_camera() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        assert!(!controls.update(&mut cam));
        assert!((cam.position - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn rotation_preserves_distance() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(ControlAction::Rotate(Vec2::new(120.0, 40.0)), &cam, 720.0);
        assert!(controls.update(&mut cam));
        assert!((cam.position.length() - 3.0).abs() < 1e-4);
        assert!(cam.position.x.abs() > 0.1);
    }

    #[test]
    fn damping_eases_out_and_settles() {
        let mut cam = camera();
        let mut controls = OrbitControls::default().with_damping(0.05);
        controls.apply(ControlAction::Rotate(Vec2::new(200.0, 0.0)), &cam, 720.0);

        let first = cam.position;
        controls.update(&mut cam);
        let step_one = (cam.position - first).length();
        let second = cam.position;
        controls.update(&mut cam);
        let step_two = (cam.position - second).length();
        assert!(step_two < step_one);

        for _ in 0..1000 {
            controls.update(&mut cam);
        }
        assert!(controls.is_settled());
        assert!(!controls.update(&mut cam));
    }

    #[test]
    fn damped_rotation_converges_to_undamped() {
        let mut damped_cam = camera();
        let mut damped = OrbitControls::default().with_damping(0.05);
        let mut direct_cam = camera();
        let mut direct = OrbitControls::default();

        let action = ControlAction::Rotate(Vec2::new(90.0, 0.0));
        damped.apply(action, &damped_cam, 720.0);
        direct.apply(action, &direct_cam, 720.0);
        direct.update(&mut direct_cam);
        for _ in 0..2000 {
            damped.update(&mut damped_cam);
        }
        assert!((damped_cam.position - direct_cam.position).length() < 1e-3);
    }

    #[test]
    fn polar_angle_never_flips_over_pole() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(ControlAction::Rotate(Vec2::new(0.0, 10_000.0)), &cam, 720.0);
        controls.update(&mut cam);
        assert!(cam.position.y < 3.0);
        assert!(cam.position.y > 2.99);
        assert!(!cam.view_matrix().col(0).x.is_nan());
    }

    #[test]
    fn zoom_in_moves_closer() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(ControlAction::Zoom(1.0), &cam, 720.0);
        controls.update(&mut cam);
        assert!((cam.position.length() - 3.0 * 0.95).abs() < 1e-4);
    }

    #[test]
    fn zoom_respects_min_distance() {
        let mut cam = camera();
        let mut controls = OrbitControls {
            min_distance: 2.0,
            ..OrbitControls::default()
        };
        controls.apply(ControlAction::Zoom(100.0), &cam, 720.0);
        controls.update(&mut cam);
        assert!((cam.position.length() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(ControlAction::Pan(Vec2::new(-100.0, 0.0)), &cam, 720.0);
        controls.update(&mut cam);
        // Dragging left moves the view to the right.
        assert!(controls.target.x > 0.0);
        assert_eq!(cam.target, controls.target);
        assert!(((cam.position - cam.target).length() - 3.0).abs() < 1e-4);
    }
}
