use glam::{Mat4, Vec3, Vec4};
use shadowstage_kernel::{DirectionalLight, PointLight, SceneConfig, SpotLight};

/// Shadow map layers: directional, spot, then six point-light faces.
pub(crate) const SHADOW_LAYERS: usize = 8;
pub(crate) const DIRECTIONAL_LAYER: usize = 0;
pub(crate) const SPOT_LAYER: usize = 1;
pub(crate) const POINT_LAYER: usize = 2;

/// Point light face directions in layer order; matches the shader's face pick.
const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

fn look_at(eye: Vec3, target: Vec3) -> Mat4 {
    let forward = (target - eye).try_normalize().unwrap_or(Vec3::NEG_Y);
    let up = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Mat4::look_at_rh(eye, target, up)
}

pub(crate) fn directional_view_proj(light: &DirectionalLight) -> Mat4 {
    let e = light.shadow.extent;
    let proj = Mat4::orthographic_rh(-e, e, -e, e, light.shadow.near, light.shadow.far);
    proj * look_at(light.position, light.target)
}

pub(crate) fn spot_view_proj(light: &SpotLight) -> Mat4 {
    let fov = (light.angle * 2.0).clamp(0.01, std::f32::consts::PI - 0.01);
    let proj = Mat4::perspective_rh(fov, 1.0, light.shadow.near, light.shadow.far);
    proj * look_at(light.position, light.target)
}

pub(crate) fn point_view_projs(light: &PointLight) -> [Mat4; 6] {
    let proj = Mat4::perspective_rh(
        std::f32::consts::FRAC_PI_2,
        1.0,
        light.shadow.near,
        light.shadow.far,
    );
    CUBE_FACES.map(|(dir, up)| {
        proj * Mat4::look_at_rh(light.position, light.position + dir, up)
    })
}

/// Light matrices for every shadow layer plus which layers are active.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ShadowLayers {
    pub view_proj: [Mat4; SHADOW_LAYERS],
    pub active: [bool; SHADOW_LAYERS],
}

impl ShadowLayers {
    pub fn from_scene(scene: &SceneConfig) -> Self {
        let mut view_proj = [Mat4::IDENTITY; SHADOW_LAYERS];
        let mut active = [false; SHADOW_LAYERS];
        let enabled = scene.casts_shadows();

        view_proj[DIRECTIONAL_LAYER] = directional_view_proj(&scene.directional);
        active[DIRECTIONAL_LAYER] = enabled && scene.directional.cast_shadow;

        if let Some(spot) = &scene.spot {
            view_proj[SPOT_LAYER] = spot_view_proj(spot);
            active[SPOT_LAYER] = enabled && spot.cast_shadow;
        }
        if let Some(point) = &scene.point {
            for (i, m) in point_view_projs(point).into_iter().enumerate() {
                view_proj[POINT_LAYER + i] = m;
                active[POINT_LAYER + i] = enabled && point.cast_shadow;
            }
        }
        Self { view_proj, active }
    }

    /// Matrices of the frusta a helper should outline, whether or not the
    /// renderer has shadow maps enabled.
    pub fn helper_frusta(scene: &SceneConfig) -> Vec<Mat4> {
        let mut frusta = Vec::new();
        if scene.directional.cast_shadow {
            frusta.push(directional_view_proj(&scene.directional));
        }
        if let Some(spot) = scene.spot.as_ref().filter(|s| s.cast_shadow) {
            frusta.push(spot_view_proj(spot));
        }
        if let Some(point) = scene.point.as_ref().filter(|p| p.cast_shadow) {
            frusta.extend(point_view_projs(point));
        }
        frusta
    }
}

/// World-space corners of a light frustum, near face first.
pub(crate) fn frustum_corners(view_proj: Mat4) -> [Vec3; 8] {
    let inverse = view_proj.inverse();
    let mut corners = [Vec3::ZERO; 8];
    let ndc = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    for (i, z) in [0.0_f32, 1.0].into_iter().enumerate() {
        for (j, (x, y)) in ndc.into_iter().enumerate() {
            let p = inverse * Vec4::new(x, y, z, 1.0);
            corners[i * 4 + j] = p.truncate() / p.w;
        }
    }
    corners
}

/// Endpoint pairs of the twelve frustum edges.
pub(crate) fn frustum_edges(view_proj: Mat4) -> [[Vec3; 2]; 12] {
    let c = frustum_corners(view_proj);
    [
        [c[0], c[1]],
        [c[1], c[2]],
        [c[2], c[3]],
        [c[3], c[0]],
        [c[4], c[5]],
        [c[5], c[6]],
        [c[6], c[7]],
        [c[7], c[4]],
        [c[0], c[4]],
        [c[1], c[5]],
        [c[2], c[6]],
        [c[3], c[7]],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowstage_kernel::ScenePreset;

    #[test]
    fn realtime_activates_all_layers() {
        let layers = ShadowLayers::from_scene(&ScenePreset::Realtime.build());
        assert!(layers.active.iter().all(|&a| a));
    }

    #[test]
    fn disabled_shadow_mode_deactivates_layers() {
        let layers = ShadowLayers::from_scene(&ScenePreset::Baked.build());
        assert!(layers.active.iter().all(|&a| !a));
    }

    #[test]
    fn origin_inside_directional_frustum() {
        let scene = ScenePreset::Realtime.build();
        let m = directional_view_proj(&scene.directional);
        // The light sits ~1.03 units from the origin, just beyond `near`.
        let p = m.project_point3(Vec3::ZERO);
        assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&p.z));
    }

    #[test]
    fn point_faces_cover_axes() {
        let scene = ScenePreset::Realtime.build();
        let point = scene.point.unwrap();
        let faces = point_view_projs(&point);
        for (i, (dir, _)) in CUBE_FACES.iter().enumerate() {
            let p = faces[i].project_point3(point.position + *dir);
            assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4, "face {i}");
            assert!((0.0..=1.0).contains(&p.z));
        }
    }

    #[test]
    fn frustum_corners_round_trip() {
        let scene = ScenePreset::Realtime.build();
        let m = spot_view_proj(&scene.spot.unwrap());
        for corner in frustum_corners(m) {
            let p = m.project_point3(corner);
            assert!((p.x.abs() - 1.0).abs() < 1e-3);
            assert!((p.y.abs() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn helpers_list_every_casting_light() {
        let frusta = ShadowLayers::helper_frusta(&ScenePreset::Realtime.build());
        assert_eq!(frusta.len(), 8);
        assert!(ShadowLayers::helper_frusta(&ScenePreset::Lights.build()).is_empty());
    }
}
