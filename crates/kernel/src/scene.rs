//! Scene description consumed by the renderers.
//!
//! Everything here is plain data. The three presets reproduce the lighting
//! setups the viewer ships with; see [`ScenePreset`].

use crate::animation::{BounceOrbit, ShadowFade};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use shadowstage_common::{Rgb, Transform};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardMaterial {
    pub color: Rgb,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            metalness: 0.5,
            roughness: 0.5,
        }
    }
}

/// Shadow camera and map parameters for one light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightShadow {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    /// Half size of the orthographic frustum (directional lights only).
    pub extent: f32,
    /// Filter radius in texels.
    pub radius: f32,
}

impl Default for LightShadow {
    fn default() -> Self {
        Self {
            map_size: 1024,
            near: 0.5,
            far: 500.0,
            extent: 5.0,
            radius: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Rgb,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub cast_shadow: bool,
    pub shadow: LightShadow,
}

impl DirectionalLight {
    /// Unit vector pointing from the light towards its target.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub color: Rgb,
    pub intensity: f32,
    /// Cut-off distance; zero means unbounded.
    pub distance: f32,
    /// Half angle of the cone in radians.
    pub angle: f32,
    pub penumbra: f32,
    pub decay: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub cast_shadow: bool,
    pub shadow: LightShadow,
}

impl SpotLight {
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub color: Rgb,
    pub intensity: f32,
    pub distance: f32,
    pub decay: f32,
    pub position: Vec3,
    pub cast_shadow: bool,
    pub shadow: LightShadow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MeshShape {
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Plane in the local XY plane, facing +Z.
    Plane { width: f32, height: f32 },
}

/// How the animation treats a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshRole {
    Solid,
    /// Follows the animated pose.
    Animated,
    /// Decal that tracks the animated mesh along the floor and fades with
    /// its height.
    ShadowProxy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub shape: MeshShape,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub role: MeshRole,
}

impl Mesh {
    fn solid(name: &str, shape: MeshShape, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            shape,
            transform,
            cast_shadow: false,
            receive_shadow: false,
            role: MeshRole::Solid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowMode {
    Disabled,
    /// Single-tap depth comparison filtered by the hardware.
    Pcf,
    /// 3x3 percentage-closer filtering scaled by the light's shadow radius.
    PcfSoft,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.01,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 3.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationConfig {
    pub orbit: BounceOrbit,
    pub fade: ShadowFade,
}

/// Full description of what the renderer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub name: String,
    pub camera: CameraConfig,
    pub material: StandardMaterial,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub spot: Option<SpotLight>,
    pub point: Option<PointLight>,
    pub meshes: Vec<Mesh>,
    pub shadow_mode: ShadowMode,
    /// Draw the shadow camera frusta as wireframes.
    pub helpers_visible: bool,
    pub animation: Option<AnimationConfig>,
}

impl SceneConfig {
    pub fn meshes_with_role(&self, role: MeshRole) -> impl Iterator<Item = &Mesh> {
        self.meshes.iter().filter(move |m| m.role == role)
    }

    /// Whether any light currently renders into a shadow map.
    pub fn casts_shadows(&self) -> bool {
        self.shadow_mode != ShadowMode::Disabled
            && (self.directional.cast_shadow
                || self.spot.is_some_and(|s| s.cast_shadow)
                || self.point.is_some_and(|p| p.cast_shadow))
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown scene preset `{0}` (expected one of: lights, realtime, baked)")]
pub struct UnknownPreset(pub String);

/// The lighting setups the viewer ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenePreset {
    /// Ambient and a cyan directional light, no shadows.
    Lights,
    /// Directional, spot and point lights all casting soft shadow maps.
    Realtime,
    /// No shadow maps; a bouncing sphere with a fading decal underneath.
    Baked,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 3] = [Self::Lights, Self::Realtime, Self::Baked];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lights => "lights",
            Self::Realtime => "realtime",
            Self::Baked => "baked",
        }
    }

    pub fn build(&self) -> SceneConfig {
        match self {
            Self::Lights => lights_scene(),
            Self::Realtime => realtime_scene(),
            Self::Baked => baked_scene(),
        }
    }
}

impl fmt::Display for ScenePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

fn sphere(radius: f32) -> MeshShape {
    MeshShape::Sphere {
        radius,
        width_segments: 16,
        height_segments: 16,
    }
}

fn floor(size: f32) -> Mesh {
    let mut mesh = Mesh::solid(
        "floor",
        MeshShape::Plane {
            width: size,
            height: size,
        },
        Transform::from_position(Vec3::new(0.0, -0.5, 0.0)).with_rotation_x(-PI * 0.5),
    );
    mesh.receive_shadow = true;
    mesh
}

fn cyan_directional(cast_shadow: bool) -> DirectionalLight {
    DirectionalLight {
        color: Rgb::from_hex(0x00fffc),
        intensity: 1.0,
        position: Vec3::new(1.0, 0.25, 0.0),
        target: Vec3::ZERO,
        cast_shadow,
        shadow: LightShadow {
            map_size: 1024,
            near: 1.0,
            far: 6.0,
            extent: 2.0,
            radius: 10.0,
        },
    }
}

fn white_ambient(intensity: f32) -> AmbientLight {
    AmbientLight {
        color: Rgb::WHITE,
        intensity,
    }
}

fn lights_scene() -> SceneConfig {
    SceneConfig {
        name: ScenePreset::Lights.name().to_string(),
        camera: CameraConfig::default(),
        material: StandardMaterial::default(),
        ambient: white_ambient(0.6),
        directional: cyan_directional(false),
        spot: None,
        point: None,
        meshes: vec![
            Mesh::solid("sphere", sphere(0.5), Transform::default()),
            floor(4.0),
        ],
        shadow_mode: ShadowMode::Disabled,
        helpers_visible: false,
        animation: None,
    }
}

fn realtime_scene() -> SceneConfig {
    let mut ball = Mesh::solid("sphere", sphere(0.5), Transform::default());
    ball.cast_shadow = true;

    SceneConfig {
        name: ScenePreset::Realtime.name().to_string(),
        camera: CameraConfig::default(),
        material: StandardMaterial::default(),
        ambient: white_ambient(0.6),
        directional: cyan_directional(true),
        spot: Some(SpotLight {
            color: Rgb::WHITE,
            intensity: 2.0,
            distance: 10.0,
            angle: PI * 0.3,
            penumbra: 0.0,
            decay: 2.0,
            position: Vec3::new(0.0, 2.0, 2.0),
            target: Vec3::ZERO,
            cast_shadow: true,
            shadow: LightShadow {
                map_size: 1024,
                near: 1.0,
                far: 6.0,
                ..LightShadow::default()
            },
        }),
        point: Some(PointLight {
            color: Rgb::WHITE,
            intensity: 2.7,
            distance: 0.0,
            decay: 2.0,
            position: Vec3::new(-1.0, 1.0, 0.0),
            cast_shadow: true,
            shadow: LightShadow {
                map_size: 1024,
                near: 0.1,
                far: 5.0,
                ..LightShadow::default()
            },
        }),
        meshes: vec![ball, floor(4.0)],
        shadow_mode: ShadowMode::PcfSoft,
        helpers_visible: false,
        animation: None,
    }
}

fn baked_scene() -> SceneConfig {
    let mut ball = Mesh::solid("sphere", sphere(0.5), Transform::default());
    ball.role = MeshRole::Animated;

    let mut decal = Mesh::solid(
        "sphere shadow",
        MeshShape::Plane {
            width: 1.5,
            height: 1.5,
        },
        Transform::from_position(Vec3::new(0.0, -0.5 + 0.01, 0.0)).with_rotation_x(-PI * 0.5),
    );
    decal.role = MeshRole::ShadowProxy;

    SceneConfig {
        name: ScenePreset::Baked.name().to_string(),
        camera: CameraConfig::default(),
        material: StandardMaterial {
            roughness: 0.7,
            ..StandardMaterial::default()
        },
        ambient: white_ambient(0.5),
        directional: DirectionalLight {
            color: Rgb::WHITE,
            intensity: 0.5,
            position: Vec3::new(2.0, 2.0, -1.0),
            ..cyan_directional(false)
        },
        spot: None,
        point: None,
        meshes: vec![ball, floor(5.0), decal],
        shadow_mode: ShadowMode::Disabled,
        helpers_visible: false,
        animation: Some(AnimationConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_names_round_trip_through_from_str() {
        for preset in ScenePreset::ALL {
            assert_eq!(preset.name().parse::<ScenePreset>(), Ok(preset));
        }
        assert_eq!("REALTIME".parse::<ScenePreset>(), Ok(ScenePreset::Realtime));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = "studio".parse::<ScenePreset>().unwrap_err();
        assert!(err.to_string().contains("studio"));
    }

    #[test]
    fn realtime_casts_from_every_light() {
        let scene = ScenePreset::Realtime.build();
        assert!(scene.casts_shadows());
        assert!(scene.directional.cast_shadow);
        assert!(scene.spot.unwrap().cast_shadow);
        assert!(scene.point.unwrap().cast_shadow);
        assert_eq!(scene.directional.shadow.map_size, 1024);
        assert!(scene.animation.is_none());
    }

    #[test]
    fn baked_has_animation_and_proxy() {
        let scene = ScenePreset::Baked.build();
        assert!(!scene.casts_shadows());
        assert!(scene.animation.is_some());
        assert_eq!(scene.meshes_with_role(MeshRole::Animated).count(), 1);
        assert_eq!(scene.meshes_with_role(MeshRole::ShadowProxy).count(), 1);
    }

    #[test]
    fn lights_preset_has_no_extra_lights() {
        let scene = ScenePreset::Lights.build();
        assert!(scene.spot.is_none());
        assert!(scene.point.is_none());
        assert_eq!(scene.ambient.intensity, 0.6);
    }

    #[test]
    fn directional_points_at_target() {
        let light = cyan_directional(true);
        let dir = light.direction();
        assert!((dir - Vec3::new(-1.0, -0.25, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn scene_serializes_to_json() {
        let scene = ScenePreset::Realtime.build();
        let json = serde_json::to_string(&scene).unwrap();
        let back: SceneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "realtime");
        assert_eq!(back.meshes.len(), scene.meshes.len());
    }
}
