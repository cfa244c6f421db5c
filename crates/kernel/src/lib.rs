//! Stage kernel: scene description, camera, viewport state and the
//! animation clock.
//!
//! # Invariants
//! - Animated poses are a pure function of one clock reading.
//! - The clock is monotonic and never resets.
//! - Viewport pixel ratio never exceeds [`viewport::MAX_PIXEL_RATIO`].

pub mod animation;
pub mod camera;
pub mod clock;
pub mod scene;
pub mod stage;
pub mod viewport;

pub use animation::{AnimatedFrame, BounceOrbit, ShadowFade};
pub use camera::PerspectiveCamera;
pub use clock::{AnimationClock, ManualTime, MonotonicTime, TimeSource};
pub use scene::{
    AmbientLight, AnimationConfig, CameraConfig, DirectionalLight, LightShadow, Mesh, MeshRole,
    MeshShape, PointLight, SceneConfig, ScenePreset, ShadowMode, SpotLight, StandardMaterial,
    UnknownPreset,
};
pub use stage::Stage;
pub use viewport::{ViewportError, ViewportEvent, ViewportState};
