use shadowstage_kernel::SceneConfig;
use std::ops::RangeInclusive;

/// A scene attribute the debug panel can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneParam {
    DirectionalIntensity,
    AmbientIntensity,
    Metalness,
    Roughness,
    DirectionalX,
    DirectionalY,
    DirectionalZ,
}

impl SceneParam {
    /// Borrow the bound attribute inside the scene.
    pub fn value_mut<'a>(&self, scene: &'a mut SceneConfig) -> &'a mut f32 {
        match self {
            Self::DirectionalIntensity => &mut scene.directional.intensity,
            Self::AmbientIntensity => &mut scene.ambient.intensity,
            Self::Metalness => &mut scene.material.metalness,
            Self::Roughness => &mut scene.material.roughness,
            Self::DirectionalX => &mut scene.directional.position.x,
            Self::DirectionalY => &mut scene.directional.position.y,
            Self::DirectionalZ => &mut scene.directional.position.z,
        }
    }

    pub fn value(&self, scene: &SceneConfig) -> f32 {
        match self {
            Self::DirectionalIntensity => scene.directional.intensity,
            Self::AmbientIntensity => scene.ambient.intensity,
            Self::Metalness => scene.material.metalness,
            Self::Roughness => scene.material.roughness,
            Self::DirectionalX => scene.directional.position.x,
            Self::DirectionalY => scene.directional.position.y,
            Self::DirectionalZ => scene.directional.position.z,
        }
    }
}

/// One numeric slider bound to a scene attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderBinding {
    pub label: &'static str,
    pub param: SceneParam,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl SliderBinding {
    pub fn range(&self) -> RangeInclusive<f32> {
        self.min..=self.max
    }

    /// Clamp to the range and snap to the nearest step.
    pub fn quantize(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }

    /// Write a value through the binding. Returns the value stored.
    pub fn set(&self, scene: &mut SceneConfig, value: f32) -> f32 {
        let stored = self.quantize(value);
        *self.param.value_mut(scene) = stored;
        tracing::debug!(param = self.label, value = stored, "panel value changed");
        stored
    }
}

/// The debug panel: sliders plus the shadow camera helper toggle.
#[derive(Debug, Clone)]
pub struct DebugPanel {
    pub sliders: Vec<SliderBinding>,
    pub visible: bool,
}

impl Default for DebugPanel {
    fn default() -> Self {
        Self::standard()
    }
}

impl DebugPanel {
    /// Lighting and material sliders.
    pub fn standard() -> Self {
        let slider = |label, param, max| SliderBinding {
            label,
            param,
            min: 0.0,
            max,
            step: 0.001,
        };
        Self {
            sliders: vec![
                slider("directional intensity", SceneParam::DirectionalIntensity, 3.0),
                slider("ambient intensity", SceneParam::AmbientIntensity, 3.0),
                slider("metalness", SceneParam::Metalness, 1.0),
                slider("roughness", SceneParam::Roughness, 1.0),
                slider("directional x", SceneParam::DirectionalX, 1.0),
                slider("directional y", SceneParam::DirectionalY, 1.0),
                slider("directional z", SceneParam::DirectionalZ, 1.0),
            ],
            visible: true,
        }
    }

    pub fn binding(&self, param: SceneParam) -> Option<&SliderBinding> {
        self.sliders.iter().find(|s| s.param == param)
    }

    pub fn set_helpers_visible(scene: &mut SceneConfig, visible: bool) {
        scene.helpers_visible = visible;
        tracing::debug!(visible, "shadow camera helpers toggled");
    }
}
