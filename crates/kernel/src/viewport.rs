use thiserror::Error;

/// Upper bound on the pixel ratio applied to the renderer.
pub const MAX_PIXEL_RATIO: f64 = 3.0;

/// A viewport-size-change notification from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportEvent {
    /// Logical width.
    pub width: f64,
    /// Logical height.
    pub height: f64,
    pub device_pixel_ratio: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ViewportError {
    #[error("viewport has degenerate size {width}x{height}")]
    DegenerateSize { width: f64, height: f64 },
    #[error("invalid device pixel ratio {0}")]
    InvalidPixelRatio(f64),
}

/// Current viewport dimensions and the capped pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl ViewportState {
    /// Build the state for a host notification, validating it first.
    pub fn from_event(event: &ViewportEvent) -> Result<Self, ViewportError> {
        let ViewportEvent {
            width,
            height,
            device_pixel_ratio,
        } = *event;
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ViewportError::DegenerateSize { width, height });
        }
        if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
            return Err(ViewportError::InvalidPixelRatio(device_pixel_ratio));
        }
        Ok(Self {
            width,
            height,
            pixel_ratio: capped_pixel_ratio(device_pixel_ratio),
        })
    }

    pub fn aspect(&self) -> f32 {
        (self.width / self.height) as f32
    }

    /// Size of the drawing buffer in physical pixels.
    pub fn buffer_size(&self) -> (u32, u32) {
        (
            ((self.width * self.pixel_ratio).round() as u32).max(1),
            ((self.height * self.pixel_ratio).round() as u32).max(1),
        )
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            pixel_ratio: 1.0,
        }
    }
}

pub fn capped_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    device_pixel_ratio.min(MAX_PIXEL_RATIO)
}
