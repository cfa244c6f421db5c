use glam::Vec2;

/// Pointer position normalized to the viewport, centered on the origin.
///
/// `x` grows to the right and `y` grows upwards, both within [-0.5, 0.5].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
}

impl Cursor {
    pub fn from_pointer(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            x: position.x / width - 0.5,
            y: -(position.y / height - 0.5),
        }
    }

    pub fn update(&mut self, position: Vec2, width: f32, height: f32) {
        *self = Self::from_pointer(position, width, height);
        tracing::trace!(x = self.x, y = self.y, "cursor moved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_origin() {
        let c = Cursor::from_pointer(Vec2::new(400.0, 300.0), 800.0, 600.0);
        assert_eq!(c, Cursor::default());
    }

    #[test]
    fn top_left_corner() {
        let c = Cursor::from_pointer(Vec2::ZERO, 800.0, 600.0);
        assert_eq!(c.x, -0.5);
        assert_eq!(c.y, 0.5);
    }

    #[test]
    fn bottom_right_corner() {
        let mut c = Cursor::default();
        c.update(Vec2::new(800.0, 600.0), 800.0, 600.0);
        assert_eq!(c.x, 0.5);
        assert_eq!(c.y, -0.5);
    }
}
