use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// A camera-control request derived from pointer input.
///
/// Controls consume actions, never raw window events, so every host maps
/// its own events onto the same set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Orbit by a pointer delta in logical pixels.
    Rotate(Vec2),
    /// Move the target by a pointer delta in logical pixels.
    Pan(Vec2),
    /// Dolly by wheel steps; positive moves closer.
    Zoom(f32),
}

/// Turns pointer positions and button state into drag actions.
#[derive(Debug, Default)]
pub struct PointerTracker {
    last: Option<Vec2>,
    dragging: Option<PointerButton>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: PointerButton) {
        if self.dragging.is_none() {
            self.dragging = Some(button);
        }
    }

    pub fn release(&mut self, button: PointerButton) {
        if self.dragging == Some(button) {
            self.dragging = None;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Record a new pointer position, returning the drag it implies.
    pub fn moved(&mut self, position: Vec2) -> Option<ControlAction> {
        self.track(position, false)
    }

    /// Record a pointer position that an overlay (e.g. the debug panel)
    /// may have captured. The position is always kept so the next drag
    /// delta starts from here; a captured move yields no action.
    pub fn track(&mut self, position: Vec2, captured: bool) -> Option<ControlAction> {
        let previous = self.last.replace(position)?;
        let delta = position - previous;
        if captured || delta == Vec2::ZERO {
            return None;
        }
        match self.dragging? {
            PointerButton::Primary => Some(ControlAction::Rotate(delta)),
            PointerButton::Secondary | PointerButton::Middle => Some(ControlAction::Pan(delta)),
        }
    }

    /// Forget the last position, e.g. when the pointer leaves the window.
    pub fn left(&mut self) {
        self.last = None;
        self.dragging = None;
    }

    pub fn wheel(&self, steps: f32) -> Option<ControlAction> {
        (steps != 0.0).then_some(ControlAction::Zoom(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_produces_no_action() {
        let mut tracker = PointerTracker::new();
        assert_eq!(tracker.moved(Vec2::new(10.0, 10.0)), None);
        assert_eq!(tracker.moved(Vec2::new(20.0, 10.0)), None);
    }

    #[test]
    fn primary_drag_rotates() {
        let mut tracker = PointerTracker::new();
        tracker.moved(Vec2::new(10.0, 10.0));
        tracker.press(PointerButton::Primary);
        assert_eq!(
            tracker.moved(Vec2::new(15.0, 8.0)),
            Some(ControlAction::Rotate(Vec2::new(5.0, -2.0)))
        );
    }

    #[test]
    fn secondary_drag_pans() {
        let mut tracker = PointerTracker::new();
        tracker.moved(Vec2::ZERO);
        tracker.press(PointerButton::Secondary);
        assert!(matches!(
            tracker.moved(Vec2::new(1.0, 1.0)),
            Some(ControlAction::Pan(_))
        ));
    }

    #[test]
    fn release_of_other_button_keeps_drag() {
        let mut tracker = PointerTracker::new();
        tracker.press(PointerButton::Primary);
        tracker.release(PointerButton::Secondary);
        assert!(tracker.is_dragging());
        tracker.release(PointerButton::Primary);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn leaving_resets_position() {
        let mut tracker = PointerTracker::new();
        tracker.moved(Vec2::ZERO);
        tracker.press(PointerButton::Primary);
        tracker.left();
        assert_eq!(tracker.moved(Vec2::new(50.0, 50.0)), None);
    }

    #[test]
    fn release_over_overlay_ends_drag() {
        let mut tracker = PointerTracker::new();
        tracker.moved(Vec2::ZERO);
        tracker.press(PointerButton::Primary);
        assert!(tracker.track(Vec2::new(30.0, 0.0), true).is_none());
        tracker.release(PointerButton::Primary);

        // Hovering back out of the overlay must not orbit.
        assert_eq!(tracker.track(Vec2::new(40.0, 0.0), false), None);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn captured_moves_keep_position_current() {
        let mut tracker = PointerTracker::new();
        tracker.moved(Vec2::ZERO);
        tracker.press(PointerButton::Primary);
        tracker.track(Vec2::new(300.0, 0.0), true);
        tracker.track(Vec2::new(600.0, 0.0), true);
        // Leaving the overlay continues from the last seen position.
        assert_eq!(
            tracker.track(Vec2::new(605.0, 0.0), false),
            Some(ControlAction::Rotate(Vec2::new(5.0, 0.0)))
        );
    }

    #[test]
    fn zero_wheel_is_ignored() {
        let tracker = PointerTracker::new();
        assert_eq!(tracker.wheel(0.0), None);
        assert_eq!(tracker.wheel(1.0), Some(ControlAction::Zoom(1.0)));
    }
}
