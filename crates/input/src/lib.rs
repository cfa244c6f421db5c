//! Pointer input: raw pointer events become [`ControlAction`]s, which the
//! [`OrbitControls`] consume and apply to the camera once per frame.
//!
//! # Invariants
//! - Controls never move the camera outside of [`CameraControls::update`].
//! - The polar angle stays strictly between the poles.

pub mod action;
pub mod cursor;
pub mod orbit;

pub use action::{ControlAction, PointerButton, PointerTracker};
pub use cursor::Cursor;
pub use orbit::{CameraControls, OrbitControls};
