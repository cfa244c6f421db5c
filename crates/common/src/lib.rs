//! Shared value types used by every shadowstage crate.

pub mod types;

pub use types::{Rgb, Transform};
