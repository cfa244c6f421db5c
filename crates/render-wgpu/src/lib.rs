//! wgpu render backend for shadowstage.
//!
//! Draws the stage's meshes lit by ambient, directional, spot and point
//! lights, with depth shadow maps for each shadow-casting light. The shadow
//! proxy is an alpha-blended decal whose opacity comes from the stage.
//!
//! # Invariants
//! - Renderer never mutates stage state.
//! - Drawing buffer size is `round(logical size * pixel ratio)`.
//! - Mesh geometry is uploaded once; lights and poses are read every frame.

mod gpu;
mod light;
mod mesh;
mod shaders;

pub use gpu::{Frame, RenderError, WgpuRenderer};
