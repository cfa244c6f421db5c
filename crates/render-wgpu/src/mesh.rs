use bytemuck::{Pod, Zeroable};
use shadowstage_kernel::MeshShape;
use std::f32::consts::{PI, TAU};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Triangle list for a mesh shape.
pub(crate) fn build(shape: &MeshShape) -> (Vec<Vertex>, Vec<u32>) {
    match *shape {
        MeshShape::Sphere {
            radius,
            width_segments,
            height_segments,
        } => sphere_mesh(radius, width_segments, height_segments),
        MeshShape::Plane { width, height } => plane_mesh(width, height),
    }
}

/// UV sphere centered on the origin, poles on the Y axis.
fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> (Vec<Vertex>, Vec<u32>) {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);

    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        for ix in 0..=ws {
            let u = ix as f32 / ws as f32;
            let normal = [
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            ];
            vertices.push(Vertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                normal,
                uv: [u, 1.0 - v],
            });
        }
    }

    let row = ws + 1;
    let mut indices = Vec::new();
    for iy in 0..hs {
        for ix in 0..ws {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            // Pole rows collapse to single triangles.
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    (vertices, indices)
}

/// Single quad in the XY plane facing +Z.
fn plane_mesh(width: f32, height: f32) -> (Vec<Vertex>, Vec<u32>) {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let normal = [0.0, 0.0, 1.0];
    #[rustfmt::skip]
    let vertices = vec![
        Vertex { position: [-hw,  hh, 0.0], normal, uv: [0.0, 1.0] },
        Vertex { position: [ hw,  hh, 0.0], normal, uv: [1.0, 1.0] },
        Vertex { position: [-hw, -hh, 0.0], normal, uv: [0.0, 0.0] },
        Vertex { position: [ hw, -hh, 0.0], normal, uv: [1.0, 0.0] },
    ];
    let indices = vec![0, 2, 1, 2, 3, 1];
    (vertices, indices)
}
