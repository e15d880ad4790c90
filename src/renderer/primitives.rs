//! Geometry generators producing [`Mesh`]es with mesh-local indices.
use std::f32::consts::PI;

use super::vertex::{v, Vertex};
use crate::asset::Mesh;

const WHITE: [f32; 4] = [1.0; 4];

/// Axis-aligned quad in the XY plane, centred on the origin.
pub fn quad(width: f32, height: f32, color: [f32; 4]) -> Mesh {
    let (hw, hh) = (width * 0.5, height * 0.5);
    Mesh::new(
        vec![
            v([-hw, -hh, 0.0], color, [0.0, 1.0], 0.0),
            v([hw, -hh, 0.0], color, [1.0, 1.0], 0.0),
            v([hw, hh, 0.0], color, [1.0, 0.0], 0.0),
            v([-hw, hh, 0.0], color, [0.0, 0.0], 0.0),
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// `cols` x `rows` grid of `cell`-sized quads in the XY plane. Quads do not
/// share vertices, so the mesh has `4 * cols * rows` vertices.
pub fn grid(cols: u32, rows: u32, cell: f32, color: [f32; 4]) -> Mesh {
    let mut vertices = Vec::with_capacity((cols * rows * 4) as usize);
    let mut indices = Vec::with_capacity((cols * rows * 6) as usize);
    let origin_x = -(cols as f32) * cell * 0.5;
    let origin_y = -(rows as f32) * cell * 0.5;

    for row in 0..rows {
        for col in 0..cols {
            let x = origin_x + col as f32 * cell;
            let y = origin_y + row as f32 * cell;
            let base = vertices.len() as u32;
            vertices.extend([
                v([x, y, 0.0], color, [0.0, 1.0], 0.0),
                v([x + cell, y, 0.0], color, [1.0, 1.0], 0.0),
                v([x + cell, y + cell, 0.0], color, [1.0, 0.0], 0.0),
                v([x, y + cell, 0.0], color, [0.0, 0.0], 0.0),
            ]);
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    Mesh::new(vertices, indices)
}

/// Unit cube (edge length 1) with one quad per face.
pub fn cube(color: [f32; 4]) -> Mesh {
    // (normal axis, sign) for each face; the other two axes span the quad.
    const FACES: [(usize, f32); 6] = [
        (0, 1.0),
        (0, -1.0),
        (1, 1.0),
        (1, -1.0),
        (2, 1.0),
        (2, -1.0),
    ];
    const CORNERS: [[f32; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (axis, sign) in FACES {
        let (u_axis, v_axis) = ((axis + 1) % 3, (axis + 2) % 3);
        let base = vertices.len() as u32;
        for [cu, cv] in CORNERS {
            let mut pos = [0.0; 3];
            pos[axis] = 0.5 * sign;
            pos[u_axis] = cu;
            pos[v_axis] = cv * sign;
            vertices.push(v(pos, color, [cu + 0.5, 0.5 - cv], 0.0));
        }
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh::new(vertices, indices)
}

/// UV sphere of radius 1.
pub fn sphere(segments: u32, rings: u32, color: [f32; 4]) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut vertices: Vec<Vertex> = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for segment in 0..=segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let pos = [ring_radius * theta.cos(), y, ring_radius * theta.sin()];
            let uv = [
                segment as f32 / segments as f32,
                ring as f32 / rings as f32,
            ];
            vertices.push(v(pos, color, uv, 0.0));
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend([current, next, current + 1]);
            indices.extend([current + 1, next, next + 1]);
        }
    }

    Mesh::new(vertices, indices)
}

/// White unit quad, the default sprite.
pub fn unit_quad() -> Mesh {
    quad(1.0, 1.0, WHITE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices_in_range(mesh: &Mesh) -> bool {
        mesh.indices()
            .iter()
            .all(|&i| (i as usize) < mesh.vertex_count())
    }

    #[test]
    fn quad_is_four_vertices_six_indices() {
        let mesh = unit_quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
        assert!(indices_in_range(&mesh));
    }

    #[test]
    fn grid_scales_with_cell_count() {
        let mesh = grid(3, 2, 1.0, WHITE);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert!(indices_in_range(&mesh));
    }

    #[test]
    fn cube_faces_sit_on_the_unit_box() {
        let mesh = cube(WHITE);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert!(indices_in_range(&mesh));
        assert!(mesh
            .vertices()
            .iter()
            .all(|vtx| vtx.pos.iter().any(|c| (c.abs() - 0.5).abs() < 1e-6)));
    }

    #[test]
    fn sphere_vertices_lie_on_unit_radius() {
        let mesh = sphere(16, 8, WHITE);
        assert_eq!(mesh.vertex_count(), 17 * 9);
        assert_eq!(mesh.index_count(), 16 * 8 * 6);
        assert!(indices_in_range(&mesh));
        for vtx in mesh.vertices() {
            let [x, y, z] = vtx.pos;
            assert!(((x * x + y * y + z * z).sqrt() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn sphere_clamps_degenerate_tessellation() {
        let mesh = sphere(0, 0, WHITE);
        assert_eq!(mesh.vertex_count(), 3 * 4);
    }
}
