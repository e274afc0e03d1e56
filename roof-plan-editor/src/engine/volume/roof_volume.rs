use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};

/// Flat roof volume: a slab sitting on the ground plane. Built at the
/// unscaled footprint size; the entity transform carries the footprint
/// scale, so thickness stays constant under resize.
pub fn flat_slab_mesh(size: f32, thickness: f32) -> Mesh {
    Mesh::from(Cuboid::new(size, thickness, size)).translated_by(Vec3::Y * (thickness * 0.5))
}

/// Dual-pitch roof volume: a gable prism with the ridge along local X at
/// `ridge_height`, eaves on the ground at `z = ±size/2`.
pub fn gable_prism_mesh(size: f32, ridge_height: f32) -> Mesh {
    let h = size * 0.5;

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    let mut quad = |verts: [[f32; 3]; 4], normal: [f32; 3]| {
        let base = positions.len() as u32;
        positions.extend_from_slice(&verts);
        normals.extend_from_slice(&[normal; 4]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    };

    // Slope normals from the cross-section triangle.
    let slope = Vec2::new(ridge_height, h).normalize();

    // North slope (eave at -z up to the ridge).
    quad(
        [
            [-h, 0.0, -h],
            [h, 0.0, -h],
            [h, ridge_height, 0.0],
            [-h, ridge_height, 0.0],
        ],
        [0.0, slope.y, -slope.x],
    );
    // South slope.
    quad(
        [
            [h, 0.0, h],
            [-h, 0.0, h],
            [-h, ridge_height, 0.0],
            [h, ridge_height, 0.0],
        ],
        [0.0, slope.y, slope.x],
    );
    // Bottom.
    quad(
        [[-h, 0.0, h], [h, 0.0, h], [h, 0.0, -h], [-h, 0.0, -h]],
        [0.0, -1.0, 0.0],
    );

    let mut triangle = |verts: [[f32; 3]; 3], normal: [f32; 3]| {
        let base = positions.len() as u32;
        positions.extend_from_slice(&verts);
        normals.extend_from_slice(&[normal; 3]);
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    };

    // Gable ends.
    triangle(
        [[-h, 0.0, h], [-h, ridge_height, 0.0], [-h, 0.0, -h]],
        [-1.0, 0.0, 0.0],
    );
    triangle(
        [[h, 0.0, -h], [h, ridge_height, 0.0], [h, 0.0, h]],
        [1.0, 0.0, 0.0],
    );

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    fn positions_of(mesh: &Mesh) -> Vec<[f32; 3]> {
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("missing position attribute");
        };
        positions.clone()
    }

    #[test]
    fn gable_ridge_sits_at_ridge_height() {
        let mesh = gable_prism_mesh(10.0, 3.5);
        let positions = positions_of(&mesh);

        let max_y = positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        assert_eq!(max_y, 3.5);
        // Every ridge vertex is on the centre line.
        for p in positions.iter().filter(|p| p[1] == 3.5) {
            assert_eq!(p[2], 0.0);
        }
    }

    #[test]
    fn gable_footprint_matches_requested_size() {
        let positions = positions_of(&gable_prism_mesh(10.0, 3.5));
        for p in &positions {
            assert!(p[0].abs() <= 5.0 && p[2].abs() <= 5.0);
            assert!(p[1] >= 0.0);
        }
        assert!(positions.iter().any(|p| p[0] == -5.0 && p[2] == 5.0));
    }

    #[test]
    fn gable_normals_are_unit_length() {
        let mesh = gable_prism_mesh(8.0, 2.0);
        let Some(VertexAttributeValues::Float32x3(normals)) =
            mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
        else {
            panic!("missing normal attribute");
        };
        for n in normals {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn flat_slab_rests_on_the_ground() {
        let positions = positions_of(&flat_slab_mesh(10.0, 1.2));
        let min_y = positions.iter().map(|p| p[1]).fold(f32::MAX, f32::min);
        let max_y = positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        assert!((min_y - 0.0).abs() < 1e-6);
        assert!((max_y - 1.2).abs() < 1e-6);
    }
}
