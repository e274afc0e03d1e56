use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::view::{NoFrustumCulling, RenderLayers};
use constants::editor_settings::{GRID_EXTENT, GRID_SPACING, GROUND_PLANE_HEIGHT};
use constants::view_layers::{PLAN_LAYER, VOLUME_LAYER};

#[derive(Component)]
pub struct GroundGrid;

/// Flat reference grid at ground height, visible in both views.
pub fn spawn_ground_grid(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let grid_material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, 0.25),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(create_grid_line_mesh(GRID_EXTENT, GRID_SPACING))),
        MeshMaterial3d(grid_material),
        Transform::IDENTITY,
        Visibility::Visible,
        NoFrustumCulling,
        RenderLayers::from_layers(&[PLAN_LAYER, VOLUME_LAYER]),
        GroundGrid,
        Name::new("ground_grid"),
    ));
}

fn create_grid_line_mesh(extent: f32, spacing: f32) -> Mesh {
    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    let line_count = (2.0 * extent / spacing).round() as i32;
    for i in 0..=line_count {
        let offset = -extent + i as f32 * spacing;

        let base = vertices.len() as u32;
        vertices.push([offset, GROUND_PLANE_HEIGHT, -extent]);
        vertices.push([offset, GROUND_PLANE_HEIGHT, extent]);
        vertices.push([-extent, GROUND_PLANE_HEIGHT, offset]);
        vertices.push([extent, GROUND_PLANE_HEIGHT, offset]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 3]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_indices(bevy::render::mesh::Indices::U32(indices));
    mesh
}
