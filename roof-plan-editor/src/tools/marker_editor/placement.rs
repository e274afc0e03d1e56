use bevy::prelude::*;
use bevy::render::view::RenderLayers;
use bevy::window::PrimaryWindow;
use constants::editor_settings::{
    BASE_FOOTPRINT_SIZE, CORNER_HANDLE_SIZE, EDGE_HANDLE_SIZE, GROUND_PLANE_HEIGHT,
    HANDLE_COLOR, MARKER_COLOR, MARKER_PICK_THICKNESS, MARKER_SELECTED_COLOR, PREVIEW_COLOR,
    ROTATION_HANDLE_COLOR, ROTATION_HANDLE_OFFSET, ROTATION_HANDLE_RADIUS,
};
use constants::view_layers::PLAN_LAYER;

use super::movement::MovementController;
use super::picking::pick_topmost;
use super::projection::{cursor_ray, cursor_to_ground_plane};
use super::resize::{CORNER_SIGNS, ResizeController};
use super::rotation::RotationController;
use super::state::{
    FootprintBounds, HandleBounds, HandleOwner, HandleRole, MarkerMaterials, PlacementPreview,
    PlacementState, RoofMarker,
};
use super::store::{MarkerIdAllocator, MarkerStore, MarkerTransform, RoofType};
use crate::engine::camera::plan_camera::PlanCamera;
use crate::engine::config::ActiveConfig;

/// Shared mesh handles for marker plates and their grab handles.
#[derive(Resource)]
pub struct MarkerAssets {
    pub plate: Handle<Mesh>,
    pub corner_handle: Handle<Mesh>,
    pub edge_handle: Handle<Mesh>,
    pub rotation_handle: Handle<Mesh>,
}

const HANDLE_LIFT: f32 = 0.3;

pub fn setup_marker_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let unlit = |color: Color| StandardMaterial {
        base_color: color,
        unlit: true,
        ..default()
    };

    commands.insert_resource(MarkerAssets {
        plate: meshes.add(Cuboid::new(
            BASE_FOOTPRINT_SIZE,
            MARKER_PICK_THICKNESS,
            BASE_FOOTPRINT_SIZE,
        )),
        corner_handle: meshes.add(Cuboid::new(
            CORNER_HANDLE_SIZE,
            CORNER_HANDLE_SIZE,
            CORNER_HANDLE_SIZE,
        )),
        edge_handle: meshes.add(Cuboid::new(
            EDGE_HANDLE_SIZE,
            EDGE_HANDLE_SIZE,
            EDGE_HANDLE_SIZE,
        )),
        rotation_handle: meshes.add(Cylinder::new(ROTATION_HANDLE_RADIUS, 0.15)),
    });

    commands.insert_resource(MarkerMaterials {
        normal: materials.add(unlit(MARKER_COLOR)),
        selected: materials.add(unlit(MARKER_SELECTED_COLOR)),
        handle: materials.add(unlit(HANDLE_COLOR)),
        rotation_handle: materials.add(unlit(ROTATION_HANDLE_COLOR)),
        preview: materials.add(StandardMaterial {
            base_color: PREVIEW_COLOR,
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        }),
    });
}

pub fn placement_mode_hotkeys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut place: ResMut<PlacementState>,
) {
    if keyboard.just_pressed(KeyCode::KeyF) {
        place.active = true;
        place.roof_type = RoofType::Flat;
        info!("placement mode: flat roof");
    }
    if keyboard.just_pressed(KeyCode::KeyG) {
        place.active = true;
        place.roof_type = RoofType::DualPitch;
        info!("placement mode: dual-pitch roof");
    }
    if keyboard.just_pressed(KeyCode::Escape) && place.active {
        place.active = false;
        info!("placement mode off");
    }
}

/// Keeps exactly one ghost footprint alive while placement mode is active.
/// The entity persists across frames; mode exit despawns it.
pub fn ensure_placement_preview(
    place: Res<PlacementState>,
    existing_preview: Query<Entity, With<PlacementPreview>>,
    assets: Option<Res<MarkerAssets>>,
    materials: Option<Res<MarkerMaterials>>,
    mut commands: Commands,
) {
    if !place.active {
        for entity in existing_preview.iter() {
            commands.entity(entity).despawn();
        }
        return;
    }
    if !existing_preview.is_empty() {
        return;
    }
    let (Some(assets), Some(materials)) = (assets, materials) else {
        return;
    };

    commands.spawn((
        Mesh3d(assets.plate.clone()),
        MeshMaterial3d(materials.preview.clone()),
        Transform::default(),
        Visibility::Hidden,
        PlacementPreview,
        RenderLayers::layer(PLAN_LAYER),
        Name::new("placement_preview"),
    ));
}

/// Ghost follows the projected cursor; hidden while the cursor has no
/// ground hit.
pub fn update_placement_preview(
    place: Res<PlacementState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlanCamera>>,
    mut q_preview: Query<(&mut Transform, &mut Visibility), With<PlacementPreview>>,
) {
    if !place.active {
        return;
    }
    let Ok((mut transform, mut visibility)) = q_preview.single_mut() else {
        return;
    };

    let Ok(window) = windows.single() else { return };
    let Some(cursor_pos) = window.cursor_position() else {
        *visibility = Visibility::Hidden;
        return;
    };
    let Ok((camera, cam_xf)) = cameras.single() else {
        return;
    };
    let Some(hit) = cursor_to_ground_plane(camera, cam_xf, cursor_pos, GROUND_PLANE_HEIGHT)
    else {
        *visibility = Visibility::Hidden;
        return;
    };

    transform.translation = hit;
    *visibility = Visibility::Visible;
}

/// Pointer-down with no picked object while placement mode is active
/// completes a placement gesture: marker, handles, store entry.
pub fn place_marker_on_click(
    buttons: Res<ButtonInput<MouseButton>>,
    place: Res<PlacementState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlanCamera>>,
    q_markers: Query<(Entity, &GlobalTransform, &FootprintBounds), With<RoofMarker>>,
    q_handles: Query<(&HandleOwner, &GlobalTransform, &HandleBounds, &HandleRole, &Visibility)>,
    assets: Res<MarkerAssets>,
    materials: Res<MarkerMaterials>,
    config: Res<ActiveConfig>,
    mut ids: ResMut<MarkerIdAllocator>,
    mut store: ResMut<MarkerStore>,
    mut commands: Commands,
) {
    if !place.active || !buttons.just_pressed(MouseButton::Left) {
        return;
    }

    let Ok(window) = windows.single() else { return };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    let Ok((camera, cam_xf)) = cameras.single() else {
        return;
    };

    // Placement only on empty ground; clicks over an existing marker or
    // handle belong to the other controllers.
    if let Some((origin, dir)) = cursor_ray(camera, cam_xf, cursor_pos) {
        let picked = pick_topmost(
            origin,
            dir,
            q_markers.iter().map(|(e, xf, bounds)| (e, xf, bounds.0)),
            q_handles.iter().map(|(owner, xf, bounds, role, vis)| {
                (owner.0, xf, bounds.0, *role, *vis != Visibility::Hidden)
            }),
        );
        if picked.is_some() {
            return;
        }
    }

    let Some(hit) = cursor_to_ground_plane(camera, cam_xf, cursor_pos, GROUND_PLANE_HEIGHT)
    else {
        return;
    };

    let id = ids.allocate();
    let snapshot = MarkerTransform::new(id, place.roof_type, hit);
    let position = snapshot.position;

    let half = BASE_FOOTPRINT_SIZE * 0.5;
    let marker = commands
        .spawn((
            RoofMarker { id, roof_type: place.roof_type, yaw: 0.0 },
            FootprintBounds(Vec3::new(
                BASE_FOOTPRINT_SIZE,
                MARKER_PICK_THICKNESS,
                BASE_FOOTPRINT_SIZE,
            )),
            MovementController {
                damping: config.0.drag_damping_ratio,
                ..default()
            },
            RotationController::default(),
            ResizeController::default(),
            Mesh3d(assets.plate.clone()),
            MeshMaterial3d(materials.normal.clone()),
            Transform::from_translation(position),
            RenderLayers::layer(PLAN_LAYER),
            Name::new(format!("roof_marker_{}", id.0)),
        ))
        .id();

    let mut handle = |mesh: &Handle<Mesh>,
                      material: &Handle<StandardMaterial>,
                      local: Vec3,
                      role: HandleRole,
                      bounds: Vec3| {
        commands.entity(marker).with_children(|parent| {
            parent.spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(local),
                role,
                HandleOwner(marker),
                HandleBounds(bounds),
                Visibility::Hidden,
                RenderLayers::layer(PLAN_LAYER),
            ));
        });
    };

    for (index, &(sx, sz)) in CORNER_SIGNS.iter().enumerate() {
        handle(
            &assets.corner_handle,
            &materials.handle,
            Vec3::new(sx * half, HANDLE_LIFT, sz * half),
            HandleRole::Corner(index),
            Vec3::splat(CORNER_HANDLE_SIZE),
        );
    }
    for (index, &(sx, sz)) in
        [(1.0f32, 0.0f32), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)].iter().enumerate()
    {
        handle(
            &assets.edge_handle,
            &materials.handle,
            Vec3::new(sx * half, HANDLE_LIFT, sz * half),
            HandleRole::Edge(index),
            Vec3::splat(EDGE_HANDLE_SIZE),
        );
    }
    handle(
        &assets.rotation_handle,
        &materials.rotation_handle,
        Vec3::new(0.0, HANDLE_LIFT, -ROTATION_HANDLE_OFFSET),
        HandleRole::Rotation,
        Vec3::new(
            ROTATION_HANDLE_RADIUS * 2.0,
            HANDLE_LIFT,
            ROTATION_HANDLE_RADIUS * 2.0,
        ),
    );

    store.upsert(snapshot);
    info!("placed {:?} marker {:?} at {:.2},{:.2}", place.roof_type, id, hit.x, hit.z);
}

/// Handles are parented to the marker, so the marker's footprint scale would
/// stretch them; counter-scale keeps their world size constant (and their
/// pick bounds valid).
pub fn compensate_handle_scale(
    q_markers: Query<&Transform, With<RoofMarker>>,
    mut q_handles: Query<(&HandleOwner, &mut Transform), Without<RoofMarker>>,
) {
    for (owner, mut transform) in &mut q_handles {
        let Ok(marker_transform) = q_markers.get(owner.0) else {
            continue;
        };
        let s = marker_transform.scale;
        if s.x > f32::EPSILON && s.z > f32::EPSILON {
            transform.scale = Vec3::new(1.0 / s.x, 1.0, 1.0 / s.z);
        }
    }
}
