//! Derived 3D volume view.
//!
//! Subscribes to the marker transform store and mirrors every footprint as
//! a roof volume in the right-hand viewport. The subscription feeds an mpsc
//! channel drained once per frame, so the store listener never touches ECS
//! state directly.
//!
//! While a footprint is being resized its centre shifts (the opposite side
//! is anchored), which would slide the volume around mid-gesture. The
//! position lock holds the volume at its pre-resize position until a
//! genuine positional change arrives; scale and rotation are never locked.

/// Flat slab and gable prism mesh construction.
pub mod roof_volume;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::mpsc::{Receiver, channel};

use bevy::prelude::*;
use bevy::render::view::RenderLayers;
use constants::editor_settings::{
    BASE_FOOTPRINT_SIZE, DUAL_PITCH_ROOF_COLOR, FLAT_ROOF_COLOR, FLAT_SLAB_THICKNESS,
    GABLE_RIDGE_HEIGHT, POSITION_LOCK_EPSILON, VOLUME_BASE_HEIGHT,
};
use constants::view_layers::VOLUME_LAYER;

use crate::tools::marker_editor::TransformPublishSet;
use crate::tools::marker_editor::store::{MarkerId, MarkerStore, MarkerTransform, RoofType};
use roof_volume::{flat_slab_mesh, gable_prism_mesh};

/// Latest store broadcasts, drained by `apply_volume_snapshots`.
#[derive(Resource)]
pub struct SnapshotInbox {
    receiver: Mutex<Receiver<Vec<MarkerTransform>>>,
}

#[derive(Component)]
pub struct RoofVolume {
    pub id: MarkerId,
    pub roof_type: RoofType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionLock {
    pub locked: bool,
    pub held: Vec3,
}

/// Advance the lock for one incoming snapshot; returns the new lock state
/// and the position the volume should show.
pub fn step_position_lock(
    lock: PositionLock,
    target: Vec3,
    is_resizing: bool,
) -> (PositionLock, Vec3) {
    if is_resizing {
        // Capture the pre-resize position the first time the flag is seen.
        let held = if lock.locked { lock.held } else { target };
        return (PositionLock { locked: true, held }, held);
    }
    if lock.locked && target.distance(lock.held) <= POSITION_LOCK_EPSILON {
        return (lock, lock.held);
    }
    (
        PositionLock {
            locked: false,
            held: target,
        },
        target,
    )
}

#[derive(Resource, Default)]
pub struct VolumeIndex {
    entities: HashMap<MarkerId, Entity>,
    locks: HashMap<MarkerId, PositionLock>,
}

#[derive(Resource)]
pub struct VolumeAssets {
    flat_mesh: Handle<Mesh>,
    gable_mesh: Handle<Mesh>,
    flat_material: Handle<StandardMaterial>,
    dual_pitch_material: Handle<StandardMaterial>,
}

impl VolumeAssets {
    fn mesh_for(&self, roof_type: RoofType) -> Handle<Mesh> {
        match roof_type {
            RoofType::Flat => self.flat_mesh.clone(),
            RoofType::DualPitch => self.gable_mesh.clone(),
        }
    }

    fn material_for(&self, roof_type: RoofType) -> Handle<StandardMaterial> {
        match roof_type {
            RoofType::Flat => self.flat_material.clone(),
            RoofType::DualPitch => self.dual_pitch_material.clone(),
        }
    }
}

pub fn setup_volume_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(VolumeAssets {
        flat_mesh: meshes.add(flat_slab_mesh(BASE_FOOTPRINT_SIZE, FLAT_SLAB_THICKNESS)),
        gable_mesh: meshes.add(gable_prism_mesh(BASE_FOOTPRINT_SIZE, GABLE_RIDGE_HEIGHT)),
        flat_material: materials.add(StandardMaterial {
            base_color: FLAT_ROOF_COLOR,
            ..default()
        }),
        dual_pitch_material: materials.add(StandardMaterial {
            base_color: DUAL_PITCH_ROOF_COLOR,
            ..default()
        }),
    });
}

/// Register the store listener. The sender side lives inside the listener
/// closure for the lifetime of the store.
pub fn connect_volume_listener(mut store: ResMut<MarkerStore>, mut commands: Commands) {
    let (sender, receiver) = channel::<Vec<MarkerTransform>>();
    let sender = Mutex::new(sender);
    store.subscribe(Box::new(move |snapshot| {
        if let Ok(sender) = sender.lock() {
            let _ = sender.send(snapshot);
        }
    }));
    commands.insert_resource(SnapshotInbox {
        receiver: Mutex::new(receiver),
    });
}

/// Drain the inbox and reconcile volume entities against the latest
/// snapshot: spawn missing, restyle roof-type changes, despawn stale.
pub fn apply_volume_snapshots(
    inbox: Option<Res<SnapshotInbox>>,
    assets: Option<Res<VolumeAssets>>,
    mut index: ResMut<VolumeIndex>,
    mut q: Query<(
        &mut Transform,
        &mut RoofVolume,
        &mut Mesh3d,
        &mut MeshMaterial3d<StandardMaterial>,
    )>,
    mut commands: Commands,
) {
    let (Some(inbox), Some(assets)) = (inbox, assets) else {
        return;
    };
    let snapshot = {
        let Ok(receiver) = inbox.receiver.lock() else {
            return;
        };
        let Some(snapshot) = receiver.try_iter().last() else {
            return;
        };
        snapshot
    };

    let VolumeIndex { entities, locks } = &mut *index;

    for marker in &snapshot {
        let lock = locks.entry(marker.id).or_default();
        let (next_lock, position) = step_position_lock(*lock, marker.position, marker.is_resizing);
        *lock = next_lock;

        let transform = Transform {
            translation: Vec3::new(position.x, VOLUME_BASE_HEIGHT, position.z),
            rotation: Quat::from_rotation_y(marker.rotation_y),
            scale: Vec3::new(marker.scale_x, 1.0, marker.scale_z),
        };

        match entities.get(&marker.id) {
            Some(&entity) => {
                let Ok((mut xf, mut volume, mut mesh, mut material)) = q.get_mut(entity) else {
                    continue;
                };
                if volume.roof_type != marker.roof_type {
                    volume.roof_type = marker.roof_type;
                    mesh.0 = assets.mesh_for(marker.roof_type);
                    material.0 = assets.material_for(marker.roof_type);
                }
                *xf = transform;
            }
            None => {
                let entity = commands
                    .spawn((
                        RoofVolume {
                            id: marker.id,
                            roof_type: marker.roof_type,
                        },
                        Mesh3d(assets.mesh_for(marker.roof_type)),
                        MeshMaterial3d(assets.material_for(marker.roof_type)),
                        transform,
                        RenderLayers::layer(VOLUME_LAYER),
                        Name::new(format!("roof_volume_{}", marker.id.0)),
                    ))
                    .id();
                entities.insert(marker.id, entity);
            }
        }
    }

    entities.retain(|id, entity| {
        let keep = snapshot.iter().any(|m| m.id == *id);
        if !keep {
            commands.entity(*entity).despawn();
            locks.remove(id);
        }
        keep
    });
}

// Registers the volume view listener and reconciliation.
pub struct VolumeViewPlugin;

impl Plugin for VolumeViewPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VolumeIndex>()
            .add_systems(Startup, (setup_volume_assets, connect_volume_listener))
            .add_systems(
                PostUpdate,
                apply_volume_snapshots.after(TransformPublishSet),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_engages_and_holds_across_centre_motion() {
        let start = Vec3::new(2.0, 0.0, 3.0);
        let (lock, shown) = step_position_lock(PositionLock::default(), start, true);
        assert!(lock.locked);
        assert_eq!(shown, start);

        // The footprint centre shifts mid-resize; the shown position does not.
        let (lock, shown) = step_position_lock(lock, Vec3::new(4.5, 0.0, 3.0), true);
        assert!(lock.locked);
        assert_eq!(shown, start);
    }

    #[test]
    fn lock_releases_on_positional_change_after_resize() {
        let start = Vec3::ZERO;
        let (lock, _) = step_position_lock(PositionLock::default(), start, true);
        let target = Vec3::new(1.0, 0.0, 0.0);
        let (lock, shown) = step_position_lock(lock, target, false);
        assert!(!lock.locked);
        assert_eq!(shown, target);
    }

    #[test]
    fn lock_ignores_sub_epsilon_jitter() {
        let start = Vec3::new(1.0, 0.0, 1.0);
        let (lock, _) = step_position_lock(PositionLock::default(), start, true);
        let jitter = start + Vec3::new(POSITION_LOCK_EPSILON * 0.5, 0.0, 0.0);
        let (lock, shown) = step_position_lock(lock, jitter, false);
        assert!(lock.locked);
        assert_eq!(shown, start);
    }

    #[test]
    fn unlocked_positions_pass_straight_through() {
        let target = Vec3::new(-3.0, 0.0, 7.5);
        let (lock, shown) = step_position_lock(PositionLock::default(), target, false);
        assert!(!lock.locked);
        assert_eq!(shown, target);
    }
}
