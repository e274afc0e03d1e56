use bevy::prelude::*;

use super::state::HandleRole;

/// What the top-most pick under the pointer resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickKind {
    MarkerBody,
    Handle(HandleRole),
}

#[derive(Debug, Clone, Copy)]
pub struct Pick {
    /// The owning marker entity (for handles, the handle's owner).
    pub marker: Entity,
    pub kind: PickKind,
    pub t: f32,
}

impl Pick {
    pub fn is_handle(&self) -> bool {
        matches!(self.kind, PickKind::Handle(_))
    }
}

/// Ray vs oriented bounding box: transform the ray into box-local space and
/// run the slab test against the half-extents.
pub fn ray_hits_obb(origin: Vec3, dir: Vec3, xf: &GlobalTransform, size: Vec3) -> Option<f32> {
    let inv = xf.compute_matrix().inverse();
    let o_local = inv.transform_point3(origin);
    let d_local = inv.transform_vector3(dir);
    let he = size * 0.5;
    ray_aabb_hit_t(o_local, d_local, -he, he)
}

// Slab-method ray–AABB intersection, returns Some(t) or None
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = Vec3::new(
        if ray_direction.x != 0.0 { 1.0 / ray_direction.x } else { f32::INFINITY },
        if ray_direction.y != 0.0 { 1.0 / ray_direction.y } else { f32::INFINITY },
        if ray_direction.z != 0.0 { 1.0 / ray_direction.z } else { f32::INFINITY },
    );

    let (mut tmin, mut tmax) = ((min.x - ray_origin.x) * inv.x, (max.x - ray_origin.x) * inv.x);
    if tmin > tmax {
        std::mem::swap(&mut tmin, &mut tmax);
    }

    let (mut tymin, mut tymax) = ((min.y - ray_origin.y) * inv.y, (max.y - ray_origin.y) * inv.y);
    if tymin > tymax {
        std::mem::swap(&mut tymin, &mut tymax);
    }

    if (tmin > tymax) || (tymin > tmax) {
        return None;
    }
    if tymin > tmin {
        tmin = tymin;
    }
    if tymax < tmax {
        tmax = tymax;
    }

    let (mut tzmin, mut tzmax) = ((min.z - ray_origin.z) * inv.z, (max.z - ray_origin.z) * inv.z);
    if tzmin > tzmax {
        std::mem::swap(&mut tzmin, &mut tzmax);
    }

    if (tmin > tzmax) || (tzmin > tmax) {
        return None;
    }
    if tzmin > tmin {
        tmin = tzmin;
    }
    if tzmax < tmax {
        tmax = tzmax;
    }

    if tmax < 0.0 {
        return None;
    }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

/// Top-most (closest-t) pick across marker bodies and visible handles.
///
/// Handles sit above the footprint plates, so an overlapping handle naturally
/// wins the depth comparison against its own marker body.
pub fn pick_topmost<'a>(
    origin: Vec3,
    dir: Vec3,
    markers: impl Iterator<Item = (Entity, &'a GlobalTransform, Vec3)>,
    handles: impl Iterator<Item = (Entity, &'a GlobalTransform, Vec3, HandleRole, bool)>,
) -> Option<Pick> {
    let mut best: Option<Pick> = None;

    for (entity, xf, size) in markers {
        if let Some(t) = ray_hits_obb(origin, dir, xf, size) {
            if t > 0.0 && best.map_or(true, |b| t < b.t) {
                best = Some(Pick { marker: entity, kind: PickKind::MarkerBody, t });
            }
        }
    }

    for (owner, xf, size, role, pickable) in handles {
        if !pickable {
            continue;
        }
        if let Some(t) = ray_hits_obb(origin, dir, xf, size) {
            if t > 0.0 && best.map_or(true, |b| t < b.t) {
                best = Some(Pick { marker: owner, kind: PickKind::Handle(role), t });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_axis_aligned_box() {
        let t = ray_aabb_hit_t(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::NEG_Y,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        )
        .unwrap();
        assert!((t - 9.0).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_offset_box() {
        assert!(
            ray_aabb_hit_t(
                Vec3::new(5.0, 10.0, 0.0),
                Vec3::NEG_Y,
                Vec3::splat(-1.0),
                Vec3::splat(1.0),
            )
            .is_none()
        );
    }

    #[test]
    fn rotated_box_is_hit_in_its_own_frame() {
        // A thin box rotated 45 degrees about Y still catches a vertical ray
        // dropped over its rotated corner area.
        let xf = GlobalTransform::from(
            Transform::from_translation(Vec3::ZERO)
                .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4)),
        );
        let size = Vec3::new(10.0, 0.2, 10.0);
        let hit = ray_hits_obb(Vec3::new(6.0, 5.0, 0.0), Vec3::NEG_Y, &xf, size);
        assert!(hit.is_some());

        // Outside the rotated extent along the diagonal.
        let miss = ray_hits_obb(Vec3::new(6.0, 5.0, 6.0), Vec3::NEG_Y, &xf, size);
        assert!(miss.is_none());
    }

    #[test]
    fn topmost_pick_prefers_closest_hit() {
        let low = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, 0.0));
        let high = GlobalTransform::from(Transform::from_xyz(0.0, 1.0, 0.0));
        let size = Vec3::new(4.0, 0.2, 4.0);

        let markers = vec![
            (Entity::from_raw(1), &low, size),
            (Entity::from_raw(2), &high, size),
        ];
        let pick = pick_topmost(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::NEG_Y,
            markers.into_iter(),
            std::iter::empty(),
        )
        .unwrap();
        assert_eq!(pick.marker, Entity::from_raw(2));
    }

    #[test]
    fn hidden_handles_are_not_pickable() {
        let xf = GlobalTransform::from(Transform::from_xyz(0.0, 1.0, 0.0));
        let handles = vec![(
            Entity::from_raw(7),
            &xf,
            Vec3::splat(1.0),
            HandleRole::Corner(0),
            false,
        )];
        assert!(
            pick_topmost(
                Vec3::new(0.0, 10.0, 0.0),
                Vec3::NEG_Y,
                std::iter::empty(),
                handles.into_iter(),
            )
            .is_none()
        );
    }
}
