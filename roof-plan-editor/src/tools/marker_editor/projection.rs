use bevy::prelude::*;

/// Exact ray intersection with a horizontal plane at `plane_y`.
///
/// Returns `None` when the ray runs parallel to the plane or the intersection
/// lies behind the ray origin. Every gesture's precision depends on this being
/// exact, so there is no stepping or smoothing here.
pub fn ray_plane_intersection(origin: Vec3, direction: Vec3, plane_y: f32) -> Option<Vec3> {
    if direction.y.abs() < 1e-6 {
        return None;
    }
    let t = (plane_y - origin.y) / direction.y;
    if t <= 0.0 {
        return None;
    }
    Some(origin + direction * t)
}

/// Window-space cursor position to viewport-local position for `camera`.
/// `None` when the cursor is outside the camera's viewport.
pub fn window_cursor_to_viewport(camera: &Camera, cursor: Vec2) -> Option<Vec2> {
    match camera.logical_viewport_rect() {
        Some(rect) if rect.contains(cursor) => Some(cursor - rect.min),
        Some(_) => None,
        None => Some(cursor),
    }
}

/// Project a window cursor position through `camera` onto the ground plane.
pub fn cursor_to_ground_plane(
    camera: &Camera,
    camera_transform: &GlobalTransform,
    cursor: Vec2,
    plane_y: f32,
) -> Option<Vec3> {
    let viewport_pos = window_cursor_to_viewport(camera, cursor)?;
    let ray = camera.viewport_to_world(camera_transform, viewport_pos).ok()?;
    ray_plane_intersection(ray.origin, ray.direction.as_vec3(), plane_y)
}

/// Viewport ray for picking, from the same cursor conversion as projection.
pub fn cursor_ray(
    camera: &Camera,
    camera_transform: &GlobalTransform,
    cursor: Vec2,
) -> Option<(Vec3, Vec3)> {
    let viewport_pos = window_cursor_to_viewport(camera, cursor)?;
    let ray = camera.viewport_to_world(camera_transform, viewport_pos).ok()?;
    Some((ray.origin, ray.direction.as_vec3()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_ray_hits_plane_exactly() {
        let hit = ray_plane_intersection(Vec3::new(3.0, 10.0, -2.0), Vec3::NEG_Y, 0.0).unwrap();
        assert_eq!(hit, Vec3::new(3.0, 0.0, -2.0));
    }

    #[test]
    fn oblique_ray_hits_plane_exactly() {
        let origin = Vec3::new(0.0, 4.0, 0.0);
        let direction = Vec3::new(1.0, -1.0, 2.0).normalize();
        let hit = ray_plane_intersection(origin, direction, 0.0).unwrap();
        assert!((hit - Vec3::new(4.0, 0.0, 8.0)).length() < 1e-4);
    }

    #[test]
    fn parallel_ray_misses() {
        assert!(ray_plane_intersection(Vec3::new(0.0, 5.0, 0.0), Vec3::X, 0.0).is_none());
    }

    #[test]
    fn intersection_behind_origin_misses() {
        // Ray pointing up from above the plane.
        assert!(ray_plane_intersection(Vec3::new(0.0, 5.0, 0.0), Vec3::Y, 0.0).is_none());
    }

    #[test]
    fn plane_height_is_respected() {
        let hit = ray_plane_intersection(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y, 2.5).unwrap();
        assert_eq!(hit.y, 2.5);
    }
}
