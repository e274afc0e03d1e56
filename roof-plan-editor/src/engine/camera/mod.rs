/// Perspective orbit camera for the 3D volume view.
pub mod orbit_camera;

/// Orthographic plan camera, viewport split, and the camera input lock.
pub mod plan_camera;
