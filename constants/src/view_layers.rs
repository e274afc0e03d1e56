/// Render layer for the top-down plan view (markers, handles, grid).
pub const PLAN_LAYER: usize = 1;

/// Render layer for the perspective volume view.
pub const VOLUME_LAYER: usize = 2;
