/// Ground reference grid shared by both views.
pub mod grid;
