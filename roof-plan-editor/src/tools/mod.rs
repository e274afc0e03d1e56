//! Interactive editing tools.
//!
//! Currently a single tool: the roof footprint marker editor, covering
//! placement, selection, and the move / rotate / resize gesture
//! controllers together with the transform store they publish into.

pub mod marker_editor;
