/// Widgets specific to the gallery
///
/// - `canvas.rs` turns drags over the review screen into gesture messages
/// - `map_panel.rs` paints the stand-in map surfaces

pub mod canvas;
pub mod map_panel;

pub use canvas::{Gesture, RevealSurface};
pub use map_panel::{FocusMap, OverviewMap};
