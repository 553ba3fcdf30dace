//! Map-space geometry: cells, bounds, viewport and screen↔map transforms.

mod cell;
mod transform;
mod viewport;

pub use cell::{Cell, CellRect, MapBounds};
pub use transform::{
    cell_center, cell_origin, cell_rect_to_screen, cell_rect_to_world, cells_on_line,
    clip_line, map_to_screen, screen_rect_to_cells, screen_to_map, screen_to_map_checked, snap_to_grid,
};
pub use viewport::Viewport;
