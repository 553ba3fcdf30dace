//! Conversions between screen space, map pixels and grid cells.
//!
//! All functions are pure: they depend only on the viewport and the cell size.

use bevy::math::{IVec2, Rect, Vec2};

use crate::error::EditResult;

use super::cell::{Cell, CellRect, MapBounds};
use super::viewport::Viewport;

/// Snap a map-space point to the cell containing it.
///
/// Uses floor division on both axes, so negative coordinates round toward
/// negative infinity and the grid stays aligned across the origin.
pub fn snap_to_grid(point: Vec2, cell_size: f32) -> Cell {
    IVec2::new(
        (point.x / cell_size).floor() as i32,
        (point.y / cell_size).floor() as i32,
    )
}

/// Top-left corner of a cell in map pixels
pub fn cell_origin(cell: Cell, cell_size: f32) -> Vec2 {
    cell.as_vec2() * cell_size
}

/// Center of a cell in map pixels
pub fn cell_center(cell: Cell, cell_size: f32) -> Vec2 {
    cell_origin(cell, cell_size) + Vec2::splat(cell_size / 2.0)
}

/// Map-pixel rectangle covered by a cell rectangle
pub fn cell_rect_to_world(rect: &CellRect, cell_size: f32) -> Rect {
    Rect::from_corners(
        cell_origin(rect.min, cell_size),
        cell_origin(rect.max + IVec2::ONE, cell_size),
    )
}

pub fn screen_to_map(screen_point: Vec2, viewport: &Viewport, cell_size: f32) -> Cell {
    snap_to_grid(viewport.screen_to_world(screen_point), cell_size)
}

/// Like [`screen_to_map`] but fails with `OutOfBounds` outside the document
pub fn screen_to_map_checked(
    screen_point: Vec2,
    viewport: &Viewport,
    cell_size: f32,
    bounds: MapBounds,
) -> EditResult<Cell> {
    bounds.check(screen_to_map(screen_point, viewport, cell_size))
}

/// Screen rectangle covered by a cell
pub fn map_to_screen(cell: Cell, viewport: &Viewport, cell_size: f32) -> Rect {
    cell_rect_to_screen(&CellRect::single(cell), viewport, cell_size)
}

/// Screen rectangle covered by a cell rectangle
pub fn cell_rect_to_screen(rect: &CellRect, viewport: &Viewport, cell_size: f32) -> Rect {
    let world = cell_rect_to_world(rect, cell_size);
    Rect::from_corners(
        viewport.world_to_screen(world.min),
        viewport.world_to_screen(world.max),
    )
}

/// Cells touched by a screen rectangle (unclipped)
pub fn screen_rect_to_cells(screen_rect: Rect, viewport: &Viewport, cell_size: f32) -> CellRect {
    CellRect::from_corners(
        screen_to_map(screen_rect.min, viewport, cell_size),
        screen_to_map(screen_rect.max, viewport, cell_size),
    )
}

/// Cells visited by a straight line between two cells, both ends included.
///
/// Bresenham walk; used to fill gaps between pointer samples during a stroke.
/// The walk is done in `i64` so endpoints anywhere in the `i32` range are safe,
/// but the result holds one cell per step: clip long segments first with
/// [`clip_line`].
pub fn cells_on_line(from: Cell, to: Cell) -> Vec<Cell> {
    let (x0, y0) = (from.x as i64, from.y as i64);
    let (x1, y1) = (to.x as i64, to.y as i64);
    let (dx, dy) = ((x1 - x0).abs(), (y1 - y0).abs());
    let (sx, sy) = ((x1 - x0).signum(), (y1 - y0).signum());
    let mut error = dx - dy;
    let (mut x, mut y) = (x0, y0);
    let mut cells = Vec::with_capacity(dx.max(dy).saturating_add(1).min(4096) as usize);

    loop {
        cells.push(IVec2::new(x as i32, y as i32));
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * error;
        if doubled > -dy {
            error -= dy;
            x += sx;
        }
        if doubled < dx {
            error += dx;
            y += sy;
        }
    }
    cells
}

/// Clip the segment between two cell centers to the map.
///
/// Returns the first and last in-bounds cells along the segment, or `None`
/// when it misses the map entirely. Segments with both ends on the map come
/// back unchanged.
pub fn clip_line(from: Cell, to: Cell, bounds: MapBounds) -> Option<(Cell, Cell)> {
    if bounds.contains(from) && bounds.contains(to) {
        return Some((from, to));
    }
    let rect = bounds.as_rect()?;
    // Cell centers sit on integer coordinates; each cell reaches half a unit out.
    let (min_x, min_y) = (rect.min.x as f64 - 0.5, rect.min.y as f64 - 0.5);
    let (max_x, max_y) = (rect.max.x as f64 + 0.5, rect.max.y as f64 + 0.5);
    let (x0, y0) = (from.x as f64, from.y as f64);
    let (dx, dy) = (to.x as f64 - x0, to.y as f64 - y0);

    // Liang-Barsky
    let mut enter = 0.0_f64;
    let mut exit = 1.0_f64;
    for (p, q) in [
        (-dx, x0 - min_x),
        (dx, max_x - x0),
        (-dy, y0 - min_y),
        (dy, max_y - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
        if enter > exit {
            return None;
        }
    }

    let to_cell = |t: f64| {
        IVec2::new(
            (x0 + t * dx).round().clamp(rect.min.x as f64, rect.max.x as f64) as i32,
            (y0 + t * dy).round().clamp(rect.min.y as f64, rect.max.y as f64) as i32,
        )
    };
    Some((to_cell(enter), to_cell(exit)))
}
