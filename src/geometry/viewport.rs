//! Pan/zoom state of the editor canvas.
//!
//! Screen space has its origin at the top-left of the canvas with y growing
//! downward, matching map space, so no axis flip is involved.

use bevy::math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH, MAX_ZOOM, MIN_ZOOM};

use super::cell::{CellRect, MapBounds};
use super::transform::snap_to_grid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Map-space position (in pixels) shown at the top-left corner of the screen
    pub pan: Vec2,
    /// Screen pixels per map pixel
    pub zoom: f32,
    /// Size of the canvas in screen pixels
    pub screen_size: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Vec2::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT))
    }
}

impl Viewport {
    pub fn new(screen_size: Vec2) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            screen_size,
        }
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self
    }

    pub fn with_pan(mut self, pan: Vec2) -> Self {
        self.pan = pan;
        self
    }

    pub fn screen_to_world(&self, screen_point: Vec2) -> Vec2 {
        self.pan + screen_point / self.zoom
    }

    pub fn world_to_screen(&self, world_point: Vec2) -> Vec2 {
        (world_point - self.pan) * self.zoom
    }

    /// Move the view by a screen-space drag delta (content follows the cursor)
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.pan -= screen_delta / self.zoom;
    }

    /// Multiply the zoom by `factor`, keeping the map point under `screen_point` fixed
    pub fn zoom_at(&mut self, screen_point: Vec2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor = self.screen_to_world(screen_point);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - screen_point / self.zoom;
    }

    /// Map-space rectangle currently covered by the screen
    pub fn visible_world_rect(&self) -> Rect {
        Rect::from_corners(self.pan, self.screen_to_world(self.screen_size))
    }

    /// Cells touched by the screen, clipped to the map; `None` when the map is off-screen
    pub fn visible_cells(&self, cell_size: f32, bounds: MapBounds) -> Option<CellRect> {
        let world = self.visible_world_rect();
        let rect = CellRect::from_corners(
            snap_to_grid(world.min, cell_size),
            snap_to_grid(world.max, cell_size),
        );
        bounds.clamp_rect(&rect)
    }

    /// Viewport of `screen_size` that shows all of `content` (map pixels), centered.
    ///
    /// Used for overview/minimap panels.
    pub fn fit_to(content: Rect, screen_size: Vec2) -> Self {
        let content_size = content.size().max(Vec2::splat(f32::EPSILON));
        let zoom = (screen_size.x / content_size.x)
            .min(screen_size.y / content_size.y)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        let shown = screen_size / zoom;
        let pan = content.center() - shown / 2.0;
        Self {
            pan,
            zoom,
            screen_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bevy::math::IVec2;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert_eq!(viewport.pan, Vec2::ZERO);
        assert_eq!(viewport.zoom, 1.0);
        assert_eq!(
            viewport.screen_size,
            Vec2::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT)
        );
    }

    #[test]
    fn test_screen_world_roundtrip() {
        let viewport = Viewport::default()
            .with_zoom(2.5)
            .with_pan(Vec2::new(-40.0, 12.0));
        let screen = Vec2::new(123.0, 456.0);
        let back = viewport.world_to_screen(viewport.screen_to_world(screen));
        assert_relative_eq!(back.x, screen.x, epsilon = 1e-3);
        assert_relative_eq!(back.y, screen.y, epsilon = 1e-3);
    }

    #[test]
    fn test_pan_by_follows_cursor() {
        let mut viewport = Viewport::default().with_zoom(2.0);
        let world = Vec2::new(50.0, 50.0);
        let before = viewport.world_to_screen(world);
        viewport.pan_by(Vec2::new(10.0, -4.0));
        let after = viewport.world_to_screen(world);
        assert_relative_eq!(after.x - before.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(after.y - before.y, -4.0, epsilon = 1e-4);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut viewport = Viewport::default().with_pan(Vec2::new(30.0, 30.0));
        let cursor = Vec2::new(400.0, 300.0);
        let anchor = viewport.screen_to_world(cursor);

        viewport.zoom_at(cursor, 2.0);

        assert_relative_eq!(viewport.zoom, 2.0);
        let moved = viewport.screen_to_world(cursor);
        assert_relative_eq!(moved.x, anchor.x, epsilon = 1e-3);
        assert_relative_eq!(moved.y, anchor.y, epsilon = 1e-3);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(Vec2::ZERO, 1000.0);
        assert_eq!(viewport.zoom, MAX_ZOOM);
        viewport.zoom_at(Vec2::ZERO, 0.00001);
        assert_eq!(viewport.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_zoom_ignores_invalid_factor() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(Vec2::ZERO, 0.0);
        viewport.zoom_at(Vec2::ZERO, f32::NAN);
        assert_eq!(viewport.zoom, 1.0);
    }

    #[test]
    fn test_visible_cells_clipped_to_bounds() {
        let viewport = Viewport::new(Vec2::new(100.0, 60.0));
        let cells = viewport.visible_cells(10.0, MapBounds::new(5, 50)).unwrap();
        assert_eq!(cells.min, IVec2::new(0, 0));
        assert_eq!(cells.max, IVec2::new(4, 6));
    }

    #[test]
    fn test_visible_cells_offscreen_map() {
        let viewport = Viewport::new(Vec2::new(100.0, 100.0)).with_pan(Vec2::new(-500.0, -500.0));
        assert_eq!(viewport.visible_cells(10.0, MapBounds::new(5, 5)), None);
    }

    #[test]
    fn test_fit_to_shows_whole_content() {
        let content = Rect::new(0.0, 0.0, 800.0, 400.0);
        let viewport = Viewport::fit_to(content, Vec2::new(400.0, 400.0));
        assert_relative_eq!(viewport.zoom, 0.5);

        let visible = viewport.visible_world_rect();
        assert!(visible.min.x <= content.min.x + 1e-3);
        assert!(visible.min.y <= content.min.y + 1e-3);
        assert!(visible.max.x >= content.max.x - 1e-3);
        assert!(visible.max.y >= content.max.y - 1e-3);
    }
}
