//! Centralized constants used across the crate.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default edge length of one grid cell, in map-space pixels
pub const DEFAULT_CELL_SIZE: f32 = 32.0;

/// Default map width in cells for new documents
pub const DEFAULT_MAP_WIDTH: u32 = 64;

/// Default map height in cells for new documents
pub const DEFAULT_MAP_HEIGHT: u32 = 64;

/// Default screen width in pixels (used when no viewport size is known yet)
pub const DEFAULT_SCREEN_WIDTH: f32 = 1600.0;

/// Default screen height in pixels (used when no viewport size is known yet)
pub const DEFAULT_SCREEN_HEIGHT: f32 = 900.0;

/// Smallest allowed viewport zoom factor
pub const MIN_ZOOM: f32 = 0.1;

/// Largest allowed viewport zoom factor
pub const MAX_ZOOM: f32 = 10.0;

/// Maximum number of recent maps to remember in config
pub const MAX_RECENT_MAPS: usize = 5;

/// Current version of the saved map format
pub const SAVE_FORMAT_VERSION: u32 = 1;

/// Name given to the first layer of a new document
pub const DEFAULT_LAYER_NAME: &str = "Layer 1";
