//! Core data structures for tilehull
//!
//! This crate provides the fundamental types for turning a tile sheet into
//! collision data:
//! - `ImageGrid` - Partitions a source image into row-major tiles
//! - `HullExtractor` - Derives a convex collision hull from a tile's alpha
//! - `CollisionGroupRegistry` - Ordered, colored collision groups
//! - `Color` - Plain RGBA color used for group and hull display
//! - `ImageTag` - Informational tags describing a decoded image

mod collision;
mod color;
mod grid;
mod hull;
mod image_tags;

pub use collision::{CollisionGroup, CollisionGroupRegistry};
pub use color::Color;
pub use grid::{
    tiles_along_axis, GridKey, ImageGrid, TileGridConfig, TileRect, TILE_VERTEX_STRIDE,
    VERTICES_PER_TILE,
};
pub use hull::{AlphaMask, Hull, HullExtractor, DEFAULT_ALPHA_THRESHOLD};
pub use image_tags::{image_tags, ImageTag};

use thiserror::Error;

/// Errors reported by tile set mutations
///
/// Every variant is a local validation failure; the operation that produced
/// it leaves the tile set untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileSetError {
    #[error("Invalid grid configuration: {0}")]
    InvalidGridConfig(String),
    #[error("Failed to load image: {0}")]
    ImageLoad(String),
    #[error("Tile index {index} is out of range (tile count is {count})")]
    InvalidTileIndex { index: usize, count: usize },
    #[error("Unknown collision group '{0}'")]
    UnknownGroup(String),
    #[error("Collision group '{0}' already exists")]
    DuplicateGroup(String),
    #[error("Collision group '{name}' is still assigned to {tiles} tile(s)")]
    GroupInUse { name: String, tiles: usize },
    #[error("Invalid property: {0}")]
    InvalidProperty(String),
}

impl From<image::ImageError> for TileSetError {
    fn from(err: image::ImageError) -> Self {
        TileSetError::ImageLoad(err.to_string())
    }
}
