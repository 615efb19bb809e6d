//! Test helpers for `tilehull_editor`.
//!
//! This module provides a recording view, image factories and model builders
//! for use in `#[cfg(test)]` modules within this crate.
#![allow(dead_code)]
//!
//! # Usage
//!
//! ```rust,ignore
//! #[cfg(test)]
//! mod tests {
//!     use crate::testing::*;
//!     // ...
//! }
//! ```

use image::{Rgba, RgbaImage};
use std::collections::BTreeSet;
use tilehull_core::{Color, ImageTag};

use crate::loader::MemoryImageLoader;
use crate::model::TileSetModel;
use crate::view::{TileRenderData, TileSetView};

// ============================================================================
// Recording view
// ============================================================================

/// One notification received by a `RecordingView`
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    ImageProperty(String),
    ImageTags(BTreeSet<ImageTag>),
    TileWidth(u32),
    TileHeight(u32),
    TileMargin(u32),
    TileSpacing(u32),
    CollisionProperty(String),
    MaterialTag(String),
    CollisionGroups(Vec<String>, Vec<Color>),
    Tiles(TileRenderData),
    ClearTiles,
    TileHullColor(usize, Color),
}

/// A view that records every call it receives, in order
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of full `set_tiles` pushes
    pub fn tile_pushes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ViewEvent::Tiles(_)))
            .count()
    }

    /// Every `(tile, color)` pushed through `set_tile_hull_color`
    pub fn hull_color_updates(&self) -> Vec<(usize, Color)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::TileHullColor(index, color) => Some((*index, *color)),
                _ => None,
            })
            .collect()
    }

    /// The most recent `set_tiles` payload
    pub fn last_tiles(&self) -> Option<&TileRenderData> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::Tiles(data) => Some(data),
            _ => None,
        })
    }

    pub fn last_event(&self) -> Option<&ViewEvent> {
        self.events.last()
    }
}

impl TileSetView for RecordingView {
    fn set_image_property(&mut self, path: &str) {
        self.events.push(ViewEvent::ImageProperty(path.to_string()));
    }

    fn set_image_tags(&mut self, tags: &BTreeSet<ImageTag>) {
        self.events.push(ViewEvent::ImageTags(tags.clone()));
    }

    fn set_tile_width_property(&mut self, tile_width: u32) {
        self.events.push(ViewEvent::TileWidth(tile_width));
    }

    fn set_tile_height_property(&mut self, tile_height: u32) {
        self.events.push(ViewEvent::TileHeight(tile_height));
    }

    fn set_tile_margin_property(&mut self, tile_margin: u32) {
        self.events.push(ViewEvent::TileMargin(tile_margin));
    }

    fn set_tile_spacing_property(&mut self, tile_spacing: u32) {
        self.events.push(ViewEvent::TileSpacing(tile_spacing));
    }

    fn set_collision_property(&mut self, path: &str) {
        self.events
            .push(ViewEvent::CollisionProperty(path.to_string()));
    }

    fn set_material_tag_property(&mut self, material_tag: &str) {
        self.events
            .push(ViewEvent::MaterialTag(material_tag.to_string()));
    }

    fn set_collision_groups(&mut self, names: &[String], colors: &[Color]) {
        self.events
            .push(ViewEvent::CollisionGroups(names.to_vec(), colors.to_vec()));
    }

    fn set_tiles(&mut self, data: &TileRenderData) {
        self.events.push(ViewEvent::Tiles(data.clone()));
    }

    fn clear_tiles(&mut self) {
        self.events.push(ViewEvent::ClearTiles);
    }

    fn set_tile_hull_color(&mut self, tile_index: usize, color: Color) {
        self.events.push(ViewEvent::TileHullColor(tile_index, color));
    }
}

// ============================================================================
// Image factories
// ============================================================================

pub const SOLID: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Image whose pixels are solid wherever `solid(x, y)` holds
pub fn sheet(width: u32, height: u32, solid: impl Fn(u32, u32) -> bool) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| if solid(x, y) { SOLID } else { CLEAR })
}

pub fn opaque_sheet(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, SOLID)
}

/// 64x64 sheet of four 32x32 tiles: opaque, transparent, left half, one pixel
pub fn quad_sheet() -> RgbaImage {
    sheet(64, 64, |x, y| match (x / 32, y / 32) {
        (0, 0) => true,
        (1, 0) => false,
        (0, 1) => x < 16,
        _ => x == 40 && y == 40,
    })
}

// ============================================================================
// Model builders
// ============================================================================

/// Loader serving `quad.png`, `opaque.png` and `clear.png`
pub fn test_loader() -> MemoryImageLoader {
    MemoryImageLoader::new()
        .with_image("quad.png", quad_sheet())
        .with_image("opaque.png", opaque_sheet(64, 64))
        .with_image("clear.png", sheet(64, 64, |_, _| false))
}

/// A model showing `quad.png` sliced into 32x32 tiles, view events cleared
pub fn quad_model() -> TileSetModel<RecordingView> {
    let mut model = TileSetModel::new(RecordingView::default(), test_loader());
    model
        .set_grid_config(32, 32, 0, 0)
        .expect("32x32 grid is valid without an image");
    model
        .set_image("quad.png")
        .expect("quad.png is served by the test loader");
    model.view_mut().clear();
    model
}
