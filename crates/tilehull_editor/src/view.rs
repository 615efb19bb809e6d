//! Presentation-layer contract
//!
//! The model never renders anything itself. After every mutation it pushes
//! the affected data to a `TileSetView`, which a UI implements however its
//! platform requires.

use image::RgbaImage;
use std::collections::BTreeSet;
use std::sync::Arc;
use tilehull_core::{Color, ImageTag};

/// Everything needed to draw tiles and hulls without re-deriving them
///
/// `hull_indices` and `hull_counts` are parallel to the tile list: tile `i`
/// owns the vertices `hull_indices[i] .. hull_indices[i] + hull_counts[i]`
/// of `hull_vertices`, counted in vertices (two floats each). A tile without
/// a hull has a count of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRenderData {
    /// The source image the tile UVs address
    pub image: Arc<RgbaImage>,
    /// Packed atlas quads, see `ImageGrid::vertex_buffer`
    pub tile_vertices: Vec<f32>,
    /// Shared pool of scaled hull vertices as `[x, y]` pairs
    pub hull_vertices: Vec<f32>,
    pub hull_indices: Vec<u32>,
    pub hull_counts: Vec<u32>,
    /// One color per tile hull
    pub hull_colors: Vec<Color>,
    /// The scale already applied to `hull_vertices`
    pub hull_scale: f32,
}

impl TileRenderData {
    pub fn tile_count(&self) -> usize {
        self.hull_counts.len()
    }

    /// Hull vertices of one tile
    ///
    /// Empty if the tile has no hull or its range lies outside the pool.
    pub fn hull_of(&self, tile_index: usize) -> Vec<[f32; 2]> {
        let (Some(&start), Some(&count)) = (
            self.hull_indices.get(tile_index),
            self.hull_counts.get(tile_index),
        ) else {
            return Vec::new();
        };
        let start = start as usize * 2;
        let end = start + count as usize * 2;
        let Some(pool) = self.hull_vertices.get(start..end) else {
            return Vec::new();
        };
        pool.chunks_exact(2)
            .map(|v| [v[0], v[1]])
            .collect()
    }
}

/// Receives tile set state from the model
pub trait TileSetView {
    fn set_image_property(&mut self, path: &str);

    fn set_image_tags(&mut self, tags: &BTreeSet<ImageTag>);

    fn set_tile_width_property(&mut self, tile_width: u32);

    fn set_tile_height_property(&mut self, tile_height: u32);

    fn set_tile_margin_property(&mut self, tile_margin: u32);

    fn set_tile_spacing_property(&mut self, tile_spacing: u32);

    fn set_collision_property(&mut self, path: &str);

    fn set_material_tag_property(&mut self, material_tag: &str);

    /// Names and colors are parallel, in registry order
    fn set_collision_groups(&mut self, names: &[String], colors: &[Color]);

    /// Replace all cached tile and hull data
    fn set_tiles(&mut self, data: &TileRenderData);

    /// Drop all cached tile and hull data
    fn clear_tiles(&mut self);

    /// Recolor a single hull without a full `set_tiles`
    fn set_tile_hull_color(&mut self, tile_index: usize, color: Color);
}

/// A view that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl TileSetView for NullView {
    fn set_image_property(&mut self, _path: &str) {}

    fn set_image_tags(&mut self, _tags: &BTreeSet<ImageTag>) {}

    fn set_tile_width_property(&mut self, _tile_width: u32) {}

    fn set_tile_height_property(&mut self, _tile_height: u32) {}

    fn set_tile_margin_property(&mut self, _tile_margin: u32) {}

    fn set_tile_spacing_property(&mut self, _tile_spacing: u32) {}

    fn set_collision_property(&mut self, _path: &str) {}

    fn set_material_tag_property(&mut self, _material_tag: &str) {}

    fn set_collision_groups(&mut self, _names: &[String], _colors: &[Color]) {}

    fn set_tiles(&mut self, _data: &TileRenderData) {}

    fn clear_tiles(&mut self) {}

    fn set_tile_hull_color(&mut self, _tile_index: usize, _color: Color) {}
}
