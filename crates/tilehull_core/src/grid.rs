//! Tile grid configuration and image partitioning
//!
//! Tiles are numbered row-major: left to right within a row, rows top to
//! bottom. Every per-tile array produced downstream (hulls, colors, group
//! assignments) is indexed the same way.

use image::{GenericImageView, RgbaImage, SubImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TileSetError;

/// Number of floats per vertex in the tile vertex buffer: `[x, y, u, v]`
pub const TILE_VERTEX_STRIDE: usize = 4;

/// Vertices emitted per tile (two counter-clockwise triangles)
pub const VERTICES_PER_TILE: usize = 6;

/// Tile dimensions plus the border and gutter skipped while slicing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileGridConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    /// Pixels skipped around the whole image
    #[serde(default)]
    pub margin: u32,
    /// Pixels skipped between adjacent tiles
    #[serde(default)]
    pub spacing: u32,
}

impl Default for TileGridConfig {
    fn default() -> Self {
        Self {
            tile_width: 32,
            tile_height: 32,
            margin: 0,
            spacing: 0,
        }
    }
}

impl TileGridConfig {
    /// Create a configuration from signed editor values
    ///
    /// Fails with `InvalidGridConfig` if a tile dimension is not positive or
    /// if margin or spacing is negative.
    pub fn new(
        tile_width: i32,
        tile_height: i32,
        margin: i32,
        spacing: i32,
    ) -> Result<Self, TileSetError> {
        if tile_width <= 0 {
            return Err(TileSetError::InvalidGridConfig(
                "Tile width must be positive".to_string(),
            ));
        }
        if tile_height <= 0 {
            return Err(TileSetError::InvalidGridConfig(
                "Tile height must be positive".to_string(),
            ));
        }
        if margin < 0 {
            return Err(TileSetError::InvalidGridConfig(
                "Tile margin must not be negative".to_string(),
            ));
        }
        if spacing < 0 {
            return Err(TileSetError::InvalidGridConfig(
                "Tile spacing must not be negative".to_string(),
            ));
        }
        Ok(Self {
            tile_width: tile_width as u32,
            tile_height: tile_height as u32,
            margin: margin as u32,
            spacing: spacing as u32,
        })
    }

    /// Check the invariants that do not depend on an image
    pub fn validate(&self) -> Result<(), TileSetError> {
        if self.tile_width == 0 {
            return Err(TileSetError::InvalidGridConfig(
                "Tile width must be positive".to_string(),
            ));
        }
        if self.tile_height == 0 {
            return Err(TileSetError::InvalidGridConfig(
                "Tile height must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of tile columns that fit in an image of the given width
    pub fn columns(&self, image_width: u32) -> u32 {
        tiles_along_axis(image_width, self.tile_width, self.margin, self.spacing)
    }

    /// Number of tile rows that fit in an image of the given height
    pub fn rows(&self, image_height: u32) -> u32 {
        tiles_along_axis(image_height, self.tile_height, self.margin, self.spacing)
    }
}

/// Tiles that fit along one image axis
///
/// `floor((image - 2 * margin + spacing) / (tile + spacing))`, clamped to zero.
pub fn tiles_along_axis(image_dim: u32, tile_dim: u32, margin: u32, spacing: u32) -> u32 {
    let step = tile_dim as i64 + spacing as i64;
    if step <= 0 {
        return 0;
    }
    let span = image_dim as i64 - 2 * margin as i64 + spacing as i64;
    span.div_euclid(step).max(0) as u32
}

/// Cache key for a partition: the grid only depends on image size and config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    pub image_width: u32,
    pub image_height: u32,
    pub config: TileGridConfig,
}

/// Placement of one tile inside the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub index: usize,
    pub column: u32,
    pub row: u32,
    /// Left edge in source pixels
    pub x: u32,
    /// Top edge in source pixels
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A source image sliced into a row-major grid of tiles
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGrid {
    key: GridKey,
    columns: u32,
    rows: u32,
    tiles: Vec<TileRect>,
}

impl ImageGrid {
    /// Slice an image into tiles
    pub fn partition(image: &RgbaImage, config: &TileGridConfig) -> Result<Self, TileSetError> {
        Self::partition_dimensions(image.width(), image.height(), config)
    }

    /// Slice an image of the given size into tiles
    ///
    /// Fails with `InvalidGridConfig` if the config is invalid or if no tile
    /// fits in a non-empty image. An empty image yields an empty grid.
    pub fn partition_dimensions(
        image_width: u32,
        image_height: u32,
        config: &TileGridConfig,
    ) -> Result<Self, TileSetError> {
        config.validate()?;

        let columns = config.columns(image_width);
        let rows = config.rows(image_height);
        let image_is_empty = image_width == 0 || image_height == 0;
        if !image_is_empty && (columns == 0 || rows == 0) {
            return Err(TileSetError::InvalidGridConfig(format!(
                "No {}x{} tiles fit in a {}x{} image with margin {} and spacing {}",
                config.tile_width,
                config.tile_height,
                image_width,
                image_height,
                config.margin,
                config.spacing
            )));
        }

        // Every placed tile ends inside the image, so offsets fit in u32 even
        // when the spacing step itself does not.
        let offset = |index: u32, tile_dim: u32| {
            let step = tile_dim as u64 + config.spacing as u64;
            (config.margin as u64 + index as u64 * step) as u32
        };

        let mut tiles = Vec::with_capacity((columns * rows) as usize);
        for row in 0..rows {
            for column in 0..columns {
                tiles.push(TileRect {
                    index: tiles.len(),
                    column,
                    row,
                    x: offset(column, config.tile_width),
                    y: offset(row, config.tile_height),
                    width: config.tile_width,
                    height: config.tile_height,
                });
            }
        }

        debug!(
            "Partitioned {}x{} image into {}x{} tiles",
            image_width, image_height, columns, rows
        );

        Ok(Self {
            key: GridKey {
                image_width,
                image_height,
                config: *config,
            },
            columns,
            rows,
            tiles,
        })
    }

    pub fn key(&self) -> GridKey {
        self.key
    }

    pub fn config(&self) -> &TileGridConfig {
        &self.key.config
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[TileRect] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&TileRect> {
        self.tiles.get(index)
    }

    /// Read-only view of a tile's pixels
    ///
    /// Returns `None` if the index is out of range or the image does not
    /// match the size this grid was partitioned for.
    pub fn tile_view<'a>(
        &self,
        image: &'a RgbaImage,
        index: usize,
    ) -> Option<SubImage<&'a RgbaImage>> {
        if image.dimensions() != (self.key.image_width, self.key.image_height) {
            return None;
        }
        let rect = self.tiles.get(index)?;
        Some(image.view(rect.x, rect.y, rect.width, rect.height))
    }

    /// Build the packed atlas vertex buffer
    ///
    /// Tiles are laid out in a `columns x rows` atlas without margin or
    /// spacing, y pointing up. Each tile is two counter-clockwise triangles
    /// of `[x, y, u, v]` vertices whose UVs address the source image (v = 0
    /// at the top row).
    pub fn vertex_buffer(&self) -> Vec<f32> {
        let mut buffer =
            Vec::with_capacity(self.tiles.len() * VERTICES_PER_TILE * TILE_VERTEX_STRIDE);
        if self.tiles.is_empty() {
            return buffer;
        }

        let image_width = self.key.image_width as f32;
        let image_height = self.key.image_height as f32;

        for rect in &self.tiles {
            let x0 = (rect.column * rect.width) as f32;
            let y0 = ((self.rows - 1 - rect.row) * rect.height) as f32;
            let x1 = x0 + rect.width as f32;
            let y1 = y0 + rect.height as f32;

            let u0 = rect.x as f32 / image_width;
            let u1 = (rect.x + rect.width) as f32 / image_width;
            let v_top = rect.y as f32 / image_height;
            let v_bottom = (rect.y + rect.height) as f32 / image_height;

            let bottom_left = [x0, y0, u0, v_bottom];
            let bottom_right = [x1, y0, u1, v_bottom];
            let top_right = [x1, y1, u1, v_top];
            let top_left = [x0, y1, u0, v_top];

            for vertex in [
                bottom_left,
                bottom_right,
                top_right,
                bottom_left,
                top_right,
                top_left,
            ] {
                buffer.extend_from_slice(&vertex);
            }
        }

        buffer
    }
}
