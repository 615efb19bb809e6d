//! Tile set model for tilehull
//!
//! `TileSetModel` slices a tile sheet, extracts a collision hull per tile and
//! tracks which collision group each tile belongs to. Every mutation is
//! synchronous: when a setter returns, the model and its `TileSetView` agree.
//!
//! # Example
//!
//! ```rust,ignore
//! use tilehull_editor::{FsImageLoader, NullView, RemovePolicy, TileSetModel};
//! use tilehull_core::Color;
//!
//! let mut model = TileSetModel::new(NullView, FsImageLoader::new("assets"));
//! model.set_image("tiles/ground.png")?;
//! model.set_grid_config(16, 16, 0, 0)?;
//!
//! model.add_group("hazard", Color::RED)?;
//! model.set_tile_group(3, Some("hazard"))?;
//! model.remove_group("hazard", RemovePolicy::Cascade)?;
//! ```

mod loader;
mod model;
mod properties;
mod settings;
mod view;

#[cfg(test)]
mod testing;

pub use loader::{decode_image, FsImageLoader, ImageLoader, LoadedImage, MemoryImageLoader};
pub use model::{RemovePolicy, Tile, TileSetModel};
pub use properties::TileSetProperties;
pub use settings::{HullSettings, SettingsError};
pub use view::{NullView, TileRenderData, TileSetView};

pub use tilehull_core;
