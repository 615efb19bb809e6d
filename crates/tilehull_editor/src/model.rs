//! The tile set model
//!
//! `TileSetModel` owns the source image, the grid, per-tile hulls, the
//! collision group registry and per-tile group assignments. It is the only
//! place any of them change. Each setter validates everything before
//! touching state, re-derives only what depends on the changed input, and
//! pushes the result to the view before returning.
//!
//! | Change                       | Grid | Hulls | Colors |
//! |------------------------------|------|-------|--------|
//! | image                        | yes* | yes   | yes    |
//! | grid config                  | yes  | yes   | yes    |
//! | collision source, threshold  |      | yes   |        |
//! | tile group, groups, color    |      |       | yes    |
//!
//! \* reused when the new image has the same size as the old one.

use image::{RgbaImage, SubImage};
use std::collections::BTreeSet;
use std::sync::Arc;
use tilehull_core::{
    AlphaMask, CollisionGroupRegistry, Color, GridKey, Hull, ImageGrid, ImageTag, TileGridConfig,
    TileRect, TileSetError,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::loader::{ImageLoader, LoadedImage};
use crate::properties::TileSetProperties;
use crate::settings::HullSettings;
use crate::view::{TileRenderData, TileSetView};

/// What to do with tiles still assigned to a group being removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovePolicy {
    /// Fail with `GroupInUse` if any tile uses the group
    #[default]
    Refuse,
    /// Unassign every tile using the group
    Cascade,
}

/// One tile of the grid, borrowed from the model
pub struct Tile<'a> {
    pub index: usize,
    pub rect: TileRect,
    /// The tile's pixels in the display image
    pub pixels: SubImage<&'a RgbaImage>,
    pub hull: Option<&'a Hull>,
    pub group: Option<&'a str>,
    pub hull_color: Color,
}

/// Tile set aggregate and single mutation boundary
pub struct TileSetModel<V: TileSetView> {
    id: Uuid,
    view: V,
    loader: Box<dyn ImageLoader>,
    settings: HullSettings,
    image_path: String,
    image: Option<Arc<RgbaImage>>,
    image_tags: BTreeSet<ImageTag>,
    collision_path: String,
    collision: Option<Arc<RgbaImage>>,
    material_tag: String,
    config: TileGridConfig,
    grid: Option<ImageGrid>,
    hulls: Vec<Option<Hull>>,
    groups: CollisionGroupRegistry,
    tile_groups: Vec<Option<String>>,
    hull_colors: Vec<Color>,
    render_data: Option<TileRenderData>,
}

impl<V: TileSetView> TileSetModel<V> {
    /// Create an empty tile set with default settings
    pub fn new(view: V, loader: impl ImageLoader + 'static) -> Self {
        Self::with_settings(view, loader, HullSettings::default())
    }

    /// Create an empty tile set
    pub fn with_settings(
        view: V,
        loader: impl ImageLoader + 'static,
        settings: HullSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            view,
            loader: Box::new(loader),
            material_tag: settings.material_tag.clone(),
            settings,
            image_path: String::new(),
            image: None,
            image_tags: BTreeSet::new(),
            collision_path: String::new(),
            collision: None,
            config: TileGridConfig::default(),
            grid: None,
            hulls: Vec::new(),
            groups: CollisionGroupRegistry::new(),
            tile_groups: Vec::new(),
            hull_colors: Vec::new(),
            render_data: None,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn settings(&self) -> &HullSettings {
        &self.settings
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_deref()
    }

    pub fn image_tags(&self) -> &BTreeSet<ImageTag> {
        &self.image_tags
    }

    pub fn collision_path(&self) -> &str {
        &self.collision_path
    }

    pub fn collision_image(&self) -> Option<&RgbaImage> {
        self.collision.as_deref()
    }

    pub fn material_tag(&self) -> &str {
        &self.material_tag
    }

    pub fn grid_config(&self) -> &TileGridConfig {
        &self.config
    }

    pub fn grid(&self) -> Option<&ImageGrid> {
        self.grid.as_ref()
    }

    pub fn tile_count(&self) -> usize {
        self.grid.as_ref().map_or(0, |g| g.tile_count())
    }

    pub fn columns(&self) -> u32 {
        self.grid.as_ref().map_or(0, |g| g.columns())
    }

    pub fn rows(&self) -> u32 {
        self.grid.as_ref().map_or(0, |g| g.rows())
    }

    pub fn groups(&self) -> &CollisionGroupRegistry {
        &self.groups
    }

    /// Borrow a tile with its pixels, hull and group
    pub fn tile(&self, index: usize) -> Option<Tile<'_>> {
        let image = self.image.as_deref()?;
        let grid = self.grid.as_ref()?;
        Some(Tile {
            index,
            rect: *grid.tile(index)?,
            pixels: grid.tile_view(image, index)?,
            hull: self.hull(index),
            group: self.tile_group(index),
            hull_color: self.tile_color(index)?,
        })
    }

    pub fn hull(&self, index: usize) -> Option<&Hull> {
        self.hulls.get(index).and_then(|h| h.as_ref())
    }

    pub fn tile_group(&self, index: usize) -> Option<&str> {
        self.tile_groups.get(index).and_then(|g| g.as_deref())
    }

    /// Hull display color of a tile, `None` if the index is out of range
    pub fn tile_color(&self, index: usize) -> Option<Color> {
        self.hull_colors.get(index).copied()
    }

    pub fn hull_colors(&self) -> &[Color] {
        &self.hull_colors
    }

    /// The data most recently pushed with `set_tiles`
    pub fn render_data(&self) -> Option<&TileRenderData> {
        self.render_data.as_ref()
    }

    /// Tiles currently assigned to a group
    pub fn tiles_in_group(&self, name: &str) -> Vec<usize> {
        self.tile_groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.as_deref() == Some(name))
            .map(|(i, _)| i)
            .collect()
    }

    // ------------------------------------------------------------------
    // Image and collision source
    // ------------------------------------------------------------------

    /// Set the image property, loading it through the image loader
    ///
    /// An empty path clears the image and all tiles.
    pub fn set_image(&mut self, path: &str) -> Result<(), TileSetError> {
        if path.is_empty() {
            self.image_path.clear();
            self.replace_image(None);
            return Ok(());
        }

        let loaded = self
            .loader
            .load(path)
            .inspect_err(|e| warn!("Rejected image '{}': {}", path, e))?;
        info!(
            "Loaded tile set image '{}' ({}x{})",
            path,
            loaded.pixels.width(),
            loaded.pixels.height()
        );
        self.image_path = path.to_string();
        self.replace_image(Some(loaded));
        Ok(())
    }

    /// Replace the source image with already decoded pixels
    ///
    /// The image property path is left as is.
    pub fn set_image_source(&mut self, pixels: RgbaImage) {
        self.replace_image(Some(LoadedImage::from_rgba(pixels)));
    }

    /// Set the collision image property
    ///
    /// While set, hulls follow the collision image's alpha instead of the
    /// display image's. An empty path goes back to the display image.
    pub fn set_collision(&mut self, path: &str) -> Result<(), TileSetError> {
        if path.is_empty() {
            self.collision_path.clear();
            self.replace_collision(None);
            return Ok(());
        }

        let loaded = self
            .loader
            .load(path)
            .inspect_err(|e| warn!("Rejected collision image '{}': {}", path, e))?;
        self.collision_path = path.to_string();
        self.replace_collision(Some(loaded.pixels));
        Ok(())
    }

    /// Replace or remove the collision mask image directly
    ///
    /// The collision property path is kept for new pixels and cleared
    /// together with the mask.
    pub fn set_collision_image(&mut self, pixels: Option<RgbaImage>) {
        if pixels.is_none() {
            self.collision_path.clear();
        }
        self.replace_collision(pixels);
    }

    fn replace_image(&mut self, loaded: Option<LoadedImage>) {
        match loaded {
            Some(loaded) => {
                self.image = Some(Arc::new(loaded.pixels));
                self.image_tags = loaded.tags;
            }
            None => {
                self.image = None;
                self.image_tags.clear();
            }
        }
        self.view.set_image_property(&self.image_path);
        self.view.set_image_tags(&self.image_tags);
        self.warn_on_collision_size_mismatch();

        self.repartition();
        self.recompute_hulls();
    }

    fn replace_collision(&mut self, pixels: Option<RgbaImage>) {
        self.collision = pixels.map(Arc::new);
        self.view.set_collision_property(&self.collision_path);
        self.warn_on_collision_size_mismatch();
        self.recompute_hulls();
    }

    fn warn_on_collision_size_mismatch(&self) {
        if let (Some(image), Some(collision)) = (&self.image, &self.collision) {
            if image.dimensions() != collision.dimensions() {
                warn!(
                    "Collision image is {}x{} but the tile image is {}x{}; missing pixels count as empty",
                    collision.width(),
                    collision.height(),
                    image.width(),
                    image.height()
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Grid configuration
    // ------------------------------------------------------------------

    /// Set all grid fields at once
    ///
    /// Fails with `InvalidGridConfig` if the values are out of range or no
    /// tile fits in the current image; the model is unchanged on failure.
    pub fn set_grid_config(
        &mut self,
        tile_width: i32,
        tile_height: i32,
        margin: i32,
        spacing: i32,
    ) -> Result<(), TileSetError> {
        let config = TileGridConfig::new(tile_width, tile_height, margin, spacing)
            .inspect_err(|e| warn!("Rejected grid config: {}", e))?;
        let grid = match self.image.as_deref() {
            Some(image) => Some(
                ImageGrid::partition(image, &config)
                    .inspect_err(|e| warn!("Rejected grid config: {}", e))?,
            ),
            None => None,
        };

        self.config = config;
        self.view.set_tile_width_property(config.tile_width);
        self.view.set_tile_height_property(config.tile_height);
        self.view.set_tile_margin_property(config.margin);
        self.view.set_tile_spacing_property(config.spacing);

        self.grid = grid;
        self.fit_assignments_to_grid();
        self.recompute_hulls();
        Ok(())
    }

    pub fn set_tile_width(&mut self, tile_width: i32) -> Result<(), TileSetError> {
        let c = self.config;
        self.set_grid_config(tile_width, c.tile_height as i32, c.margin as i32, c.spacing as i32)
    }

    pub fn set_tile_height(&mut self, tile_height: i32) -> Result<(), TileSetError> {
        let c = self.config;
        self.set_grid_config(c.tile_width as i32, tile_height, c.margin as i32, c.spacing as i32)
    }

    pub fn set_tile_margin(&mut self, margin: i32) -> Result<(), TileSetError> {
        let c = self.config;
        self.set_grid_config(c.tile_width as i32, c.tile_height as i32, margin, c.spacing as i32)
    }

    pub fn set_tile_spacing(&mut self, spacing: i32) -> Result<(), TileSetError> {
        let c = self.config;
        self.set_grid_config(c.tile_width as i32, c.tile_height as i32, c.margin as i32, spacing)
    }

    /// Re-slice after an image change, reusing the grid if the size matches
    fn repartition(&mut self) {
        let Some(image) = self.image.as_deref() else {
            self.grid = None;
            self.fit_assignments_to_grid();
            return;
        };

        let key = GridKey {
            image_width: image.width(),
            image_height: image.height(),
            config: self.config,
        };
        if self.grid.as_ref().is_some_and(|g| g.key() == key) {
            debug!("Image size unchanged, reusing tile grid");
            return;
        }

        self.grid = match ImageGrid::partition(image, &self.config) {
            Ok(grid) => Some(grid),
            Err(e) => {
                warn!("Tile set has no valid tiles: {}", e);
                None
            }
        };
        self.fit_assignments_to_grid();
    }

    fn fit_assignments_to_grid(&mut self) {
        let count = self.tile_count();
        if self.tile_groups.len() > count {
            let dropped = self.tile_groups[count..].iter().flatten().count();
            if dropped > 0 {
                debug!("Dropped {} group assignments of removed tiles", dropped);
            }
        }
        self.tile_groups.resize(count, None);
    }

    // ------------------------------------------------------------------
    // Hull settings
    // ------------------------------------------------------------------

    /// Change the alpha threshold; hulls are re-extracted, the grid is kept
    pub fn set_alpha_threshold(&mut self, alpha_threshold: u8) {
        if self.settings.alpha_threshold == alpha_threshold {
            return;
        }
        self.settings.alpha_threshold = alpha_threshold;
        self.recompute_hulls();
    }

    /// Change the hull scale; hulls are re-extracted, the grid is kept
    pub fn set_hull_scale(&mut self, scale: f32) -> Result<(), TileSetError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(TileSetError::InvalidProperty(format!(
                "Hull scale must be a positive number, got {scale}"
            )));
        }
        self.settings.hull_scale = scale;
        self.recompute_hulls();
        Ok(())
    }

    pub fn set_material_tag(&mut self, material_tag: &str) -> Result<(), TileSetError> {
        if material_tag.trim().is_empty() {
            return Err(TileSetError::InvalidProperty(
                "Material tag must not be empty".to_string(),
            ));
        }
        self.material_tag = material_tag.to_string();
        self.view.set_material_tag_property(&self.material_tag);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Collision groups
    // ------------------------------------------------------------------

    /// Assign a tile to a group, or clear its group with `None`
    ///
    /// Only that tile's hull color changes.
    pub fn set_tile_group(
        &mut self,
        index: usize,
        group: Option<&str>,
    ) -> Result<(), TileSetError> {
        let count = self.tile_count();
        if index >= count {
            return Err(TileSetError::InvalidTileIndex { index, count });
        }
        if let Some(name) = group {
            if !self.groups.contains(name) {
                return Err(TileSetError::UnknownGroup(name.to_string()));
            }
        }

        self.tile_groups[index] = group.map(str::to_string);
        self.recolor_tiles([index]);
        Ok(())
    }

    /// Replace the whole registry from parallel name and color lists
    ///
    /// Tiles assigned to a name that no longer exists are unassigned.
    pub fn set_groups(&mut self, names: &[String], colors: &[Color]) -> Result<(), TileSetError> {
        let registry = CollisionGroupRegistry::from_lists(names, colors)
            .inspect_err(|e| warn!("Rejected collision groups: {}", e))?;
        self.groups = registry;

        let mut affected = Vec::new();
        for (index, group) in self.tile_groups.iter_mut().enumerate() {
            if group.as_deref().is_some_and(|name| !self.groups.contains(name)) {
                *group = None;
            }
            affected.push(index);
        }

        self.push_groups();
        self.recolor_changed(affected);
        Ok(())
    }

    pub fn add_group(&mut self, name: &str, color: Color) -> Result<(), TileSetError> {
        self.groups.add(name, color)?;
        self.push_groups();
        Ok(())
    }

    /// Rename a group, carrying its tile assignments along
    pub fn rename_group(&mut self, old: &str, new: &str) -> Result<(), TileSetError> {
        self.groups.rename(old, new)?;

        let affected = self.tiles_in_group(old);
        for &index in &affected {
            self.tile_groups[index] = Some(new.to_string());
        }

        self.push_groups();
        self.recolor_tiles(affected);
        Ok(())
    }

    /// Remove a group
    ///
    /// With `RemovePolicy::Refuse` this fails with `GroupInUse` while any
    /// tile is assigned to the group. With `RemovePolicy::Cascade` those
    /// tiles are unassigned and their hulls revert to the unassigned color.
    pub fn remove_group(&mut self, name: &str, policy: RemovePolicy) -> Result<(), TileSetError> {
        if !self.groups.contains(name) {
            return Err(TileSetError::UnknownGroup(name.to_string()));
        }
        let affected = self.tiles_in_group(name);
        if policy == RemovePolicy::Refuse && !affected.is_empty() {
            return Err(TileSetError::GroupInUse {
                name: name.to_string(),
                tiles: affected.len(),
            });
        }

        self.groups.remove(name)?;
        for &index in &affected {
            self.tile_groups[index] = None;
        }

        self.push_groups();
        self.recolor_tiles(affected);
        Ok(())
    }

    /// Change a group's color and recolor every hull assigned to it
    pub fn set_group_color(&mut self, name: &str, color: Color) -> Result<(), TileSetError> {
        self.groups.set_color(name, color)?;
        let affected = self.tiles_in_group(name);
        self.push_groups();
        self.recolor_tiles(affected);
        Ok(())
    }

    fn push_groups(&mut self) {
        self.view
            .set_collision_groups(&self.groups.names(), &self.groups.colors());
    }

    fn color_for(&self, index: usize) -> Color {
        self.tile_group(index)
            .and_then(|name| self.groups.color_of(name))
            .unwrap_or(self.settings.unassigned_color)
    }

    /// Update and push the hull color of each listed tile
    fn recolor_tiles(&mut self, indices: impl IntoIterator<Item = usize>) {
        for index in indices {
            let color = self.color_for(index);
            self.store_hull_color(index, color);
        }
    }

    /// Like `recolor_tiles`, but only pushes colors that actually changed
    fn recolor_changed(&mut self, indices: impl IntoIterator<Item = usize>) {
        for index in indices {
            let color = self.color_for(index);
            if self.hull_colors.get(index) != Some(&color) {
                self.store_hull_color(index, color);
            }
        }
    }

    fn store_hull_color(&mut self, index: usize, color: Color) {
        let Some(slot) = self.hull_colors.get_mut(index) else {
            return;
        };
        *slot = color;
        if let Some(data) = self.render_data.as_mut() {
            if let Some(slot) = data.hull_colors.get_mut(index) {
                *slot = color;
            }
        }
        self.view.set_tile_hull_color(index, color);
    }

    // ------------------------------------------------------------------
    // Recompute
    // ------------------------------------------------------------------

    /// Re-extract every hull from the current grid, then push all tile data
    fn recompute_hulls(&mut self) {
        let extractor = self.settings.extractor();
        self.hulls = match (self.image.as_deref(), self.grid.as_ref()) {
            (Some(image), Some(grid)) => grid
                .tiles()
                .iter()
                .map(|rect| {
                    // The collision image replaces the display image's alpha
                    let source = self.collision.as_deref().unwrap_or(image);
                    let mask = AlphaMask::from_region(
                        source,
                        rect.x,
                        rect.y,
                        rect.width,
                        rect.height,
                        extractor.alpha_threshold,
                    );
                    extractor.extract_mask(&mask)
                })
                .collect(),
            _ => Vec::new(),
        };

        self.hull_colors = (0..self.hulls.len()).map(|i| self.color_for(i)).collect();
        debug!(
            "Extracted {} hulls for {} tiles",
            self.hulls.iter().flatten().count(),
            self.hulls.len()
        );
        self.push_tiles();
    }

    fn push_tiles(&mut self) {
        self.render_data = self.build_render_data();
        match &self.render_data {
            Some(data) => self.view.set_tiles(data),
            None => self.view.clear_tiles(),
        }
    }

    fn build_render_data(&self) -> Option<TileRenderData> {
        let image = self.image.as_ref()?;
        let grid = self.grid.as_ref()?;

        let mut hull_vertices = Vec::new();
        let mut hull_indices = Vec::with_capacity(self.hulls.len());
        let mut hull_counts = Vec::with_capacity(self.hulls.len());
        for hull in &self.hulls {
            hull_indices.push((hull_vertices.len() / 2) as u32);
            match hull {
                Some(hull) => {
                    for vertex in hull.vertices() {
                        hull_vertices.extend_from_slice(vertex);
                    }
                    hull_counts.push(hull.len() as u32);
                }
                None => hull_counts.push(0),
            }
        }

        Some(TileRenderData {
            image: Arc::clone(image),
            tile_vertices: grid.vertex_buffer(),
            hull_vertices,
            hull_indices,
            hull_counts,
            hull_colors: self.hull_colors.clone(),
            hull_scale: self.settings.hull_scale,
        })
    }

    /// Push every property and the tile data to the view
    pub fn refresh_view(&mut self) {
        self.view.set_image_property(&self.image_path);
        self.view.set_image_tags(&self.image_tags);
        self.view.set_tile_width_property(self.config.tile_width);
        self.view.set_tile_height_property(self.config.tile_height);
        self.view.set_tile_margin_property(self.config.margin);
        self.view.set_tile_spacing_property(self.config.spacing);
        self.view.set_collision_property(&self.collision_path);
        self.view.set_material_tag_property(&self.material_tag);
        self.push_groups();
        match &self.render_data {
            Some(data) => self.view.set_tiles(data),
            None => self.view.clear_tiles(),
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Snapshot of every persistable property
    pub fn properties(&self) -> TileSetProperties {
        let mut props = TileSetProperties::new(self.id, self.material_tag.as_str());
        props.image = self.image_path.clone();
        props.collision = self.collision_path.clone();
        props.grid = self.config;
        props.collision_groups = self.groups.iter().cloned().collect();
        props.tile_collision_groups = self.tile_groups.clone();
        props
    }

    /// Replace every property at once
    ///
    /// Images are loaded and all values validated before anything changes,
    /// so a failure leaves the model as it was.
    pub fn apply_properties(&mut self, props: &TileSetProperties) -> Result<(), TileSetError> {
        let image = match props.image.as_str() {
            "" => None,
            path => Some(self.loader.load(path)?),
        };
        let collision = match props.collision.as_str() {
            "" => None,
            path => Some(self.loader.load(path)?.pixels),
        };
        if props.material_tag.trim().is_empty() {
            return Err(TileSetError::InvalidProperty(
                "Material tag must not be empty".to_string(),
            ));
        }
        props.grid.validate()?;
        let grid = match &image {
            Some(image) => Some(ImageGrid::partition(&image.pixels, &props.grid)?),
            None => None,
        };

        let mut groups = CollisionGroupRegistry::new();
        for group in &props.collision_groups {
            groups.add(group.name.clone(), group.color)?;
        }

        let count = grid.as_ref().map_or(0, |g| g.tile_count());
        let mut tile_groups = vec![None; count];
        for (index, group) in props.tile_collision_groups.iter().enumerate() {
            let Some(name) = group else {
                continue;
            };
            if index >= count {
                return Err(TileSetError::InvalidTileIndex { index, count });
            }
            if !groups.contains(name) {
                return Err(TileSetError::UnknownGroup(name.clone()));
            }
            tile_groups[index] = Some(name.clone());
        }

        self.id = props.id;
        self.image_path = props.image.clone();
        match image {
            Some(loaded) => {
                self.image = Some(Arc::new(loaded.pixels));
                self.image_tags = loaded.tags;
            }
            None => {
                self.image = None;
                self.image_tags.clear();
            }
        }
        self.collision_path = props.collision.clone();
        self.collision = collision.map(Arc::new);
        self.material_tag = props.material_tag.clone();
        self.config = props.grid;
        self.grid = grid;
        self.groups = groups;
        self.tile_groups = tile_groups;

        info!(
            "Applied tile set properties: {} tiles, {} collision groups",
            count,
            self.groups.len()
        );
        self.warn_on_collision_size_mismatch();
        self.recompute_hulls();
        self.refresh_view();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use image::Rgba;

    fn unassigned() -> Color {
        HullSettings::default().unassigned_color
    }

    /// quad_model with "hazard" assigned to tiles 0 and 3, events cleared
    fn hazard_model() -> TileSetModel<RecordingView> {
        let mut model = quad_model();
        model.add_group("hazard", Color::RED).unwrap();
        model.set_tile_group(0, Some("hazard")).unwrap();
        model.set_tile_group(3, Some("hazard")).unwrap();
        model.view_mut().clear();
        model
    }

    #[test]
    fn test_quad_sheet_slices_into_four_tiles() {
        let model = quad_model();

        assert_eq!(model.tile_count(), 4);
        assert_eq!((model.columns(), model.rows()), (2, 2));
        let rect = model.tile(1).unwrap().rect;
        assert_eq!((rect.x, rect.y, rect.column, rect.row), (32, 0, 1, 0));
        let rect = model.tile(2).unwrap().rect;
        assert_eq!((rect.x, rect.y, rect.column, rect.row), (0, 32, 0, 1));
        assert!(model.tile(4).is_none());
    }

    #[test]
    fn test_hulls_follow_tile_alpha() {
        let model = quad_model();

        let full = model.hull(0).unwrap();
        assert_eq!(
            full.vertices(),
            &[[0.0f32, 0.0], [32.0, 0.0], [32.0, 32.0], [0.0, 32.0]]
        );
        assert_eq!(full.area(), 1024.0);

        assert!(model.hull(1).is_none());
        assert_eq!(model.hull(2).unwrap().area(), 512.0);

        // Pixel (8, 8) from the tile's top-left, y flipped
        assert_eq!(
            model.hull(3).unwrap().vertices(),
            &[[8.0f32, 23.0], [9.0, 23.0], [9.0, 24.0], [8.0, 24.0]]
        );
    }

    #[test]
    fn test_render_data_layout() {
        let model = quad_model();
        let data = model.render_data().unwrap();

        assert_eq!(data.tile_count(), 4);
        assert_eq!(data.hull_counts, vec![4, 0, 4, 4]);
        assert_eq!(data.hull_indices, vec![0, 4, 4, 8]);
        assert_eq!(data.hull_vertices.len(), 12 * 2);
        assert_eq!(
            data.tile_vertices.len(),
            4 * tilehull_core::VERTICES_PER_TILE * tilehull_core::TILE_VERTEX_STRIDE
        );
        assert!(data.hull_of(1).is_empty());
        assert_eq!(data.hull_of(2)[1], [16.0f32, 0.0]);
        assert_eq!(data.hull_colors, vec![unassigned(); 4]);
        assert_eq!(data.hull_scale, 1.0);
    }

    #[test]
    fn test_set_image_notifies_view() {
        let mut model = TileSetModel::new(RecordingView::default(), test_loader());
        model.set_image("quad.png").unwrap();

        let events = &model.view().events;
        assert_eq!(events[0], ViewEvent::ImageProperty("quad.png".to_string()));
        assert!(matches!(events[1], ViewEvent::ImageTags(_)));
        assert!(matches!(model.view().last_event(), Some(ViewEvent::Tiles(_))));
        assert_eq!(model.view().tile_pushes(), 1);
        assert_eq!(model.image_path(), "quad.png");
    }

    #[test]
    fn test_failed_load_leaves_model_unchanged() {
        let mut model = quad_model();
        let before = model.render_data().cloned();

        let result = model.set_image("missing.png");
        assert!(matches!(result, Err(TileSetError::ImageLoad(_))));
        assert_eq!(model.image_path(), "quad.png");
        assert_eq!(model.tile_count(), 4);
        assert_eq!(model.render_data().cloned(), before);
        assert!(model.view().events.is_empty());

        let result = model.set_collision("missing.png");
        assert!(matches!(result, Err(TileSetError::ImageLoad(_))));
        assert_eq!(model.collision_path(), "");
        assert!(model.view().events.is_empty());
    }

    #[test]
    fn test_empty_image_path_clears_tiles() {
        let mut model = hazard_model();
        model.set_image("").unwrap();

        assert!(model.image().is_none());
        assert_eq!(model.tile_count(), 0);
        assert!(model.render_data().is_none());
        assert!(model.tiles_in_group("hazard").is_empty());
        assert_eq!(model.view().last_event(), Some(&ViewEvent::ClearTiles));
        // Groups outlive the image
        assert!(model.groups().contains("hazard"));
    }

    #[test]
    fn test_invalid_grid_config_is_rejected() {
        let mut model = quad_model();
        let before = model.render_data().cloned();

        let result = model.set_grid_config(0, 32, 0, 0);
        assert!(matches!(result, Err(TileSetError::InvalidGridConfig(_))));
        let result = model.set_grid_config(32, 32, -1, 0);
        assert!(matches!(result, Err(TileSetError::InvalidGridConfig(_))));
        // Valid on its own, but nothing fits a 64x64 image
        let result = model.set_grid_config(128, 128, 0, 0);
        assert!(matches!(result, Err(TileSetError::InvalidGridConfig(_))));

        assert_eq!(model.grid_config().tile_width, 32);
        assert_eq!(model.tile_count(), 4);
        assert_eq!(model.render_data().cloned(), before);
        assert!(model.view().events.is_empty());

        // The same model still accepts a valid config afterwards
        model.set_grid_config(16, 16, 0, 0).unwrap();
        assert_eq!(model.tile_count(), 16);
        assert_eq!((model.columns(), model.rows()), (4, 4));
        assert_eq!(model.hull(0).unwrap().area(), 256.0);
        assert!(model.hull(2).is_none());
    }

    #[test]
    fn test_grid_change_repartitions() {
        let mut model = quad_model();
        model.set_grid_config(16, 16, 0, 0).unwrap();

        assert_eq!(model.tile_count(), 16);
        assert_eq!(
            &model.view().events[..4],
            &[
                ViewEvent::TileWidth(16),
                ViewEvent::TileHeight(16),
                ViewEvent::TileMargin(0),
                ViewEvent::TileSpacing(0),
            ]
        );
        assert_eq!(model.view().tile_pushes(), 1);
        assert_eq!(model.render_data().unwrap().tile_count(), 16);
    }

    #[test]
    fn test_single_field_setters() {
        let mut model = quad_model();
        model.set_tile_margin(2).unwrap();
        model.set_tile_spacing(1).unwrap();

        // (64 - 4 + 1) / 33 = 1
        assert_eq!((model.columns(), model.rows()), (1, 1));
        let rect = model.tile(0).unwrap().rect;
        assert_eq!((rect.x, rect.y), (2, 2));

        model.set_tile_width(16).unwrap();
        model.set_tile_height(8).unwrap();
        assert_eq!(model.columns(), 3);
        assert_eq!(model.rows(), 6);
        assert!(model.set_tile_width(-16).is_err());
        assert_eq!(model.grid_config().tile_width, 16);
    }

    #[test]
    fn test_same_config_is_idempotent() {
        let mut model = quad_model();
        let before = model.render_data().cloned();

        model.set_grid_config(32, 32, 0, 0).unwrap();
        assert_eq!(model.render_data().cloned(), before);
    }

    #[test]
    fn test_grid_without_image() {
        let mut model = TileSetModel::new(RecordingView::default(), test_loader());
        model.set_grid_config(16, 16, 1, 1).unwrap();

        assert_eq!(model.grid_config().margin, 1);
        assert!(model.grid().is_none());
        assert_eq!(model.view().last_event(), Some(&ViewEvent::ClearTiles));
    }

    #[test]
    fn test_image_too_small_for_grid() {
        let mut model = quad_model();
        model.set_image_source(opaque_sheet(16, 16));

        assert!(model.grid().is_none());
        assert_eq!(model.tile_count(), 0);
        assert_eq!(model.view().last_event(), Some(&ViewEvent::ClearTiles));
    }

    #[test]
    fn test_same_size_image_keeps_grid_and_assignments() {
        let mut model = hazard_model();
        let grid = model.grid().cloned();

        model.set_image("opaque.png").unwrap();
        assert_eq!(model.grid().cloned(), grid);
        assert_eq!(model.tiles_in_group("hazard"), vec![0, 3]);
        assert_eq!(model.hull(1).unwrap().area(), 1024.0);
        assert_eq!(model.tile_color(3), Some(Color::RED));
    }

    #[test]
    fn test_collision_image_replaces_alpha() {
        let mut model = quad_model();
        let grid = model.grid().cloned();

        model.set_collision("opaque.png").unwrap();
        assert_eq!(model.collision_path(), "opaque.png");
        assert_eq!(model.grid().cloned(), grid);
        assert_eq!(model.hull(1).unwrap().area(), 1024.0);
        assert_eq!(
            model.view().events[0],
            ViewEvent::CollisionProperty("opaque.png".to_string())
        );
        assert_eq!(model.view().tile_pushes(), 1);

        model.set_collision("").unwrap();
        assert!(model.collision_image().is_none());
        assert!(model.hull(1).is_none());
    }

    #[test]
    fn test_removing_collision_image_clears_path() {
        let mut model = quad_model();
        model.set_collision("opaque.png").unwrap();
        model.view_mut().clear();

        model.set_collision_image(None);
        assert!(model.collision_image().is_none());
        assert_eq!(model.collision_path(), "");
        assert_eq!(model.properties().collision, "");
        assert_eq!(
            model.view().events[0],
            ViewEvent::CollisionProperty(String::new())
        );
        assert!(model.hull(1).is_none());

        // Direct pixels keep whatever path is set
        model.set_collision("opaque.png").unwrap();
        model.set_collision_image(Some(opaque_sheet(64, 64)));
        assert_eq!(model.collision_path(), "opaque.png");
    }

    #[test]
    fn test_apply_properties_with_huge_spacing() {
        let mut model = quad_model();
        let mut props = model.properties();
        props.grid.spacing = u32::MAX;
        props.tile_collision_groups.truncate(1);

        model.apply_properties(&props).unwrap();
        assert_eq!(model.tile_count(), 1);
        assert_eq!(model.grid_config().spacing, u32::MAX);
        assert_eq!(model.hull(0).unwrap().area(), 1024.0);
    }

    #[test]
    fn test_small_collision_image_counts_as_empty() {
        let mut model = quad_model();
        model.set_collision_image(Some(opaque_sheet(32, 32)));

        assert_eq!(model.hull(0).unwrap().area(), 1024.0);
        assert!(model.hull(1).is_none());
        assert!(model.hull(2).is_none());
        assert!(model.hull(3).is_none());
    }

    #[test]
    fn test_alpha_threshold() {
        let mut model = quad_model();
        model.set_image_source(RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 100])));
        assert_eq!(model.hull(0).unwrap().area(), 1024.0);

        model.set_alpha_threshold(100);
        assert!(model.hull(0).is_none());
        assert_eq!(model.render_data().unwrap().hull_counts, vec![0; 4]);

        model.view_mut().clear();
        model.set_alpha_threshold(100);
        assert!(model.view().events.is_empty());

        model.set_alpha_threshold(99);
        assert!(model.hull(0).is_some());
    }

    #[test]
    fn test_hull_scale() {
        let mut model = quad_model();
        model.set_hull_scale(0.5).unwrap();

        assert_eq!(model.hull(0).unwrap().area(), 256.0);
        assert_eq!(model.render_data().unwrap().hull_scale, 0.5);
        assert_eq!(model.render_data().unwrap().hull_of(0)[2], [16.0f32, 16.0]);

        assert!(matches!(
            model.set_hull_scale(0.0),
            Err(TileSetError::InvalidProperty(_))
        ));
        assert!(model.set_hull_scale(f32::NAN).is_err());
        assert_eq!(model.settings().hull_scale, 0.5);
    }

    #[test]
    fn test_material_tag() {
        let mut model = quad_model();
        assert_eq!(model.material_tag(), "tile");

        assert!(matches!(
            model.set_material_tag("  "),
            Err(TileSetError::InvalidProperty(_))
        ));
        model.set_material_tag("metal").unwrap();
        assert_eq!(model.material_tag(), "metal");
        assert_eq!(
            model.view().events,
            vec![ViewEvent::MaterialTag("metal".to_string())]
        );
    }

    #[test]
    fn test_set_tile_group() {
        let mut model = quad_model();
        model.add_group("hazard", Color::RED).unwrap();
        model.view_mut().clear();

        model.set_tile_group(2, Some("hazard")).unwrap();
        assert_eq!(model.tile_group(2), Some("hazard"));
        assert_eq!(model.tile(2).unwrap().group, Some("hazard"));
        assert_eq!(model.view().hull_color_updates(), vec![(2, Color::RED)]);
        assert_eq!(model.view().tile_pushes(), 0);

        model.set_tile_group(2, None).unwrap();
        assert_eq!(model.tile_color(2), Some(unassigned()));
    }

    #[test]
    fn test_set_tile_group_errors() {
        let mut model = hazard_model();

        assert_eq!(
            model.set_tile_group(4, Some("hazard")),
            Err(TileSetError::InvalidTileIndex { index: 4, count: 4 })
        );
        assert_eq!(
            model.set_tile_group(1, Some("water")),
            Err(TileSetError::UnknownGroup("water".to_string()))
        );
        assert_eq!(model.tile_group(1), None);
        assert!(model.view().events.is_empty());
    }

    #[test]
    fn test_group_color_change_only_recolors() {
        let mut model = hazard_model();
        let hulls: Vec<_> = (0..4).map(|i| model.hull(i).cloned()).collect();

        model.set_group_color("hazard", Color::BLUE).unwrap();

        assert_eq!(model.view().tile_pushes(), 0);
        assert_eq!(
            model.view().hull_color_updates(),
            vec![(0, Color::BLUE), (3, Color::BLUE)]
        );
        assert_eq!(model.render_data().unwrap().hull_colors[3], Color::BLUE);
        assert_eq!(model.tile_color(1), Some(unassigned()));
        let after: Vec<_> = (0..4).map(|i| model.hull(i).cloned()).collect();
        assert_eq!(after, hulls);
    }

    #[test]
    fn test_remove_group_refuses_while_in_use() {
        let mut model = hazard_model();

        assert_eq!(
            model.remove_group("hazard", RemovePolicy::Refuse),
            Err(TileSetError::GroupInUse {
                name: "hazard".to_string(),
                tiles: 2,
            })
        );
        assert!(model.groups().contains("hazard"));
        assert_eq!(model.tile_color(0), Some(Color::RED));
        assert!(model.view().events.is_empty());

        assert_eq!(
            model.remove_group("water", RemovePolicy::Cascade),
            Err(TileSetError::UnknownGroup("water".to_string()))
        );
    }

    #[test]
    fn test_remove_group_cascades() {
        let mut model = hazard_model();
        model.remove_group("hazard", RemovePolicy::Cascade).unwrap();

        assert!(model.groups().is_empty());
        assert_eq!(model.tile_group(0), None);
        assert_eq!(model.tile_color(0), Some(unassigned()));
        assert_eq!(
            model.view().hull_color_updates(),
            vec![(0, unassigned()), (3, unassigned())]
        );
        assert_eq!(
            model.view().events[0],
            ViewEvent::CollisionGroups(Vec::new(), Vec::new())
        );
    }

    #[test]
    fn test_remove_unused_group_with_refuse() {
        let mut model = hazard_model();
        model.add_group("water", Color::BLUE).unwrap();

        model.remove_group("water", RemovePolicy::Refuse).unwrap();
        assert_eq!(model.groups().names(), vec!["hazard".to_string()]);
    }

    #[test]
    fn test_rename_group_keeps_assignments() {
        let mut model = hazard_model();
        model.rename_group("hazard", "lava").unwrap();

        assert_eq!(model.tiles_in_group("lava"), vec![0, 3]);
        assert!(model.tiles_in_group("hazard").is_empty());
        assert_eq!(model.tile_color(0), Some(Color::RED));

        model.add_group("water", Color::BLUE).unwrap();
        assert_eq!(
            model.rename_group("water", "lava"),
            Err(TileSetError::DuplicateGroup("lava".to_string()))
        );
    }

    #[test]
    fn test_set_groups_unassigns_removed_names() {
        let mut model = hazard_model();
        model.set_tile_group(2, Some("hazard")).unwrap();
        model.view_mut().clear();

        let names = vec!["ground".to_string(), "hazard".to_string()];
        let colors = vec![Color::GREEN, Color::RED];
        model.set_groups(&names, &colors).unwrap();

        // Same color, nothing to recolor
        assert!(model.view().hull_color_updates().is_empty());
        assert_eq!(
            model.view().events[0],
            ViewEvent::CollisionGroups(names.clone(), colors.clone())
        );

        let names = vec!["ground".to_string()];
        model.set_groups(&names, &[Color::GREEN]).unwrap();
        assert!(model.tiles_in_group("hazard").is_empty());
        assert_eq!(
            model.view().hull_color_updates(),
            vec![(0, unassigned()), (2, unassigned()), (3, unassigned())]
        );
    }

    #[test]
    fn test_set_groups_rejects_bad_lists() {
        let mut model = hazard_model();
        let names = vec!["a".to_string(), "a".to_string()];

        assert_eq!(
            model.set_groups(&names, &[Color::RED, Color::BLUE]),
            Err(TileSetError::DuplicateGroup("a".to_string()))
        );
        assert!(matches!(
            model.set_groups(&names, &[Color::RED]),
            Err(TileSetError::InvalidProperty(_))
        ));
        assert!(model.groups().contains("hazard"));
        assert_eq!(model.tiles_in_group("hazard"), vec![0, 3]);
        assert!(model.view().events.is_empty());
    }

    #[test]
    fn test_properties_round_trip() {
        let mut model = hazard_model();
        model.set_collision("opaque.png").unwrap();
        model.set_material_tag("metal").unwrap();
        let props = model.properties();

        assert_eq!(props.image, "quad.png");
        assert_eq!(
            props.tile_collision_groups,
            vec![Some("hazard".to_string()), None, None, Some("hazard".to_string())]
        );

        let mut copy = TileSetModel::new(RecordingView::default(), test_loader());
        copy.apply_properties(&props).unwrap();

        assert_eq!(copy.properties(), props);
        assert_eq!(copy.id(), model.id());
        assert_eq!(copy.render_data(), model.render_data());
        assert_eq!(
            copy.view().last_event(),
            Some(&ViewEvent::Tiles(model.render_data().unwrap().clone()))
        );
    }

    #[test]
    fn test_apply_properties_is_atomic() {
        let mut model = hazard_model();
        let before = model.properties();

        let mut props = before.clone();
        props.tile_collision_groups[1] = Some("water".to_string());
        assert_eq!(
            model.apply_properties(&props),
            Err(TileSetError::UnknownGroup("water".to_string()))
        );

        let mut props = before.clone();
        props.image = "missing.png".to_string();
        assert!(matches!(
            model.apply_properties(&props),
            Err(TileSetError::ImageLoad(_))
        ));

        let mut props = before.clone();
        props.grid.tile_width = 0;
        assert!(matches!(
            model.apply_properties(&props),
            Err(TileSetError::InvalidGridConfig(_))
        ));

        let mut props = before.clone();
        props.tile_collision_groups.push(Some("hazard".to_string()));
        assert_eq!(
            model.apply_properties(&props),
            Err(TileSetError::InvalidTileIndex { index: 4, count: 4 })
        );

        assert_eq!(model.properties(), before);
        assert!(model.view().events.is_empty());
    }

    #[test]
    fn test_refresh_view_pushes_everything() {
        let mut model = hazard_model();
        model.refresh_view();

        let events = &model.view().events;
        assert_eq!(events.len(), 10);
        assert_eq!(events[2], ViewEvent::TileWidth(32));
        assert_eq!(events[7], ViewEvent::MaterialTag("tile".to_string()));
        assert!(matches!(events[9], ViewEvent::Tiles(_)));
    }
}
