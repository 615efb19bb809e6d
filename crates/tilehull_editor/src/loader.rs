//! Image loading for image and collision properties
//!
//! Resolving asset paths belongs to the host application; the model only
//! sees an `ImageLoader`. `FsImageLoader` covers the common case of paths
//! relative to an assets directory.

use image::RgbaImage;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tilehull_core::{image_tags, ImageTag, TileSetError};

/// A decoded image plus its informational tags
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixels: RgbaImage,
    pub tags: BTreeSet<ImageTag>,
}

impl LoadedImage {
    /// Wrap pixels that did not come from an encoded file
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        let tags = image_tags(None, image::ColorType::Rgba8, &pixels);
        Self { pixels, tags }
    }
}

/// Turns an image property value into pixels
pub trait ImageLoader {
    fn load(&self, path: &str) -> Result<LoadedImage, TileSetError>;
}

/// Decode an encoded image held in memory
pub fn decode_image(bytes: &[u8]) -> Result<LoadedImage, TileSetError> {
    let format = image::guess_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    let color_type = decoded.color();
    let pixels = decoded.into_rgba8();
    let tags = image_tags(Some(format), color_type, &pixels);
    Ok(LoadedImage { pixels, tags })
}

/// Loads images from files relative to an assets directory
#[derive(Debug, Clone)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a property path to a file path; leading slashes are project-rooted
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches(['/', '\\']))
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, path: &str) -> Result<LoadedImage, TileSetError> {
        let file = self.resolve(path);
        let bytes = std::fs::read(&file)
            .map_err(|e| TileSetError::ImageLoad(format!("{}: {}", file.display(), e)))?;
        decode_image(&bytes)
            .map_err(|e| TileSetError::ImageLoad(format!("{}: {}", file.display(), e)))
    }
}

/// Serves images that were decoded ahead of time, keyed by property path
#[derive(Debug, Clone, Default)]
pub struct MemoryImageLoader {
    images: HashMap<String, LoadedImage>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, image: LoadedImage) {
        self.images.insert(path.into(), image);
    }

    pub fn with_image(mut self, path: impl Into<String>, pixels: RgbaImage) -> Self {
        self.insert(path, LoadedImage::from_rgba(pixels));
        self
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load(&self, path: &str) -> Result<LoadedImage, TileSetError> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| TileSetError::ImageLoad(format!("{path}: no such image")))
    }
}
