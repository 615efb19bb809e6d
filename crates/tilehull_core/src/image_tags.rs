//! Informational tags describing a decoded source image

use image::{ColorType, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A display-only fact about an image, shown next to the image property
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImageTag {
    /// Container format, e.g. `png`
    Format(String),
    /// Channel layout of the encoded data, e.g. `rgba8`
    ColorType(String),
    /// Every pixel has full alpha
    Opaque,
    /// At least one pixel is partly or fully transparent
    Translucent,
}

impl ImageTag {
    /// Get the display name of this tag
    pub fn name(&self) -> String {
        match self {
            ImageTag::Format(format) => format.clone(),
            ImageTag::ColorType(color) => color.clone(),
            ImageTag::Opaque => "opaque".to_string(),
            ImageTag::Translucent => "translucent".to_string(),
        }
    }
}

/// Collect the tags for an image decoded from `format` with `color_type`
pub fn image_tags(
    format: Option<ImageFormat>,
    color_type: ColorType,
    pixels: &RgbaImage,
) -> BTreeSet<ImageTag> {
    let mut tags = BTreeSet::new();
    if let Some(format) = format {
        tags.insert(ImageTag::Format(format!("{format:?}").to_lowercase()));
    }
    tags.insert(ImageTag::ColorType(format!("{color_type:?}").to_lowercase()));

    if pixels.pixels().all(|p| p[3] == u8::MAX) {
        tags.insert(ImageTag::Opaque);
    } else {
        tags.insert(ImageTag::Translucent);
    }
    tags
}
