//! Persistable tile set fields
//!
//! Writing these to a project file is up to the host; the model only
//! produces and replays them.

use serde::{Deserialize, Serialize};
use tilehull_core::{CollisionGroup, TileGridConfig};
use uuid::Uuid;

/// Snapshot of every user-editable tile set property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSetProperties {
    pub id: Uuid,
    /// Image property path, empty when unset
    #[serde(default)]
    pub image: String,
    /// Collision image property path, empty when hulls use the image's alpha
    #[serde(default)]
    pub collision: String,
    pub material_tag: String,
    #[serde(flatten)]
    pub grid: TileGridConfig,
    #[serde(default)]
    pub collision_groups: Vec<CollisionGroup>,
    /// Collision group name per tile, row-major
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tile_collision_groups: Vec<Option<String>>,
}

impl TileSetProperties {
    /// Properties of a tile set with no image and no groups
    pub fn new(id: Uuid, material_tag: impl Into<String>) -> Self {
        Self {
            id,
            image: String::new(),
            collision: String::new(),
            material_tag: material_tag.into(),
            grid: TileGridConfig::default(),
            collision_groups: Vec::new(),
            tile_collision_groups: Vec::new(),
        }
    }
}
