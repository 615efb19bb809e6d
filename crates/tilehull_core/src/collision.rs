//! Collision groups
//!
//! A collision group is a named, colored classification tiles can be tagged
//! with. The registry keeps groups in insertion order; the position of a
//! group is stable until it is removed and is what presentation layers use
//! to line names up with colors.

use serde::{Deserialize, Serialize};

use crate::{Color, TileSetError};

/// A named collision group and the color its hulls are drawn with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionGroup {
    pub name: String,
    #[serde(default)]
    pub color: Color,
}

impl CollisionGroup {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Ordered set of uniquely named collision groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionGroupRegistry {
    groups: Vec<CollisionGroup>,
}

fn validate_name(name: &str) -> Result<(), TileSetError> {
    if name.trim().is_empty() {
        return Err(TileSetError::InvalidProperty(
            "Collision group name must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl CollisionGroupRegistry {
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Build a registry from parallel name and color lists
    ///
    /// Fails with `DuplicateGroup` on the first repeated name.
    pub fn from_lists(names: &[String], colors: &[Color]) -> Result<Self, TileSetError> {
        if names.len() != colors.len() {
            return Err(TileSetError::InvalidProperty(format!(
                "Got {} collision group names but {} colors",
                names.len(),
                colors.len()
            )));
        }

        let mut registry = Self::new();
        for (name, color) in names.iter().zip(colors) {
            registry.add(name.clone(), *color)?;
        }
        Ok(registry)
    }

    /// Append a group, returning its index
    pub fn add(&mut self, name: impl Into<String>, color: Color) -> Result<usize, TileSetError> {
        let name = name.into();
        validate_name(&name)?;
        if self.contains(&name) {
            return Err(TileSetError::DuplicateGroup(name));
        }
        self.groups.push(CollisionGroup::new(name, color));
        Ok(self.groups.len() - 1)
    }

    /// Rename a group in place, keeping its index and color
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), TileSetError> {
        validate_name(new)?;
        let index = self
            .index_of(old)
            .ok_or_else(|| TileSetError::UnknownGroup(old.to_string()))?;
        if old != new && self.contains(new) {
            return Err(TileSetError::DuplicateGroup(new.to_string()));
        }
        self.groups[index].name = new.to_string();
        Ok(())
    }

    /// Remove a group by name
    pub fn remove(&mut self, name: &str) -> Result<CollisionGroup, TileSetError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| TileSetError::UnknownGroup(name.to_string()))?;
        Ok(self.groups.remove(index))
    }

    /// Change the display color of a group
    pub fn set_color(&mut self, name: &str, color: Color) -> Result<(), TileSetError> {
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| TileSetError::UnknownGroup(name.to_string()))?;
        group.color = color;
        Ok(())
    }

    pub fn color_of(&self, name: &str) -> Option<Color> {
        self.get(name).map(|g| g.color)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&CollisionGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionGroup> {
        self.groups.iter()
    }

    /// Group names in registry order
    pub fn names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    /// Group colors in registry order
    pub fn colors(&self) -> Vec<Color> {
        self.groups.iter().map(|g| g.color).collect()
    }
}
