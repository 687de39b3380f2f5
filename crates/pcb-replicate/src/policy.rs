//! Replication settings.
//!
//! Every field has a default, so a policy file only lists what it changes:
//!
//! ```toml
//! coverage = "contain"
//! remove_existing = true
//!
//! [locked]
//! tracks = true
//!
//! [group]
//! components = true
//! tracks = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::ItemKind;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid policy file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// How an item's bounding box must relate to the sheet bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    /// Any overlap is enough
    #[default]
    Intersect,
    /// The item must lie fully inside
    Contain,
}

/// One value per item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerKind<T> {
    pub components: T,
    pub tracks: T,
    pub zones: T,
    pub text: T,
    pub drawings: T,
}

impl<T: Copy> PerKind<T> {
    pub fn all(value: T) -> Self {
        Self {
            components: value,
            tracks: value,
            zones: value,
            text: value,
            drawings: value,
        }
    }

    pub fn get(&self, kind: ItemKind) -> T {
        match kind {
            ItemKind::Component => self.components,
            ItemKind::Track => self.tracks,
            ItemKind::Zone => self.zones,
            ItemKind::Text => self.text,
            ItemKind::Drawing => self.drawings,
        }
    }

    pub fn get_mut(&mut self, kind: ItemKind) -> &mut T {
        match kind {
            ItemKind::Component => &mut self.components,
            ItemKind::Track => &mut self.tracks,
            ItemKind::Zone => &mut self.zones,
            ItemKind::Text => &mut self.text,
            ItemKind::Drawing => &mut self.drawings,
        }
    }
}

impl PerKind<bool> {
    pub fn any(&self) -> bool {
        self.components || self.tracks || self.zones || self.text || self.drawings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationPolicy {
    pub coverage: Coverage,
    /// Select only items in the anchor's group instead of the sheet box
    pub by_group: bool,
    /// Also take items outside the box that share the anchor's group
    pub include_group_items: bool,
    /// Replicate (and overwrite) locked items of each kind
    pub locked: PerKind<bool>,
    /// Delete destination items in the target area before placing
    pub remove_existing: bool,
    /// Delete exact duplicates once replication is done
    pub remove_duplicates: bool,
    pub tracks: bool,
    pub zones: bool,
    pub text: bool,
    pub drawings: bool,
    /// Collect replicated items of each kind into a per-sheet group
    pub group: PerKind<bool>,
}

impl Default for ReplicationPolicy {
    fn default() -> Self {
        Self {
            coverage: Coverage::Intersect,
            by_group: false,
            include_group_items: false,
            locked: PerKind::all(false),
            remove_existing: false,
            remove_duplicates: false,
            tracks: true,
            zones: true,
            text: true,
            drawings: true,
            group: PerKind::all(false),
        }
    }
}

impl ReplicationPolicy {
    pub fn from_toml_str(content: &str) -> Result<Self, PolicyError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Whether items of `kind` are cloned onto destination sheets.
    pub fn replicates(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Component => true,
            ItemKind::Track => self.tracks,
            ItemKind::Zone => self.zones,
            ItemKind::Text => self.text,
            ItemKind::Drawing => self.drawings,
        }
    }
}
