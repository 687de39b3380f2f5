//! In-memory board document with a JSON representation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::board::{BoardItem, Component, Document, ItemId};
use crate::error::DocumentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub id: ItemId,
    pub item: BoardItem,
}

/// A board held entirely in memory.
///
/// Net codes are indices into `nets`; code 0 is always the empty net.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryBoard {
    #[serde(default)]
    nets: Vec<String>,
    #[serde(default)]
    groups: BTreeSet<String>,
    #[serde(default)]
    items: Vec<BoardEntry>,
    #[serde(skip)]
    file_name: Option<PathBuf>,
    #[serde(skip)]
    highlighted: BTreeSet<ItemId>,
}

impl MemoryBoard {
    pub fn new() -> Self {
        let mut board = Self::default();
        board.normalize();
        board
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut board: MemoryBoard = serde_json::from_str(json)?;
        board.normalize();
        Ok(board)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_name = Some(path.into());
        self
    }

    /// Make sure net 0 is the empty net and every item net has a code.
    fn normalize(&mut self) {
        if self.nets.first().is_none_or(|n| !n.is_empty()) {
            self.nets.retain(|n| !n.is_empty());
            self.nets.insert(0, String::new());
        }
        let used: Vec<String> = self.items.iter().flat_map(|e| item_nets(&e.item)).collect();
        for net in used {
            self.add_net(&net);
        }
    }

    /// Register a net name, returning its code.
    pub fn add_net(&mut self, name: &str) -> u32 {
        if let Some(code) = self.net_code(name) {
            return code;
        }
        self.nets.push(name.to_string());
        (self.nets.len() - 1) as u32
    }

    pub fn nets(&self) -> &[String] {
        &self.nets
    }

    pub fn entries(&self) -> &[BoardEntry] {
        &self.items
    }

    /// Insert an item under a caller-chosen id.
    pub fn insert_with_id(&mut self, id: ItemId, item: BoardItem) -> Result<(), DocumentError> {
        self.check_group(&item)?;
        for net in item_nets(&item) {
            self.add_net(&net);
        }
        self.items.push(BoardEntry { id, item });
        Ok(())
    }

    pub fn find_component(&self, reference: &str) -> Option<(ItemId, &Component)> {
        self.items.iter().find_map(|e| match &e.item {
            BoardItem::Component(c) if c.reference == reference => Some((e.id, c)),
            _ => None,
        })
    }

    pub fn is_highlighted(&self, id: ItemId) -> bool {
        self.highlighted.contains(&id)
    }

    fn check_group(&self, item: &BoardItem) -> Result<(), DocumentError> {
        match item.group() {
            Some(group) if !self.groups.contains(group) => {
                Err(DocumentError::UnknownGroup(group.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn position(&self, id: ItemId) -> Result<usize, DocumentError> {
        self.items
            .iter()
            .position(|e| e.id == id)
            .ok_or(DocumentError::UnknownItem(id))
    }
}

fn item_nets(item: &BoardItem) -> Vec<String> {
    match item {
        BoardItem::Component(c) => c.pads.iter().map(|p| p.net.clone()).collect(),
        other => other.net().map(str::to_string).into_iter().collect(),
    }
}

impl Document for MemoryBoard {
    fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    fn items(&self) -> Vec<(ItemId, &BoardItem)> {
        self.items.iter().map(|e| (e.id, &e.item)).collect()
    }

    fn item(&self, id: ItemId) -> Option<&BoardItem> {
        self.items.iter().find(|e| e.id == id).map(|e| &e.item)
    }

    fn update(&mut self, id: ItemId, item: BoardItem) -> Result<(), DocumentError> {
        self.check_group(&item)?;
        let index = self.position(id)?;
        for net in item_nets(&item) {
            self.add_net(&net);
        }
        self.items[index].item = item;
        Ok(())
    }

    fn add(&mut self, item: BoardItem) -> Result<ItemId, DocumentError> {
        let id = ItemId::new();
        self.insert_with_id(id, item)?;
        Ok(id)
    }

    fn remove(&mut self, id: ItemId) -> Result<BoardItem, DocumentError> {
        let index = self.position(id)?;
        self.highlighted.remove(&id);
        Ok(self.items.remove(index).item)
    }

    fn net_code(&self, name: &str) -> Option<u32> {
        self.nets.iter().position(|n| n == name).map(|i| i as u32)
    }

    fn group_exists(&self, name: &str) -> bool {
        self.groups.contains(name)
    }

    fn create_group(&mut self, name: &str) -> Result<(), DocumentError> {
        if !self.groups.insert(name.to_string()) {
            return Err(DocumentError::DuplicateGroup(name.to_string()));
        }
        Ok(())
    }

    fn set_highlighted(&mut self, id: ItemId, highlighted: bool) -> Result<(), DocumentError> {
        self.position(id)?;
        if highlighted {
            self.highlighted.insert(id);
        } else {
            self.highlighted.remove(&id);
        }
        Ok(())
    }

    fn refill_zones(&mut self) -> usize {
        let mut filled = 0;
        for entry in &mut self.items {
            if let BoardItem::Zone(zone) = &mut entry.item
                && zone.is_copper()
            {
                zone.filled = true;
                filled += 1;
            }
        }
        debug!("Refilled {filled} zones");
        filled
    }
}
