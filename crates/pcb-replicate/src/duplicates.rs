//! Removal of identical copies left behind by repeated replication.

use std::collections::HashSet;

use log::debug;

use crate::board::{BoardItem, Document, ItemId};
use crate::error::DocumentError;

/// Post-pass that deletes duplicated geometry from a document.
pub trait DuplicateRemover {
    /// Returns the number of removed items.
    fn remove_duplicates(&self, doc: &mut dyn Document) -> Result<usize, DocumentError>;
}

/// Deletes later copies of tracks, zones, text and drawings that match an
/// earlier item in geometry, layer and net. Group, lock and fill state are
/// ignored. Footprints are never touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactDuplicateRemover;

fn comparable(item: &BoardItem) -> BoardItem {
    let mut item = item.clone();
    item.set_group(None);
    match &mut item {
        BoardItem::Component(c) => c.locked = false,
        BoardItem::Track(t) => t.locked = false,
        BoardItem::Zone(z) => {
            z.locked = false;
            z.filled = false;
        }
        BoardItem::Text(t) => t.locked = false,
        BoardItem::Drawing(d) => d.locked = false,
    }
    item
}

impl DuplicateRemover for ExactDuplicateRemover {
    fn remove_duplicates(&self, doc: &mut dyn Document) -> Result<usize, DocumentError> {
        // Items hold floats, so they are keyed by their canonical JSON form.
        let mut seen: HashSet<String> = HashSet::new();
        let mut duplicates: Vec<ItemId> = Vec::new();
        for (id, item) in doc.items() {
            if item.as_component().is_some() {
                continue;
            }
            if !seen.insert(serde_json::to_string(&comparable(item))?) {
                duplicates.push(id);
            }
        }

        for id in &duplicates {
            let removed = doc.remove(*id)?;
            debug!("Removed duplicate {} {id}", removed.kind());
        }
        Ok(duplicates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Track;
    use crate::geometry::Point;
    use crate::memory::MemoryBoard;

    fn track(x: i64, net: &str, locked: bool) -> BoardItem {
        BoardItem::Track(Track {
            start: Point::new(x, 0),
            end: Point::new(x + 100, 0),
            width: 10,
            layer: "F.Cu".into(),
            net: net.into(),
            locked,
            group: None,
        })
    }

    #[test]
    fn test_removes_later_copies() {
        let mut board = MemoryBoard::new();
        let first = board.add(track(0, "GND", true)).unwrap();
        board.add(track(0, "GND", false)).unwrap();
        board.add(track(0, "GND", false)).unwrap();
        let other_net = board.add(track(0, "VCC", false)).unwrap();
        let moved = board.add(track(5, "GND", false)).unwrap();

        let removed = ExactDuplicateRemover.remove_duplicates(&mut board).unwrap();
        assert_eq!(removed, 2);
        let left: Vec<ItemId> = board.items().into_iter().map(|(id, _)| id).collect();
        assert_eq!(left, [first, other_net, moved]);
    }

    #[test]
    fn test_many_copies_in_other_groups() {
        let mut board = MemoryBoard::new();
        board.create_group("Replicated - A").unwrap();
        board.add(track(0, "GND", false)).unwrap();
        let mut grouped = track(0, "GND", false);
        grouped.set_group(Some("Replicated - A".into()));
        board.add(grouped).unwrap();
        for _ in 0..500 {
            board.add(track(0, "GND", false)).unwrap();
        }
        assert_eq!(ExactDuplicateRemover.remove_duplicates(&mut board).unwrap(), 501);
        assert_eq!(board.items().len(), 1);
    }
}
