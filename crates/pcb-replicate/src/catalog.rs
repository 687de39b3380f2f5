//! Read-only snapshot of the placeable items on a board.

use log::{debug, info};

use crate::board::{BoardItem, Component, Document, ItemId, ItemKind};
use crate::error::ReplicateError;
use crate::geometry::BoundingBox;
use crate::hierarchy::{HierarchyIndex, SheetPath, split_identity_path};

#[derive(Debug, Clone)]
pub struct CatalogComponent {
    pub id: ItemId,
    pub component: Component,
    /// Symbol id shared by every instance of this footprint's symbol
    pub symbol_id: Option<String>,
    pub sheet: SheetPath,
}

impl CatalogComponent {
    pub fn reference(&self) -> &str {
        &self.component.reference
    }

    /// Footprints without schematic linkage never take part in replication.
    pub fn is_linked(&self) -> bool {
        self.symbol_id.is_some() && !self.sheet.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub id: ItemId,
    pub item: BoardItem,
    pub bbox: BoundingBox,
}

impl CatalogItem {
    pub fn kind(&self) -> ItemKind {
        self.item.kind()
    }
}

/// Snapshot of a document taken at the start of a run.
///
/// It goes stale as soon as the document is mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    hierarchy: HierarchyIndex,
    components: Vec<CatalogComponent>,
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn build(doc: &dyn Document) -> Result<Self, ReplicateError> {
        info!("Getting a list of all footprints on the board");
        let items = doc.items();
        let footprints: Vec<&Component> =
            items.iter().filter_map(|(_, item)| item.as_component()).collect();

        let schematic = doc.file_name().map(|p| p.with_extension("kicad_sch"));
        let hierarchy = HierarchyIndex::build(footprints, schematic.as_deref())?;

        let mut components = Vec::new();
        let mut others = Vec::new();
        for (id, item) in items {
            match item {
                BoardItem::Component(c) => {
                    let symbol_id = split_identity_path(&c.path).map(|(_, symbol)| symbol);
                    let sheet = hierarchy.sheet_path(&c.path);
                    if symbol_id.is_none() {
                        debug!("Footprint {} is only in the layout", c.reference);
                    }
                    components.push(CatalogComponent {
                        id,
                        component: c.clone(),
                        symbol_id,
                        sheet,
                    });
                }
                other => others.push(CatalogItem {
                    id,
                    item: other.clone(),
                    bbox: other.bounding_box(),
                }),
            }
        }

        debug!(
            "Catalog holds {} footprints and {} other items",
            components.len(),
            others.len()
        );
        Ok(Self {
            hierarchy,
            components,
            items: others,
        })
    }

    pub fn hierarchy(&self) -> &HierarchyIndex {
        &self.hierarchy
    }

    pub fn components(&self) -> &[CatalogComponent] {
        &self.components
    }

    /// Tracks, zones, text and drawings.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn by_reference(&self, reference: &str) -> Option<&CatalogComponent> {
        self.components.iter().find(|c| c.reference() == reference)
    }

    pub fn component(&self, id: ItemId) -> Option<&CatalogComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    /// The footprint chosen as anchor.
    pub fn anchor(&self, id: ItemId) -> Result<&CatalogComponent, ReplicateError> {
        self.component(id)
            .ok_or_else(|| ReplicateError::UnknownAnchor(id.to_string()))
    }

    /// All linked footprints instancing the same symbol.
    pub fn with_symbol_id<'a>(
        &'a self,
        symbol_id: &'a str,
    ) -> impl Iterator<Item = &'a CatalogComponent> + 'a {
        self.components
            .iter()
            .filter(move |c| c.is_linked() && c.symbol_id.as_deref() == Some(symbol_id))
    }

    /// Linked footprints inside the sheet instance `prefix`.
    pub fn on_sheet(&self, prefix: &[String]) -> Vec<&CatalogComponent> {
        self.components
            .iter()
            .filter(|c| c.is_linked() && c.sheet.starts_with(prefix))
            .collect()
    }

    /// Every other footprint, including layout-only ones.
    pub fn not_on_sheet(&self, prefix: &[String]) -> Vec<&CatalogComponent> {
        self.components
            .iter()
            .filter(|c| !(c.is_linked() && c.sheet.starts_with(prefix)))
            .collect()
    }
}

/// Bounding box around a set of footprints.
pub fn components_bounding_box<'a, I>(components: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = &'a Component>,
{
    BoundingBox::union(components.into_iter().map(Component::bounding_box))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Pad, Track};
    use crate::geometry::Point;
    use crate::memory::MemoryBoard;
    use std::collections::BTreeMap;

    fn footprint(reference: &str, path: &str, sheet: &str, x: i64) -> BoardItem {
        let properties = if sheet.is_empty() {
            BTreeMap::new()
        } else {
            BTreeMap::from([
                ("Sheetname".to_string(), sheet.to_string()),
                ("Sheetfile".to_string(), "ch.kicad_sch".to_string()),
            ])
        };
        BoardItem::Component(Component {
            reference: reference.into(),
            value: String::new(),
            path: path.into(),
            properties,
            position: Point::new(x, 0),
            orientation: 0.0,
            layer: "F.Cu".into(),
            locked: false,
            group: None,
            body: BoundingBox::new(Point::new(-10, -10), Point::new(10, 10)),
            pads: vec![Pad {
                name: "1".into(),
                net: "GND".into(),
            }],
            texts: vec![],
            settings: Default::default(),
        })
    }

    #[test]
    fn test_catalog_partitions_sheets() {
        let mut board = MemoryBoard::new();
        board.add(footprint("R1", "/a/r", "A", 0)).unwrap();
        board.add(footprint("R2", "/b/r", "B", 100)).unwrap();
        board.add(footprint("H1", "", "", 200)).unwrap();
        board
            .add(BoardItem::Track(Track {
                start: Point::new(0, 0),
                end: Point::new(100, 0),
                width: 4,
                layer: "F.Cu".into(),
                net: "GND".into(),
                locked: false,
                group: None,
            }))
            .unwrap();

        let catalog = Catalog::build(&board).unwrap();
        assert_eq!(catalog.components().len(), 3);
        assert_eq!(catalog.hierarchy().len(), 2);
        assert_eq!(catalog.items().len(), 1);
        assert_eq!(
            catalog.items()[0].bbox,
            BoundingBox::new(Point::new(-2, -2), Point::new(102, 2))
        );

        let prefix = vec!["A".to_string()];
        let on: Vec<_> = catalog
            .on_sheet(&prefix)
            .into_iter()
            .map(|c| c.reference())
            .collect();
        let off: Vec<_> = catalog
            .not_on_sheet(&prefix)
            .into_iter()
            .map(|c| c.reference())
            .collect();
        assert_eq!(on, ["R1"]);
        assert_eq!(off, ["R2", "H1"]);

        assert!(!catalog.by_reference("H1").unwrap().is_linked());
        assert_eq!(catalog.with_symbol_id("R").count(), 2);
        assert!(catalog.on_sheet(&[]).is_empty());
    }

    #[test]
    fn test_components_bounding_box() {
        let a = footprint("R1", "", "", 0);
        let b = footprint("R2", "", "", 100);
        let boxes = [a, b];
        let comps = boxes.iter().filter_map(BoardItem::as_component);
        assert_eq!(
            components_bounding_box(comps),
            Some(BoundingBox::new(Point::new(-10, -10), Point::new(110, 10)))
        );
    }
}
