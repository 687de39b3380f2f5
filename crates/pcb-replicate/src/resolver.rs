//! Enumerating the other instances of a sheet.

use itertools::Itertools;
use log::info;

use crate::catalog::{Catalog, CatalogComponent};
use crate::error::ReplicateError;
use crate::matcher::match_component;

/// Sheet instance ids from the root down to one sheet.
pub type SheetPrefix = Vec<String>;

/// A sheet instance that can receive the source layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSheet {
    pub prefix: SheetPrefix,
    /// Sheet display names along the prefix
    pub names: Vec<String>,
    /// Reference of the footprint that plays the anchor on this sheet
    pub anchor: String,
}

/// The anchor's sheet prefix at `level` (0 = outermost sheet).
pub fn source_prefix(
    anchor: &CatalogComponent,
    level: usize,
) -> Result<SheetPrefix, ReplicateError> {
    if !anchor.is_linked() {
        return Err(ReplicateError::AnchorNotLinked(anchor.reference().to_string()));
    }
    if level >= anchor.sheet.depth() {
        return Err(ReplicateError::InvalidLevel {
            reference: anchor.reference().to_string(),
            level,
            depth: anchor.sheet.depth(),
        });
    }
    Ok(anchor.sheet.ids[..=level].to_vec())
}

/// Every other instance of the anchor's sheet at `level`.
///
/// An instance qualifies when its schematic files match the anchor's files
/// along the whole prefix. Results are sorted and never contain the
/// anchor's own prefix.
pub fn replication_candidates(
    catalog: &Catalog,
    anchor: &CatalogComponent,
    level: usize,
) -> Result<Vec<SheetPrefix>, ReplicateError> {
    let own = source_prefix(anchor, level)?;
    let files = &anchor.sheet.files[..=level];
    let Some(symbol_id) = anchor.symbol_id.as_deref() else {
        return Err(ReplicateError::AnchorNotLinked(anchor.reference().to_string()));
    };

    info!(
        "Looking for sheets to replicate on level {level}, file {}",
        files[level]
    );

    let mut sheets: Vec<SheetPrefix> = catalog
        .with_symbol_id(symbol_id)
        .filter(|c| c.sheet.files.len() > level && c.sheet.files[..=level] == *files)
        .map(|c| c.sheet.ids[..=level].to_vec())
        .filter(|prefix| *prefix != own)
        .collect();
    sheets.sort();
    sheets.dedup();

    info!(
        "Suitable sheets are: {}",
        sheets.iter().map(|prefix| prefix.join("/")).join(", ")
    );
    Ok(sheets)
}

/// Candidate sheets together with their anchor footprints and names.
pub fn candidate_sheets(
    catalog: &Catalog,
    anchor: &CatalogComponent,
    level: usize,
) -> Result<Vec<CandidateSheet>, ReplicateError> {
    replication_candidates(catalog, anchor, level)?
        .into_iter()
        .map(|prefix| {
            let sheet = catalog.on_sheet(&prefix);
            let dst_anchor = match_component(anchor, &sheet)?;
            Ok(CandidateSheet {
                names: dst_anchor.sheet.names[..prefix.len()].to_vec(),
                anchor: dst_anchor.reference().to_string(),
                prefix,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardItem, Component, Document};
    use crate::geometry::{BoundingBox, Point};
    use crate::memory::MemoryBoard;
    use std::collections::BTreeMap;

    fn footprint(reference: &str, path: &str, name: &str, file: &str) -> BoardItem {
        BoardItem::Component(Component {
            reference: reference.into(),
            value: String::new(),
            path: path.into(),
            properties: BTreeMap::from([
                ("Sheetname".to_string(), name.to_string()),
                ("Sheetfile".to_string(), file.to_string()),
            ]),
            position: Point::default(),
            orientation: 0.0,
            layer: "F.Cu".into(),
            locked: false,
            group: None,
            body: BoundingBox::default(),
            pads: vec![],
            texts: vec![],
            settings: Default::default(),
        })
    }

    /// Two outer instances of `outer.kicad_sch`, each holding two instances
    /// of `inner.kicad_sch`, plus a lone footprint directly in each outer sheet.
    fn nested_board() -> MemoryBoard {
        let mut board = MemoryBoard::new();
        let mut n = 0;
        for outer in ["O1", "O2"] {
            board
                .add(footprint(
                    &format!("C{outer}"),
                    &format!("/{outer}/c"),
                    outer,
                    "outer.kicad_sch",
                ))
                .unwrap();
            for inner in ["I1", "I2"] {
                n += 1;
                board
                    .add(footprint(
                        &format!("R{n}"),
                        &format!("/{outer}/{outer}{inner}/r"),
                        inner,
                        "inner.kicad_sch",
                    ))
                    .unwrap();
            }
        }
        board
    }

    #[test]
    fn test_inner_level_candidates() {
        let catalog = Catalog::build(&nested_board()).unwrap();
        let anchor = catalog.by_reference("R1").unwrap();
        let sheets = replication_candidates(&catalog, anchor, 1).unwrap();
        assert_eq!(
            sheets,
            vec![
                vec!["O1".to_string(), "O1I2".to_string()],
                vec!["O2".to_string(), "O2I1".to_string()],
                vec!["O2".to_string(), "O2I2".to_string()],
            ]
        );
    }

    #[test]
    fn test_outer_level_candidates() {
        let catalog = Catalog::build(&nested_board()).unwrap();
        let anchor = catalog.by_reference("R1").unwrap();
        let sheets = replication_candidates(&catalog, anchor, 0).unwrap();
        assert_eq!(sheets, vec![vec!["O2".to_string()]]);

        let candidates = candidate_sheets(&catalog, anchor, 0).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].anchor, "R3");
        assert_eq!(candidates[0].names, ["O2"]);
    }

    #[test]
    fn test_invalid_level() {
        let catalog = Catalog::build(&nested_board()).unwrap();
        let anchor = catalog.by_reference("R1").unwrap();
        assert!(matches!(
            replication_candidates(&catalog, anchor, 2),
            Err(ReplicateError::InvalidLevel { depth: 2, .. })
        ));
    }
}
